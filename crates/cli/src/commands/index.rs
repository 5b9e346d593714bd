//! `docsearch index clear [--domain]` and `docsearch index stats
//! <domain>`, backed by [`DomainIndexer`]'s `clear`/`stats`, mirroring
//! `get_domain_stats` in `sitemap_index.py`.

use docsearch_urlindex::DomainIndexer;

pub async fn clear(indexer: &DomainIndexer, domain: Option<&str>) -> anyhow::Result<()> {
    let removed = indexer.clear(domain).await?;
    match domain {
        Some(d) => println!("Cleared the URL index for domain {d} ({removed} domain(s) removed)."),
        None => println!("Cleared {removed} domain index(es)."),
    }
    Ok(())
}

pub async fn stats(indexer: &DomainIndexer, domain: &str) {
    match indexer.stats(domain).await {
        Some(stats) => {
            println!("Domain:      {}", stats.domain);
            println!("Source:      {:?}", stats.source_type);
            println!("URL count:   {}", stats.url_count);
            println!("Indexed at:  {}", stats.indexed_at);
        }
        None => println!("No index built yet for domain {domain}."),
    }
}
