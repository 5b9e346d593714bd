//! `docsearch cache clear [--domain]` and `docsearch cache list
//! [--domain]`, backed directly by [`PageCache`]'s `clear`/`get_index`.

use docsearch_cache::PageCache;

pub async fn clear(cache: &PageCache, domain: Option<&str>) -> anyhow::Result<()> {
    let removed = cache.clear(domain).await?;
    match domain {
        Some(d) => println!("Cleared {removed} cached page(s) for domain {d}."),
        None => println!("Cleared {removed} cached page(s)."),
    }
    Ok(())
}

pub async fn list(cache: &PageCache, domain: Option<&str>) {
    let entries = cache.get_index(domain).await;
    if entries.is_empty() {
        println!("No cached pages.");
        return;
    }
    for entry in entries {
        println!("{}", entry.url);
        if !entry.title.is_empty() {
            println!("  {}", entry.title);
        }
    }
}
