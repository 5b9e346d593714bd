//! `docsearch tools` — lists configured tools, mirroring
//! `DocSearchAgent.list_tools` (used by the original MCP surface to
//! advertise one granular tool per configured corpus).

use docsearch_engine::SearchEngine;

pub fn run(engine: &SearchEngine) {
    let mut tools = engine.list_tools();
    tools.sort_by(|a, b| a.id.cmp(&b.id));

    if tools.is_empty() {
        println!("No tools configured.");
        return;
    }

    for tool in tools {
        println!("{:<20} {}", tool.id, tool.name);
        println!("{:<20} {}", "", tool.description);
    }
}
