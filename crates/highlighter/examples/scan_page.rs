//! Scan a page tree and print the results
//!
//! Usage: `cargo run --example scan_page [page.json] [config.json]`
//! Without arguments a small built-in page is scanned.

use std::sync::Arc;

use highlighter::{ControlMessage, Engine, EngineConfig, LiveDocument, PatternRegistry};

const SAMPLE_PAGE: &str = r##"{
  "root": {
    "nodeType": 1, "nodeName": "BODY", "bounds": [0, 0, 1280, 900],
    "children": [
      { "nodeType": 1, "nodeName": "DIV", "bounds": [0, 0, 400, 30],
        "children": [{ "nodeType": 3, "nodeName": "#text", "nodeValue": "Only 2 left in stock" }] },
      { "nodeType": 1, "nodeName": "DIV", "bounds": [0, 40, 400, 30],
        "children": [{ "nodeType": 3, "nodeName": "#text", "nodeValue": "Sponsored" }] },
      { "nodeType": 1, "nodeName": "P", "computedStyles": { "display": "none" },
        "children": [{ "nodeType": 3, "nodeName": "#text", "nodeValue": "Free for 30 days, then $9.99 per month" }] },
      { "nodeType": 1, "nodeName": "SCRIPT",
        "children": [{ "nodeType": 3, "nodeName": "#text", "nodeValue": "var deal = 'Deal of the day';" }] }
    ]
  }
}"##;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let page = match args.next() {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_PAGE.to_string(),
    };
    let config = match args.next() {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let registry = match PatternRegistry::builtin() {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Pattern configuration rejected, highlighter disabled: {}", e);
            return Ok(());
        }
    };

    let document = LiveDocument::from_json(&page)?;
    let engine = Arc::new(Engine::new(registry, config, document));

    engine.start().await;
    let results = engine
        .handle_json(&serde_json::to_string(&ControlMessage::GetPatternCount)?)
        .await?;
    println!("{}", results);

    engine.stop().await;
    Ok(())
}
