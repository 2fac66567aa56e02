use std::sync::Arc;

use marketpulse::cache::InMemoryCache;
use marketpulse::core::{AnalysisItem, AnalysisSummary, MarketPulseError};
use marketpulse::{AnalysisClient, ScriptedSource, ScriptedSummarizer};

#[tokio::main]
async fn main() -> Result<(), MarketPulseError> {
    tracing_subscriber::fmt().init();

    // --- Setup: scripted upstreams + TTL cache ---
    // The source has one batch; after that it errors. With caching,
    // repeated queries are served without touching the upstream.
    let source = ScriptedSource::new();
    source.push_items(vec![
        AnalysisItem {
            id: "p1".to_string(),
            title: "New release announcement".to_string(),
            author: "devrel".to_string(),
            engagement: 140,
            ..Default::default()
        },
        AnalysisItem {
            id: "p2".to_string(),
            title: "Community benchmark thread".to_string(),
            author: "perf_enthusiast".to_string(),
            engagement: 85,
            ..Default::default()
        },
    ]);

    let summarizer = ScriptedSummarizer::new();
    summarizer.push_summary(AnalysisSummary {
        overview: "Strong launch-week engagement driven by the release post.".to_string(),
        trends: vec!["release announcements".to_string()],
        competitors: vec![],
        opportunities: vec!["amplify community benchmarks".to_string()],
    });

    let client = AnalysisClient::new(
        Arc::new(source),
        Arc::new(summarizer),
        Arc::new(InMemoryCache::new()),
    );

    // --- First call: cache miss, full pipeline ---
    println!("=== Cache Miss (first call) ===");
    let first = client.fetch_analysis("Rust Web Frameworks").await?;
    println!("Overview: {}", first.summary.overview);
    println!("Items: {}", first.items.len());

    // --- Second call, differently-cased query: cache hit ---
    println!("\n=== Cache Hit (normalized query) ===");
    let second = client.fetch_analysis("  rust web frameworks  ").await?;
    println!("Overview: {}", second.summary.overview);
    println!("Same object: {}", Arc::ptr_eq(&first, &second));

    // --- Clear cache: next fetch hits the exhausted source and degrades ---
    println!("\n=== Clear Cache, Degraded Fetch ===");
    client.clear_cache().await?;
    let third = client.fetch_analysis("rust web frameworks").await?;
    println!("Overview: {}", third.summary.overview);
    println!("Items: {}", third.items.len());

    println!("\nDashboard fetch demo completed.");
    Ok(())
}
