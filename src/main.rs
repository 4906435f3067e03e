use std::path::PathBuf;
use std::sync::Arc;

use dealdex::catalog::Catalog;
use dealdex::cli::{Cli, Commands};
use dealdex::config::Config;
use dealdex::embedding::{cache, EmbeddingProvider, FastEmbedProvider};
use dealdex::error::{DealdexError, Result};
use dealdex::index::SearchIndex;
use dealdex::search::{DealResult, SearchEngine, SearchOptions};

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Build { force } => cmd_build(&config, force),
        Commands::Search {
            query,
            limit,
            json,
            stream,
            terms,
        } => cmd_search(&config, &query, limit, json, stream, &terms),
        Commands::Info => cmd_info(&config),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dealdex=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(&path),
        None => {
            let default_path = PathBuf::from("dealdex.toml");
            if default_path.exists() {
                Config::load(&default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn cmd_build(config: &Config, force: bool) -> Result<()> {
    let cache_path = config.embeddings_cache_path();
    if force && cache_path.exists() {
        std::fs::remove_file(&cache_path).map_err(|source| DealdexError::Io {
            source,
            context: format!("failed to remove {}", cache_path.display()),
        })?;
        tracing::info!("removed existing embedding cache");
    }

    let catalog = Catalog::load(&config.data.deals_path, &config.data.products_path)?;
    let provider = FastEmbedProvider::new(&config.embedding.model)?;
    let index = SearchIndex::build(
        catalog,
        Some(&provider),
        Some(&cache_path),
        config.embedding.batch_size,
    )?;

    println!("✓ Index built");
    println!("  Offers:  {}", index.offers().len());
    println!("  Records: {}", index.record_count());
    println!(
        "  Embeddings: {} x {}",
        index.embeddings().rows(),
        index.embeddings().dim()
    );
    println!("  Cache: {}", cache_path.display());
    Ok(())
}

fn cmd_search(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    json: bool,
    stream: bool,
    terms: &[String],
) -> Result<()> {
    let catalog = Catalog::load(&config.data.deals_path, &config.data.products_path)?;
    let cache_path = config.embeddings_cache_path();

    // A dead embedding backend degrades to keyword + fuzzy search as
    // long as a cached matrix exists; index build fails otherwise.
    let provider: Option<Arc<dyn EmbeddingProvider>> =
        match FastEmbedProvider::new(&config.embedding.model) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                tracing::warn!("embedding backend unavailable: {e}");
                None
            }
        };

    let index = SearchIndex::build(
        catalog,
        provider.as_deref(),
        Some(&cache_path),
        config.embedding.batch_size,
    )?;

    let options = SearchOptions {
        top_k: config.search.top_k,
        stream_batch_size: config.search.stream_batch_size,
        fuzzy_threshold: config.search.fuzzy_threshold,
    };
    let engine = SearchEngine::with_options(Arc::new(index), provider, options);
    let top_k = limit.unwrap_or(config.search.top_k);

    let runtime = tokio::runtime::Runtime::new().map_err(|source| DealdexError::Io {
        source,
        context: "failed to create tokio runtime".to_string(),
    })?;

    runtime.block_on(async {
        if stream {
            let mut rank = 1;
            for batch in engine.search_stream(query, top_k).await {
                if json {
                    println!(
                        "{}",
                        serde_json::to_string(&batch).unwrap_or_else(|_| "[]".to_string())
                    );
                } else {
                    for deal in &batch {
                        print_deal(deal, rank);
                        rank += 1;
                    }
                }
            }
            if rank == 1 && !json {
                println!("No deals found.");
            }
        } else {
            let results = if terms.is_empty() {
                engine.search(query, top_k).await
            } else {
                engine.search_expanded(terms, top_k).await
            };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&results).unwrap_or_else(|_| "[]".to_string())
                );
            } else if results.is_empty() {
                println!("No deals found.");
            } else {
                println!("{} deals found", results.len());
                for (i, deal) in results.iter().enumerate() {
                    print_deal(deal, i + 1);
                }
            }
        }
    });

    Ok(())
}

fn cmd_info(config: &Config) -> Result<()> {
    let catalog = Catalog::load(&config.data.deals_path, &config.data.products_path)?;

    let record_count: usize = catalog
        .offers
        .iter()
        .map(|offer| catalog.products_for(&offer.offer_id).len().max(1))
        .sum();

    let mut categories: Vec<&str> = catalog
        .offers
        .iter()
        .map(|offer| offer.category.as_str())
        .filter(|c| !c.is_empty())
        .collect();
    categories.sort_unstable();
    categories.dedup();

    println!("Dealdex Catalog");
    println!("===============");
    println!("Offers:     {}", catalog.offer_count());
    println!("Products:   {}", catalog.product_count());
    println!("Records:    {}", record_count);
    println!("Categories: {}", categories.len());

    let cache_path = config.embeddings_cache_path();
    match cache::load(&cache_path) {
        Ok(cached) => println!(
            "Cache:      {} ({} x {})",
            cache_path.display(),
            cached.matrix.rows(),
            cached.matrix.dim()
        ),
        Err(_) => println!("Cache:      not built (run 'dealdex build')"),
    }

    Ok(())
}

fn print_deal(deal: &DealResult, rank: usize) {
    let sources = deal.score_components.sources().join(", ");
    println!(
        "  {rank}. {}  [{:.3} via {sources}]",
        deal.offer.name, deal.score
    );

    let mut meta = vec![deal.offer.offer_price.clone(), deal.offer.category.clone()];
    meta.retain(|part| !part.is_empty());
    meta.push(format!("Offer ID: {}", deal.offer.offer_id));
    if let Some(days) = deal.offer.end_date.and_then(days_until_expiry) {
        meta.push(format!("ends in {days}d"));
    }
    println!("     {}", meta.join(" | "));

    if !deal.offer.description.is_empty() {
        println!("     {}", deal.offer.description);
    }

    if !deal.matching_products.is_empty() {
        println!("     Matching products ({}):", deal.matching_products.len());
        for m in &deal.matching_products {
            let mut parts = Vec::new();
            if let Some(price) = m.product.member_price {
                parts.push(format!("${price:.2}"));
            }
            if !m.product.aisle.is_empty() {
                parts.push(m.product.aisle.clone());
            }
            if parts.is_empty() {
                println!("       - {}", m.product.name);
            } else {
                println!("       - {} ({})", m.product.name, parts.join(" | "));
            }
        }
    }
}

/// Days until an epoch-ms deadline, or `None` once it has passed.
fn days_until_expiry(end_ms: i64) -> Option<i64> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let days = (end_ms - now_ms) / (1000 * 60 * 60 * 24);
    (days >= 0).then_some(days)
}
