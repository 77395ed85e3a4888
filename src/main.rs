//! ddg-tiers CLI - tiered DuckDuckGo search from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use ddg_tiers::{
    QueryKind, RequestContext, SafeSearch, Search, SearchConfig, SearchResult, TierKind,
};

/// Resilient DuckDuckGo search with tiered fallback
#[derive(Parser)]
#[command(name = "ddg-tiers")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search
    Search(SearchArgs),

    /// Show the tier fallback order
    Tiers,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Query kind: text, images, videos, news
    #[arg(short, long, default_value = "text")]
    kind: QueryKind,

    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Region code (e.g., us-en, uk-en)
    #[arg(short, long)]
    region: Option<String>,

    /// Safe search level: off, moderate, strict
    #[arg(short, long)]
    safesearch: Option<SafeSearch>,

    /// Time limit: d, w, m, y
    #[arg(short, long)]
    time: Option<String>,

    /// Proxy URL (e.g., http://127.0.0.1:8080 or socks5://127.0.0.1:1080)
    #[arg(short, long)]
    proxy: Option<String>,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Also try a real browser before the engine client
    #[arg(long)]
    browser: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Keep proxy variables while the browser is provisioned
    #[arg(long)]
    keep_proxy_for_driver: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Tiers => list_tiers(),
    }
}

fn list_tiers() -> Result<()> {
    println!("Text queries try these tiers in order:\n");
    for (i, tier) in TierKind::ORDER.iter().enumerate() {
        let note = match tier {
            TierKind::Impersonated => "GET with a browser header preset",
            TierKind::Browser => "real Chrome/Chromium (only with --browser)",
            TierKind::EngineApi => "structured engine client, 3 attempts",
            TierKind::PlainScrape => "form POST, anchors only, final",
        };
        println!("  {}. {:<18} {}", i + 1, tier.name(), note);
    }
    println!();
    println!("Images, videos and news use the engine client only.");
    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let config = SearchConfig {
        use_browser: args.browser,
        headless: !args.headed,
        bypass_proxy_for_driver: !args.keep_proxy_for_driver,
        ..Default::default()
    };
    let search = Search::new(config).context("Invalid search configuration")?;

    let mut ctx = RequestContext::new(&args.query).with_max_results(args.limit);
    if let Some(region) = &args.region {
        ctx = ctx.with_region(region);
    }
    if let Some(level) = args.safesearch {
        ctx = ctx.with_safesearch(level);
    }
    if let Some(time) = &args.time {
        ctx = ctx.with_time(time);
    }
    if let Some(proxy) = &args.proxy {
        ctx = ctx.with_proxy(proxy);
        if matches!(args.format, OutputFormat::Text) {
            eprintln!("Using proxy: {}", proxy);
        }
    }
    for (name, value) in &args.headers {
        ctx = ctx.with_header(name, value);
    }

    let results = search.search_kind(args.kind, &ctx).await?;
    print_results(&args, &results)
}

fn print_results(args: &SearchArgs, results: &[SearchResult]) -> Result<()> {
    match args.format {
        OutputFormat::Text => {
            println!(
                "\nSearch results for \"{}\" ({} results):\n",
                args.query,
                results.len()
            );
            for result in results {
                println!("{}. {}", result.id, result.title);
                println!("   URL: {}", result.href);
                if !result.body.is_empty() {
                    let body: String = result.body.chars().take(150).collect();
                    if body.len() < result.body.len() {
                        println!("   {}...", body);
                    } else {
                        println!("   {}", body);
                    }
                }
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
        OutputFormat::Compact => {
            for result in results {
                println!("{}\t{}", result.title, result.href);
            }
        }
    }
    Ok(())
}
