use atconj_meetings::atconj_atlantic_city::AtlanticCitySpider;
use atconj_meetings::atconj_county_commission::CountyCommissionSpider;
use atconj_meetings::{
    run_spider, Clock, CrawlSummary, HttpFetcher, JsonLinesSink, MeetingTable, Sink, Spider,
    SpiderError, SystemClock, Table, DEFAULT_REQUEST_DELAY,
};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    AtlanticCity,
    CountyCommission,
    All,
}

#[derive(Debug, Parser)]
#[command(
    name = "atconj-meetings",
    about = "Collect Atlantic City and Atlantic County public meetings"
)]
struct Args {
    /// Which site to crawl
    #[arg(value_enum, default_value_t = Target::All)]
    spider: Target,

    /// Write JSON Lines to this file instead of stdout
    #[arg(long, conflicts_with = "db")]
    output: Option<PathBuf>,

    /// Store meetings in this SQLite file, one table per spider
    #[arg(long)]
    db: Option<String>,

    /// Minimum delay between two requests
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY.as_millis() as u64)]
    delay_ms: u64,
}

async fn crawl<S, K>(
    spider: S,
    args: &Args,
    json: &K,
    clock: Arc<dyn Clock>,
) -> Result<CrawlSummary, SpiderError>
where
    S: Spider + Send + Sync + 'static,
    K: Sink + Sync,
{
    let fetcher = HttpFetcher::new(Duration::from_millis(args.delay_ms))?;
    match args.db.as_deref() {
        Some(path) => {
            let table = MeetingTable::connect(path, spider.name()).await?;
            let summary = run_spider(spider, fetcher, &table, clock).await?;
            info!("[{}] {} meetings stored", table.get_name(), table.count().await?);
            Ok(summary)
        }
        None => run_spider(spider, fetcher, json, clock).await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "debug,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let args = Args::parse();

    let writer: Box<dyn Write + Send> = match args.output.as_ref() {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    let json = JsonLinesSink::new(writer);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut total = CrawlSummary::default();
    let mut add = |s: CrawlSummary| {
        total.emitted += s.emitted;
        total.dropped_items += s.dropped_items;
        total.failed_pages += s.failed_pages;
    };

    if matches!(args.spider, Target::AtlanticCity | Target::All) {
        add(crawl(AtlanticCitySpider::default(), &args, &json, Arc::clone(&clock)).await?);
    }
    if matches!(args.spider, Target::CountyCommission | Target::All) {
        add(crawl(CountyCommissionSpider::default(), &args, &json, Arc::clone(&clock)).await?);
    }

    info!(
        "Total: {} emitted, {} items dropped, {} pages failed",
        total.emitted, total.dropped_items, total.failed_pages
    );
    Ok(())
}
