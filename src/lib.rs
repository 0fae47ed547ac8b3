use reqwest::header::HeaderMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::{
    task::JoinSet,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};
use url::Url;

pub mod atconj_atlantic_city;
pub mod atconj_county_commission;
pub mod config;
pub mod decode;
pub mod meeting;
pub mod normalize;

mod data;
mod error;
mod utils;

pub use data::{JsonLinesSink, MeetingRow, MeetingTable, Table};
pub use error::SpiderError;
pub use meeting::Meeting;
pub use normalize::{Clock, FixedClock, SystemClock};

/// A request to fetch, carrying whatever the spider needs to parse the
/// answer.
#[derive(Debug, Clone)]
pub struct Request<C> {
    pub url: Url,
    pub headers: HeaderMap,
    pub continuation: C,
}

impl<C> Request<C> {
    pub fn new(url: Url, continuation: C) -> Self {
        Request {
            url,
            headers: HeaderMap::new(),
            continuation,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL, after redirects.
    pub url: Url,
    pub body: String,
}

pub enum SpiderOutput<C> {
    Request(Request<C>),
    Meeting(Meeting),
}

/// Outer `Err` rejects the whole page, inner ones drop a single item.
pub type PageResult<C> = Result<Vec<Result<SpiderOutput<C>, SpiderError>>, SpiderError>;

pub trait Spider {
    /// State threaded from a request to the parse of its response.
    type Continuation: Send + 'static;

    fn name(&self) -> &str;
    fn start_requests(
        &self,
        clock: &dyn Clock,
    ) -> Result<Vec<Request<Self::Continuation>>, SpiderError>;
    fn parse(
        &self,
        response: &Response,
        continuation: Self::Continuation,
        clock: &dyn Clock,
    ) -> PageResult<Self::Continuation>;
}

#[async_trait::async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<Response, SpiderError>;
}

#[async_trait::async_trait]
pub trait Sink {
    async fn insert(&self, meeting: &Meeting) -> Result<(), SpiderError>;
}

lazy_static::lazy_static! {
    static ref LAST_REQUEST_MUTEX: tokio::sync::Mutex<Option<Instant>> = tokio::sync::Mutex::new(None);
}

pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(200);

pub struct HttpFetcher {
    client: reqwest::Client,
    delay: Duration,
}

impl HttpFetcher {
    pub fn new(delay: Duration) -> Result<HttpFetcher, SpiderError> {
        Ok(HttpFetcher {
            client: reqwest::Client::builder().build()?,
            delay,
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<Response, SpiderError> {
        let mut last_request_mutex = LAST_REQUEST_MUTEX.lock().await;
        let last_request = last_request_mutex.take();
        let now = Instant::now();
        if let Some(last_request) = last_request {
            let duration = now.duration_since(last_request);
            if duration < self.delay {
                tokio::time::sleep(self.delay - duration).await;
            }
        }

        debug!("Visit {}", url);
        let result = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        last_request_mutex.replace(Instant::now());
        drop(last_request_mutex);

        let response = result?;
        let url = response.url().clone();
        let body = response.text().await?;
        Ok(Response { url, body })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub emitted: u64,
    pub dropped_items: u64,
    pub failed_pages: u64,
}

/// Crawls one spider to completion, handing every meeting to `sink`.
///
/// Failed pages and items are logged and counted, never emitted. A meeting
/// whose id was already emitted in this crawl is dropped. Only a sink error
/// stops the crawl.
pub async fn run_spider<S, F, K>(
    spider: S,
    fetcher: F,
    sink: &K,
    clock: Arc<dyn Clock>,
) -> Result<CrawlSummary, SpiderError>
where
    S: Spider + Send + Sync + 'static,
    F: Fetcher + Send + Sync + 'static,
    K: Sink + Sync + ?Sized,
{
    let spider = Arc::new(spider);
    let fetcher = Arc::new(fetcher);

    let requests = spider.start_requests(clock.as_ref())?;
    info!("[{}] Initial requests: {}", spider.name(), requests.len());

    let mut tasks = JoinSet::new();
    for request in requests {
        tasks.spawn(handle(
            request,
            Arc::clone(&spider),
            Arc::clone(&fetcher),
            Arc::clone(&clock),
        ));
    }

    let mut summary = CrawlSummary::default();
    let mut seen = HashSet::new();

    while let Some(joined) = tasks.join_next().await {
        let (url, page) = match joined {
            Ok(res) => res,
            Err(e) => {
                warn!("[{}] Task aborted: {}", spider.name(), e);
                summary.failed_pages += 1;
                continue;
            }
        };

        let outputs = match page {
            Ok(outputs) => outputs,
            Err(e) => {
                warn!("[{}] Drop page {}: {}", spider.name(), url, e);
                summary.failed_pages += 1;
                continue;
            }
        };

        for output in outputs {
            match output {
                Ok(SpiderOutput::Request(request)) => {
                    tasks.spawn(handle(
                        request,
                        Arc::clone(&spider),
                        Arc::clone(&fetcher),
                        Arc::clone(&clock),
                    ));
                }
                Ok(SpiderOutput::Meeting(meeting)) => {
                    if !seen.insert(meeting.id.clone()) {
                        warn!(
                            "[{}] Duplicate id {} from {}",
                            spider.name(),
                            meeting.id,
                            url
                        );
                        summary.dropped_items += 1;
                        continue;
                    }
                    debug!("\n{}", meeting);
                    sink.insert(&meeting).await?;
                    summary.emitted += 1;
                    info!("[{}] Insert Result {}", summary.emitted, meeting.id);
                }
                Err(e) => {
                    warn!("[{}] Drop item from {}: {}", spider.name(), url, e);
                    summary.dropped_items += 1;
                }
            }
        }
    }

    info!(
        "[{}] Done: {} emitted, {} items dropped, {} pages failed",
        spider.name(),
        summary.emitted,
        summary.dropped_items,
        summary.failed_pages
    );
    Ok(summary)
}

async fn handle<S, F>(
    request: Request<S::Continuation>,
    spider: Arc<S>,
    fetcher: Arc<F>,
    clock: Arc<dyn Clock>,
) -> (Url, PageResult<S::Continuation>)
where
    S: Spider + Send + Sync,
    F: Fetcher + Send + Sync,
{
    let response = match fetcher.fetch(&request.url, &request.headers).await {
        Ok(response) => response,
        Err(e) => return (request.url, Err(e)),
    };
    let page = spider.parse(&response, request.continuation, clock.as_ref());
    (response.url, page)
}
