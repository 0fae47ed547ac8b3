use super::data::EventScript;
use super::CONFIG;
use crate::config::SiteConfig;
use crate::decode::{self, RowScript};
use crate::meeting::{Classification, IdSource, Meeting, MeetingDraft};
use crate::{normalize, Clock, PageResult, Request, Response, Spider, SpiderError, SpiderOutput};
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

const E: &str = "Invalid selector";
lazy_static! {
    static ref ROWS: Selector = Selector::parse("table.front_end_widget tbody tr").expect(E);
    static ref SCRIPTS: Selector =
        Selector::parse("table.front_end_widget tbody script").expect(E);
    static ref TIME_NOTES: Selector = Selector::parse("div#widget_45_2122_758 p").expect(E);
    static ref AGENDA: Selector = Selector::parse("td.event_agenda a").expect(E);
    static ref MINUTES: Selector = Selector::parse("td.event_minutes a").expect(E);
}

/// Cell holding the document link for a `LinkSpec` key.
pub(super) fn link_selector(key: &str) -> Option<&'static Selector> {
    match key {
        "agenda" => Some(&*AGENDA),
        "minutes" => Some(&*MINUTES),
        _ => {
            warn!("Unknown link key {}", key);
            None
        }
    }
}

/// The site answers 403 unless the request looks like a browser navigation.
const BROWSER_HEADERS: [(&str, &str); 5] = [
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
];
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36";

/// Reads the commissioners' meeting schedule table.
#[derive(Debug)]
pub struct CountyCommissionSpider {
    config: SiteConfig,
}

impl Default for CountyCommissionSpider {
    fn default() -> Self {
        CountyCommissionSpider::new(CONFIG)
    }
}

impl CountyCommissionSpider {
    pub fn new(config: SiteConfig) -> Self {
        CountyCommissionSpider { config }
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in BROWSER_HEADERS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers
    }

    fn parse_meeting(
        &self,
        pair: RowScript<'_>,
        time_notes: &str,
        page_url: &Url,
        now: NaiveDateTime,
    ) -> Result<Meeting, SpiderError> {
        let event: EventScript = serde_json::from_str(pair.script.trim())?;
        let tz = self.config.timezone;

        let start = event
            .start_date
            .as_deref()
            .ok_or(SpiderError::MissingField("startDate"))?;
        let start = normalize::parse_datetime(start, tz)?;
        let end = event
            .end_date
            .as_deref()
            .and_then(|end| normalize::parse_datetime(end, tz).ok())
            .filter(|end| *end > start);

        let location = event.location.unwrap_or_default();
        let location = normalize::location_from_parts(
            location.name(),
            location.address(),
            &self.config.default_location,
        );

        let base = Url::parse(self.config.base_url)?;
        let links = normalize::links(&base, self.config.links, |key| {
            pair.row
                .select(link_selector(key)?)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(ToString::to_string)
        });

        let row_text = decode::visible_text(pair.row);
        let cancelled = normalize::mentions_cancellation(&[
            self.config.agency,
            event.name.as_deref().unwrap_or_default(),
            event.description.as_deref().unwrap_or_default(),
            row_text.as_str(),
        ]);

        let draft = MeetingDraft {
            title: self.config.agency.to_string(),
            description: String::new(),
            classification: Classification::Board,
            start,
            end,
            all_day: false,
            time_notes: time_notes.to_string(),
            location,
            links,
            source: self
                .config
                .source_url
                .map(ToString::to_string)
                .unwrap_or_else(|| page_url.to_string()),
        };

        draft.finish(
            cancelled,
            now,
            IdSource::Composite {
                spider: self.config.name,
                disambiguator: None,
            },
        )
    }
}

impl Spider for CountyCommissionSpider {
    type Continuation = ();

    fn name(&self) -> &str {
        self.config.name
    }

    fn start_requests(&self, _: &dyn Clock) -> Result<Vec<Request<()>>, SpiderError> {
        let url = Url::parse(self.config.start_url)?;
        Ok(vec![Request::new(url, ()).with_headers(Self::headers())])
    }

    fn parse(&self, response: &Response, _: (), clock: &dyn Clock) -> PageResult<()> {
        let doc = Html::parse_document(&response.body);
        let pairs = decode::row_scripts(&doc, &ROWS, &SCRIPTS)?;
        let time_notes = decode::first_text(&doc, &TIME_NOTES).unwrap_or_default();
        let now = clock.now_in(self.config.timezone);

        Ok(pairs
            .into_iter()
            .map(|pair| {
                self.parse_meeting(pair, &time_notes, &response.url, now)
                    .map(SpiderOutput::Meeting)
            })
            .collect())
    }
}
