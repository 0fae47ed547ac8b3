//! Field normalizers shared by every spider.
//!
//! Each function maps decoded source data to one canonical field value and
//! absorbs missing optional data with a fallback instead of failing. Only the
//! date-time parser can fail, since `start` is mandatory.

use crate::config::{DefaultLocation, LinkSpec};
use crate::meeting::{Classification, Link, Location, Status};
use crate::SpiderError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use lazy_regex::regex;
use tracing::warn;
use url::Url;

/// Source of the current instant, injectable so status can be computed
/// against a frozen clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current wall-clock time in `tz`, the frame every record time uses.
    fn now_in(&self, tz: Tz) -> NaiveDateTime {
        self.now().with_timezone(&tz).naive_local()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Midnight UTC of the given day.
    pub fn on(year: i32, month: u32, day: u32) -> Option<FixedClock> {
        let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
        Some(FixedClock(Utc.from_utc_datetime(&midnight)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

const CANCELLED_WORDS: [&str; 3] = ["cancel", "rescheduled", "postpone"];

const NAIVE_FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// First classification whose name occurs in `meeting_type`, then the
/// "council" rule, then `NotClassified`.
pub fn classify(meeting_type: &str) -> Classification {
    let text = meeting_type.to_lowercase();
    Classification::ALL
        .iter()
        .copied()
        .find(|c| text.contains(&c.as_str().to_lowercase()))
        .unwrap_or(if text.contains("council") {
            Classification::CityCouncil
        } else {
            Classification::NotClassified
        })
}

/// Location from a single `"<name> - <address>"` string.
///
/// The address is the segment between the first and second hyphens; anything
/// after a second hyphen is dropped. Without a hyphen the whole text is the
/// address and the default name is used. Empty input, or a hyphen leaving
/// either side empty, yields the default pair.
pub fn location_from_text(raw: Option<&str>, default: &DefaultLocation) -> Location {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return default.to_location(),
    };

    let mut parts = raw.split('-');
    match (parts.next(), parts.next()) {
        (Some(name), Some(address)) => {
            let (name, address) = (name.trim(), address.trim());
            if name.is_empty() || address.is_empty() {
                default.to_location()
            } else {
                Location {
                    name: name.to_string(),
                    address: address.to_string(),
                }
            }
        }
        _ => Location {
            name: default.name.to_string(),
            address: raw.to_string(),
        },
    }
}

/// Location from a structured pair; the default replaces both halves when
/// either one is missing.
pub fn location_from_parts(
    name: Option<&str>,
    address: Option<&str>,
    default: &DefaultLocation,
) -> Location {
    match (name.map(str::trim), address.map(str::trim)) {
        (Some(name), Some(address)) if !name.is_empty() && !address.is_empty() => Location {
            name: name.to_string(),
            address: address.to_string(),
        },
        _ => default.to_location(),
    }
}

/// Links in `specs` order; `lookup` returns the raw reference for a spec key.
pub fn links<F>(base: &Url, specs: &[LinkSpec], mut lookup: F) -> Vec<Link>
where
    F: FnMut(&str) -> Option<String>,
{
    specs
        .iter()
        .filter_map(|spec| {
            let raw = lookup(spec.key)?;
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            match base.join(raw) {
                Ok(href) => Some(Link {
                    title: spec.title.to_string(),
                    href: href.to_string(),
                }),
                Err(e) => {
                    warn!("Skip {} link {:?}: {}", spec.title, raw, e);
                    None
                }
            }
        })
        .collect()
}

pub fn status(cancelled: bool, start: NaiveDateTime, now: NaiveDateTime) -> Status {
    if cancelled {
        Status::Cancelled
    } else if start < now {
        Status::Passed
    } else {
        Status::Tentative
    }
}

/// Whether any of the texts announces a cancelled or moved meeting.
pub fn mentions_cancellation(texts: &[&str]) -> bool {
    texts.iter().any(|text| {
        let text = text.to_lowercase();
        CANCELLED_WORDS.iter().any(|w| text.contains(w))
    })
}

pub fn slugify(text: &str) -> String {
    regex!(r"[^A-Za-z0-9]+")
        .replace_all(text, "_")
        .trim_matches('_')
        .to_lowercase()
}

/// `<spider>/<YYYYMMDDHHMM>/<disambiguator>/<slug>`, with `x` standing in for
/// a missing disambiguator.
pub fn composite_id(
    spider: &str,
    start: NaiveDateTime,
    disambiguator: Option<&str>,
    title: &str,
) -> String {
    format!(
        "{}/{}/{}/{}",
        spider,
        start.format("%Y%m%d%H%M"),
        disambiguator.unwrap_or("x").replace('/', "-"),
        slugify(title)
    )
}

/// Integer id from a JSON number or a numeric string.
pub fn numeric_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parses a source date-time into wall-clock time in `tz`.
///
/// Values with an offset are converted into `tz`; naive values are taken as
/// already local to `tz`.
pub fn parse_datetime(raw: &str, tz: Tz) -> Result<NaiveDateTime, SpiderError> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&tz).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt.with_timezone(&tz).naive_local());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Ok(dt);
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt);
    }

    Err(SpiderError::InvalidDateTime {
        value: raw.to_string(),
    })
}
