use super::data::{CalendarMeeting, MeetingDetail};
use super::CONFIG;
use crate::config::SiteConfig;
use crate::meeting::{IdSource, Meeting, MeetingDraft};
use crate::{decode, normalize, Clock, PageResult, Request, Response, Spider, SpiderError, SpiderOutput};
use chrono::Months;
use url::Url;

const DETAIL_URL: &str = "https://www.acnj.gov/api/data/GetMeeting";

/// Months of history and of upcoming meetings asked from the calendar API.
const MONTHS_BEFORE: u32 = 8;
const MONTHS_AFTER: u32 = 3;

#[derive(Debug, Clone)]
pub enum Step {
    Calendar,
    Detail { id: i64, item: CalendarMeeting },
}

/// Reads the calendar API, then fetches every listed meeting's detail.
#[derive(Debug)]
pub struct AtlanticCitySpider {
    config: SiteConfig,
}

impl Default for AtlanticCitySpider {
    fn default() -> Self {
        AtlanticCitySpider::new(CONFIG)
    }
}

impl AtlanticCitySpider {
    pub fn new(config: SiteConfig) -> Self {
        AtlanticCitySpider { config }
    }

    /// Calendar URL covering the window around today.
    pub fn calendar_url(&self, clock: &dyn Clock) -> Result<Url, SpiderError> {
        let today = clock.now_in(self.config.timezone).date();
        let window = today
            .checked_sub_months(Months::new(MONTHS_BEFORE))
            .zip(today.checked_add_months(Months::new(MONTHS_AFTER)));
        let (start, end) = window.ok_or_else(|| SpiderError::InvalidDateTime {
            value: today.to_string(),
        })?;

        const FMT: &str = "%m%%2F%d%%2F%Y+12:00+am";
        Ok(Url::parse(&format!(
            "{}?end={}&meetingTypeID=all&start={}",
            self.config.start_url,
            end.format(FMT),
            start.format(FMT)
        ))?)
    }

    fn parse_calendar(&self, response: &Response) -> PageResult<Step> {
        Ok(decode::json_items(&response.body)?
            .into_iter()
            .map(|value| -> Result<SpiderOutput<Step>, SpiderError> {
                let item: CalendarMeeting = serde_json::from_value(value)?;
                let id = normalize::numeric_id(&item.id).ok_or(SpiderError::MissingField("id"))?;
                let url = Url::parse(&format!("{}?id={}", DETAIL_URL, id))?;
                Ok(SpiderOutput::Request(Request::new(
                    url,
                    Step::Detail { id, item },
                )))
            })
            .collect())
    }

    fn parse_meeting(
        &self,
        response: &Response,
        id: i64,
        item: &CalendarMeeting,
        clock: &dyn Clock,
    ) -> Result<Meeting, SpiderError> {
        let detail: MeetingDetail = serde_json::from_str(&response.body)?;
        let tz = self.config.timezone;

        let title = item
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SpiderError::MissingField("title"))?;
        let start = item
            .start
            .as_deref()
            .or(detail.date_time.as_deref())
            .ok_or(SpiderError::MissingField("start"))?;
        let start = normalize::parse_datetime(start, tz)?;

        let base = Url::parse(self.config.base_url)?;
        let source = self
            .config
            .source_url
            .map(ToString::to_string)
            .unwrap_or_else(|| response.url.to_string());

        let draft = MeetingDraft {
            title: title.to_string(),
            description: String::new(),
            classification: normalize::classify(detail.meeting_type.as_deref().unwrap_or_default()),
            start,
            end: None,
            all_day: item.all_day.unwrap_or(false),
            time_notes: String::new(),
            location: normalize::location_from_text(
                detail.location.as_deref(),
                &self.config.default_location,
            ),
            links: normalize::links(&base, self.config.links, |key| detail.document(key)),
            source,
        };

        draft.finish(
            detail.is_canceled.unwrap_or(false),
            clock.now_in(tz),
            IdSource::Passthrough(id),
        )
    }
}

impl Spider for AtlanticCitySpider {
    type Continuation = Step;

    fn name(&self) -> &str {
        self.config.name
    }

    fn start_requests(&self, clock: &dyn Clock) -> Result<Vec<Request<Step>>, SpiderError> {
        Ok(vec![Request::new(self.calendar_url(clock)?, Step::Calendar)])
    }

    fn parse(&self, response: &Response, step: Step, clock: &dyn Clock) -> PageResult<Step> {
        match step {
            Step::Calendar => self.parse_calendar(response),
            Step::Detail { id, item } => Ok(vec![self
                .parse_meeting(response, id, &item, clock)
                .map(SpiderOutput::Meeting)]),
        }
    }
}
