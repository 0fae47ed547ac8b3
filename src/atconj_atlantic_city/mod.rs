//! Atlantic City meetings.
//!
//! The calendar page renders through JavaScript, so the spider reads the API
//! behind it instead: `GetCalendarMeetings` lists the meetings of a date
//! window and `GetMeeting` returns the details of one of them. Records point
//! at the public calendar page rather than at the API.

mod data;
mod spider;

pub use data::{CalendarMeeting, MeetingDetail};
pub use spider::{AtlanticCitySpider, Step};

use crate::config::{DefaultLocation, LinkSpec, SiteConfig};

pub const CONFIG: SiteConfig = SiteConfig {
    name: "atconj_Atlantic_City",
    agency: "Atlantic City",
    timezone: chrono_tz::America::New_York,
    base_url: "https://www.acnj.gov/",
    start_url: "https://www.acnj.gov/api/data/GetCalendarMeetings",
    source_url: Some("https://www.acnj.gov/calendar"),
    default_location: DefaultLocation {
        name: "City Hall of Atlantic City",
        address: "1301 Bacharach Boulevard Atlantic City, NJ, 08401",
    },
    links: &[
        LinkSpec {
            key: "Meeting_AgendaPDF",
            title: "Agenda",
        },
        LinkSpec {
            key: "Meeting_MinutesPDF",
            title: "Minutes",
        },
        LinkSpec {
            key: "Meeting_NoticePDF",
            title: "Notice",
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::{Classification, Link, Location, Meeting, MeetingId, Status};
    use crate::{FixedClock, PageResult, Response, Spider, SpiderError, SpiderOutput};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::fs;
    use url::Url;

    const LIST_URL: &str = "https://www.acnj.gov/api/data/GetCalendarMeetings?end=06%2F30%2F2025+12:00+am&meetingTypeID=all&start=06%2F01%2F2024+12:00+am";

    fn response(url: &str, body: String) -> Response {
        Response {
            url: Url::parse(url).expect("Invalid url"),
            body,
        }
    }

    fn fixture(name: &str) -> String {
        fs::read_to_string(format!("tests/files/{}", name)).expect("Invalid file path")
    }

    fn clock() -> FixedClock {
        FixedClock::on(2024, 12, 6).expect("valid date")
    }

    fn detail_with(patch: serde_json::Value) -> String {
        let mut detail: serde_json::Value =
            serde_json::from_str(&fixture("atconj_Atlantic_City_meeting_detail.json"))
                .expect("valid fixture");
        if let (Some(detail), Some(patch)) = (detail.as_object_mut(), patch.as_object()) {
            for (k, v) in patch {
                detail.insert(k.clone(), v.clone());
            }
        }
        detail.to_string()
    }

    /// Parses the calendar fixture, then answers every detail request with
    /// `detail`.
    fn crawl(spider: &AtlanticCitySpider, detail: &str) -> Vec<Result<Meeting, SpiderError>> {
        let list = response(LIST_URL, fixture("atconj_Atlantic_City.json"));
        let outputs = spider
            .parse(&list, Step::Calendar, &clock())
            .expect("valid list");

        let mut meetings = vec![];
        for output in outputs {
            let Ok(SpiderOutput::Request(request)) = output else {
                panic!("expected a detail request");
            };
            let page: PageResult<Step> = spider.parse(
                &response(request.url.as_str(), detail.to_string()),
                request.continuation,
                &clock(),
            );
            for item in page.expect("single item page") {
                meetings.push(item.map(|o| match o {
                    SpiderOutput::Meeting(m) => m,
                    SpiderOutput::Request(_) => panic!("unexpected request"),
                }));
            }
        }
        meetings
    }

    #[test]
    fn test_calendar_url() {
        let spider = AtlanticCitySpider::default();
        let requests = spider.start_requests(&clock()).expect("valid window");

        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url.as_str(),
            "https://www.acnj.gov/api/data/GetCalendarMeetings?end=03%2F05%2F2025+12:00+am&meetingTypeID=all&start=04%2F05%2F2024+12:00+am"
        );
    }

    #[test]
    fn test_detail_requests() {
        let spider = AtlanticCitySpider::default();
        let list = response(LIST_URL, fixture("atconj_Atlantic_City.json"));
        let outputs = spider
            .parse(&list, Step::Calendar, &clock())
            .expect("valid list");

        let urls = outputs
            .iter()
            .map(|o| match o {
                Ok(SpiderOutput::Request(r)) => r.url.to_string(),
                _ => panic!("expected a detail request"),
            })
            .collect::<Vec<_>>();
        assert_eq!(urls.len(), 6);
        assert_eq!(urls[0], "https://www.acnj.gov/api/data/GetMeeting?id=429");
        assert_eq!(urls[5], "https://www.acnj.gov/api/data/GetMeeting?id=472");
    }

    #[test]
    fn test_parsing_meetings() {
        let spider = AtlanticCitySpider::default();
        let meetings = crawl(&spider, &fixture("atconj_Atlantic_City_meeting_detail.json"))
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .expect("every item parses");

        assert_eq!(meetings.len(), 6);

        let expected = Meeting {
            id: MeetingId::Numeric(429),
            title: "CITISTAT Meeting".to_string(),
            description: "".to_string(),
            classification: Classification::NotClassified,
            status: Status::Passed,
            start: NaiveDate::from_ymd_opt(2024, 6, 26)
                .and_then(|d| d.and_hms_opt(17, 0, 0))
                .expect("valid date"),
            end: None,
            all_day: false,
            time_notes: "".to_string(),
            location: Location {
                name: "John F. Scarpa Academic Center".to_string(),
                address: "3711 Atlantic Ave., Atlantic City, NJ 08401".to_string(),
            },
            links: vec![
                Link {
                    title: "Agenda".to_string(),
                    href: "https://www.acnj.gov/_Content/pdf/agendas/2024-06-26-CITISTAT-Presentations.pdf".to_string(),
                },
                Link {
                    title: "Minutes".to_string(),
                    href: "https://www.acnj.gov/_Content/pdf/minutes/2024-06-26-CITISTAT-Responses.pdf".to_string(),
                },
            ],
            source: "https://www.acnj.gov/calendar".to_string(),
        };
        assert_eq!(meetings[0], expected);

        // start and all_day come from the list, status from the clock
        assert_eq!(meetings[4].title, "City Council Meeting");
        assert_eq!(meetings[4].status, Status::Tentative);
        assert!(meetings[5].all_day);
        assert_eq!(
            meetings[5].start,
            NaiveDate::from_ymd_opt(2025, 2, 3)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid date")
        );
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let spider = AtlanticCitySpider::default();
        let detail = fixture("atconj_Atlantic_City_meeting_detail.json");
        let first = crawl(&spider, &detail);
        let second = crawl(&spider, &detail);

        let first = first
            .into_iter()
            .map(|m| serde_json::to_string(&m.expect("valid")).expect("serializable"))
            .collect::<Vec<_>>();
        let second = second
            .into_iter()
            .map(|m| serde_json::to_string(&m.expect("valid")).expect("serializable"))
            .collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cancelled_meeting() {
        let spider = AtlanticCitySpider::default();
        let detail = detail_with(serde_json::json!({ "Meeting_IsCanceled": true }));
        for meeting in crawl(&spider, &detail) {
            assert_eq!(meeting.expect("valid").status, Status::Cancelled);
        }
    }

    #[test]
    fn test_missing_location_and_type() {
        let spider = AtlanticCitySpider::default();
        let detail = detail_with(serde_json::json!({
            "Meeting_Location": "",
            "Meeting_Type": "Regular Council Session",
            "Meeting_AgendaPDF": null,
            "Meeting_NoticePDF": "/_Content/pdf/notices/n.pdf",
        }));
        let meeting = crawl(&spider, &detail)
            .remove(0)
            .expect("valid meeting");

        assert_eq!(
            meeting.location,
            Location {
                name: "City Hall of Atlantic City".to_string(),
                address: "1301 Bacharach Boulevard Atlantic City, NJ, 08401".to_string(),
            }
        );
        assert_eq!(meeting.classification, Classification::CityCouncil);
        assert_eq!(
            meeting.links.iter().map(|l| l.title.as_str()).collect::<Vec<_>>(),
            vec!["Minutes", "Notice"]
        );
    }

    #[test]
    fn test_bad_items_are_isolated() {
        let spider = AtlanticCitySpider::default();
        let list = response(
            LIST_URL,
            r#"[
                {"id": "1", "title": "A", "start": "2024-06-26T17:00:00", "allDay": false},
                {"title": "No id", "start": "2024-06-26T17:00:00"},
                {"id": "3", "title": "C", "start": "2024-06-26T17:00:00", "allDay": false}
            ]"#
            .to_string(),
        );
        let outputs = spider
            .parse(&list, Step::Calendar, &clock())
            .expect("valid list");
        assert_eq!(outputs.len(), 3);
        assert!(matches!(outputs[1], Err(SpiderError::MissingField("id"))));

        let bad_detail = response("https://www.acnj.gov/api/data/GetMeeting?id=1", "<html>".to_string());
        let Ok(SpiderOutput::Request(request)) = outputs.into_iter().next().expect("first") else {
            panic!("expected a detail request");
        };
        let page = spider
            .parse(&bad_detail, request.continuation, &clock())
            .expect("item-level failure only");
        assert!(matches!(page[0], Err(SpiderError::JsonError(_))));

        let not_a_list = response(LIST_URL, r#"{"error": "busy"}"#.to_string());
        assert!(spider.parse(&not_a_list, Step::Calendar, &clock()).is_err());
    }

    #[test]
    fn test_missing_start_is_fatal_for_item() {
        let spider = AtlanticCitySpider::default();
        let item = CalendarMeeting {
            id: serde_json::json!("9"),
            title: Some("No start".to_string()),
            start: None,
            all_day: None,
        };
        let detail = response(
            "https://www.acnj.gov/api/data/GetMeeting?id=9",
            r#"{"Meeting_Type": "Board"}"#.to_string(),
        );
        let page = spider
            .parse(&detail, Step::Detail { id: 9, item }, &clock())
            .expect("item-level failure only");
        assert!(matches!(page[0], Err(SpiderError::MissingField("start"))));
    }
}
