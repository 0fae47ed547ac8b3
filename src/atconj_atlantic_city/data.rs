use serde::Deserialize;
use std::collections::HashMap;

/// One entry of the `GetCalendarMeetings` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalendarMeeting {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default, rename = "allDay")]
    pub all_day: Option<bool>,
}

/// Body of `GetMeeting?id=<id>`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MeetingDetail {
    #[serde(default, rename = "Meeting_Type")]
    pub meeting_type: Option<String>,
    #[serde(default, rename = "Meeting_IsCanceled")]
    pub is_canceled: Option<bool>,
    #[serde(default, rename = "Meeting_DateTime")]
    pub date_time: Option<String>,
    #[serde(default, rename = "Meeting_Location")]
    pub location: Option<String>,
    /// Everything else, document paths included.
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

impl MeetingDetail {
    /// String value of a document field such as `Meeting_AgendaPDF`.
    pub fn document(&self, key: &str) -> Option<String> {
        self.other
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
    }
}
