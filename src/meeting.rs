use crate::normalize;
use crate::SpiderError;
use chrono::NaiveDateTime;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Advisory Committee")]
    AdvisoryCommittee,
    #[serde(rename = "Board")]
    Board,
    #[serde(rename = "City Council")]
    CityCouncil,
    #[serde(rename = "Commission")]
    Commission,
    #[serde(rename = "Committee")]
    Committee,
    #[serde(rename = "Forum")]
    Forum,
    #[serde(rename = "Police Beat")]
    PoliceBeat,
    #[serde(rename = "Not classified")]
    NotClassified,
}

impl Classification {
    /// Matching priority used by the classification normalizer.
    pub const ALL: [Classification; 8] = [
        Classification::AdvisoryCommittee,
        Classification::Board,
        Classification::CityCouncil,
        Classification::Commission,
        Classification::Committee,
        Classification::Forum,
        Classification::PoliceBeat,
        Classification::NotClassified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::AdvisoryCommittee => "Advisory Committee",
            Classification::Board => "Board",
            Classification::CityCouncil => "City Council",
            Classification::Commission => "Commission",
            Classification::Committee => "Committee",
            Classification::Forum => "Forum",
            Classification::PoliceBeat => "Police Beat",
            Classification::NotClassified => "Not classified",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Cancelled,
    Tentative,
    Confirmed,
    Passed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Cancelled => "cancelled",
            Status::Tentative => "tentative",
            Status::Confirmed => "confirmed",
            Status::Passed => "passed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeetingId {
    Numeric(i64),
    Composite(String),
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingId::Numeric(id) => write!(f, "{}", id),
            MeetingId::Composite(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
    pub description: String,
    pub classification: Classification,
    pub status: Status,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
    pub time_notes: String,
    pub location: Location,
    pub links: Vec<Link>,
    pub source: String,
}

impl fmt::Display for Meeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Id              : {}", self.id)?;
        writeln!(f, "Title           : {}", self.title)?;
        writeln!(f, "Classification  : {}", self.classification)?;
        writeln!(f, "Status          : {}", self.status)?;
        writeln!(f, "Start           : {}", self.start)?;
        if let Some(end) = self.end.as_ref() {
            writeln!(f, "End             : {}", end)?;
        } else {
            writeln!(f, "End             : None")?;
        };
        writeln!(
            f,
            "Location        : {} ({})",
            self.location.name, self.location.address
        )?;
        writeln!(
            f,
            "Links           : {}",
            self.links
                .iter()
                .map(|l| format!("{} <{}>", l.title, l.href))
                .join(", ")
        )?;
        writeln!(f, "Source          : {}", self.source)?;
        if !self.time_notes.is_empty() {
            writeln!(f, "Time Notes      : {}", self.time_notes)?;
        }

        Ok(())
    }
}

/// How the record id is obtained once every other field is final.
#[derive(Debug, Clone, Copy)]
pub enum IdSource<'a> {
    /// Numeric id supplied by the source.
    Passthrough(i64),
    /// Derived from the spider name, start and title.
    Composite {
        spider: &'a str,
        disambiguator: Option<&'a str>,
    },
}

/// Every sourced field of a meeting; status and id are derived by
/// [`MeetingDraft::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDraft {
    pub title: String,
    pub description: String,
    pub classification: Classification,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
    pub time_notes: String,
    pub location: Location,
    pub links: Vec<Link>,
    pub source: String,
}

impl MeetingDraft {
    /// `now` must be in the same wall-clock frame as `start`.
    pub fn finish(
        self,
        cancelled: bool,
        now: NaiveDateTime,
        id: IdSource<'_>,
    ) -> Result<Meeting, SpiderError> {
        if self.title.trim().is_empty() {
            return Err(SpiderError::MissingField("title"));
        }

        let status = normalize::status(cancelled, self.start, now);
        let id = match id {
            IdSource::Passthrough(id) => MeetingId::Numeric(id),
            IdSource::Composite {
                spider,
                disambiguator,
            } => MeetingId::Composite(normalize::composite_id(
                spider,
                self.start,
                disambiguator,
                &self.title,
            )),
        };

        Ok(Meeting {
            id,
            title: self.title,
            description: self.description,
            classification: self.classification,
            status,
            start: self.start,
            end: self.end,
            all_day: self.all_day,
            time_notes: self.time_notes,
            location: self.location,
            links: self.links,
            source: self.source,
        })
    }
}
