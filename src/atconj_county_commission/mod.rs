//! Atlantic County Board of County Commissioners.
//!
//! The schedule is one HTML table. Each row carries the document links and
//! embeds a JSON-LD `<script>` with the date and place of the meeting.

mod data;
mod spider;

pub use data::{EventLocation, EventScript};
pub use spider::CountyCommissionSpider;

use crate::config::{DefaultLocation, LinkSpec, SiteConfig};

pub const CONFIG: SiteConfig = SiteConfig {
    name: "atconj_County_Commission",
    agency: "Atlantic County Board of County Commissioners",
    timezone: chrono_tz::America::New_York,
    base_url: "https://www.atlanticcountynj.gov",
    start_url: "https://www.atlanticcountynj.gov/government/county-government/board-of-county-commissioners/meeting-schedule-agendas-and-minutes/-toggle-all",
    source_url: None,
    default_location: DefaultLocation {
        name: "Stillwater Building",
        address: "Stillwater Building, 201 S. Shore Road Northfield, New Jersey 08225",
    },
    links: &[
        LinkSpec {
            key: "agenda",
            title: "Agenda",
        },
        LinkSpec {
            key: "minutes",
            title: "Minutes",
        },
    ],
};
