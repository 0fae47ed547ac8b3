use crate::meeting::Location;
use chrono_tz::Tz;

/// Fallback `{name, address}` used when a source gives no usable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultLocation {
    pub name: &'static str,
    pub address: &'static str,
}

impl DefaultLocation {
    pub fn to_location(&self) -> Location {
        Location {
            name: self.name.to_string(),
            address: self.address.to_string(),
        }
    }
}

/// Maps a source field (a JSON key or a CSS selector) to a link title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpec {
    pub key: &'static str,
    pub title: &'static str,
}

/// Read-only constants describing one source site.
///
/// Every unit owns a `const` instance and hands it to its spider on
/// construction, so tests can swap in their own values.
#[derive(Debug, Clone, Copy)]
pub struct SiteConfig {
    pub name: &'static str,
    pub agency: &'static str,
    pub timezone: Tz,
    /// Base every relative document path is resolved against.
    pub base_url: &'static str,
    /// Entry point of the crawl.
    pub start_url: &'static str,
    /// Human-browsable page recorded as `source`, when it differs from the
    /// page that was fetched.
    pub source_url: Option<&'static str>,
    pub default_location: DefaultLocation,
    pub links: &'static [LinkSpec],
}
