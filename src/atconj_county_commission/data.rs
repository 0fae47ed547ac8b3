use serde::Deserialize;

/// JSON-LD event embedded in a `<script>` next to each schedule row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventScript {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<EventLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventLocation {
    #[serde(default)]
    pub name: Option<serde_json::Value>,
    #[serde(default)]
    pub address: Option<serde_json::Value>,
}

impl EventLocation {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(serde_json::Value::as_str)
    }

    /// Only plain-text addresses are usable, structured ones are ignored.
    pub fn address(&self) -> Option<&str> {
        self.address.as_ref().and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structured_address_is_ignored() {
        let event: EventScript = serde_json::from_str(
            r#"{
                "@context": "https://schema.org",
                "@type": "Event",
                "startDate": "2025-01-07T16:00:00-05:00",
                "location": {
                    "@type": "Place",
                    "name": "Stillwater Building",
                    "address": {"@type": "PostalAddress", "streetAddress": "201 S. Shore Road"}
                }
            }"#,
        )
        .expect("valid event");

        let location = event.location.expect("location");
        assert_eq!(location.name(), Some("Stillwater Building"));
        assert_eq!(location.address(), None);
        assert_eq!(event.end_date, None);
    }
}
