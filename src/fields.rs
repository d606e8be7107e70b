//! Enumerations shared by the catalog, the store and the command line.

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// How often a protocol task is meant to be performed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    #[serde(alias = "Daily")]
    Daily,
    #[serde(alias = "Weekdays")]
    Weekdays,
    #[serde(alias = "Weekly")]
    Weekly,
    #[serde(alias = "Monthly")]
    Monthly,
}

impl Frequency {
    /// Parse a free-form label such as "Daily" or "weekly".
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "every day" => Some(Frequency::Daily),
            "weekdays" => Some(Frequency::Weekdays),
            "weekly" | "every week" => Some(Frequency::Weekly),
            "monthly" | "every month" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

/// Deserialize an optional frequency label, dropping labels we do not know.
///
/// Catalog sources write frequencies as free text, so an unrecognised label
/// must not reject the whole record.
pub fn lenient_frequency<'de, D>(deserializer: D) -> Result<Option<Frequency>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Frequency::from_label))
}

/// Which of today's tasks to print.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Open,
    Done,
}

impl TaskFilter {
    pub fn matches(self, completed: bool) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Open => !completed,
            TaskFilter::Done => completed,
        }
    }
}

/// Sorting options for the enrolled protocol list.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    /// Enrollment order.
    Enrolled,
    Progress,
    Start,
}

/// Format a frequency label for display.
pub fn format_frequency(f: Option<Frequency>) -> &'static str {
    match f {
        Some(Frequency::Daily) => "Daily",
        Some(Frequency::Weekdays) => "Weekdays",
        Some(Frequency::Weekly) => "Weekly",
        Some(Frequency::Monthly) => "Monthly",
        None => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_accepts_display_labels() {
        let f: Frequency = serde_json::from_str("\"Daily\"").unwrap();
        assert_eq!(f, Frequency::Daily);
        let f: Frequency = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(f, Frequency::Weekly);
        assert_eq!(serde_json::to_string(&Frequency::Weekdays).unwrap(), "\"weekdays\"");
    }

    #[test]
    fn test_lenient_frequency_drops_unknown_labels() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "lenient_frequency")]
            frequency: Option<Frequency>,
        }
        let p: Probe = serde_json::from_str(r#"{"frequency": "Daily"}"#).unwrap();
        assert_eq!(p.frequency, Some(Frequency::Daily));
        let p: Probe = serde_json::from_str(r#"{"frequency": "3x per week"}"#).unwrap();
        assert_eq!(p.frequency, None);
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.frequency, None);
    }

    #[test]
    fn test_task_filter() {
        assert!(TaskFilter::All.matches(true));
        assert!(TaskFilter::Open.matches(false));
        assert!(!TaskFilter::Open.matches(true));
        assert!(TaskFilter::Done.matches(true));
    }
}
