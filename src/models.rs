use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-day article counts for a year, keyed `YYYY/MM/DD`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct DayCounts {
    pub days: BTreeMap<String, u64>,
}

impl DayCounts {
    /// Absent keys count as zero.
    pub fn count(&self, key: &str) -> u64 {
        self.days.get(key).copied().unwrap_or_default()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for DayCounts {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().map(|(key, count)| (key.into(), count)).collect(),
        }
    }
}

pub fn date_key(date: NaiveDate) -> String {
    format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub category: String,
    pub paragraphs: Vec<String>,
    pub date_published: String,
}

impl Article {
    /// Publication time as `HH:MM:SS`, or the raw value if it does not parse.
    pub fn published_time(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.date_published) {
            Ok(published) => published.format("%H:%M:%S").to_string(),
            Err(_) => {
                chrono::NaiveDateTime::parse_from_str(&self.date_published, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|published| published.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|_| self.date_published.clone())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PoemScope {
    Day,
    Month,
    Year,
}

impl PoemScope {
    pub const ALL: [PoemScope; 3] = [PoemScope::Day, PoemScope::Month, PoemScope::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            PoemScope::Day => "day",
            PoemScope::Month => "month",
            PoemScope::Year => "year",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PoemScope::Day => "Poem of the Day",
            PoemScope::Month => "Poem of the Month",
            PoemScope::Year => "Poem of the Year",
        }
    }
}

impl fmt::Display for PoemScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated content. The backend answers `null` when a scope has none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Poem {
    pub date_generated: String,
    pub hash: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermalinkResponse {
    pub permalink: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedPoem {
    pub paragraphs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_counts_deserialize_from_flat_mapping() {
        let counts: DayCounts =
            serde_json::from_str(r#"{"2021/03/15": 4, "2021/03/02": 9}"#).expect("parse");
        assert_eq!(counts.count("2021/03/15"), 4);
        assert_eq!(counts.count("2021/03/02"), 9);
        assert_eq!(counts.count("2021/03/03"), 0);
    }

    #[test]
    fn date_key_pads_month_and_day() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 2).expect("date");
        assert_eq!(date_key(date), "2021/03/02");
    }

    #[test]
    fn null_poem_is_distinct_from_missing_fields() {
        let none: Option<Poem> = serde_json::from_str("null").expect("null");
        assert!(none.is_none());
        assert!(serde_json::from_str::<Option<Poem>>(r#"{"hash": "x"}"#).is_err());
    }

    #[test]
    fn published_time_accepts_offset_and_naive_timestamps() {
        let mut article = Article {
            url: "https://example.com/a".to_string(),
            title: "A".to_string(),
            category: "UK".to_string(),
            paragraphs: vec![],
            date_published: "2020-12-22T11:26:05.594814+00:00".to_string(),
        };
        assert_eq!(article.published_time(), "11:26:05");

        article.date_published = "2020-12-22T08:01:02".to_string();
        assert_eq!(article.published_time(), "08:01:02");

        article.date_published = "yesterday".to_string();
        assert_eq!(article.published_time(), "yesterday");
    }
}
