use crate::errors::RouteError;
use chrono::{Datelike, NaiveDate};

/// A day selected in the URL, stored zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayParams {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DayParams {
    /// Converts the one-based month and day found in URLs.
    pub fn from_url(year: i32, month: u32, day: u32) -> Option<Self> {
        Some(Self {
            year,
            month: month.checked_sub(1)?,
            day: day.checked_sub(1)?,
        })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
            day: date.day0(),
        }
    }

    /// The calendar date, or `None` for combinations such as February 30th.
    pub fn resolve(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.checked_add(1)?, self.day.checked_add(1)?)
    }

    pub fn label(&self) -> String {
        format!("{}-{:02}-{:02}", self.year, self.month + 1, self.day + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Poems,
    Calendar { year: i32 },
    Day(DayParams),
    SavedPoem { hash: String },
}

impl Route {
    /// Maps an application path to the view it selects. A leading `/rabbit`
    /// mount point, query string and fragment are ignored.
    pub fn parse(path: &str, today: NaiveDate) -> Result<Self, RouteError> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut segments: Vec<&str> =
            path.split('/').filter(|segment| !segment.is_empty()).collect();
        if segments.first() == Some(&"rabbit") {
            segments.remove(0);
        }

        match segments.as_slice() {
            [] => Ok(Route::Poems),
            ["calendar"] => Ok(Route::Calendar { year: today.year() }),
            ["calendar", year] => Ok(Route::Calendar {
                year: parse_number("year", year)?,
            }),
            ["calendar", year, month, day] => {
                let year = parse_number("year", year)?;
                let month = parse_number("month", month)?;
                let day = parse_number("day", day)?;
                DayParams::from_url(year, month, day)
                    .map(Route::Day)
                    .ok_or_else(|| RouteError::OutOfRange(path.to_string()))
            }
            ["saved-poem", hash] => Ok(Route::SavedPoem {
                hash: extract_hash(hash).to_string(),
            }),
            _ => Err(RouteError::NotFound(path.to_string())),
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, RouteError> {
    value.parse().map_err(|_| RouteError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

/// Last path segment of a pasted permalink URL, or the input itself.
pub fn extract_hash(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.rsplit('/').next() {
        Some(last) if !last.is_empty() => last,
        _ => trimmed,
    }
}

/// Shareable location of a saved poem under `origin`.
pub fn saved_poem_url(origin: &str, hash: &str) -> String {
    format!("{}/rabbit/saved-poem/{}", origin.trim_end_matches('/'), hash)
}
