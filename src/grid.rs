use crate::models::{date_key, DayCounts};
use chrono::{Datelike, NaiveDate};

pub const BUCKET_COUNT: u8 = 6;
/// Bucket used when a month has no counts at all.
pub const EMPTY_BUCKET: u8 = 1;
pub const MIN_WEEKS: usize = 5;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridCell {
    pub in_range: bool,
    pub day: Option<u32>,
    pub date_key: Option<String>,
    /// `None` for out-of-range cells and for in-range cells whose counts are not loaded yet.
    pub count: Option<u64>,
    pub bucket: Option<u8>,
}

impl GridCell {
    fn out_of_range() -> Self {
        Self::default()
    }

    fn unknown(date: NaiveDate) -> Self {
        Self {
            in_range: true,
            day: Some(date.day()),
            date_key: Some(date_key(date)),
            count: None,
            bucket: None,
        }
    }

    fn counted(date: NaiveDate, count: u64, max_count: u64) -> Self {
        Self {
            in_range: true,
            day: Some(date.day()),
            date_key: Some(date_key(date)),
            count: Some(count),
            bucket: Some(bucket(count, max_count)),
        }
    }
}

pub type Week = [GridCell; 7];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    /// Zero-based month.
    pub month: u32,
    pub weeks: Vec<Week>,
}

impl MonthGrid {
    pub fn title(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month as usize)
            .copied()
            .unwrap_or("Unknown");
        format!("{name} {}", self.year)
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.weeks.iter().flat_map(|week| week.iter())
    }

    pub fn cell_for_day(&self, day: u32) -> Option<&GridCell> {
        self.cells().find(|cell| cell.day == Some(day))
    }
}

pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = first_of_month(year, month)?;
    let next = if month == 11 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 2, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Column of day 1 with Monday as column 0.
pub fn month_offset(year: i32, month: u32) -> Option<u32> {
    first_of_month(year, month).map(|first| first.weekday().num_days_from_monday())
}

pub fn week_count(days_in_month: u32, offset: u32) -> usize {
    ((offset + days_in_month).div_ceil(7) as usize).max(MIN_WEEKS)
}

/// Largest count among keys whose month component is `month` (zero-based); 0 if none match.
/// The year component is not checked, mirroring how the backend scopes its responses.
pub fn max_count_in_month(counts: &DayCounts, month: u32) -> u64 {
    counts
        .days
        .iter()
        .filter(|(key, _)| key_month(key) == Some(month + 1))
        .map(|(_, count)| *count)
        .max()
        .unwrap_or(0)
}

fn key_month(key: &str) -> Option<u32> {
    let mut parts = key.split('/');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    let well_formed = !year.is_empty()
        && digits(year)
        && month.len() == 2
        && digits(month)
        && day.len() == 2
        && digits(day);
    if !well_formed {
        return None;
    }
    month.parse().ok()
}

/// Maps a count to a colour bucket in `1..=6` relative to the month maximum.
pub fn bucket(count: u64, max_count: u64) -> u8 {
    if max_count == 0 {
        return EMPTY_BUCKET;
    }
    let scaled = (u128::from(count) * u128::from(BUCKET_COUNT)) / u128::from(max_count);
    let bucket = scaled.saturating_add(1).min(u128::from(BUCKET_COUNT));
    bucket as u8
}

/// Lays out a month as Monday-first weeks.
///
/// Cells before day 1 and after the last day are out of range. Without counts
/// every in-range cell is unknown rather than zero. An impossible `(year, month)`
/// yields the minimum number of weeks, all out of range.
pub fn compute_grid(year: i32, month: u32, counts: Option<&DayCounts>) -> MonthGrid {
    let (Some(first), Some(days), Some(offset)) = (
        first_of_month(year, month),
        days_in_month(year, month),
        month_offset(year, month),
    ) else {
        return MonthGrid {
            year,
            month,
            weeks: (0..MIN_WEEKS)
                .map(|_| std::array::from_fn(|_| GridCell::out_of_range()))
                .collect(),
        };
    };

    let max_count = counts.map_or(0, |counts| max_count_in_month(counts, month));
    let weeks = (0..week_count(days, offset))
        .map(|row| {
            std::array::from_fn(|column| {
                let index = (row * 7 + column) as u32;
                if index < offset || index >= offset + days {
                    return GridCell::out_of_range();
                }
                let date = first + chrono::Duration::days(i64::from(index - offset));
                match counts {
                    Some(counts) => {
                        GridCell::counted(date, counts.count(&date_key(date)), max_count)
                    }
                    None => GridCell::unknown(date),
                }
            })
        })
        .collect();

    MonthGrid { year, month, weeks }
}
