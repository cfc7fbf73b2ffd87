use chrono::{NaiveDate, NaiveDateTime};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything scraped from one page: one entry per facility listing.
/// Serializes as a bare array, matching the shape consumers already expect.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Schedule(pub Vec<Location>);

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub id: String,
    pub weeks: Vec<Week>,
}

/// One Sunday-to-Saturday row of a facility's table. `days` holds only the
/// days that actually have scheduled times; empty cells are dropped during
/// parsing rather than carried as empty entries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Week {
    pub program_label: String,
    pub week_start: NaiveDate,
    pub days: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Day {
    pub times: Vec<TimeRange>,
}

/// A single scheduled interval. Both ends fall on the owning day's date;
/// the page carries no time zone, so these are naive local timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}
