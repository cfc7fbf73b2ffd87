use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// The pipeline stage that rejected its input fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Location,
    Week,
    Day,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layer::Location => "location",
            Layer::Week => "week",
            Layer::Day => "day",
        })
    }
}

/// All errors the schedule pipeline can produce. Every stage is strict:
/// it either returns a fully valid value or one of these, never a partial
/// result. The schema-shaped variants keep the offending HTML fragment
/// around for diagnostics; `Display` deliberately leaves it out.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The fragment root lacks a required attribute.
    #[error("{layer}: missing `{attribute}` attribute")]
    MissingAttribute {
        layer: Layer,
        attribute: &'static str,
        fragment: String,
    },

    /// Header cells or column-role markers deviate from the fixed table schema.
    #[error("{layer}: {message}")]
    SchemaMismatch {
        layer: Layer,
        message: String,
        fragment: String,
    },

    /// Cell 0 of a week row carries no leading `Mon D` date token.
    #[error("week: no start date found in `{header}`")]
    DateNotFound { header: String, fragment: String },

    /// The resolved week start is not a Sunday.
    #[error("week: start date {date} does not fall on a Sunday")]
    InvalidWeekStart { date: NaiveDate, fragment: String },

    /// A time-range token does not match the `H[:MM][am|pm] - H[:MM][am|pm]`
    /// grammar, or its endpoints cannot be resolved to instants.
    #[error("unrecognized time range `{token}`")]
    TimeRangeFormat { token: String },
}
