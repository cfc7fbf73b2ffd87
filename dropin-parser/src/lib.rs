mod error;
mod parser;
mod structs;

pub use error::{Layer, ParseError};
pub use parser::parse_schedule;
pub use structs::{Day, Location, Schedule, TimeRange, Week};
