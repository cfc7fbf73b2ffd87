use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{Day, Layer, Location, ParseError, Schedule, TimeRange, Week};

macro_rules! selector {
    ($query:expr) => {{
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($query).unwrap());
        &SELECTOR
    }};
}

const EXPECTED_COLUMNS: [&str; 8] = ["Program", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Twelve weeks, exactly. A week header dated further back than this is
/// taken to belong to the next calendar year instead.
const YEAR_ROLLOVER_DAYS: i64 = 84;

static WEEK_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][a-z]{2} \d{1,2}").unwrap());

static TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})(?::(\d{1,2}))?(am|pm)? - (\d{1,2})(?::(\d{1,2}))?(am|pm)?").unwrap()
});

/// Extracts every facility's weekly drop-in schedule from a listings page.
///
/// The page prints week dates without a year, so `now` anchors year
/// inference for week headers; output near a year boundary depends on when
/// the page was scraped. Callers wanting reproducible results must pin it.
///
/// Validation is all-or-nothing: any listing that deviates from the fixed
/// table schema fails the whole parse.
pub fn parse_schedule<S: AsRef<str>>(html: S, now: NaiveDateTime) -> Result<Schedule, ParseError> {
    let document = Html::parse_document(html.as_ref());

    let locations = document
        .select(selector!(".pfrProgramDescrList .pfrListing"))
        .map(|listing| parse_location(listing, now))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Schedule(locations))
}

fn parse_location(listing: ElementRef, now: NaiveDateTime) -> Result<Location, ParseError> {
    let id = listing
        .value()
        .attr("data-id")
        .ok_or_else(|| ParseError::MissingAttribute {
            layer: Layer::Location,
            attribute: "data-id",
            fragment: listing.html(),
        })?
        .to_owned();

    let headings: Vec<String> = listing
        .select(selector!("table thead tr th"))
        .map(|heading| heading.text().collect::<String>().trim().to_owned())
        .collect();

    if headings != EXPECTED_COLUMNS {
        return Err(ParseError::SchemaMismatch {
            layer: Layer::Location,
            message: format!("expected table header {EXPECTED_COLUMNS:?}, found {headings:?}"),
            fragment: listing.html(),
        });
    }

    let weeks = listing
        .select(selector!("table tbody tr"))
        .map(|row| parse_week(row, now))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Location { id, weeks })
}

fn parse_week(row: ElementRef, now: NaiveDateTime) -> Result<Week, ParseError> {
    let cells: Vec<ElementRef> = row.select(selector!("td")).collect();

    let roles: Vec<Option<&str>> = cells
        .iter()
        .map(|cell| cell.value().attr("data-info"))
        .collect();

    let schema_ok = roles.len() == EXPECTED_COLUMNS.len()
        && roles
            .iter()
            .zip(EXPECTED_COLUMNS)
            .all(|(role, expected)| *role == Some(expected));

    if !schema_ok {
        return Err(ParseError::SchemaMismatch {
            layer: Layer::Week,
            message: format!("expected column roles {EXPECTED_COLUMNS:?}, found {roles:?}"),
            fragment: row.html(),
        });
    }

    let program_cell = cells[0];

    let program_label = program_cell
        .select(selector!("div strong"))
        .next()
        .map(|label| label.text().collect::<String>().trim().to_owned())
        .unwrap_or_default();

    // The week's dates live in the cell's own <strong>, not the one nested
    // inside the label div. The text is sometimes broken across lines, so
    // collapse whitespace runs before matching.
    let date_header = program_cell
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "strong")
        .map(|header| header.text().collect::<String>())
        .unwrap_or_default();
    let date_header = date_header.split_whitespace().collect::<Vec<_>>().join(" ");

    let token = WEEK_START
        .find(&date_header)
        .ok_or_else(|| ParseError::DateNotFound {
            header: date_header.clone(),
            fragment: row.html(),
        })?
        .as_str();

    let week_start = resolve_week_start(token, now).ok_or_else(|| ParseError::DateNotFound {
        header: date_header.clone(),
        fragment: row.html(),
    })?;

    // Every table starts its range on a Sunday; anything else means the
    // page no longer has the shape we know how to read.
    if week_start.weekday() != Weekday::Sun {
        return Err(ParseError::InvalidWeekStart {
            date: week_start,
            fragment: row.html(),
        });
    }

    let mut days = Vec::new();
    for (offset, cell) in cells.iter().skip(1).enumerate() {
        let date = week_start + Duration::days(offset as i64);
        if let Some(day) = parse_day(*cell, date)? {
            days.push(day);
        }
    }

    Ok(Week {
        program_label,
        week_start,
        days,
    })
}

fn resolve_week_start(token: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let assumed = parse_month_day(token, now.year())?;
    if now - assumed.and_time(NaiveTime::MIN) > Duration::days(YEAR_ROLLOVER_DAYS) {
        parse_month_day(token, now.year() + 1)
    } else {
        Some(assumed)
    }
}

fn parse_month_day(token: &str, year: i32) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{token} {year}"), "%b %d %Y").ok()
}

fn parse_day(cell: ElementRef, date: NaiveDate) -> Result<Option<Day>, ParseError> {
    let marker = cell.value().attr("data-info");
    if !marker.is_some_and(|value| EXPECTED_COLUMNS[1..].contains(&value)) {
        return Err(ParseError::SchemaMismatch {
            layer: Layer::Day,
            message: format!("`{}` is not a day-of-week marker", marker.unwrap_or("")),
            fragment: cell.html(),
        });
    }

    // Cheap probe: a digit anywhere in the cell means something is
    // scheduled. Cells with nothing booked hold only whitespace.
    let has_time = cell.text().flat_map(str::chars).any(|c| c.is_ascii_digit());
    if !has_time {
        return Ok(None);
    }

    // Each direct text node is one range token; the <br> elements between
    // them act as separators.
    let mut times = Vec::new();
    for node in cell.children() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let token = text.trim();
        if token.is_empty() {
            continue;
        }
        times.push(parse_time_range(token, date)?);
    }

    Ok(Some(Day { times }))
}

fn parse_time_range(token: &str, date: NaiveDate) -> Result<TimeRange, ParseError> {
    let malformed = || ParseError::TimeRangeFormat {
        token: token.to_owned(),
    };

    let caps = TIME_RANGE.captures(token).ok_or_else(malformed)?;

    let from_minute = caps.get(2).map_or("00", |m| m.as_str());
    let to_minute = caps.get(5).map_or("00", |m| m.as_str());

    // A meridiem stated on one side only carries over to the other. A token
    // with neither is ambiguous and rejected outright.
    let from_meridiem = caps.get(3).or_else(|| caps.get(6)).map(|m| m.as_str());
    let to_meridiem = caps.get(6).or_else(|| caps.get(3)).map(|m| m.as_str());
    let (Some(from_meridiem), Some(to_meridiem)) = (from_meridiem, to_meridiem) else {
        return Err(malformed());
    };

    let from = resolve_endpoint(date, &caps[1], from_minute, from_meridiem).ok_or_else(malformed)?;
    let to = resolve_endpoint(date, &caps[4], to_minute, to_meridiem).ok_or_else(malformed)?;

    // No ordering check: a range that reads as ending before it starts is
    // passed through as-is.
    Ok(TimeRange { from, to })
}

fn resolve_endpoint(date: NaiveDate, hour: &str, minute: &str, meridiem: &str) -> Option<NaiveDateTime> {
    let stamp = format!("{} {hour}:{minute}{meridiem}", date.format("%Y-%m-%d"));
    NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %I:%M%P").ok()
}
