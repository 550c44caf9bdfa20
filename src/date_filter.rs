use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use regex::Regex;

use crate::error::{FormatError, MailError, Result};
use crate::store::ItemCollection;

/// Accepted string bounds: `DD-MM-YYYY` or `DD/MM/YYYY`, ASCII digits only.
const DATE_PATTERN: &str = r"^[0-9]{2}[-/][0-9]{2}[-/][0-9]{4}$";

/// What a bound looks like once normalized.
const CANONICAL_PATTERN: &str = r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$";

/// Canonical format used in restriction queries.
pub const CANONICAL_DATE_FORMAT: &str = "%d/%m/%Y";

fn matches_pattern(pattern: &str, text: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// One end of a received-time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateBound {
    Date(NaiveDate),
    /// Only the calendar day is kept.
    DateTime(NaiveDateTime),
    Text(String),
}

impl DateBound {
    /// Canonical `DD/MM/YYYY` form. `param` names the bound in errors.
    pub fn normalize(&self, param: &'static str) -> std::result::Result<String, FormatError> {
        match self {
            DateBound::Date(date) => Ok(date.format(CANONICAL_DATE_FORMAT).to_string()),
            DateBound::DateTime(datetime) => Ok(datetime.format(CANONICAL_DATE_FORMAT).to_string()),
            DateBound::Text(text) => {
                if !matches_pattern(DATE_PATTERN, text) {
                    return Err(FormatError::InvalidDate {
                        param,
                        value: text.clone(),
                    });
                }

                Ok(text.replace('-', "/"))
            }
        }
    }

    /// Empty strings count as "no bound".
    fn is_blank(&self) -> bool {
        matches!(self, DateBound::Text(text) if text.is_empty())
    }
}

impl From<NaiveDate> for DateBound {
    fn from(date: NaiveDate) -> Self {
        DateBound::Date(date)
    }
}

impl From<NaiveDateTime> for DateBound {
    fn from(datetime: NaiveDateTime) -> Self {
        DateBound::DateTime(datetime)
    }
}

impl From<&str> for DateBound {
    fn from(text: &str) -> Self {
        DateBound::Text(text.to_string())
    }
}

impl From<String> for DateBound {
    fn from(text: String) -> Self {
        DateBound::Text(text)
    }
}

/// Received-time restriction, inclusive on both ends.
///
/// Renders as the client's predicate language, e.g.
/// `[ReceivedTime] >= '04/09/2019' And [ReceivedTime] <= '30/09/2019'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    start: Option<String>,
    end: Option<String>,
}

impl Restriction {
    /// Both bounds must already be canonical (`DD/MM/YYYY`).
    pub fn received_between(start: Option<String>, end: Option<String>) -> Result<Self> {
        if start.is_none() && end.is_none() {
            return Err(MailError::MissingDateBound);
        }
        Self::check_canonical(start.as_deref(), "start")?;
        Self::check_canonical(end.as_deref(), "end")?;
        Ok(Restriction { start, end })
    }

    fn check_canonical(bound: Option<&str>, param: &'static str) -> Result<()> {
        match bound {
            Some(text) if !matches_pattern(CANONICAL_PATTERN, text) => {
                Err(FormatError::InvalidDate {
                    param,
                    value: text.to_string(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    pub fn end(&self) -> Option<&str> {
        self.end.as_deref()
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => write!(
                f,
                "[ReceivedTime] >= '{}' And [ReceivedTime] <= '{}'",
                start, end
            ),
            (Some(start), None) => write!(f, "[ReceivedTime] >= '{}'", start),
            (None, Some(end)) => write!(f, "[ReceivedTime] <= '{}'", end),
            (None, None) => Ok(()),
        }
    }
}

/// Narrows `items` to those received between `start` and `end` (inclusive).
///
/// Fails when both bounds are missing, when a bound is malformed, and when
/// nothing matches: an empty result is an error, not an empty collection.
pub fn filter_by_date<C: ItemCollection>(
    items: &C,
    start: Option<DateBound>,
    end: Option<DateBound>,
) -> Result<C> {
    let start = start
        .filter(|bound| !bound.is_blank())
        .map(|bound| bound.normalize("start"))
        .transpose()?;
    let end = end
        .filter(|bound| !bound.is_blank())
        .map(|bound| bound.normalize("end"))
        .transpose()?;

    let restriction = Restriction::received_between(start, end)?;

    match (restriction.start(), restriction.end()) {
        (Some(start), Some(end)) => {
            info!("Getting items starting from: {}, until date: {}", start, end)
        }
        (Some(start), None) => info!("Getting all items starting from: {}", start),
        (None, Some(end)) => info!("Getting all items until date: {}", end),
        (None, None) => {}
    }
    debug!("Restriction query: {}", restriction);

    let filtered = items.restrict(&restriction)?;
    let count = filtered.count()?;

    if count == 0 {
        return Err(MailError::EmptyResult {
            query: restriction.to_string(),
        });
    }

    info!("{} item(s) match the restriction", count);
    Ok(filtered)
}
