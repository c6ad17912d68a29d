//! Input validation shared by all OKR entities.
//!
//! # Invariants
//! - Titles are trimmed and never blank.
//! - Numeric value fields are finite.
//! - Deadlines are stored as `YYYY-MM-DD`.

use super::EntityKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

// Accepts a bare date or an ISO date-time whose date part is kept.
static DEADLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:[T ][0-9:.]+(?:Z|[+-]\d{2}:?\d{2})?)?$")
        .expect("valid deadline regex")
});

/// Rejected client input, always attributable to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is blank after trim.
    EmptyTitle(EntityKind),
    /// Numeric input is NaN or infinite.
    NonFiniteValue(&'static str),
    /// Key result whose target equals its start value.
    ZeroValueSpan,
    /// Deadline is not an ISO calendar date.
    InvalidDeadline(String),
    /// OKR generation requested without business context.
    EmptyGenerationContext,
}

impl ValidationError {
    /// Name of the offending input field as clients send it.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle(_) => "title",
            Self::NonFiniteValue(field) => field,
            Self::ZeroValueSpan => "target_value",
            Self::InvalidDeadline(_) => "deadline",
            Self::EmptyGenerationContext => "context",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle(kind) => write!(f, "{kind} title must not be blank"),
            Self::NonFiniteValue(field) => write!(f, "`{field}` must be a finite number"),
            Self::ZeroValueSpan => write!(
                f,
                "key result needs target_value different from start_value"
            ),
            Self::InvalidDeadline(value) => {
                write!(f, "deadline `{value}` is not an ISO date (YYYY-MM-DD)")
            }
            Self::EmptyGenerationContext => write!(f, "generation context must not be blank"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn normalize_title(kind: EntityKind, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle(kind));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_text(value: Option<String>) -> String {
    value.map(|text| text.trim().to_string()).unwrap_or_default()
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFiniteValue(field))
    }
}

/// Normalizes a deadline to its `YYYY-MM-DD` date part.
///
/// Blank input means "no deadline".
pub fn normalize_deadline(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let invalid = || ValidationError::InvalidDeadline(raw.to_string());
    let captures = DEADLINE_RE.captures(raw).ok_or_else(invalid)?;
    let year: u32 = captures[1].parse().map_err(|_| invalid())?;
    let month: u32 = captures[2].parse().map_err(|_| invalid())?;
    let day: u32 = captures[3].parse().map_err(|_| invalid())?;

    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(invalid());
    }

    Ok(Some(format!("{year:04}-{month:02}-{day:02}")))
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
