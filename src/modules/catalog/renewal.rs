//! Loan renewal form.
//!
//! A librarian may push a copy's due date anywhere from today up to four
//! weeks ahead, both ends included. A fresh form proposes three weeks.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::utils::validation::{FieldErrors, REQUIRED};

/// Furthest a renewal may reach, in days from today.
pub const MAX_RENEWAL_DAYS: u64 = 28;

/// Renewal period proposed when the form is first shown.
pub const DEFAULT_RENEWAL_DAYS: u64 = 21;

pub const INVALID_DATE: &str = "Enter a valid date.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalError {
    #[error("Invalid date - renewal in past")]
    InPast,
    #[error("Invalid date - renewal more than 4 weeks ahead")]
    TooFarAhead,
}

/// Accept `candidate` if `today <= candidate <= today + 28 days`.
pub fn validate_renewal_date(
    candidate: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalError> {
    if candidate < today {
        return Err(RenewalError::InPast);
    }
    // Past the end of the calendar every date is "too far".
    match today.checked_add_days(Days::new(MAX_RENEWAL_DAYS)) {
        Some(limit) if candidate <= limit => Ok(candidate),
        Some(_) => Err(RenewalError::TooFarAhead),
        None => Ok(candidate),
    }
}

/// Date pre-filled into a fresh renewal form.
pub fn proposed_renewal_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(DEFAULT_RENEWAL_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// The renewal form as submitted. The date stays an untyped JSON value until
/// cleaned so that a malformed value is reported on the field rather than
/// rejecting the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenewBookForm {
    #[serde(default)]
    pub renewal_date: Option<Value>,
}

impl RenewBookForm {
    pub const FIELD: &'static str = "renewal_date";

    /// Form shown for a fresh request.
    pub fn initial(today: NaiveDate) -> Self {
        Self {
            renewal_date: Some(Value::String(proposed_renewal_date(today).to_string())),
        }
    }

    /// Parse and validate the submitted date.
    pub fn clean(&self, today: NaiveDate) -> Result<NaiveDate, FieldErrors> {
        let mut errors = FieldErrors::new();

        let parsed = match &self.renewal_date {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) if raw.trim().is_empty() => None,
            Some(Value::String(raw)) => Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")),
            // Numbers, booleans, arrays and objects are never dates.
            Some(_) => {
                errors.add(Self::FIELD, INVALID_DATE);
                return Err(errors);
            }
        };

        let parsed = match parsed {
            Some(Ok(date)) => date,
            Some(Err(_)) => {
                errors.add(Self::FIELD, INVALID_DATE);
                return Err(errors);
            }
            None => {
                errors.add(Self::FIELD, REQUIRED);
                return Err(errors);
            }
        };

        validate_renewal_date(parsed, today).map_err(|e| {
            errors.add(Self::FIELD, e.to_string());
            errors
        })
    }
}
