use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Reporting window with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(ValidationError::InvalidPeriod {
                start: start_date,
                end: end_date,
            }
            .into());
        }
        Ok(Period {
            start_date,
            end_date,
        })
    }

    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            ValidationError::InvalidInput(format!("invalid month {}-{}", year, month))
        })?;
        let next_month_start = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let end = next_month_start
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!("invalid month {}-{}", year, month))
            })?;
        Period::new(start, end)
    }

    pub fn year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| ValidationError::InvalidInput(format!("invalid year {}", year)))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| ValidationError::InvalidInput(format!("invalid year {}", year)))?;
        Period::new(start, end)
    }

    /// Year to date, ending on `as_of`.
    pub fn year_to_date(as_of: NaiveDate) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(as_of.year(), 1, 1)
            .ok_or_else(|| ValidationError::InvalidInput(format!("invalid date {}", as_of)))?;
        Period::new(start, as_of)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}
