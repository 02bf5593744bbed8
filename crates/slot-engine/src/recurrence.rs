//! Recurrence patterns for availability blocks.
//!
//! Patterns arrive as JSON blobs such as
//! `{"type":"weekly","daysOfWeek":[1,3,5],"endDate":"2026-06-30"}` and are
//! validated on the way in: an empty or out-of-range `daysOfWeek` is an
//! [`EngineError::InvalidConfiguration`], never a silent default.
//!
//! Day numbering follows the calendar UI: 0 = Sunday through 6 = Saturday.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A recurrence rule attached to an availability block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", try_from = "RawRecurrence")]
pub enum Recurrence {
    /// Repeats on the listed weekdays until `end_date` (inclusive, local date).
    #[serde(rename_all = "camelCase")]
    Weekly {
        days_of_week: BTreeSet<u8>,
        end_date: Option<NaiveDate>,
    },
}

impl Recurrence {
    /// Build a validated weekly pattern.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfiguration` if `days` is empty or holds
    /// a value outside `0..=6`.
    pub fn weekly(days: impl IntoIterator<Item = u8>, end_date: Option<NaiveDate>) -> Result<Self> {
        let pattern = Recurrence::Weekly {
            days_of_week: days.into_iter().collect(),
            end_date,
        };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Parse a pattern from its JSON transport form.
    ///
    /// Any shape error (unknown `type`, wrong field types, bad dates) is
    /// reported as `InvalidConfiguration` since it points at corrupt upstream data.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::invalid(format!("recurrence pattern: {}", e)))
    }

    /// Check the invariants of the pattern.
    ///
    /// The enum can be built directly, so the expander re-checks before use.
    pub fn validate(&self) -> Result<()> {
        match self {
            Recurrence::Weekly { days_of_week, .. } => {
                if days_of_week.is_empty() {
                    return Err(EngineError::invalid("daysOfWeek must not be empty"));
                }
                if let Some(bad) = days_of_week.iter().find(|d| **d > 6) {
                    return Err(EngineError::invalid(format!(
                        "daysOfWeek value {} outside 0..=6",
                        bad
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            Recurrence::Weekly { end_date, .. } => *end_date,
        }
    }

    /// Whether an occurrence may be generated on `date` (ignores the pattern start).
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Recurrence::Weekly {
                days_of_week,
                end_date,
            } => {
                if !days_of_week.contains(&day_index(date.weekday())) {
                    return false;
                }
                !matches!(end_date, Some(end) if date > *end)
            }
        }
    }
}

/// 0 = Sunday .. 6 = Saturday.
pub fn day_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum RawRecurrence {
    #[serde(rename_all = "camelCase")]
    Weekly {
        days_of_week: Vec<i64>,
        #[serde(default)]
        end_date: Option<String>,
    },
}

impl TryFrom<RawRecurrence> for Recurrence {
    type Error = EngineError;

    fn try_from(raw: RawRecurrence) -> Result<Self> {
        match raw {
            RawRecurrence::Weekly {
                days_of_week,
                end_date,
            } => {
                let days = days_of_week
                    .into_iter()
                    .map(|d| {
                        u8::try_from(d)
                            .ok()
                            .filter(|d| *d <= 6)
                            .ok_or_else(|| {
                                EngineError::invalid(format!("daysOfWeek value {} outside 0..=6", d))
                            })
                    })
                    .collect::<Result<Vec<u8>>>()?;
                let end_date = end_date.as_deref().map(parse_end_date).transpose()?;
                Recurrence::weekly(days, end_date)
            }
        }
    }
}

/// Accepts a bare `YYYY-MM-DD` or a full RFC 3339 timestamp (date part as written).
fn parse_end_date(s: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| EngineError::invalid(format!("endDate '{}' is not a date", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weekly_pattern() {
        let p = Recurrence::from_json(r#"{"type":"weekly","daysOfWeek":[5,1,3],"endDate":"2026-06-30"}"#)
            .unwrap();
        assert_eq!(
            p,
            Recurrence::Weekly {
                days_of_week: [1, 3, 5].into_iter().collect(),
                end_date: NaiveDate::from_ymd_opt(2026, 6, 30),
            }
        );
    }

    #[test]
    fn end_date_accepts_rfc3339() {
        let p = Recurrence::from_json(
            r#"{"type":"weekly","daysOfWeek":[0],"endDate":"2026-06-30T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(p.end_date(), NaiveDate::from_ymd_opt(2026, 6, 30));
    }

    #[test]
    fn missing_end_date_is_open_ended() {
        let p = Recurrence::from_json(r#"{"type":"weekly","daysOfWeek":[2]}"#).unwrap();
        assert_eq!(p.end_date(), None);
    }

    #[test]
    fn empty_days_rejected() {
        let err = Recurrence::from_json(r#"{"type":"weekly","daysOfWeek":[]}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn out_of_range_day_rejected() {
        for json in [
            r#"{"type":"weekly","daysOfWeek":[7]}"#,
            r#"{"type":"weekly","daysOfWeek":[-1]}"#,
        ] {
            let err = Recurrence::from_json(json).unwrap_err();
            assert!(
                matches!(err, EngineError::InvalidConfiguration(_)),
                "{} should be InvalidConfiguration, got {:?}",
                json,
                err
            );
        }
    }

    #[test]
    fn unknown_type_rejected() {
        let err = Recurrence::from_json(r#"{"type":"daily","daysOfWeek":[1]}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[test]
    fn serializes_back_to_transport_shape() {
        let p = Recurrence::weekly([1, 3], None).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "weekly", "daysOfWeek": [1, 3], "endDate": null})
        );
    }

    #[test]
    fn directly_built_pattern_fails_validation() {
        let p = Recurrence::Weekly {
            days_of_week: BTreeSet::new(),
            end_date: None,
        };
        assert!(p.validate().is_err());
    }
}
