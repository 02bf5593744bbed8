//! Engine configuration.
//!
//! Loaded from a camelCase JSON document; every key is optional:
//!
//! ```json
//! {
//!   "timezone": "Europe/Zurich",
//!   "policy": { "minLeadTimeMinutes": 60, "maxAdvanceMinutes": 43200,
//!               "minDurationMinutes": 15, "gridQuantumMinutes": 15 },
//!   "dstPolicy": "shiftForward",
//!   "defaultDurationMinutes": 30
//! }
//! ```

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{EngineError, Result};
use crate::policy::{BookingWindowPolicy, MAX_CONFIG_MINUTES};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Reference timezone of the robot: day boundaries, weekdays and recurrence
    /// end dates are evaluated here.
    #[serde(with = "tz_name")]
    pub timezone: Tz,
    pub policy: BookingWindowPolicy,
    pub dst_policy: DstPolicy,
    /// Length of a single-click selection.
    pub default_duration_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            policy: BookingWindowPolicy::default(),
            dst_policy: DstPolicy::default(),
            default_duration_minutes: 30,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Same settings in another timezone.
    pub fn with_timezone(mut self, name: &str) -> Result<Self> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }

    pub fn check(&self) -> Result<()> {
        self.policy.check()?;
        if self.default_duration_minutes <= 0 {
            return Err(EngineError::invalid("defaultDurationMinutes must be positive"));
        }
        if self.default_duration_minutes > MAX_CONFIG_MINUTES {
            return Err(EngineError::invalid(format!(
                "defaultDurationMinutes must be at most {}",
                MAX_CONFIG_MINUTES
            )));
        }
        Ok(())
    }
}

/// Parse an IANA timezone name such as `"America/Los_Angeles"`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| EngineError::InvalidTimezone(name.to_string()))
}

mod tz_name {
    use chrono_tz::Tz;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tz: &Tz, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Tz, D::Error> {
        let name = String::deserialize(d)?;
        name.parse()
            .map_err(|_| D::Error::custom(format!("invalid timezone '{}'", name)))
    }
}
