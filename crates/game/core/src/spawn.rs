//! Per-channel spawn policy.
//!
//! A channel drops items either per message (probability), on a wall-clock
//! schedule (interval), or both. Values are validated on construction and
//! out-of-range input is rejected, never clamped.
use std::fmt;

use crate::ids::{ChannelId, GuildId};

/// Longest allowed interval: one week.
pub const MAX_INTERVAL_SECS: u32 = 604_800;

/// Rejected spawn-policy input.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Probability must be in (0.0, 1.0], got {0}")]
    Probability(f64),

    #[error("Interval must be in [1, 604800], got {0}")]
    Interval(i64),
}

/// Per-message drop probability in `(0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Probability(f64);

impl Probability {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::Probability(value))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seconds between timed drops, in `[1, MAX_INTERVAL_SECS]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval(u32);

impl Interval {
    pub fn new(secs: i64) -> Result<Self, ConfigError> {
        if (1..=i64::from(MAX_INTERVAL_SECS)).contains(&secs) {
            Ok(Self(secs as u32))
        } else {
            Err(ConfigError::Interval(secs))
        }
    }

    #[inline]
    pub fn secs(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.0))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// One of the two independent conditions a rule can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Dimension {
    Probability,
    Interval,
}

/// Result of clearing one dimension of a mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cleared {
    /// The other dimension survives.
    Kept(SpawnMode),
    /// Nothing is left; the rule should be deleted.
    Emptied,
    /// The dimension was not set; nothing changes.
    NotSet,
}

/// Closed set of spawn policies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpawnMode {
    Probability(Probability),
    Interval(Interval),
    Hybrid {
        probability: Probability,
        interval: Interval,
    },
}

impl SpawnMode {
    /// Builds a mode from raw persisted values, where `probability <= 0` and
    /// `interval <= 0` mean "unset". Returns `Ok(None)` when both are unset.
    pub fn from_parts(probability: f64, interval: i64) -> Result<Option<Self>, ConfigError> {
        let probability = (probability > 0.0 || probability.is_nan())
            .then(|| Probability::new(probability))
            .transpose()?;
        let interval = (interval > 0)
            .then(|| Interval::new(interval))
            .transpose()?;

        Ok(match (probability, interval) {
            (Some(p), Some(i)) => Some(Self::Hybrid {
                probability: p,
                interval: i,
            }),
            (Some(p), None) => Some(Self::Probability(p)),
            (None, Some(i)) => Some(Self::Interval(i)),
            (None, None) => None,
        })
    }

    /// Raw values for persistence; unset dimensions become `0.0` / `0`.
    pub fn to_parts(self) -> (f64, u32) {
        (
            self.probability().map_or(0.0, Probability::get),
            self.interval().map_or(0, Interval::secs),
        )
    }

    pub fn probability(self) -> Option<Probability> {
        match self {
            Self::Probability(p) | Self::Hybrid { probability: p, .. } => Some(p),
            Self::Interval(_) => None,
        }
    }

    pub fn interval(self) -> Option<Interval> {
        match self {
            Self::Interval(i) | Self::Hybrid { interval: i, .. } => Some(i),
            Self::Probability(_) => None,
        }
    }

    pub fn has(self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Probability => self.probability().is_some(),
            Dimension::Interval => self.interval().is_some(),
        }
    }

    /// Sets the probability, keeping any interval already configured.
    pub fn with_probability(current: Option<Self>, probability: Probability) -> Self {
        match current.and_then(Self::interval) {
            Some(interval) => Self::Hybrid {
                probability,
                interval,
            },
            None => Self::Probability(probability),
        }
    }

    /// Sets the interval, keeping any probability already configured.
    pub fn with_interval(current: Option<Self>, interval: Interval) -> Self {
        match current.and_then(Self::probability) {
            Some(probability) => Self::Hybrid {
                probability,
                interval,
            },
            None => Self::Interval(interval),
        }
    }

    /// Removes one dimension.
    pub fn clear(self, dimension: Dimension) -> Cleared {
        match (self, dimension) {
            (Self::Hybrid { interval, .. }, Dimension::Probability) => {
                Cleared::Kept(Self::Interval(interval))
            }
            (Self::Hybrid { probability, .. }, Dimension::Interval) => {
                Cleared::Kept(Self::Probability(probability))
            }
            (Self::Probability(_), Dimension::Probability)
            | (Self::Interval(_), Dimension::Interval) => Cleared::Emptied,
            _ => Cleared::NotSet,
        }
    }
}

/// Renders the admin description, one dimension per line.
impl fmt::Display for SpawnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probability(p) => write!(f, "Probability: {p}"),
            Self::Interval(i) => write!(f, "Interval: {i}"),
            Self::Hybrid {
                probability,
                interval,
            } => write!(f, "Probability: {probability}\nInterval: {interval}"),
        }
    }
}

/// Spawn policy of one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRule {
    pub channel: ChannelId,
    pub guild: GuildId,
    pub mode: SpawnMode,
}

impl SpawnRule {
    pub fn new(channel: ChannelId, guild: GuildId, mode: SpawnMode) -> Self {
        Self {
            channel,
            guild,
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: f64) -> Probability {
        Probability::new(v).unwrap()
    }

    fn i(v: i64) -> Interval {
        Interval::new(v).unwrap()
    }

    #[test]
    fn probability_bounds() {
        assert!(Probability::new(1.0).is_ok());
        assert!(Probability::new(0.0001).is_ok());
        assert_eq!(Probability::new(0.0), Err(ConfigError::Probability(0.0)));
        assert!(Probability::new(1.5).is_err());
        assert!(Probability::new(-0.1).is_err());
        assert!(Probability::new(f64::NAN).is_err());
    }

    #[test]
    fn interval_bounds() {
        assert!(Interval::new(1).is_ok());
        assert!(Interval::new(604_800).is_ok());
        assert_eq!(Interval::new(0), Err(ConfigError::Interval(0)));
        assert!(Interval::new(604_801).is_err());
        assert_eq!(
            Interval::new(-5).unwrap_err().to_string(),
            "Interval must be in [1, 604800], got -5"
        );
    }

    #[test]
    fn parts_round_trip() {
        assert_eq!(SpawnMode::from_parts(0.0, 0).unwrap(), None);
        assert_eq!(
            SpawnMode::from_parts(0.5, 0).unwrap(),
            Some(SpawnMode::Probability(p(0.5)))
        );
        assert_eq!(
            SpawnMode::from_parts(0.0, 60).unwrap(),
            Some(SpawnMode::Interval(i(60)))
        );
        let hybrid = SpawnMode::from_parts(0.1, 3600).unwrap().unwrap();
        assert_eq!(hybrid.to_parts(), (0.1, 3600));
        assert!(SpawnMode::from_parts(2.0, 0).is_err());
        assert!(SpawnMode::from_parts(0.0, 700_000).is_err());
    }

    #[test]
    fn setting_a_dimension_keeps_the_other() {
        let interval_only = SpawnMode::Interval(i(60));
        assert_eq!(
            SpawnMode::with_probability(Some(interval_only), p(0.2)),
            SpawnMode::Hybrid {
                probability: p(0.2),
                interval: i(60)
            }
        );

        let hybrid = SpawnMode::Hybrid {
            probability: p(0.2),
            interval: i(60),
        };
        assert_eq!(
            SpawnMode::with_probability(Some(hybrid), p(0.7)),
            SpawnMode::Hybrid {
                probability: p(0.7),
                interval: i(60)
            }
        );
        assert_eq!(
            SpawnMode::with_interval(Some(SpawnMode::Probability(p(0.3))), i(10)),
            SpawnMode::Hybrid {
                probability: p(0.3),
                interval: i(10)
            }
        );
        assert_eq!(
            SpawnMode::with_interval(None, i(10)),
            SpawnMode::Interval(i(10))
        );
    }

    #[test]
    fn clearing_dimensions() {
        let hybrid = SpawnMode::Hybrid {
            probability: p(0.1),
            interval: i(3600),
        };
        assert_eq!(
            hybrid.clear(Dimension::Probability),
            Cleared::Kept(SpawnMode::Interval(i(3600)))
        );
        assert_eq!(
            hybrid.clear(Dimension::Interval),
            Cleared::Kept(SpawnMode::Probability(p(0.1)))
        );
        assert_eq!(
            SpawnMode::Probability(p(0.1)).clear(Dimension::Probability),
            Cleared::Emptied
        );
        assert_eq!(
            SpawnMode::Interval(i(5)).clear(Dimension::Probability),
            Cleared::NotSet
        );
    }

    #[test]
    fn descriptions() {
        assert_eq!(
            SpawnMode::Probability(p(0.3)).to_string(),
            "Probability: 0.3"
        );
        assert_eq!(SpawnMode::Interval(i(60)).to_string(), "Interval: 60s");
        assert_eq!(
            SpawnMode::Hybrid {
                probability: p(0.1),
                interval: i(3600)
            }
            .to_string(),
            "Probability: 0.1\nInterval: 3600s"
        );
    }
}
