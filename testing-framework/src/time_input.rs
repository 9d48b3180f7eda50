use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use devnet_common::U256;

use crate::error::ChainError;

/// A time amount as accepted by the fast-forward operations.
///
/// Callers tend to hold seconds in whatever shape their fixtures produced
/// them: a plain integer, a `U256` read from a contract, a string from a
/// config file, or a date. All of them normalize to whole seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeInput {
    /// Plain number of seconds
    Seconds(u64),
    /// Big-number seconds, must fit in a u64
    Big(U256),
    /// Decimal or `0x` hex integer
    Text(String),
    /// Whole seconds of the duration (sub-second part is dropped)
    Duration(Duration),
    /// Unix time of the date, in seconds
    Date(SystemTime),
}

impl TimeInput {
    /// Normalize to whole seconds
    pub fn to_seconds(&self) -> Result<u64, ChainError> {
        match self {
            Self::Seconds(seconds) => Ok(*seconds),
            Self::Big(value) => {
                if *value > U256::from(u64::MAX) {
                    return Err(ChainError::InvalidTimeInput(format!(
                        "{} does not fit in 64 bits",
                        value
                    )));
                }
                Ok(value.low_u64())
            }
            Self::Text(text) => parse_seconds(text),
            Self::Duration(duration) => Ok(duration.as_secs()),
            Self::Date(date) => date
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .map_err(|_| ChainError::InvalidTimeInput("date is before the unix epoch".into())),
        }
    }
}

fn parse_seconds(text: &str) -> Result<u64, ChainError> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };

    parsed.map_err(|e| ChainError::InvalidTimeInput(format!("{:?}: {}", text, e)))
}

impl From<u64> for TimeInput {
    fn from(seconds: u64) -> Self {
        Self::Seconds(seconds)
    }
}

impl From<u32> for TimeInput {
    fn from(seconds: u32) -> Self {
        Self::Seconds(seconds.into())
    }
}

impl From<U256> for TimeInput {
    fn from(value: U256) -> Self {
        Self::Big(value)
    }
}

impl From<&str> for TimeInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for TimeInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Duration> for TimeInput {
    fn from(duration: Duration) -> Self {
        Self::Duration(duration)
    }
}

impl From<SystemTime> for TimeInput {
    fn from(date: SystemTime) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<Utc>> for TimeInput {
    fn from(date: DateTime<Utc>) -> Self {
        Self::Date(date.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_inputs() {
        assert_eq!(TimeInput::from(3600u64).to_seconds().unwrap(), 3600);
        assert_eq!(TimeInput::from(60u32).to_seconds().unwrap(), 60);
        assert_eq!(TimeInput::from(U256::from(86_400u64)).to_seconds().unwrap(), 86_400);
    }

    #[test]
    fn test_big_number_overflow() {
        let input = TimeInput::from(U256::from(u64::MAX) + U256::one());
        assert!(matches!(input.to_seconds(), Err(ChainError::InvalidTimeInput(_))));
    }

    #[test]
    fn test_text_inputs() {
        assert_eq!(TimeInput::from("7200").to_seconds().unwrap(), 7200);
        assert_eq!(TimeInput::from(" 42 ").to_seconds().unwrap(), 42);
        assert_eq!(TimeInput::from("0x10".to_string()).to_seconds().unwrap(), 16);
        assert!(TimeInput::from("-5").to_seconds().is_err());
        assert!(TimeInput::from("soon").to_seconds().is_err());
        assert!(TimeInput::from("").to_seconds().is_err());
    }

    #[test]
    fn test_duration_and_dates() {
        assert_eq!(
            TimeInput::from(Duration::from_millis(90_500)).to_seconds().unwrap(),
            90
        );

        let date = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(TimeInput::from(date).to_seconds().unwrap(), 1_700_000_000);

        let chrono_date = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(TimeInput::from(chrono_date).to_seconds().unwrap(), 1_700_000_000);

        let before_epoch = UNIX_EPOCH - Duration::from_secs(1);
        assert!(TimeInput::from(before_epoch).to_seconds().is_err());
    }
}
