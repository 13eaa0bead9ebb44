//! Human-readable duration parsing and amount formatting

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Duration out of range: {0}")]
    OutOfRange(String),
}

/// Duration wrapper with human-readable parsing ("500ms", "30s", "2m")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_human_readable(&self) -> String {
        let millis = self.0.as_millis();
        const UNITS: &[(&str, u128)] = &[("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

        for &(unit, divisor) in UNITS {
            if millis >= divisor && millis % divisor == 0 {
                return format!("{}{}", millis / divisor, unit);
            }
        }

        format!("{}ms", millis)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> serde::de::Visitor<'de> for DurationVisitor {
            type Value = HumanDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration as string (e.g., \"500ms\", \"30s\") or seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(HumanDuration::from_secs(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(HumanDuration::from_secs)
                    .map_err(|_| E::custom(format!("negative duration: {v}")))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<HumanDuration>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_human_readable())
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        // Plain numbers are seconds
        if let Ok(num) = s.parse::<u64>() {
            return Ok(HumanDuration::from_secs(num));
        }

        let (num_str, unit) = if let Some(pos) = s.find(|c: char| !c.is_ascii_digit()) {
            (&s[..pos], &s[pos..])
        } else {
            return Err(ParseError::InvalidFormat(s.to_string()));
        };

        if num_str.is_empty() {
            return Err(ParseError::InvalidFormat(s.to_string()));
        }

        let num: u64 = num_str.parse()?;

        let multiplier: u64 = match unit.trim() {
            "ms" => 1,
            "s" | "sec" | "secs" => 1_000,
            "m" | "min" | "mins" => 60_000,
            "h" | "hr" | "hrs" => 3_600_000,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        let millis = num
            .checked_mul(multiplier)
            .ok_or_else(|| ParseError::OutOfRange(s.to_string()))?;

        Ok(HumanDuration::from_millis(millis))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}

/// Format an amount with two decimals and comma thousands separators
pub fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!("30".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(30));
        assert_eq!("30s".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(30));
        assert_eq!("30 secs".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(30));
    }

    #[test]
    fn test_parse_millis_and_minutes() {
        assert_eq!("500ms".parse::<HumanDuration>().unwrap(), HumanDuration::from_millis(500));
        assert_eq!("2m".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(120));
        assert_eq!("1h".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(3600));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("fast".parse::<HumanDuration>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("10 days".parse::<HumanDuration>(), Err(ParseError::InvalidUnit(_))));
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(matches!(
            "9999999999999999h".parse::<HumanDuration>(),
            Err(ParseError::OutOfRange(_))
        ));
        assert_eq!(
            "5124095576030h".parse::<HumanDuration>().unwrap(),
            HumanDuration::from_millis(5_124_095_576_030 * 3_600_000)
        );
    }

    #[test]
    fn test_to_human_readable() {
        assert_eq!(HumanDuration::from_secs(30).to_human_readable(), "30s");
        assert_eq!(HumanDuration::from_secs(120).to_human_readable(), "2m");
        assert_eq!(HumanDuration::from_millis(1500).to_human_readable(), "1500ms");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct TestStruct {
            timeout: HumanDuration,
        }

        let parsed: TestStruct = serde_json::from_str(r#"{"timeout": "250ms"}"#).unwrap();
        assert_eq!(parsed.timeout.as_duration(), Duration::from_millis(250));

        let parsed: TestStruct = serde_json::from_str(r#"{"timeout": 5}"#).unwrap();
        assert_eq!(parsed.timeout.as_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(5000.0), "5,000.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-250.5), "-250.50");
        assert_eq!(format_amount(999.999), "1,000.00");
    }
}
