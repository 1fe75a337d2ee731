use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// The currency the PayGate instances we talk to settle in. Searches against the gateway do not
/// return a currency field, so the basket currency is authoritative.
pub const DEFAULT_CURRENCY_CODE: &str = "EUR";

//--------------------------------------      Amount       -----------------------------------------------------------
/// A monetary amount, stored as an integer count of minor units (cents).
///
/// PayGate exchanges amounts as decimal strings in `XXXXX.XX` format. Amounts are parsed from and
/// rendered to that format without ever passing through a float, so `"20.00"` is always exactly
/// 2000 minor units and never `19.999999`.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(transparent)]
pub struct Amount(i64);

#[derive(Debug, Clone, Error)]
#[error("'{0}' is not a valid decimal amount")]
pub struct AmountParseError(String);

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Amount {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    /// Parses a decimal string with at most two fraction digits. `"20"`, `"20.5"` and `"20.50"`
    /// are accepted; anything with more precision, or not a decimal at all, is rejected rather
    /// than rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AmountParseError(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() || whole.chars().any(|c| !c.is_ascii_digit()) {
            return Err(err());
        }
        if frac.len() > 2 || frac.chars().any(|c| !c.is_ascii_digit()) {
            return Err(err());
        }
        let whole = whole.parse::<i64>().map_err(|_| err())?;
        let mut frac_cents = frac.parse::<i64>().unwrap_or_default();
        if frac.len() == 1 {
            frac_cents *= 10;
        }
        let cents = whole.checked_mul(100).and_then(|v| v.checked_add(frac_cents)).ok_or_else(err)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

// The wire format is a decimal string, so serde goes through the string representation.
impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
