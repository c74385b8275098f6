use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Confirmed,
    Recovered,
    Deaths,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Confirmed, Metric::Recovered, Metric::Deaths];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Confirmed => "confirmed",
            Metric::Recovered => "recovered",
            Metric::Deaths => "deaths",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Identifies a row in the time-series tables. `state: None` means the
/// country-level aggregate covering all subdivisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionKey {
    pub country: String,
    pub state: Option<String>,
}

impl RegionKey {
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            state: None,
        }
    }

    pub fn with_state(country: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            state: Some(state.into()),
        }
    }

    /// Build a key from raw feed cells. The feed leaves the state cell blank
    /// for country-level rows; that placeholder maps to `None` here so no
    /// caller ever matches on the empty string.
    pub fn from_feed(country: &str, state: &str) -> Self {
        let state = state.trim();
        Self {
            country: country.trim().to_string(),
            state: (!state.is_empty()).then(|| state.to_string()),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Some(state) => write!(f, "{}, {}", state, self.country),
            None => write!(f, "{}", self.country),
        }
    }
}

/// Point-in-time snapshot at the last reported date. Recomputed per query,
/// never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub confirmed: u64,
    pub recovered: u64,
    pub deaths: u64,
}

impl Totals {
    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Recovered => self.recovered,
            Metric::Deaths => self.deaths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_key_blank_state_is_country_level() {
        let key = RegionKey::from_feed("Iceland", "");
        assert_eq!(key, RegionKey::country("Iceland"));
        assert_eq!(key.to_string(), "Iceland");
    }

    #[test]
    fn feed_key_whitespace_state_is_country_level() {
        let key = RegionKey::from_feed("Iceland", "   ");
        assert_eq!(key.state, None);
    }

    #[test]
    fn feed_key_keeps_state() {
        let key = RegionKey::from_feed("Australia", "Victoria");
        assert_eq!(key, RegionKey::with_state("Australia", "Victoria"));
        assert_eq!(key.to_string(), "Victoria, Australia");
    }

    #[test]
    fn metric_names() {
        assert_eq!(Metric::Confirmed.to_string(), "confirmed");
        assert_eq!(Metric::Deaths.name(), "deaths");
    }
}
