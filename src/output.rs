use std::io::{self, Write};

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::EntrySeries;
use crate::domain::Totals;
use crate::regions::RegionInfo;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsReport {
    pub country: String,
    pub state: Option<String>,
    pub as_of: Option<NaiveDate>,
    pub totals: Totals,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesReport {
    pub country: String,
    pub state: Option<String>,
    pub series: EntrySeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountriesReport {
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateEntry {
    pub name: String,
    #[serde(flatten)]
    pub info: RegionInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatesReport {
    pub country: String,
    pub states: Vec<StateEntry>,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_totals(result: &TotalsReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_series(result: &SeriesReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_countries(result: &CountriesReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_states(result: &StatesReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Thousands-separated rendering for the counter cards and CLI summaries.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(25459700), "25,459,700");
    }
}
