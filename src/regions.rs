use std::collections::{BTreeMap, BTreeSet};

use crate::domain::RegionKey;
use crate::error::DashboardError;

const COUNTRY_COLUMN: &str = "Country_Region";
const STATE_COLUMN: &str = "Province_State";
const ADMIN2_COLUMN: &str = "Admin2";
const COMBINED_COLUMN: &str = "Combined_Key";
const POPULATION_COLUMN: &str = "Population";

/// Display metadata from the geography reference table. Never used for
/// totals, only for selector labels and report output.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RegionInfo {
    pub combined_name: Option<String>,
    pub population: Option<u64>,
}

/// The (country -> states) relation derived from the UID/ISO/FIPS lookup
/// table. Drives the selectors independently of whether a region has any
/// recorded cases. Built once, immutable.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    states: BTreeMap<String, BTreeSet<String>>,
    info: BTreeMap<RegionKey, RegionInfo>,
}

impl RegionIndex {
    /// Parse the lookup CSV. The reference table carries one row per
    /// (country, state) pair plus county-level rows (Admin2) and a
    /// country-level aggregate row with a blank state; the aggregate row
    /// registers the country but must not surface as a selectable state.
    pub fn parse(text: &str) -> Result<Self, DashboardError> {
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|err| malformed(format!("unreadable header row: {err}")))?
            .clone();

        let country_idx = headers
            .iter()
            .position(|name| name == COUNTRY_COLUMN)
            .ok_or_else(|| malformed(format!("missing {COUNTRY_COLUMN} column")))?;
        let state_idx = headers
            .iter()
            .position(|name| name == STATE_COLUMN)
            .ok_or_else(|| malformed(format!("missing {STATE_COLUMN} column")))?;
        let admin2_idx = headers.iter().position(|name| name == ADMIN2_COLUMN);
        let combined_idx = headers.iter().position(|name| name == COMBINED_COLUMN);
        let population_idx = headers.iter().position(|name| name == POPULATION_COLUMN);

        let mut index = RegionIndex::default();
        for record in reader.records() {
            let record = record.map_err(|err| malformed(format!("unreadable record: {err}")))?;
            let country = record.get(country_idx).unwrap_or("").trim();
            if country.is_empty() {
                continue;
            }
            let key = RegionKey::from_feed(country, record.get(state_idx).unwrap_or(""));

            let entry = index.states.entry(key.country.clone()).or_default();
            if let Some(state) = &key.state {
                entry.insert(state.clone());
            }

            // County rows repeat the state; keep metadata from the
            // state/country-level row only.
            let is_county = admin2_idx
                .and_then(|idx| record.get(idx))
                .map(|cell| !cell.trim().is_empty())
                .unwrap_or(false);
            if !is_county && !index.info.contains_key(&key) {
                let combined_name = combined_idx
                    .and_then(|idx| record.get(idx))
                    .map(str::trim)
                    .filter(|cell| !cell.is_empty())
                    .map(str::to_string);
                let population = population_idx
                    .and_then(|idx| record.get(idx))
                    .and_then(|cell| cell.trim().parse::<u64>().ok());
                index.info.insert(
                    key,
                    RegionInfo {
                        combined_name,
                        population,
                    },
                );
            }
        }

        Ok(index)
    }

    /// Countries for the country selector. Ordered, duplicate-free.
    pub fn countries(&self) -> Vec<&str> {
        self.states.keys().map(String::as_str).collect()
    }

    /// States registered under `country` for the state selector. Ordered,
    /// duplicate-free; empty for countries with no subdivisions or unknown
    /// countries.
    pub fn states_for(&self, country: &str) -> Vec<&str> {
        self.states
            .get(country)
            .map(|states| states.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn info(&self, country: &str, state: Option<&str>) -> Option<&RegionInfo> {
        let key = RegionKey {
            country: country.to_string(),
            state: state.filter(|value| !value.is_empty()).map(str::to_string),
        };
        self.info.get(&key)
    }
}

fn malformed(reason: String) -> DashboardError {
    DashboardError::MalformedTable {
        table: "lookup".to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const FIXTURE: &str = "\
UID,iso2,Admin2,Province_State,Country_Region,Combined_Key,Population
36,AU,,,Australia,Australia,25459700
3601,AU,,New South Wales,Australia,\"New South Wales, Australia\",8118000
3602,AU,,Victoria,Australia,\"Victoria, Australia\",6629800
352,IS,,,Iceland,Iceland,341250
84036061,US,Westchester,New York,US,\"Westchester, New York, US\",967506
84036001,US,Albany,New York,US,\"Albany, New York, US\",305506
8403600,US,,New York,US,\"New York, US\",19453561
840,US,,,US,US,329466283
";

    #[test]
    fn countries_are_ordered_and_duplicate_free() {
        let index = RegionIndex::parse(FIXTURE).unwrap();
        assert_eq!(index.countries(), vec!["Australia", "Iceland", "US"]);
    }

    #[test]
    fn states_exclude_country_level_aggregate() {
        let index = RegionIndex::parse(FIXTURE).unwrap();
        assert_eq!(
            index.states_for("Australia"),
            vec!["New South Wales", "Victoria"]
        );
        assert!(index.states_for("Iceland").is_empty());
    }

    #[test]
    fn county_rows_do_not_duplicate_states() {
        let index = RegionIndex::parse(FIXTURE).unwrap();
        assert_eq!(index.states_for("US"), vec!["New York"]);
    }

    #[test]
    fn unknown_country_has_no_states() {
        let index = RegionIndex::parse(FIXTURE).unwrap();
        assert!(index.states_for("Atlantis").is_empty());
    }

    #[test]
    fn metadata_comes_from_state_level_row() {
        let index = RegionIndex::parse(FIXTURE).unwrap();
        let info = index.info("US", Some("New York")).unwrap();
        assert_eq!(info.combined_name.as_deref(), Some("New York, US"));
        assert_eq!(info.population, Some(19453561));
        let country = index.info("Australia", None).unwrap();
        assert_eq!(country.population, Some(25459700));
    }

    #[test]
    fn missing_identity_column_is_malformed() {
        let err = RegionIndex::parse("UID,Province_State\n1,Victoria\n").unwrap_err();
        assert_matches!(err, DashboardError::MalformedTable { .. });
    }
}
