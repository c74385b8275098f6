use chrono::NaiveDate;

use crate::domain::{Metric, RegionKey};
use crate::error::DashboardError;

const COUNTRY_COLUMN: &str = "Country/Region";
const STATE_COLUMN: &str = "Province/State";

/// One region's running cumulative counts, aligned to the owning table's
/// date axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesRow {
    pub key: RegionKey,
    pub values: Vec<u64>,
}

/// One metric's full time series: one row per region key, one column per
/// report date. Parsed once at startup, immutable afterwards.
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    metric: Metric,
    dates: Vec<NaiveDate>,
    rows: Vec<TimeSeriesRow>,
}

impl TimeSeriesTable {
    /// Parse one feed CSV. The identity columns must both be present; every
    /// header that parses as a feed date (`m/d/yy`) becomes part of the date
    /// axis and everything else (Lat, Long) is dropped. Counts must be
    /// numeric; a blank cell reads as 0, which is how the feed writes
    /// regions with no reports yet.
    pub fn parse(metric: Metric, text: &str) -> Result<Self, DashboardError> {
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|err| malformed(metric, format!("unreadable header row: {err}")))?
            .clone();

        let country_idx = headers
            .iter()
            .position(|name| name == COUNTRY_COLUMN)
            .ok_or_else(|| malformed(metric, format!("missing {COUNTRY_COLUMN} column")))?;
        let state_idx = headers
            .iter()
            .position(|name| name == STATE_COLUMN)
            .ok_or_else(|| malformed(metric, format!("missing {STATE_COLUMN} column")))?;

        let mut date_columns = Vec::new();
        for (idx, name) in headers.iter().enumerate() {
            if let Ok(date) = NaiveDate::parse_from_str(name, "%m/%d/%y") {
                date_columns.push((idx, date));
            }
        }
        if date_columns.is_empty() {
            return Err(malformed(metric, "no date columns".to_string()));
        }
        for window in date_columns.windows(2) {
            if window[1].1 <= window[0].1 {
                return Err(DashboardError::InconsistentSchedule(format!(
                    "{metric} table dates not strictly increasing around {}",
                    window[1].1
                )));
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|err| malformed(metric, format!("unreadable record: {err}")))?;
            let country = record
                .get(country_idx)
                .ok_or_else(|| malformed(metric, "record missing country cell".to_string()))?;
            let state = record.get(state_idx).unwrap_or("");
            let key = RegionKey::from_feed(country, state);

            let mut values = Vec::with_capacity(date_columns.len());
            for (idx, date) in &date_columns {
                let cell = record.get(*idx).unwrap_or("").trim();
                if cell.is_empty() {
                    values.push(0);
                    continue;
                }
                let value = cell.parse::<u64>().map_err(|_| {
                    malformed(metric, format!("non-numeric count {cell:?} for {key} on {date}"))
                })?;
                values.push(value);
            }
            rows.push(TimeSeriesRow { key, values });
        }

        Ok(Self {
            metric,
            dates: date_columns.into_iter().map(|(_, date)| date).collect(),
            rows,
        })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// The shared column axis. Strictly increasing, identical for every row;
    /// both are enforced in `parse`, so queries never re-check.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[TimeSeriesRow] {
        &self.rows
    }

    /// All rows for `country`, narrowed to `state` when given and non-empty.
    /// Exact string match on the raw data; an empty result is not an error,
    /// callers decide whether "no rows" matters.
    pub fn rows_for(&self, country: &str, state: Option<&str>) -> Vec<&TimeSeriesRow> {
        let state = state.filter(|value| !value.is_empty());
        self.rows
            .iter()
            .filter(|row| row.key.country == country)
            .filter(|row| match state {
                Some(wanted) => row.key.state.as_deref() == Some(wanted),
                None => true,
            })
            .collect()
    }

    /// Value at the last date column. Each row is already a running
    /// cumulative count, so this is the current total for the region.
    pub fn latest(row: &TimeSeriesRow) -> u64 {
        row.values.last().copied().unwrap_or(0)
    }
}

fn malformed(metric: Metric, reason: String) -> DashboardError {
    DashboardError::MalformedTable {
        table: metric.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const FIXTURE: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20
New South Wales,Australia,-33.8688,151.2093,1,4,100
Victoria,Australia,-37.8136,144.9631,0,2,50
,Iceland,64.9631,-19.0208,0,0,7
";

    #[test]
    fn parse_splits_identity_and_date_columns() {
        let table = TimeSeriesTable::parse(Metric::Confirmed, FIXTURE).unwrap();
        assert_eq!(table.dates().len(), 3);
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[2].key, RegionKey::country("Iceland"));
        assert_eq!(table.rows()[2].values, vec![0, 0, 7]);
    }

    #[test]
    fn rows_for_filters_by_state_when_given() {
        let table = TimeSeriesTable::parse(Metric::Confirmed, FIXTURE).unwrap();
        assert_eq!(table.rows_for("Australia", None).len(), 2);
        let victoria = table.rows_for("Australia", Some("Victoria"));
        assert_eq!(victoria.len(), 1);
        assert_eq!(TimeSeriesTable::latest(victoria[0]), 50);
        assert!(table.rows_for("Australia", Some("Tasmania")).is_empty());
    }

    #[test]
    fn rows_for_treats_empty_state_as_unspecified() {
        let table = TimeSeriesTable::parse(Metric::Confirmed, FIXTURE).unwrap();
        assert_eq!(table.rows_for("Australia", Some("")).len(), 2);
    }

    #[test]
    fn missing_identity_column_is_malformed() {
        let text = "Province/State,Lat,Long,1/22/20\nVictoria,-37.8,144.9,1\n";
        let err = TimeSeriesTable::parse(Metric::Confirmed, text).unwrap_err();
        assert_matches!(err, DashboardError::MalformedTable { .. });
    }

    #[test]
    fn non_numeric_count_is_malformed() {
        let text = "Province/State,Country/Region,1/22/20\nVictoria,Australia,many\n";
        let err = TimeSeriesTable::parse(Metric::Deaths, text).unwrap_err();
        assert_matches!(err, DashboardError::MalformedTable { .. });
    }

    #[test]
    fn decreasing_dates_are_inconsistent() {
        let text = "Province/State,Country/Region,1/23/20,1/22/20\nVictoria,Australia,1,2\n";
        let err = TimeSeriesTable::parse(Metric::Confirmed, text).unwrap_err();
        assert_matches!(err, DashboardError::InconsistentSchedule(_));
    }

    #[test]
    fn blank_cells_read_as_zero() {
        let text = "Province/State,Country/Region,1/22/20,1/23/20\nVictoria,Australia,,3\n";
        let table = TimeSeriesTable::parse(Metric::Confirmed, text).unwrap();
        assert_eq!(table.rows()[0].values, vec![0, 3]);
    }
}
