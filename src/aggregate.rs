use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::domain::{Metric, RegionKey, Totals};
use crate::table::TimeSeriesTable;

/// One matching row's full per-date sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesRow {
    pub key: RegionKey,
    pub values: Vec<u64>,
}

/// Per-date values for every matching row, stacked per metric. Callers
/// decide whether to sum across rows or chart them individually.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySeries {
    pub dates: Vec<NaiveDate>,
    pub confirmed: Vec<SeriesRow>,
    pub recovered: Vec<SeriesRow>,
    pub deaths: Vec<SeriesRow>,
}

/// The single source of truth for "what are the numbers for this query".
/// Stateless over the immutable dataset: no caching, every call re-scans
/// the relevant rows, so results always reflect the loaded tables.
#[derive(Clone)]
pub struct AggregationService {
    data: Arc<Dataset>,
}

impl AggregationService {
    pub fn new(data: Arc<Dataset>) -> Self {
        Self { data }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    /// Sum of each metric's last-date column over the rows matching the
    /// query. A metric with zero matching rows contributes 0 rather than
    /// failing the query; reporting gaps are data, not errors. Selection is
    /// literal on the tables, so a state unknown to the region index simply
    /// matches nothing.
    pub fn totals(&self, country: &str, state: Option<&str>) -> Totals {
        Totals {
            confirmed: self.metric_total(Metric::Confirmed, country, state),
            recovered: self.metric_total(Metric::Recovered, country, state),
            deaths: self.metric_total(Metric::Deaths, country, state),
        }
    }

    fn metric_total(&self, metric: Metric, country: &str, state: Option<&str>) -> u64 {
        self.data
            .table(metric)
            .rows_for(country, state)
            .into_iter()
            .map(TimeSeriesTable::latest)
            .sum()
    }

    /// Full per-date sequences for the matching rows of every metric.
    pub fn entry_series(&self, country: &str, state: Option<&str>) -> EntrySeries {
        let stack = |metric: Metric| {
            self.data
                .table(metric)
                .rows_for(country, state)
                .into_iter()
                .map(|row| SeriesRow {
                    key: row.key.clone(),
                    values: row.values.clone(),
                })
                .collect()
        };
        EntrySeries {
            dates: self.data.dates().to_vec(),
            confirmed: stack(Metric::Confirmed),
            recovered: stack(Metric::Recovered),
            deaths: stack(Metric::Deaths),
        }
    }
}
