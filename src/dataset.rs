use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::Metric;
use crate::error::DashboardError;
use crate::feed::FeedClient;
use crate::regions::RegionIndex;
use crate::table::TimeSeriesTable;

/// The process-wide dataset: three metric tables plus the region index,
/// loaded in one blocking fail-fast step at startup. Immutable afterwards;
/// a refresh means building a whole new `Dataset`.
#[derive(Debug)]
pub struct Dataset {
    confirmed: TimeSeriesTable,
    recovered: TimeSeriesTable,
    deaths: TimeSeriesTable,
    regions: RegionIndex,
}

impl Dataset {
    /// Fetch and parse all four feeds. Any fetch or parse failure aborts the
    /// load; the process must not serve queries over a partial dataset.
    pub fn load(client: &dyn FeedClient) -> Result<Arc<Self>, DashboardError> {
        info!("loading global time-series dataset");
        let confirmed = Self::load_table(client, Metric::Confirmed)?;
        let recovered = Self::load_table(client, Metric::Recovered)?;
        let deaths = Self::load_table(client, Metric::Deaths)?;

        let lookup = client.fetch_lookup()?;
        debug!(bytes = lookup.len(), "lookup table fetched");
        let regions = RegionIndex::parse(&lookup)?;

        let dataset = Self::from_parts(confirmed, recovered, deaths, regions)?;
        info!(
            dates = dataset.dates().len(),
            countries = dataset.regions().countries().len(),
            "dataset ready"
        );
        Ok(Arc::new(dataset))
    }

    fn load_table(
        client: &dyn FeedClient,
        metric: Metric,
    ) -> Result<TimeSeriesTable, DashboardError> {
        let text = client.fetch_table(metric)?;
        debug!(%metric, bytes = text.len(), "feed fetched");
        TimeSeriesTable::parse(metric, &text)
    }

    /// Assemble a dataset from already-parsed parts, enforcing the shared
    /// date axis across the three tables.
    pub fn from_parts(
        confirmed: TimeSeriesTable,
        recovered: TimeSeriesTable,
        deaths: TimeSeriesTable,
        regions: RegionIndex,
    ) -> Result<Self, DashboardError> {
        for table in [&recovered, &deaths] {
            if table.dates() != confirmed.dates() {
                return Err(DashboardError::InconsistentSchedule(format!(
                    "{} table disagrees with confirmed on the date axis",
                    table.metric()
                )));
            }
        }
        Ok(Self {
            confirmed,
            recovered,
            deaths,
            regions,
        })
    }

    pub fn table(&self, metric: Metric) -> &TimeSeriesTable {
        match metric {
            Metric::Confirmed => &self.confirmed,
            Metric::Recovered => &self.recovered,
            Metric::Deaths => &self.deaths,
        }
    }

    pub fn regions(&self) -> &RegionIndex {
        &self.regions
    }

    /// The shared date axis (identical across tables after `from_parts`).
    pub fn dates(&self) -> &[NaiveDate] {
        self.confirmed.dates()
    }

    /// Last reported date, the column every totals query reads.
    pub fn as_of(&self) -> Option<NaiveDate> {
        self.dates().last().copied()
    }
}
