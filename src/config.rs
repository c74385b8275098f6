use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Metric;
use crate::error::DashboardError;

const DEFAULT_CONFIG_FILE: &str = "covidview.json";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const CSSE_TIME_SERIES: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series";
const CSSE_LOOKUP: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/UID_ISO_FIPS_LookUp_Table.csv";

/// On-disk config shape. Every field is optional; anything left out falls
/// back to the Johns Hopkins CSSE defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub confirmed_url: Option<String>,
    #[serde(default)]
    pub recovered_url: Option<String>,
    #[serde(default)]
    pub deaths_url: Option<String>,
    #[serde(default)]
    pub lookup_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUrls {
    pub confirmed: String,
    pub recovered: String,
    pub deaths: String,
    pub lookup: String,
}

impl FeedUrls {
    pub fn for_metric(&self, metric: Metric) -> &str {
        match metric {
            Metric::Confirmed => &self.confirmed,
            Metric::Recovered => &self.recovered,
            Metric::Deaths => &self.deaths,
        }
    }
}

impl Default for FeedUrls {
    fn default() -> Self {
        Self {
            confirmed: format!("{CSSE_TIME_SERIES}/time_series_covid19_confirmed_global.csv"),
            recovered: format!("{CSSE_TIME_SERIES}/time_series_covid19_recovered_global.csv"),
            deaths: format!("{CSSE_TIME_SERIES}/time_series_covid19_deaths_global.csv"),
            lookup: CSSE_LOOKUP.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub urls: FeedUrls,
    pub timeout: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolve the effective config. An explicit `path` must exist and
    /// parse; the default `covidview.json` is optional and its absence
    /// means "all defaults".
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DashboardError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Self::resolve_config(Config::default()));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DashboardError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DashboardError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let defaults = FeedUrls::default();
        ResolvedConfig {
            urls: FeedUrls {
                confirmed: config.confirmed_url.unwrap_or(defaults.confirmed),
                recovered: config.recovered_url.unwrap_or(defaults.recovered),
                deaths: config.deaths_url.unwrap_or(defaults.deaths),
                lookup: config.lookup_url.unwrap_or(defaults.lookup),
            },
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_csse_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.urls, FeedUrls::default());
        assert_eq!(resolved.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(resolved.urls.confirmed.contains("confirmed_global"));
    }

    #[test]
    fn overrides_take_precedence() {
        let config = Config {
            deaths_url: Some("http://localhost/deaths.csv".to_string()),
            timeout_secs: Some(5),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config);
        assert_eq!(resolved.urls.deaths, "http://localhost/deaths.csv");
        assert_eq!(resolved.urls.confirmed, FeedUrls::default().confirmed);
        assert_eq!(resolved.timeout, Duration::from_secs(5));
    }

    #[test]
    fn for_metric_routes_to_the_right_feed() {
        let urls = FeedUrls::default();
        assert!(urls.for_metric(Metric::Recovered).contains("recovered_global"));
        assert!(urls.for_metric(Metric::Deaths).contains("deaths_global"));
    }
}
