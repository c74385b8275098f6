use assert_matches::assert_matches;

use covidview::dataset::Dataset;
use covidview::domain::Metric;
use covidview::error::DashboardError;
use covidview::feed::FeedClient;

const CONFIRMED: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20
Victoria,Australia,-37.81,144.96,2,50
,Iceland,64.96,-19.02,0,7
";

const RECOVERED: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20
Victoria,Australia,-37.81,144.96,1,30
";

const DEATHS: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20
Victoria,Australia,-37.81,144.96,0,3
";

const LOOKUP: &str = "\
UID,iso2,Admin2,Province_State,Country_Region,Combined_Key,Population
36,AU,,,Australia,Australia,25459700
3602,AU,,Victoria,Australia,\"Victoria, Australia\",6629800
352,IS,,,Iceland,Iceland,341250
";

/// In-memory feed, the test double for the remote CSVs.
struct MockFeed {
    confirmed: &'static str,
    recovered: &'static str,
    deaths: &'static str,
    lookup: &'static str,
}

impl Default for MockFeed {
    fn default() -> Self {
        Self {
            confirmed: CONFIRMED,
            recovered: RECOVERED,
            deaths: DEATHS,
            lookup: LOOKUP,
        }
    }
}

impl FeedClient for MockFeed {
    fn fetch_table(&self, metric: Metric) -> Result<String, DashboardError> {
        let text = match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Recovered => self.recovered,
            Metric::Deaths => self.deaths,
        };
        if text.is_empty() {
            return Err(DashboardError::FeedHttp("connection refused".to_string()));
        }
        Ok(text.to_string())
    }

    fn fetch_lookup(&self) -> Result<String, DashboardError> {
        Ok(self.lookup.to_string())
    }
}

#[test]
fn load_builds_a_complete_dataset() {
    let dataset = Dataset::load(&MockFeed::default()).unwrap();
    assert_eq!(dataset.dates().len(), 2);
    assert_eq!(dataset.as_of().unwrap().to_string(), "2020-01-23");
    assert_eq!(dataset.regions().countries(), vec!["Australia", "Iceland"]);
    assert_eq!(dataset.table(Metric::Confirmed).rows().len(), 2);
}

#[test]
fn unreachable_feed_fails_the_whole_load() {
    let feed = MockFeed {
        deaths: "",
        ..MockFeed::default()
    };
    let err = Dataset::load(&feed).unwrap_err();
    assert_matches!(err, DashboardError::FeedHttp(_));
}

#[test]
fn malformed_table_fails_the_whole_load() {
    let feed = MockFeed {
        recovered: "Province/State,Lat,Long,1/22/20\nVictoria,-37.81,144.96,1\n",
        ..MockFeed::default()
    };
    let err = Dataset::load(&feed).unwrap_err();
    assert_matches!(err, DashboardError::MalformedTable { .. });
}

#[test]
fn mismatched_date_axis_is_inconsistent() {
    let feed = MockFeed {
        recovered: "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20
Victoria,Australia,-37.81,144.96,1,30,45
",
        ..MockFeed::default()
    };
    let err = Dataset::load(&feed).unwrap_err();
    assert_matches!(err, DashboardError::InconsistentSchedule(_));
}
