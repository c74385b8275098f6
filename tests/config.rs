use std::time::Duration;

use assert_matches::assert_matches;

use covidview::config::{Config, ConfigLoader, FeedUrls};
use covidview::error::DashboardError;

#[test]
fn explicit_config_file_overrides_feed_urls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("covidview.json");
    std::fs::write(
        &path,
        r#"{
            "confirmed_url": "http://localhost:8000/confirmed.csv",
            "lookup_url": "http://localhost:8000/lookup.csv",
            "timeout_secs": 10
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(resolved.urls.confirmed, "http://localhost:8000/confirmed.csv");
    assert_eq!(resolved.urls.lookup, "http://localhost:8000/lookup.csv");
    assert_eq!(resolved.urls.recovered, FeedUrls::default().recovered);
    assert_eq!(resolved.timeout, Duration::from_secs(10));
}

#[test]
fn missing_explicit_config_path_is_an_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/covidview.json")).unwrap_err();
    assert_matches!(err, DashboardError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("covidview.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, DashboardError::ConfigParse(_));
}

#[test]
fn empty_object_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("covidview.json");
    std::fs::write(&path, "{}").unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(resolved.urls, FeedUrls::default());

    let from_default = ConfigLoader::resolve_config(Config::default());
    assert_eq!(resolved.urls, from_default.urls);
}
