use chrono::{TimeZone, Utc};
use ecfr_insight::aggregator::{
    build_report, run, GroupFilter, Granularity, Metric, RunParams,
};
use ecfr_insight::output::{read_report, write_json, write_report};
use ecfr_insight::parser::{MetricView, RawRecord};
use ecfr_insight::utils::config::{EngineConfig, SCHEMA_VERSION};
use ecfr_insight::utils::OutputError;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn records() -> Vec<RawRecord> {
    vec![
        RawRecord {
            title_number: Some("7\u{2014}Agriculture".to_string()),
            kind: Some("section".to_string()),
            label: Some("a b c".to_string()),
            date: Some("2022-06-01".to_string()),
            ..Default::default()
        },
        RawRecord {
            title_number: Some("12\u{2014}Banks and Banking".to_string()),
            kind: Some("part".to_string()),
            label: Some("d e".to_string()),
            ..Default::default()
        },
    ]
}

#[test]
fn test_flat_report_round_trip() {
    let params = RunParams::default();
    let result = run(&records(), &params).unwrap();
    let report = build_report(&result, &params, &[Metric::WordCount], &GroupFilter::All);

    let temp_file = NamedTempFile::new().unwrap();
    write_report(&report, temp_file.path()).unwrap();
    let loaded = read_report(temp_file.path()).unwrap();

    assert_eq!(loaded, report);
    assert_eq!(loaded.version, SCHEMA_VERSION);
    assert_eq!(loaded.groups.len(), 2);
    assert!(loaded.parameters.granularity.is_none());
}

#[test]
fn test_time_series_report_shape() {
    let config = EngineConfig {
        granularity: Granularity::Annually,
        lookback_years: 4,
        ..Default::default()
    };
    let params = RunParams::time_series(&config, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let result = run(&records(), &params).unwrap();
    let report = build_report(
        &result,
        &params,
        &[Metric::SectionCount],
        &GroupFilter::parse("7", &config.delimiter),
    );

    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("reports/series.json");
    write_report(&report, &path).unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["parameters"]["granularity"], "annually");
    assert_eq!(json["parameters"]["group_filter"], "7");
    assert_eq!(json["views"][0]["kind"], "time_series");
    assert_eq!(json["views"][0]["metric"], "sectionCount");
    assert_eq!(json["views"][0]["rows"][0]["points"].as_array().unwrap().len(), 5);
    assert_eq!(json["skipped"]["missing_timestamp"], 1);

    let loaded = read_report(&path).unwrap();
    match &loaded.views[0] {
        MetricView::TimeSeries { rows, .. } => assert_eq!(rows[0].label, "Agriculture"),
        other => panic!("expected a time-series view, got {:?}", other),
    }
}

#[test]
fn test_write_json_to_directory_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        write_json(&records(), temp_dir.path()),
        Err(OutputError::InvalidPath(_))
    ));
}

#[test]
fn test_read_missing_report() {
    assert!(matches!(
        read_report("/nonexistent/report.json"),
        Err(OutputError::WriteFailed(_))
    ));
}
