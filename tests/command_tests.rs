use ecfr_insight::commands::{
    execute_aggregate, execute_flatten, execute_rollup, execute_timeseries, validate_args,
    AggregateArgs, FlattenArgs, InputArgs, RollupArgs, TimeSeriesArgs,
};
use ecfr_insight::aggregator::{Granularity, Metric};
use ecfr_insight::output::read_report;
use ecfr_insight::parser::read_records;
use ecfr_insight::utils::config::{EngineConfig, DEFAULT_DELIMITER};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;

const RECORDS: &str = r#"[
    {"title_number": "7—Agriculture", "type": "section", "label": "a b c", "date": "2021-03-01"},
    {"title_number": "7—Agriculture", "type": "part", "label": "d", "date": "2022-03-01"},
    {"title_number": "40—Environment", "type": "section", "label": "e f", "date": "2023-03-01"},
    {"type": "section", "label": "orphan"}
]"#;

fn input_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("records.json");
    std::fs::write(&path, RECORDS).unwrap();
    path
}

#[test]
fn test_validate_args_valid() {
    let args = AggregateArgs {
        input: InputArgs {
            path: PathBuf::from("records.json"),
            titles: false,
        },
        output: Some(PathBuf::from("report.json")),
        ..Default::default()
    };

    assert!(validate_args(&args).is_ok());
}

#[test]
fn test_validate_args_empty_input() {
    let args = AggregateArgs {
        output: Some(PathBuf::from("report.json")),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_lookback_too_large() {
    let args = AggregateArgs {
        input: InputArgs {
            path: PathBuf::from("records.json"),
            titles: false,
        },
        print_summary: true,
        config: EngineConfig {
            lookback_years: 10_000,
            ..Default::default()
        },
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_execute_aggregate_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out/report.json");

    execute_aggregate(AggregateArgs {
        input: InputArgs {
            path: input_file(&dir),
            titles: false,
        },
        metrics: vec![Metric::WordCount, Metric::PartCount],
        output: Some(output.clone()),
        ..Default::default()
    })
    .unwrap();

    let report = read_report(&output).unwrap();
    assert_eq!(report.record_count, 4);
    assert_eq!(report.skipped.missing_entity, 1);
    assert_eq!(report.views.len(), 2);
    assert_eq!(report.groups[0].key, "7");
    assert_eq!(report.groups[1].key, "40");
}

#[test]
fn test_execute_timeseries_writes_buckets() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("series.json");

    execute_timeseries(TimeSeriesArgs {
        aggregate: AggregateArgs {
            input: InputArgs {
                path: input_file(&dir),
                titles: false,
            },
            output: Some(output.clone()),
            config: EngineConfig {
                granularity: Granularity::Annually,
                lookback_years: 5,
                ..Default::default()
            },
            ..Default::default()
        },
        now: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        ..Default::default()
    })
    .unwrap();

    let report = read_report(&output).unwrap();
    assert_eq!(report.parameters.bucket_count, Some(6));
    assert_eq!(report.views[0].row_count(), 1);
}

#[test]
fn test_execute_aggregate_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = execute_aggregate(AggregateArgs {
        input: InputArgs {
            path: dir.path().join("missing.json"),
            titles: false,
        },
        print_summary: true,
        ..Default::default()
    });

    assert!(result.is_err());
}

#[test]
fn test_execute_rollup_writes_years() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rollup.json");

    execute_rollup(RollupArgs {
        input: InputArgs {
            path: input_file(&dir),
            titles: false,
        },
        output: Some(output.clone()),
        ..Default::default()
    })
    .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["years"]["2021"]["7"]["total"]["word_count"], 3);
    assert_eq!(json["years"]["2022"]["7"]["months"][2]["part_count"], 1);
    assert_eq!(json["skipped"]["missing_entity"], 1);
}

#[test]
fn test_execute_flatten_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("titles.json");
    let output = dir.path().join("flat.json");
    std::fs::write(
        &input,
        r#"{"label": "Title 40 - Protection of Environment",
            "children": [{"type": "section", "label": "§ 1", "description": "air water"}]}"#,
    )
    .unwrap();

    execute_flatten(FlattenArgs {
        input,
        output: output.clone(),
        delimiter: DEFAULT_DELIMITER.to_string(),
    })
    .unwrap();

    let records = read_records(&output).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].title_number.as_deref(),
        Some("40\u{2014}Protection of Environment")
    );
    assert_eq!(records[0].word_count, Some(2));
}
