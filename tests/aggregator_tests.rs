//! Integration tests for the aggregation engine.
//!
//! Covers the flat and bucketed views end to end, from raw records to
//! selected metric rows.

use chrono::{DateTime, TimeZone, Utc};
use ecfr_insight::aggregator::{
    generate_buckets, nearest_bucket, run, select_flat, select_series, select_total, GroupFilter,
    GroupKey, Granularity, LookbackWindow, Metric, RunParams,
};
use ecfr_insight::parser::RawRecord;
use ecfr_insight::utils::config::{EngineConfig, DEFAULT_DELIMITER};
use pretty_assertions::assert_eq;

fn record(title: Option<&str>, kind: &str, label: &str, date: Option<&str>) -> RawRecord {
    RawRecord {
        title_number: title.map(str::to_string),
        kind: Some(kind.to_string()),
        label: Some(label.to_string()),
        date: date.map(str::to_string),
        ..Default::default()
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn series_params(granularity: Granularity, years: u32) -> RunParams {
    let config = EngineConfig {
        granularity,
        lookback_years: years,
        ..Default::default()
    };
    RunParams::time_series(&config, now())
}

fn sample_records() -> Vec<RawRecord> {
    vec![
        record(Some("7\u{2014}Agriculture"), "section", "a b c", Some("2020-03-02")),
        record(Some("7\u{2014}Agriculture"), "part", "d e", Some("2021-07-15")),
        record(Some("12\u{2014}Banks and Banking"), "section", "one two three four", Some("2022-11-30")),
        record(Some("12\u{2014}Banks and Banking"), "section", "five", None),
        record(Some("2\u{2014}Grants"), "other", "x y z", Some("not a date")),
        record(None, "section", "orphan words here", Some("2020-01-01")),
    ]
}

#[test]
fn test_scenario_single_section() {
    let records = vec![record(Some("7\u{2014}Agriculture"), "section", "a b c", None)];
    let result = run(&records, &RunParams::default()).unwrap();

    assert_eq!(result.groups.len(), 1);
    let seven = &result.groups[&GroupKey::from("7")];
    assert_eq!(seven.name, "Agriculture");
    assert_eq!(seven.metrics.word_count, 3);
    assert_eq!(seven.metrics.section_count, 1);
    assert_eq!(seven.metrics.part_count, 0);
}

#[test]
fn test_scenario_first_seen_name_wins() {
    let records = vec![
        record(Some("7\u{2014}Agriculture"), "section", "a", None),
        record(Some("7 \u{2014}  Agriculture Dept "), "section", "b", None),
    ];
    let result = run(&records, &RunParams::default()).unwrap();

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[&GroupKey::from("7")].name, "Agriculture");
    assert_eq!(result.groups[&GroupKey::from("7")].metrics.section_count, 2);
}

#[test]
fn test_scenario_missing_title_excluded() {
    let with_orphan = vec![
        record(Some("7\u{2014}Agriculture"), "section", "a", Some("2020-01-01")),
        record(None, "section", "lost words", Some("2020-01-01")),
    ];
    let without_orphan = vec![with_orphan[0].clone()];

    let params = series_params(Granularity::Annually, 10);
    let a = run(&with_orphan, &params).unwrap();
    let b = run(&without_orphan, &params).unwrap();

    assert_eq!(a.groups, b.groups);
    assert_eq!(a.series.as_ref().unwrap().data, b.series.as_ref().unwrap().data);
    assert_eq!(a.skipped.missing_entity, 1);
}

#[test]
fn test_scenario_all_ratio_is_ratio_of_sums() {
    let mut records = Vec::new();
    for _ in 0..10 {
        records.push(record(
            Some("1\u{2014}General"),
            "section",
            "w w w w w w w w w w",
            Some("2023-01-01"),
        ));
    }
    // 50 words, no sections
    for _ in 0..5 {
        records.push(record(
            Some("2\u{2014}Grants"),
            "part",
            "w w w w w w w w w w",
            Some("2023-01-01"),
        ));
    }

    let params = series_params(Granularity::Annually, 3);
    let result = run(&records, &params).unwrap();

    let total = select_total(&result, Metric::AvgWordsPerSection);
    assert!((total.value - 150.0 / 11.0).abs() < 1e-9);

    let rows = select_series(&result, Metric::AvgWordsPerSection, &GroupFilter::All);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, "All");
    let bucket = rows[0]
        .points
        .iter()
        .find(|p| p.bucket == Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
        .unwrap();
    assert!((bucket.value - 150.0 / 11.0).abs() < 1e-9);
    assert!(rows[0].points.iter().all(|p| p.value.is_finite() && p.value >= 0.0));
}

#[test]
fn test_order_independence() {
    let records = sample_records();
    let params = series_params(Granularity::Monthly, 5);
    let reference = run(&records, &params).unwrap();

    let mut reversed = records.clone();
    reversed.reverse();
    assert_eq!(run(&reversed, &params).unwrap(), reference);

    let mut rotated = records;
    rotated.rotate_left(2);
    assert_eq!(run(&rotated, &params).unwrap(), reference);
}

#[test]
fn test_chunk_size_independence() {
    let records = sample_records();
    let reference = run(&records, &series_params(Granularity::Quarterly, 5)).unwrap();

    for chunk_size in [1, 2, 3, 100] {
        let params = RunParams {
            chunk_size,
            ..series_params(Granularity::Quarterly, 5)
        };
        assert_eq!(run(&records, &params).unwrap(), reference);
    }
}

#[test]
fn test_adding_record_only_grows_its_group() {
    let records = sample_records();
    let params = series_params(Granularity::Annually, 5);
    let before = run(&records, &params).unwrap();

    let mut extended = records;
    extended.push(record(Some("7\u{2014}Agriculture"), "section", "more words", Some("2023-05-05")));
    let after = run(&extended, &params).unwrap();

    let key = GroupKey::from("7");
    let (b, a) = (&before.groups[&key].metrics, &after.groups[&key].metrics);
    assert!(a.word_count >= b.word_count);
    assert!(a.section_count > b.section_count);
    assert!(a.part_count >= b.part_count);

    for (other, totals) in &before.groups {
        if *other != key {
            assert_eq!(after.groups[other], *totals);
            assert_eq!(
                after.series.as_ref().unwrap().data.groups[other],
                before.series.as_ref().unwrap().data.groups[other]
            );
        }
    }
}

#[test]
fn test_zero_section_ratio_is_finite() {
    let records = vec![
        record(Some("3"), "part", "a b c d", None),
        record(Some("4"), "other", "", None),
    ];
    let result = run(&records, &RunParams::default()).unwrap();

    for row in select_flat(&result, Metric::AvgWordsPerSection, &GroupFilter::All) {
        assert!(row.value.is_finite());
        assert!(row.value >= 0.0);
    }
    assert_eq!(
        select_flat(&result, Metric::AvgWordsPerSection, &GroupFilter::parse("3", DEFAULT_DELIMITER))[0].value,
        4.0
    );
}

#[test]
fn test_every_group_has_every_bucket() {
    let params = series_params(Granularity::Monthly, 5);
    let result = run(&sample_records(), &params).unwrap();
    let series = result.series.unwrap();

    assert_eq!(series.data.buckets.len(), 61);
    assert_eq!(series.data.groups.len(), result.groups.len());
    for accumulators in series.data.groups.values() {
        assert_eq!(accumulators.len(), series.data.buckets.len());
    }

    // Title 2 only has an unparseable date
    assert!(series.data.groups[&GroupKey::from("2")]
        .iter()
        .all(|acc| acc.is_empty()));
    assert_eq!(result.skipped.unparseable_timestamp, 1);
    assert_eq!(result.skipped.missing_timestamp, 1);
}

#[test]
fn test_nearest_bucket_assignment() {
    let window = LookbackWindow::new(
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap(),
    );
    let buckets = generate_buckets(Granularity::Monthly, &window);
    assert_eq!(buckets.len(), 2);

    let early = Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2020, 1, 20, 0, 0, 0).unwrap();
    let midpoint = Utc.with_ymd_and_hms(2020, 1, 16, 12, 0, 0).unwrap();
    assert_eq!(nearest_bucket(&buckets, early), Some(0));
    assert_eq!(nearest_bucket(&buckets, late), Some(1));
    assert_eq!(nearest_bucket(&buckets, midpoint), Some(0));
}

#[test]
fn test_empty_input_still_has_buckets() {
    let result = run(&[], &series_params(Granularity::Annually, 3)).unwrap();

    assert!(result.groups.is_empty());
    let rows = select_series(&result, Metric::WordCount, &GroupFilter::All);
    assert_eq!(rows[0].points.len(), 4);
    assert!(rows[0].points.iter().all(|p| p.value == 0.0));

    let series = result.series.unwrap();
    assert_eq!(series.data.buckets.len(), 4);
    assert!(series.data.groups.is_empty());
}

#[test]
fn test_group_filter_by_full_label() {
    let result = run(&sample_records(), &RunParams::default()).unwrap();
    let filter = GroupFilter::parse("12\u{2014}Banks and Banking", DEFAULT_DELIMITER);

    let rows = select_flat(&result, Metric::SectionCount, &filter);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "Banks and Banking");
    assert_eq!(rows[0].value, 2.0);

    let unknown = GroupFilter::parse("99", DEFAULT_DELIMITER);
    assert!(select_flat(&result, Metric::SectionCount, &unknown).is_empty());
}

#[test]
fn test_unknown_group_has_no_series_rows() {
    let result = run(&sample_records(), &series_params(Granularity::Monthly, 5)).unwrap();
    assert!(result.series.is_some());

    let unknown = GroupFilter::parse("99", DEFAULT_DELIMITER);
    assert!(select_series(&result, Metric::WordCount, &unknown).is_empty());

    let known = GroupFilter::parse("7", DEFAULT_DELIMITER);
    assert_eq!(select_series(&result, Metric::WordCount, &known).len(), 1);
}

#[test]
fn test_flat_rows_in_numeric_key_order() {
    let result = run(&sample_records(), &RunParams::default()).unwrap();
    let keys: Vec<String> = select_flat(&result, Metric::WordCount, &GroupFilter::All)
        .into_iter()
        .map(|row| row.key)
        .collect();

    assert_eq!(keys, vec!["2", "7", "12"]);
}

#[test]
fn test_flat_result_has_no_series_rows() {
    let result = run(&sample_records(), &RunParams::default()).unwrap();
    assert!(select_series(&result, Metric::WordCount, &GroupFilter::All).is_empty());
}
