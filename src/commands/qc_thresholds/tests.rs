use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_yaml::{Number, Value};
use tempfile::TempDir;

use super::*;
use crate::cli::QcThresholdsArgs;
use crate::model::{Direction, FormattingRules, ThresholdRecord, ThresholdRule};

const HANDLER_LIST: &str = r#"
- name: ClusterPFHandler
  warning: 18
  error: unknown
- name: Q30Handler
  warning: 80
  error: unknown
- name: ErrorRateHandler
  allow_missing_error_rate: false
  warning: 2
  error: unknown
- name: ReadsPerSampleHandler
  warning: unknown
  error: 13.5
- name: UndeterminedPercentageHandler
  warning: unknown
  error: 9
- name: UnidentifiedIndexHandler
  significance_threshold: 1
  white_listed_indexes:
    - .*N.*
    - G{6,}
"#;

const KEYED_CONFIG: &str = r#"
default_handlers:
  - name: UndeterminedPercentageHandler
    warning: unknown
    error: 9
  - name: ReadsPerSampleHandler
    warning: unknown
    error: 1
miseq_v3:
  "36-76":
    handlers:
      - name: ClusterPFHandler
        warning: 10
        error: unknown
      - name: Q30Handler
        warning: 85
        error: unknown
      - name: ErrorRateHandler
        warning: 1.5
        error: unknown
      - name: ReadsPerSampleHandler
        warning: unknown
        error: 5
  151:
    handlers:
      - name: ClusterPFHandler
        warning: 18
        error: unknown
      - name: Q30Handler
        warning: 80
        error: unknown
      - name: ErrorRateHandler
        warning: 2
        error: unknown
"#;

fn handler_list() -> Vec<ThresholdRecord> {
    serde_yaml::from_str(HANDLER_LIST).expect("handler list should deserialize")
}

fn rules_value(records: &[ThresholdRecord]) -> Value {
    let rules = convert_to_rules(records, METRIC_MAPPINGS).expect("all metrics present");
    serde_yaml::to_value(FormattingRules::from_rules(rules)).expect("rules should serialize")
}

fn write(root: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = root.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn index_records_keys_every_handler() {
    let records = handler_list();
    let by_name = index_records(&records);
    assert_eq!(by_name.len(), 6);
    assert!(by_name.contains_key("UnidentifiedIndexHandler"));
}

#[test]
fn convert_to_rules_maps_every_table_entry() {
    let value = rules_value(&handler_list());
    let section = &value["table_cond_formatting_rules"];

    let expected: Value = serde_yaml::from_str(
        r#"
Error:
  warn:
    - gt: 2
mqc-generalstats-bcl2fastq-total:
  fail:
    - lt: 13.5
percent_Q30:
  warn:
    - lt: 80
total:
  warn:
    - lt: 18
"#,
    )
    .expect("valid yaml");
    assert_eq!(section, &expected);
}

#[test]
fn unknown_bounds_produce_no_clause() {
    let records = handler_list();
    let rules = convert_to_rules(&records, METRIC_MAPPINGS).expect("all metrics present");

    let total = rules
        .iter()
        .find(|rule| rule.reported_key == "total")
        .expect("total rule");
    assert_eq!(
        total,
        &ThresholdRule {
            reported_key: "total".to_string(),
            direction: Direction::LessThan,
            warn: Some(Number::from(18)),
            fail: None,
        }
    );

    let reads = rules
        .iter()
        .find(|rule| rule.reported_key == "mqc-generalstats-bcl2fastq-total")
        .expect("reads per sample rule");
    assert_eq!(reads.warn, None);
    assert_eq!(reads.fail, Some(Number::from(13.5)));
}

#[test]
fn rule_with_both_bounds_unknown_is_still_emitted() {
    let mut records = handler_list();
    for record in &mut records {
        if record.name == "Q30Handler" {
            record.warning = Some(Value::String("unknown".to_string()));
        }
    }

    let value = rules_value(&records);
    let q30 = &value["table_cond_formatting_rules"]["percent_Q30"];
    assert_eq!(q30, &Value::Mapping(Default::default()));
}

#[test]
fn missing_mapped_metric_is_fatal() {
    let records: Vec<_> = handler_list()
        .into_iter()
        .filter(|record| record.name != "ErrorRateHandler")
        .collect();

    let err = convert_to_rules(&records, METRIC_MAPPINGS).expect_err("metric missing");
    assert!(err.to_string().contains("ErrorRateHandler"));
}

#[test]
fn non_numeric_bound_is_rejected() {
    let records: Vec<ThresholdRecord> = serde_yaml::from_str(
        "[{name: ClusterPFHandler, warning: lots, error: unknown}]",
    )
    .expect("record should deserialize");
    let mapping = &METRIC_MAPPINGS[..1];
    assert!(convert_to_rules(&records, mapping).is_err());

    let records: Vec<ThresholdRecord> = serde_yaml::from_str(
        "[{name: ClusterPFHandler, warning: true, error: unknown}]",
    )
    .expect("record should deserialize");
    assert!(convert_to_rules(&records, mapping).is_err());
}

#[test]
fn unmapped_handler_bounds_are_not_inspected() {
    let dir = TempDir::new().expect("tempdir");
    let handlers = format!(
        "{HANDLER_LIST}- name: SomeFlagHandler\n  warning: true\n  error:\n    nested: [1, 2]\n"
    );
    let config = write(dir.path(), "handlers.yaml", &handlers);

    let records = load_threshold_records(&config, &RunType::default()).expect("records");
    assert_eq!(records.len(), 7);
    assert_eq!(rules_value(&records), rules_value(&handler_list()));
}

#[test]
fn keyed_config_selects_range_and_appends_defaults() {
    let config: serde_yaml::Mapping = serde_yaml::from_str(KEYED_CONFIG).expect("valid yaml");
    let run_type = RunType {
        instrument_and_reagent: Some("miseq_v3".to_string()),
        read_length: Some(51),
    };

    let records = resolve_handler_configs(&config, &run_type).expect("resolved");
    let names: Vec<_> = records.iter().map(|record| record.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ClusterPFHandler",
            "Q30Handler",
            "ErrorRateHandler",
            "ReadsPerSampleHandler",
            "UndeterminedPercentageHandler",
        ]
    );

    let value = rules_value(&records);
    assert_eq!(
        value["table_cond_formatting_rules"]["mqc-generalstats-bcl2fastq-total"]["fail"][0]["lt"],
        Value::Number(Number::from(5))
    );
}

#[test]
fn keyed_config_falls_back_to_closest_read_length() {
    let config: serde_yaml::Mapping = serde_yaml::from_str(KEYED_CONFIG).expect("valid yaml");
    let run_type = RunType {
        instrument_and_reagent: Some("miseq_v3".to_string()),
        read_length: Some(150),
    };

    let records = resolve_handler_configs(&config, &run_type).expect("resolved");
    let value = rules_value(&records);
    let section = &value["table_cond_formatting_rules"];
    assert_eq!(section["total"]["warn"][0]["lt"], Value::Number(Number::from(18)));
    // Default handler fills in the metric the 151 entry leaves out.
    assert_eq!(
        section["mqc-generalstats-bcl2fastq-total"]["fail"][0]["lt"],
        Value::Number(Number::from(1))
    );
}

#[test]
fn keyed_config_requires_known_instrument() {
    let config: serde_yaml::Mapping = serde_yaml::from_str(KEYED_CONFIG).expect("valid yaml");
    let run_type = RunType {
        instrument_and_reagent: Some("hiseq_v4".to_string()),
        read_length: Some(151),
    };
    assert!(resolve_handler_configs(&config, &run_type).is_err());

    let run_type = RunType {
        instrument_and_reagent: Some("miseq_v3".to_string()),
        read_length: None,
    };
    assert!(resolve_handler_configs(&config, &run_type).is_err());
}

#[test]
fn read_length_uses_first_number() {
    assert_eq!(parse_read_length("151-151").expect("valid"), 151);
    assert_eq!(parse_read_length("76").expect("valid"), 76);
    assert!(parse_read_length("long").is_err());
}

#[test]
fn qc_thresholds_output_is_reproducible() {
    let dir = TempDir::new().expect("tempdir");
    let config = write(dir.path(), "checkqc_config.yaml", KEYED_CONFIG);
    write(
        dir.path(),
        "RunInfo.xml",
        r#"<RunInfo><Run Id="r"><Reads>
             <Read Number="1" NumCycles="151" IsIndexedRead="N" />
             <Read Number="2" NumCycles="10" IsIndexedRead="Y" />
           </Reads></Run></RunInfo>"#,
    );
    let output = dir.path().join("qc_thresholds.yaml");

    let args = QcThresholdsArgs {
        runfolder: dir.path().to_path_buf(),
        config,
        instrument_and_reagent: Some("miseq_v3".to_string()),
        read_length: None,
        output: output.clone(),
    };

    run(args.clone()).expect("first run");
    let first = fs::read_to_string(&output).expect("first output");
    run(args).expect("second run");
    let second = fs::read_to_string(&output).expect("second output");
    assert_eq!(first, second);

    let value: Value = serde_yaml::from_str(&first).expect("output is yaml");
    assert_eq!(
        value["table_cond_formatting_rules"]["Error"]["warn"][0]["gt"],
        Value::Number(Number::from(2))
    );
    let keys: Vec<_> = first
        .lines()
        .filter(|line| line.starts_with("  ") && !line.starts_with("   "))
        .collect();
    assert_eq!(
        keys,
        vec![
            "  Error:",
            "  mqc-generalstats-bcl2fastq-total:",
            "  percent_Q30:",
            "  total:",
        ]
    );
}

#[test]
fn plain_handler_list_needs_no_run_type() {
    let dir = TempDir::new().expect("tempdir");
    let config = write(dir.path(), "handlers.yaml", HANDLER_LIST);

    let records = load_threshold_records(&config, &RunType::default()).expect("records");
    assert_eq!(records.len(), 6);
}
