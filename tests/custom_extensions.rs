//! Library-level tests for user-registered extension sources.

use std::sync::Arc;

use fragmap::bed::parse_records;
use fragmap::commands::IntersectCommand;
use fragmap::config::{IntersectionConfig, IntersectionMode};
use fragmap::extension::{
    aggregator_fn, classifier_fn, extractor_fn, Classifier, ExtensionCatalog, ExtensionSpec,
    Value,
};
use fragmap::genome::Genome;
use fragmap::interval::TypedRecord;
use fragmap::{Fragment, IntersectError, Record};

fn records(content: &str) -> Vec<Record> {
    parse_records(content).unwrap()
}

fn run(cmd: &IntersectCommand, a: &str, b: &str) -> Result<String, IntersectError> {
    let genome = Genome::from_names(["chr1", "chr2"]);
    let mut output = Vec::new();
    cmd.run(
        records(a).into_iter().map(Ok),
        records(b).into_iter().map(Ok),
        &genome,
        &mut output,
    )?;
    Ok(String::from_utf8(output).unwrap())
}

fn specs(strings: &[&str]) -> Vec<ExtensionSpec> {
    strings.iter().map(|s| s.parse().unwrap()).collect()
}

/// Longest overlapping "b", by name column.
struct LongestName;

impl Classifier for LongestName {
    fn classify(&self, fragment: &Fragment) -> Value {
        fragment
            .b
            .iter()
            .max_by_key(|b| b.len())
            .and_then(|b| match &b.payload {
                TypedRecord::Bed(bed) => bed.name().map(Value::from),
                _ => None,
            })
            .unwrap_or_default()
    }
}

fn catalog() -> ExtensionCatalog {
    let mut catalog = ExtensionCatalog::with_builtins();
    catalog.register_classifier("lab", "longest_name", Arc::new(LongestName));
    catalog.register_classifier(
        "lab",
        "span",
        classifier_fn(|f: &Fragment| Value::from(f.a.len())),
    );
    catalog.register_extractor(
        "lab",
        "length",
        extractor_fn(|r: &Record| Ok(Value::from(r.len()))),
    );
    catalog.register_aggregator(
        "lab",
        "range",
        aggregator_fn(
            |values: &[f64]| {
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                Value::Float(max - min)
            },
            Value::Missing,
        ),
    );
    catalog
}

#[test]
fn test_custom_classifiers() {
    let cmd = IntersectCommand::new(IntersectionConfig::builder().b_part(None).build().unwrap())
        .with_extensions(
            &catalog(),
            &specs(&[
                "name:String:longest_name:0:classifier:lab",
                "span:Integer:span:0:classifier:lab",
            ]),
        )
        .unwrap();

    let out = run(
        &cmd,
        "chr1\t0\t100\nchr2\t0\t10\n",
        "chr1\t10\t20\tshort\nchr1\t30\t80\tlong\n",
    )
    .unwrap();
    assert_eq!(out, "chr1\t0\t100\tlong\t100\nchr2\t0\t10\t.\t10\n");
}

#[test]
fn test_custom_map_with_named_extractor() {
    let cmd = IntersectCommand::new(IntersectionConfig::builder().b_part(None).build().unwrap())
        .with_extensions(&catalog(), &specs(&["r:Float:range:length:map:lab"]))
        .unwrap();

    let out = run(&cmd, "chr1\t0\t100\n", "chr1\t10\t20\nchr1\t30\t80\n").unwrap();
    assert_eq!(out, "chr1\t0\t100\t40\n");
}

#[test]
fn test_aggregator_empty_result_used_without_overlaps() {
    let mut catalog = catalog();
    catalog.register_aggregator(
        "lab",
        "offset_sum",
        aggregator_fn(
            |v: &[f64]| Value::Float(v.iter().sum::<f64>() + 10.0),
            Value::Float(10.0),
        ),
    );
    let cmd = IntersectCommand::new(IntersectionConfig::builder().b_part(None).build().unwrap())
        .with_extensions(&catalog, &specs(&["s:Float:offset_sum:5:map:lab"]))
        .unwrap();

    let out = run(&cmd, "chr1\t0\t100\nchr1\t200\t300\n", "chr1\t10\t20\tn\t3\n").unwrap();
    assert_eq!(out, "chr1\t0\t100\t13\nchr1\t200\t300\t10\n");
}

#[test]
fn test_per_overlap_mode_with_extensions() {
    let config = IntersectionConfig::builder()
        .mode(IntersectionMode::PerOverlap)
        .build()
        .unwrap();
    let cmd = IntersectCommand::new(config)
        .with_extensions(&catalog(), &specs(&["b:Integer:b_bases:0:classifier:"]))
        .unwrap();

    let out = run(&cmd, "chr1\t0\t100\nchr1\t200\t300\n", "chr1\t10\t20\nchr1\t30\t80\n").unwrap();
    assert_eq!(out, "chr1\t0\t100\t10\t20\t10\nchr1\t0\t100\t30\t80\t50\n");
}

#[test]
fn test_unknown_source() {
    let result = IntersectCommand::default()
        .with_extensions(&catalog(), &specs(&["x:Float:range:5:map:elsewhere"]));
    assert!(matches!(result, Err(IntersectError::Extension(_))));
}

#[test]
fn test_string_result_for_numeric_column_is_fatal() {
    let mut catalog = catalog();
    catalog.register_aggregator(
        "lab",
        "label",
        aggregator_fn(|_: &[f64]| Value::from("many"), Value::Missing),
    );
    let cmd = IntersectCommand::default()
        .with_extensions(&catalog, &specs(&["x:Float:label:5:map:lab"]))
        .unwrap();

    let err = run(&cmd, "chr1\t0\t100\n", "chr1\t10\t20\tn\t3\n").unwrap_err();
    assert!(matches!(err, IntersectError::Extension(_)));
    assert!(err.to_string().contains("chr1:1-100"), "{}", err);
}

