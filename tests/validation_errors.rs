//! Fatal input and configuration errors.
//!
//! Every failure must exit non-zero with an `Error:` message on stderr and
//! name the offending interval or setting.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn create_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
}

fn run_intersect(a: &str, b: &str, genome: &str, extra: &[&str]) -> Output {
    let a = create_file(a);
    let b = create_file(b);
    let g = create_file(genome);
    Command::new(env!("CARGO_BIN_EXE_fragmap"))
        .args([
            "intersect",
            "-a",
            a.path().to_str().unwrap(),
            "-b",
            b.path().to_str().unwrap(),
            "-g",
            g.path().to_str().unwrap(),
        ])
        .args(extra)
        .output()
        .expect("Failed to run fragmap")
}

/// Assert failure and return stderr.
fn expect_failure(output: &Output) -> String {
    let err = String::from_utf8_lossy(&output.stderr).to_string();
    assert!(!output.status.success(), "expected failure, stderr: {}", err);
    err
}

// =============================================================================
// Input validation
// =============================================================================

#[test]
fn test_unsorted_a_rejected() {
    let output = run_intersect("chr1\t50\t60\nchr1\t10\t20\n", "chr1\t0\t5\n", "chr1\n", &[]);
    let err = expect_failure(&output);
    assert!(err.starts_with("Error:"), "stderr: {}", err);
    assert!(err.contains("a input is not sorted"), "stderr: {}", err);
    assert!(err.contains("chr1:11-20"), "stderr: {}", err);
}

#[test]
fn test_unsorted_b_rejected_after_a_ends() {
    let output = run_intersect(
        "chr1\t0\t10\n",
        "chr1\t0\t5\nchr2\t0\t5\nchr1\t100\t200\n",
        "chr1\nchr2\n",
        &[],
    );
    let err = expect_failure(&output);
    assert!(err.contains("b input is not sorted"), "stderr: {}", err);
}

#[test]
fn test_genome_order_enforced() {
    // Lexicographic order is not genome order here
    let output = run_intersect(
        "chr1\t0\t10\nchr10\t0\t10\nchr2\t0\t10\n",
        "chr1\t0\t5\n",
        "chr1\nchr2\nchr10\n",
        &[],
    );
    let err = expect_failure(&output);
    assert!(err.contains("not sorted"), "stderr: {}", err);
}

#[test]
fn test_unknown_chromosome_rejected() {
    let output = run_intersect("chrUn\t0\t10\n", "chr1\t0\t5\n", "chr1\n", &[]);
    let err = expect_failure(&output);
    assert!(err.contains("chrUn"), "stderr: {}", err);
}

#[test]
fn test_interval_past_chromosome_end_rejected() {
    let output = run_intersect("chr1\t0\t10\n", "chr1\t90\t120\n", "chr1\t100\n", &[]);
    let err = expect_failure(&output);
    assert!(err.contains("beyond the end"), "stderr: {}", err);
}

#[test]
fn test_start_after_stop_rejected() {
    let output = run_intersect("chr1\t20\t10\n", "chr1\t0\t5\n", "chr1\n", &[]);
    expect_failure(&output);
}

#[test]
fn test_parallel_run_validates_too() {
    let output = run_intersect(
        "chr1\t50\t60\nchr1\t10\t20\n",
        "chr1\t0\t5\n",
        "chr1\n",
        &["--threads", "2"],
    );
    let err = expect_failure(&output);
    assert!(err.contains("not sorted"), "stderr: {}", err);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_fraction_out_of_range() {
    let output = run_intersect("chr1\t0\t10\n", "chr1\t0\t5\n", "chr1\n", &["-f", "1.5"]);
    expect_failure(&output);
}

#[test]
fn test_zero_bases_requirement() {
    let output = run_intersect("chr1\t0\t10\n", "chr1\t0\t5\n", "chr1\n", &["-F", "0"]);
    expect_failure(&output);
}

#[test]
fn test_malformed_extension_spec() {
    let output = run_intersect(
        "chr1\t0\t10\n",
        "chr1\t0\t5\n",
        "chr1\n",
        &["-c", "only:three:parts"],
    );
    expect_failure(&output);
}

#[test]
fn test_unknown_extension_function() {
    let output = run_intersect(
        "chr1\t0\t10\n",
        "chr1\t0\t5\n",
        "chr1\n",
        &["-c", "x:Float:no_such_op:5:map:"],
    );
    let err = expect_failure(&output);
    assert!(err.contains("no_such_op"), "stderr: {}", err);
}

#[test]
fn test_not_mode_with_piece_b_rejected() {
    let output = run_intersect(
        "chr1\t0\t10\n",
        "chr1\t0\t5\n",
        "chr1\n",
        &["--mode", "not", "--b-part", "piece"],
    );
    let err = expect_failure(&output);
    assert!(err.starts_with("Error:"), "stderr: {}", err);
}

#[test]
fn test_not_mode_with_piece_a_rejected() {
    let output = run_intersect(
        "chr1\t0\t10\n",
        "chr1\t20\t25\n",
        "chr1\n",
        &["--mode", "not", "--a-part", "piece"],
    );
    let err = expect_failure(&output);
    assert!(err.contains("a part 'piece'"), "stderr: {}", err);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_classifier_result_type_violation() {
    let output = run_intersect(
        "chr1\t0\t10\n",
        "chr1\t0\t5\n",
        "chr1\n",
        &["-c", "p:Integer:start_parity:0:classifier:"],
    );
    let err = expect_failure(&output);
    assert!(err.contains("chr1:1-10"), "stderr: {}", err);
}
