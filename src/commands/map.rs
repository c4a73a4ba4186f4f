//! Map command: bedtools-style column summaries of overlapping "b" records.
//!
//! `-c 5 -O sum,mean` becomes two map extensions over column 5, one per
//! operation. Each "a" is reported once as its full record, followed by one
//! column per operation; "b" intervals are not printed.
//!
//! With `group_by_b` an "a" gets one row per distinct "b" name (in the order
//! the names first appear), and the name is printed before the operation
//! columns. With `name_match` only "b" records whose name equals the name of
//! "a" are summarized. A record without a name column is named `.`.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::intersect::{FragmentReporter, IntersectCommand, IntersectStats};
use crate::bed;
use crate::config::{IntersectionConfig, OverlapAmount};
use crate::error::Result;
use crate::extension::{
    expand_ops, ExtensionCatalog, FieldValue, InvocationStats, ResolvedExtension, Scalar,
};
use crate::fragment::Fragment;
use crate::genome::Genome;
use crate::interval::{Record, TypedRecord};
use crate::report::ReportRow;

/// Name printed for records without a name column.
const NO_NAME: &str = ".";

/// Map command configuration.
#[derive(Debug, Clone)]
pub struct MapCommand {
    /// 1-based payload columns to summarize
    pub columns: Vec<usize>,
    /// Aggregator names (count, sum, mean, min, max, median)
    pub operations: Vec<String>,
    /// Minimum overlap as a fraction of A
    pub a_requirement: OverlapAmount,
    /// Minimum overlap as a fraction of B
    pub b_requirement: OverlapAmount,
    /// Only summarize B records named like A
    pub name_match: bool,
    /// One row per B name
    pub group_by_b: bool,
    pub threads: usize,
}

impl Default for MapCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl MapCommand {
    pub fn new() -> Self {
        Self {
            columns: vec![5],
            operations: vec!["sum".to_string()],
            a_requirement: OverlapAmount::default(),
            b_requirement: OverlapAmount::default(),
            name_match: false,
            group_by_b: false,
            threads: 1,
        }
    }

    /// Validate the settings and build the sweep command and row builder.
    fn prepare(&self, catalog: &ExtensionCatalog) -> Result<(IntersectCommand, MapReporter)> {
        let config = IntersectionConfig::builder()
            .b_part(None)
            .a_requirement(self.a_requirement)
            .b_requirement(self.b_requirement)
            .build()?;
        let specs = expand_ops(&self.columns, &self.operations)?;
        let reporter = MapReporter {
            extensions: catalog.resolve_all(&specs)?,
            name_match: self.name_match,
            group_by_b: self.group_by_b,
        };
        Ok((IntersectCommand::new(config).with_threads(self.threads), reporter))
    }

    /// Streaming run on the calling thread.
    pub fn run<A, B, W>(&self, a: A, b: B, genome: &Genome, output: W) -> Result<IntersectStats>
    where
        A: Iterator<Item = bed::Result<Record>>,
        B: Iterator<Item = bed::Result<Record>>,
        W: Write,
    {
        let (cmd, reporter) = self.prepare(&ExtensionCatalog::with_builtins())?;
        cmd.run_with(&reporter, a, b, genome, output)
    }

    /// Map one or more "b" files onto `a_path` and write rows to `output`.
    pub fn run_files<P: AsRef<Path>, W: Write>(
        &self,
        a_path: P,
        b_paths: &[P],
        genome: &Genome,
        output: W,
    ) -> Result<IntersectStats> {
        let (cmd, reporter) = self.prepare(&ExtensionCatalog::with_builtins())?;
        cmd.run_files_with(&reporter, a_path, b_paths, genome, output)
    }
}

/// Builds map rows: the full "a" record, an optional group name, then one
/// column per operation.
struct MapReporter {
    extensions: Vec<ResolvedExtension>,
    name_match: bool,
    group_by_b: bool,
}

impl FragmentReporter for MapReporter {
    fn report(
        &self,
        fragment: &Fragment,
        invocation: &mut InvocationStats,
    ) -> Result<Vec<ReportRow>> {
        let a_name = record_name(&fragment.a);
        let matching: Vec<Arc<Record>> = fragment
            .b
            .iter()
            .filter(|b| !self.name_match || record_name(b) == a_name)
            .cloned()
            .collect();

        if !self.group_by_b {
            let fragment = Fragment::new(fragment.a.clone(), matching);
            return Ok(vec![self.row(&fragment, None, invocation)?]);
        }

        let mut groups: Vec<(String, Vec<Arc<Record>>)> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        for b in matching {
            let name = record_name(&b);
            match index.get(name) {
                Some(&i) => groups[i].1.push(b),
                None => {
                    index.insert(name.to_string(), groups.len());
                    groups.push((name.to_string(), vec![b]));
                }
            }
        }

        if groups.is_empty() {
            let alone = Fragment::alone(fragment.a.clone());
            return Ok(vec![self.row(&alone, Some(NO_NAME), invocation)?]);
        }

        groups
            .into_iter()
            .map(|(name, bs)| {
                let group = Fragment::new(fragment.a.clone(), bs);
                self.row(&group, Some(&name), invocation)
            })
            .collect()
    }
}

impl MapReporter {
    fn row(
        &self,
        fragment: &Fragment,
        group: Option<&str>,
        invocation: &mut InvocationStats,
    ) -> Result<ReportRow> {
        let mut fields = a_columns(&fragment.a);
        if let Some(group) = group {
            fields.push(text(group));
        }
        for ext in &self.extensions {
            fields.push(ext.evaluate(fragment, invocation)?);
        }
        Ok(ReportRow {
            a: fragment.a.interval.clone(),
            b: Vec::new(),
            fields,
        })
    }
}

/// BED columns 4 and onwards of "a", printed verbatim.
fn a_columns(record: &Record) -> Vec<FieldValue> {
    match &record.payload {
        TypedRecord::Bed(bed) => bed.columns.iter().map(|c| text(c)).collect(),
        _ => Vec::new(),
    }
}

fn record_name(record: &Record) -> &str {
    match &record.payload {
        TypedRecord::Bed(bed) => bed.name().unwrap_or(NO_NAME),
        _ => NO_NAME,
    }
}

fn text(s: &str) -> FieldValue {
    FieldValue::Scalar(Scalar::Str(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bed::parse_records;
    use crate::error::IntersectError;

    const MAP_A: &str = "chr1\t100\t200\tgeneA\t10\nchr1\t300\t400\tgeneB\t20\n";
    const MAP_B: &str = "chr1\t120\t180\tgeneA\t5\n\
                         chr1\t130\t170\tgeneB\t7\n\
                         chr1\t150\t190\tgeneA\t3\n\
                         chr1\t350\t380\tgeneB\t4\n";

    fn stream(content: &str) -> impl Iterator<Item = bed::Result<Record>> {
        parse_records(content).unwrap().into_iter().map(Ok)
    }

    fn run(map: &MapCommand, a: &str, b: &str) -> String {
        let mut output = Vec::new();
        map.run(stream(a), stream(b), &Genome::from_names(["chr1"]), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    fn ops(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // ==== Operations ====

    #[test]
    fn test_one_column_many_ops() {
        let map = MapCommand {
            operations: ops(&["sum", "count", "median"]),
            ..MapCommand::new()
        };
        let out = run(
            &map,
            "chr1\t0\t100\nchr1\t200\t300\n",
            "chr1\t10\t20\tx\t1\nchr1\t30\t40\ty\t2\nchr1\t50\t60\tz\t4\n",
        );
        assert_eq!(out, "chr1\t0\t100\t7\t3\t2\nchr1\t200\t300\t.\t0\t.\n");
    }

    #[test]
    fn test_count_includes_non_numeric_values() {
        let map = MapCommand {
            columns: vec![4],
            operations: ops(&["count"]),
            ..MapCommand::new()
        };
        let out = run(&map, "chr1\t0\t100\n", "chr1\t10\t20\tgeneA\nchr1\t30\t40\tgeneB\n");
        assert_eq!(out, "chr1\t0\t100\t2\n");
    }

    #[test]
    fn test_count_of_missing_column() {
        let map = MapCommand {
            operations: ops(&["count"]),
            ..MapCommand::new()
        };
        let out = run(&map, "chr1\t0\t100\n", "chr1\t10\t20\n");
        assert_eq!(out, "chr1\t0\t100\t1\n");
    }

    #[test]
    fn test_full_a_record_printed() {
        let out = run(&MapCommand::new(), MAP_A, MAP_B);
        assert_eq!(
            out,
            "chr1\t100\t200\tgeneA\t10\t15\nchr1\t300\t400\tgeneB\t20\t4\n"
        );

        let map = MapCommand {
            operations: ops(&["sum", "mean", "count"]),
            ..MapCommand::new()
        };
        assert_eq!(
            run(&map, MAP_A, MAP_B),
            "chr1\t100\t200\tgeneA\t10\t15\t5\t3\nchr1\t300\t400\tgeneB\t20\t4\t4\t1\n"
        );
    }

    #[test]
    fn test_a_without_overlap() {
        let map = MapCommand {
            operations: ops(&["sum", "count"]),
            ..MapCommand::new()
        };
        let out = run(&map, "chr1\t500\t600\tgeneC\t30\n", MAP_B);
        assert_eq!(out, "chr1\t500\t600\tgeneC\t30\t.\t0\n");
    }

    // ==== Names ====

    #[test]
    fn test_name_match() {
        let map = MapCommand {
            name_match: true,
            ..MapCommand::new()
        };
        assert_eq!(
            run(&map, MAP_A, MAP_B),
            "chr1\t100\t200\tgeneA\t10\t8\nchr1\t300\t400\tgeneB\t20\t4\n"
        );
    }

    #[test]
    fn test_name_match_unnamed_a() {
        let map = MapCommand {
            operations: ops(&["sum", "count"]),
            name_match: true,
            ..MapCommand::new()
        };
        assert_eq!(run(&map, "chr1\t100\t200\n", MAP_B), "chr1\t100\t200\t.\t0\n");
    }

    #[test]
    fn test_group_by_b() {
        let map = MapCommand {
            group_by_b: true,
            ..MapCommand::new()
        };
        assert_eq!(
            run(&map, MAP_A, MAP_B),
            "chr1\t100\t200\tgeneA\t10\tgeneA\t8\n\
             chr1\t100\t200\tgeneA\t10\tgeneB\t7\n\
             chr1\t300\t400\tgeneB\t20\tgeneB\t4\n"
        );
    }

    #[test]
    fn test_group_by_b_with_name_match() {
        let map = MapCommand {
            group_by_b: true,
            name_match: true,
            ..MapCommand::new()
        };
        assert_eq!(
            run(&map, MAP_A, MAP_B),
            "chr1\t100\t200\tgeneA\t10\tgeneA\t8\nchr1\t300\t400\tgeneB\t20\tgeneB\t4\n"
        );
    }

    #[test]
    fn test_group_by_b_several_ops() {
        let map = MapCommand {
            group_by_b: true,
            operations: ops(&["sum", "count"]),
            ..MapCommand::new()
        };
        let out = run(&map, MAP_A, MAP_B);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].ends_with("\tgeneA\t8\t2"));
        assert!(rows[1].ends_with("\tgeneB\t7\t1"));
        assert!(rows[2].ends_with("\tgeneB\t4\t1"));
    }

    #[test]
    fn test_group_by_b_without_overlaps() {
        let map = MapCommand {
            group_by_b: true,
            operations: ops(&["sum", "count"]),
            ..MapCommand::new()
        };
        let out = run(&map, "chr1\t500\t600\tgeneC\n", MAP_B);
        assert_eq!(out, "chr1\t500\t600\tgeneC\t.\t.\t0\n");
    }

    // ==== Errors ====

    #[test]
    fn test_mismatched_lists_rejected() {
        let map = MapCommand {
            columns: vec![4, 5],
            operations: ops(&["sum", "mean", "max"]),
            ..MapCommand::new()
        };
        let result = map.prepare(&ExtensionCatalog::with_builtins());
        assert!(matches!(result, Err(IntersectError::Extension(_))));
    }

    #[test]
    fn test_invalid_requirement_rejected() {
        let map = MapCommand {
            a_requirement: OverlapAmount::Fraction(1.5),
            ..MapCommand::new()
        };
        let result = map.prepare(&ExtensionCatalog::with_builtins());
        assert!(matches!(result, Err(IntersectError::Config(_))));
    }

    // ==== Parallel ====

    #[test]
    fn test_parallel_matches_sequential() {
        let map = MapCommand {
            group_by_b: true,
            operations: ops(&["sum", "count"]),
            ..MapCommand::new()
        };
        let (cmd, reporter) = map.prepare(&ExtensionCatalog::with_builtins()).unwrap();
        let genome = Genome::from_names(["chr1"]);

        let mut sequential = Vec::new();
        cmd.run_with(&reporter, stream(MAP_A), stream(MAP_B), &genome, &mut sequential)
            .unwrap();
        let mut parallel = Vec::new();
        cmd.clone()
            .with_threads(2)
            .run_parallel_with(&reporter, stream(MAP_A), stream(MAP_B), &genome, &mut parallel)
            .unwrap();

        assert_eq!(sequential, parallel);
        assert!(!sequential.is_empty());
    }
}
