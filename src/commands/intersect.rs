//! Intersect command: sweep, evaluate extensions, assemble rows, write.
//!
//! # Execution
//!
//! With one thread both inputs are streamed through a single
//! [`OverlapSweep`]; memory is bounded by the active "b" window. With more
//! threads both inputs are loaded, validated and split by chromosome; each
//! chromosome gets its own sweep and rows are written in genome order.
//!
//! Either way the output is identical. Several "b" files are merged into one
//! sorted stream before the sweep.
//!
//! Rows come from a [`FragmentReporter`]: the command itself assembles
//! intersect rows, and the map command supplies its own.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::bed::{self, BedReader};
use crate::config::IntersectionConfig;
use crate::error::Result;
use crate::extension::{ExtensionCatalog, ExtensionSpec, FieldValue, InvocationStats, ResolvedExtension};
use crate::fragment::Fragment;
use crate::genome::Genome;
use crate::interval::Record;
use crate::parallel::{partition_by_chromosome, run_ordered, ChromPartition};
use crate::report::{ReportAssembler, ReportRow};
use crate::streaming::{MergedRecords, OverlapSweep, RowWriter, SweepStats};
use crate::vcf::VcfReader;

/// A boxed record stream, as returned by [`open_records`].
pub type RecordStream = Box<dyn Iterator<Item = bed::Result<Record>> + Send>;

/// Statistics for an intersect run.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntersectStats {
    pub sweep: SweepStats,
    pub invocation: InvocationStats,
    /// Rows written
    pub rows: usize,
}

impl IntersectStats {
    pub fn merge(&mut self, other: &IntersectStats) {
        self.sweep.merge(&other.sweep);
        self.invocation.merge(&other.invocation);
        self.rows += other.rows;
    }
}

impl fmt::Display for IntersectStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Rows: {}, {}", self.sweep, self.rows, self.invocation)
    }
}

/// Open a record stream, choosing the reader by file extension.
///
/// `.vcf` files get a VCF payload; everything else is read as BED.
pub fn open_records<P: AsRef<Path>>(path: P) -> bed::Result<RecordStream> {
    let path = path.as_ref();
    let is_vcf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("vcf"))
        .unwrap_or(false);

    if is_vcf {
        Ok(Box::new(VcfReader::from_path(path)?.records()))
    } else {
        Ok(Box::new(BedReader::from_path(path)?.records()))
    }
}

/// Open several sorted files as one stream in genome order.
pub fn open_merged<P: AsRef<Path>>(paths: &[P], genome: &Genome) -> bed::Result<RecordStream> {
    if let [path] = paths {
        return open_records(path);
    }
    let inputs = paths
        .iter()
        .map(open_records)
        .collect::<bed::Result<Vec<_>>>()?;
    Ok(Box::new(MergedRecords::new(inputs, genome.clone())))
}

/// Turns each fragment into output rows.
///
/// Called from worker threads on parallel runs.
pub trait FragmentReporter: Sync {
    fn report(
        &self,
        fragment: &Fragment,
        invocation: &mut InvocationStats,
    ) -> Result<Vec<ReportRow>>;
}

/// Intersect command configuration.
#[derive(Debug, Clone)]
pub struct IntersectCommand {
    pub config: IntersectionConfig,
    /// Report columns, in output order
    pub extensions: Vec<ResolvedExtension>,
    /// Worker threads; 1 streams both inputs
    pub threads: usize,
    /// Warn if active window exceeds threshold
    pub warn_large_window: bool,
}

impl Default for IntersectCommand {
    fn default() -> Self {
        Self::new(IntersectionConfig::default())
    }
}

impl FragmentReporter for IntersectCommand {
    fn report(
        &self,
        fragment: &Fragment,
        invocation: &mut InvocationStats,
    ) -> Result<Vec<ReportRow>> {
        let fields = self
            .extensions
            .iter()
            .map(|ext| ext.evaluate(fragment, invocation))
            .collect::<std::result::Result<Vec<FieldValue>, _>>()?;
        Ok(ReportAssembler::new(&self.config).assemble(fragment, fields))
    }
}

impl IntersectCommand {
    pub fn new(config: IntersectionConfig) -> Self {
        Self {
            config,
            extensions: Vec::new(),
            threads: 1,
            warn_large_window: true,
        }
    }

    /// Resolve extension spec strings against `catalog` and append them as
    /// report columns.
    pub fn with_extensions(
        mut self,
        catalog: &ExtensionCatalog,
        specs: &[ExtensionSpec],
    ) -> Result<Self> {
        self.extensions.extend(catalog.resolve_all(specs)?);
        Ok(self)
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Intersect `a_path` with one or more "b" files and write rows to
    /// `output`.
    pub fn run_files<P: AsRef<Path>, W: Write>(
        &self,
        a_path: P,
        b_paths: &[P],
        genome: &Genome,
        output: W,
    ) -> Result<IntersectStats> {
        self.run_files_with(self, a_path, b_paths, genome, output)
    }

    /// Like [`run_files`](Self::run_files), with rows built by `reporter`.
    pub fn run_files_with<R, P, W>(
        &self,
        reporter: &R,
        a_path: P,
        b_paths: &[P],
        genome: &Genome,
        output: W,
    ) -> Result<IntersectStats>
    where
        R: FragmentReporter,
        P: AsRef<Path>,
        W: Write,
    {
        let a = open_records(a_path)?;
        let b = open_merged(b_paths, genome)?;
        if self.threads > 1 {
            self.run_parallel_with(reporter, a, b, genome, output)
        } else {
            self.run_with(reporter, a, b, genome, output)
        }
    }

    /// Streaming run on the calling thread.
    pub fn run<A, B, W>(&self, a: A, b: B, genome: &Genome, output: W) -> Result<IntersectStats>
    where
        A: Iterator<Item = bed::Result<Record>>,
        B: Iterator<Item = bed::Result<Record>>,
        W: Write,
    {
        self.run_with(self, a, b, genome, output)
    }

    /// Streaming run with rows built by `reporter`.
    pub fn run_with<R, A, B, W>(
        &self,
        reporter: &R,
        a: A,
        b: B,
        genome: &Genome,
        output: W,
    ) -> Result<IntersectStats>
    where
        R: FragmentReporter,
        A: Iterator<Item = bed::Result<Record>>,
        B: Iterator<Item = bed::Result<Record>>,
        W: Write,
    {
        let mut stats = IntersectStats::default();
        let mut writer = RowWriter::new(output);

        let mut sweep = OverlapSweep::new(a, b, genome, self.config.clone())
            .warn_large_window(self.warn_large_window);

        for fragment in sweep.by_ref() {
            let fragment = fragment?;
            for row in reporter.report(&fragment, &mut stats.invocation)? {
                writer.write_row(&row)?;
                stats.rows += 1;
            }
        }

        writer.flush()?;
        stats.sweep = sweep.stats();
        Ok(stats)
    }

    /// Chromosome-parallel run on `self.threads` workers.
    pub fn run_parallel<A, B, W>(
        &self,
        a: A,
        b: B,
        genome: &Genome,
        output: W,
    ) -> Result<IntersectStats>
    where
        A: Iterator<Item = bed::Result<Record>>,
        B: Iterator<Item = bed::Result<Record>>,
        W: Write,
    {
        self.run_parallel_with(self, a, b, genome, output)
    }

    /// Chromosome-parallel run with rows built by `reporter`.
    pub fn run_parallel_with<R, A, B, W>(
        &self,
        reporter: &R,
        a: A,
        b: B,
        genome: &Genome,
        output: W,
    ) -> Result<IntersectStats>
    where
        R: FragmentReporter,
        A: Iterator<Item = bed::Result<Record>>,
        B: Iterator<Item = bed::Result<Record>>,
        W: Write,
    {
        let input = partition_by_chromosome(a, b, genome)?;
        let mut stats = IntersectStats::default();
        let mut writer = RowWriter::new(output);
        let warned = Arc::new(AtomicBool::new(false));

        run_ordered(
            input.partitions,
            self.threads,
            |partition| self.run_partition(reporter, partition, genome, &warned),
            |(rows, partition_stats): (Vec<ReportRow>, IntersectStats)| {
                for row in &rows {
                    writer.write_row(row)?;
                }
                stats.merge(&partition_stats);
                Ok(())
            },
        )?;

        writer.flush()?;
        stats.sweep.a_records = input.a_records;
        stats.sweep.b_records = input.b_records;
        Ok(stats)
    }

    fn run_partition<R: FragmentReporter>(
        &self,
        reporter: &R,
        partition: ChromPartition,
        genome: &Genome,
        warned: &Arc<AtomicBool>,
    ) -> Result<(Vec<ReportRow>, IntersectStats)> {
        let mut stats = IntersectStats::default();
        let mut rows = Vec::new();

        let mut sweep = OverlapSweep::new(
            partition.a.into_iter().map(Ok),
            partition.b.into_iter().map(Ok),
            genome,
            self.config.clone(),
        )
        .warn_large_window(self.warn_large_window)
        .share_warning(Arc::clone(warned));

        for fragment in sweep.by_ref() {
            let fragment = fragment?;
            rows.extend(reporter.report(&fragment, &mut stats.invocation)?);
        }

        stats.rows = rows.len();
        stats.sweep = sweep.stats();
        Ok((rows, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bed::parse_records;
    use crate::config::{IntersectionMode, IntersectionPart, OverlapAmount};
    use crate::error::IntersectError;

    fn genome() -> Genome {
        Genome::from_names(["chr1", "chr2", "chr3"])
    }

    fn stream(content: &str) -> impl Iterator<Item = bed::Result<Record>> {
        parse_records(content).unwrap().into_iter().map(Ok)
    }

    fn specs(strings: &[&str]) -> Vec<ExtensionSpec> {
        strings.iter().map(|s| s.parse::<ExtensionSpec>().unwrap()).collect()
    }

    fn run(cmd: &IntersectCommand, a: &str, b: &str) -> (String, IntersectStats) {
        let mut output = Vec::new();
        let stats = cmd.run(stream(a), stream(b), &genome(), &mut output).unwrap();
        (String::from_utf8(output).unwrap(), stats)
    }

    fn run_parallel(cmd: &IntersectCommand, a: &str, b: &str) -> (String, IntersectStats) {
        let mut output = Vec::new();
        let stats = cmd
            .run_parallel(stream(a), stream(b), &genome(), &mut output)
            .unwrap();
        (String::from_utf8(output).unwrap(), stats)
    }

    // ==== Row layout ====

    #[test]
    fn test_whole_b_row() {
        let cmd = IntersectCommand::default();
        let (out, stats) = run(&cmd, "chr1\t0\t10\n", "chr1\t3\t7\n");
        assert_eq!(out, "chr1\t0\t10\t3\t7\n");
        assert_eq!(stats.rows, 1);
        assert_eq!(stats.sweep.fragments, 1);
    }

    #[test]
    fn test_a_without_overlap_still_reported() {
        let cmd = IntersectCommand::default();
        let (out, _) = run(&cmd, "chr1\t0\t10\nchr1\t50\t60\n", "chr1\t3\t7\n");
        assert_eq!(out, "chr1\t0\t10\t3\t7\nchr1\t50\t60\n");
    }

    #[test]
    fn test_inverse_b_with_contained_b() {
        let config = IntersectionConfig::builder()
            .b_part(Some(IntersectionPart::Inverse))
            .build()
            .unwrap();
        let (out, _) = run(&IntersectCommand::new(config), "chr1\t0\t10\n", "chr1\t3\t7\n");
        assert_eq!(out, "chr1\t0\t10\n");
    }

    #[test]
    fn test_not_mode() {
        let config = IntersectionConfig::builder()
            .mode(IntersectionMode::Not)
            .build()
            .unwrap();
        let (out, stats) = run(
            &IntersectCommand::new(config),
            "chr1\t0\t10\nchr1\t20\t30\n",
            "chr1\t5\t6\n",
        );
        assert_eq!(out, "chr1\t20\t30\n");
        assert_eq!(stats.sweep.a_records, 2);
    }

    // ==== Extensions ====

    #[test]
    fn test_classifier_and_map_columns() {
        let catalog = ExtensionCatalog::with_builtins();
        let config = IntersectionConfig::builder().b_part(None).build().unwrap();
        let cmd = IntersectCommand::new(config)
            .with_extensions(
                &catalog,
                &specs(&[
                    "parity:String:start_parity:0:classifier:",
                    "n:Integer:n_overlapping:0:classifier:builtin",
                    "total:Float:sum:5:map:",
                    "scores:Float:bed_score:0:extractor:",
                ]),
            )
            .unwrap();

        let (out, stats) = run(
            &cmd,
            "chr1\t1\t10\nchr1\t40\t50\n",
            "chr1\t2\t4\tx\t5\nchr1\t5\t9\ty\t7.5\n",
        );
        assert_eq!(out, "chr1\t1\t10\todd\t2\t12.5\t5,7.5\nchr1\t40\t50\teven\t0\t.\t.\n");
        assert_eq!(stats.invocation.record_type_mismatches, 0);
    }

    #[test]
    fn test_fraction_requirement_filters() {
        let config = IntersectionConfig::builder()
            .a_requirement(OverlapAmount::Fraction(0.5))
            .build()
            .unwrap();
        let (out, _) = run(
            &IntersectCommand::new(config),
            "chr1\t0\t10\n",
            "chr1\t0\t4\nchr1\t4\t9\n",
        );
        assert_eq!(out, "chr1\t0\t10\t4\t9\n");
    }

    // ==== Errors ====

    #[test]
    fn test_unsorted_input_aborts() {
        let cmd = IntersectCommand::default();
        let mut output = Vec::new();
        let result = cmd.run(
            stream("chr1\t50\t60\nchr1\t0\t10\n"),
            stream("chr1\t3\t7\n"),
            &genome(),
            &mut output,
        );
        assert!(matches!(result, Err(IntersectError::Unsorted { .. })));
    }

    #[test]
    fn test_unresolvable_extension() {
        let catalog = ExtensionCatalog::with_builtins();
        let result = IntersectCommand::default()
            .with_extensions(&catalog, &specs(&["x:Float:nope:0:map:"]));
        assert!(matches!(result, Err(IntersectError::Extension(_))));
    }

    // ==== Parallel ====

    #[test]
    fn test_parallel_matches_sequential() {
        let a = "chr1\t0\t10\nchr1\t5\t20\nchr2\t0\t100\nchr3\t7\t8\n";
        let b = "chr1\t3\t7\t.\t1\nchr1\t8\t30\t.\t2\nchr2\t50\t60\t.\t3\nchr3\t0\t100\t.\t4\n";

        let catalog = ExtensionCatalog::with_builtins();
        let cmd = IntersectCommand::default()
            .with_extensions(&catalog, &specs(&["mean:Float:mean:5:map:"]))
            .unwrap();

        let (sequential, seq_stats) = run(&cmd, a, b);
        let (parallel, par_stats) = run_parallel(&cmd.clone().with_threads(3), a, b);

        assert_eq!(sequential, parallel);
        assert_eq!(seq_stats.rows, par_stats.rows);
        assert_eq!(par_stats.sweep.a_records, 4);
        assert_eq!(par_stats.sweep.b_records, 4);
    }
}
