//! fragmap: overlap sorted genomic intervals and summarize each fragment.
//!
//! Usage: fragmap <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use fragmap::bed::BedError;
use fragmap::commands::{IntersectCommand, MapCommand};
use fragmap::config::{
    IntersectionConfig, IntersectionConfigBuilder, IntersectionMode, IntersectionPart,
    OverlapAmount,
};
use fragmap::error::IntersectError;
use fragmap::extension::{ExtensionCatalog, ExtensionSpec};
use fragmap::genome::Genome;

#[derive(Parser)]
#[command(name = "fragmap")]
#[command(version)]
#[command(about = "Sweep-line interval overlap with pluggable per-fragment summaries", long_about = None)]
struct Cli {
    /// Number of threads; more than one loads inputs and runs per chromosome
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Print run statistics to stderr
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report each A interval with the B intervals overlapping it
    Intersect {
        /// Sorted BED or VCF file A
        #[arg(short = 'a', long)]
        file_a: PathBuf,

        /// One or more sorted BED or VCF files B, swept as one stream
        #[arg(short = 'b', long, required = true, num_args = 1..)]
        file_b: Vec<PathBuf>,

        /// Genome file giving chromosome order (and optionally lengths)
        #[arg(short = 'g', long)]
        genome: PathBuf,

        /// Write rows to this file instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// default, not (-v), or per-overlap
        #[arg(long, default_value = "default")]
        mode: IntersectionMode,

        /// Part of A to report: whole, inverse, or piece
        #[arg(long)]
        a_part: Option<IntersectionPart>,

        /// Part of each B to report: whole, inverse, or piece
        #[arg(long, default_value = "whole")]
        b_part: IntersectionPart,

        /// Do not report B intervals
        #[arg(long, conflicts_with = "b_part")]
        no_b: bool,

        /// Minimum overlap with A: bases (5), fraction (0.5), or percent (50%)
        #[arg(short = 'f', long = "a-requirements", default_value = "1")]
        a_requirement: OverlapAmount,

        /// Minimum overlap with B: bases (5), fraction (0.5), or percent (50%)
        #[arg(short = 'F', long = "b-requirements", default_value = "1")]
        b_requirement: OverlapAmount,

        /// Extension column: field:type:function:arg:kind:source (repeatable)
        #[arg(short = 'c', long = "column")]
        columns: Vec<ExtensionSpec>,

        /// Suppress the large active window warning
        #[arg(long)]
        quiet: bool,
    },

    /// Summarize columns of the B intervals overlapping each A interval
    Map {
        /// Sorted BED file A
        #[arg(short = 'a', long)]
        file_a: PathBuf,

        /// One or more sorted BED files B, swept as one stream
        #[arg(short = 'b', long, required = true, num_args = 1..)]
        file_b: Vec<PathBuf>,

        /// Genome file giving chromosome order (and optionally lengths)
        #[arg(short = 'g', long)]
        genome: PathBuf,

        /// Write rows to this file instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Columns of B to summarize (1-based, 4 or higher)
        #[arg(short = 'c', long, value_delimiter = ',', default_value = "5")]
        columns: Vec<usize>,

        /// Operations: count, sum, mean, min, max, median
        #[arg(short = 'O', long, value_delimiter = ',', default_value = "sum")]
        operations: Vec<String>,

        /// Minimum overlap with A: bases (5), fraction (0.5), or percent (50%)
        #[arg(short = 'f', long = "a-requirements", default_value = "1")]
        a_requirement: OverlapAmount,

        /// Minimum overlap with B: bases (5), fraction (0.5), or percent (50%)
        #[arg(short = 'F', long = "b-requirements", default_value = "1")]
        b_requirement: OverlapAmount,

        /// Only summarize B intervals whose name matches the A name
        #[arg(short = 'n', long)]
        name_match: bool,

        /// One row per distinct B name, printed before the summaries
        #[arg(short = 'G', long = "group-by-b")]
        group_by_b: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let threads = cli.threads.unwrap_or(1);

    let result = match cli.command {
        Commands::Intersect {
            file_a,
            file_b,
            genome,
            output,
            mode,
            a_part,
            b_part,
            no_b,
            a_requirement,
            b_requirement,
            columns,
            quiet,
        } => run_intersect(
            file_a,
            file_b,
            genome,
            output,
            IntersectionConfig::builder()
                .mode(mode)
                .a_part(a_part)
                .b_part(if no_b { None } else { Some(b_part) })
                .a_requirement(a_requirement)
                .b_requirement(b_requirement),
            columns,
            threads,
            quiet,
            cli.stats,
        ),
        Commands::Map {
            file_a,
            file_b,
            genome,
            output,
            columns,
            operations,
            a_requirement,
            b_requirement,
            name_match,
            group_by_b,
        } => run_map(
            file_a,
            file_b,
            genome,
            output,
            MapCommand {
                columns,
                operations,
                a_requirement,
                b_requirement,
                name_match,
                group_by_b,
                threads,
            },
            cli.stats,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn run_intersect(
    file_a: PathBuf,
    file_b: Vec<PathBuf>,
    genome_path: PathBuf,
    output: Option<PathBuf>,
    config: IntersectionConfigBuilder,
    columns: Vec<ExtensionSpec>,
    threads: usize,
    quiet: bool,
    stats: bool,
) -> Result<(), IntersectError> {
    let genome = Genome::from_file(&genome_path)?;
    let mut cmd = IntersectCommand::new(config.build()?)
        .with_extensions(&ExtensionCatalog::with_builtins(), &columns)?
        .with_threads(threads);
    cmd.warn_large_window = !quiet;

    let result = cmd.run_files(file_a, &file_b, &genome, open_output(output)?)?;

    if stats {
        eprintln!("Intersect stats: {}", result);
    }
    Ok(())
}

fn run_map(
    file_a: PathBuf,
    file_b: Vec<PathBuf>,
    genome_path: PathBuf,
    output: Option<PathBuf>,
    cmd: MapCommand,
    stats: bool,
) -> Result<(), IntersectError> {
    let genome = Genome::from_file(&genome_path)?;
    let result = cmd.run_files(file_a, &file_b, &genome, open_output(output)?)?;

    if stats {
        eprintln!("Map stats: {}", result);
    }
    Ok(())
}

/// The file named by `-o`, or stdout.
fn open_output(path: Option<PathBuf>) -> Result<Box<dyn Write>, IntersectError> {
    Ok(match path {
        Some(path) => Box::new(File::create(path).map_err(BedError::Io)?),
        None => Box::new(io::stdout().lock()),
    })
}
