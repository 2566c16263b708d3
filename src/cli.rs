//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::format::SequenceFormat;
use crate::input::Input;

/// Out-of-core k-mer counter for large FASTA/FASTQ inputs.
///
/// Reads from a file or stdin (use `-` or omit the path for stdin), partitions
/// the k-mer space into sectors sized from a sampled prefix distribution,
/// spills sectors to temporary storage, sorts each in memory, and aggregates
/// counts per requested length.
///
/// # Examples
///
/// ```bash
/// # Count 21-mers from a FASTA file, default length range
/// sectormer genome.fa --counts 21
///
/// # Count every length from 16 to 24
/// sectormer genome.fa --min-size 16 --max-size 24
///
/// # From stdin, with explicit budgets
/// zcat large.fa.gz | sectormer --maxmem 512 --maxdisk 20 --counts 31
/// ```
#[derive(Parser, Debug)]
#[command(name = "sectormer")]
#[command(version, author, about, long_about = None)]
pub struct Args {
    /// Input sequence file (use '-' or omit for stdin)
    #[arg(default_value = "-")]
    pub path: PathBuf,

    /// Output prefix; defaults to `<input>.pcount`
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Comma-separated list of k-mer lengths to produce
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["min_size", "max_size"])]
    pub counts: Option<Vec<usize>>,

    /// Minimum k-mer length to produce
    #[arg(long, default_value = "8")]
    pub min_size: usize,

    /// Maximum k-mer length to produce
    #[arg(long, default_value = "30")]
    pub max_size: usize,

    /// Memory budget in megabytes
    #[arg(long, default_value = "2048")]
    pub maxmem: u64,

    /// Disk budget in gigabytes
    #[arg(long, default_value = "10")]
    pub maxdisk: u64,

    /// Worker thread count (default: physical cores)
    #[arg(long)]
    pub cores: Option<usize>,

    /// Minimum occurrence count for a k-mer to be emitted
    #[arg(long, default_value = "3")]
    pub min_abundance: u32,

    /// Canonicalize each k-mer to the lexicographically smaller of itself
    /// and its reverse complement before routing
    #[arg(long)]
    pub canonical: bool,

    /// Input file format (auto-detected from extension if not specified)
    #[arg(long, value_enum, default_value = "auto")]
    pub format: SequenceFormat,

    /// Suppress informational output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Returns the input source (file or stdin).
    #[must_use]
    pub fn input(&self) -> Input {
        Input::from_path(&self.path)
    }

    /// Returns the resolved input format.
    #[must_use]
    pub fn resolved_input_format(&self) -> SequenceFormat {
        self.format.resolve(Some(&self.path))
    }

    /// Returns the requested output lengths, resolving `--counts` against
    /// `--min-size`/`--max-size` (the latter pair is the default).
    #[must_use]
    pub fn lengths(&self) -> Vec<usize> {
        match &self.counts {
            Some(list) => {
                let mut lengths = list.clone();
                lengths.sort_unstable();
                lengths.dedup();
                lengths
            }
            None => (self.min_size..=self.max_size).collect(),
        }
    }

    /// Returns the output prefix, deriving `<input>.pcount` when unset.
    #[must_use]
    pub fn output_prefix(&self) -> PathBuf {
        match &self.out {
            Some(out) => out.clone(),
            None => match self.input() {
                Input::File(path) => {
                    let mut s = path.into_os_string();
                    s.push(".pcount");
                    PathBuf::from(s)
                }
                Input::Stdin => PathBuf::from("stdin.pcount"),
            },
        }
    }
}

/// Top-level CLI structure used only to detect the `merge` subcommand; the
/// default counting path parses [`Args`] directly, mirroring the corpus's own
/// dispatch between a subcommand-only `Cli` and a flat default `Args`.
#[derive(Parser, Debug)]
#[command(name = "sectormer")]
#[command(version, author, about = "Out-of-core k-mer counter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge several previously produced per-length outputs.
    Merge(MergeArgs),
}

/// Arguments for the merge subcommand (§4.8 `MultiLengthMerge`).
#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Output prefixes of prior runs to merge (at least two)
    #[arg(required = true, num_args = 2..)]
    pub inputs: Vec<PathBuf>,

    /// Output prefix for the merged result
    #[arg(long)]
    pub out: PathBuf,

    /// Comma-separated list of k-mer lengths to produce
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["min_size", "max_size"])]
    pub counts: Option<Vec<usize>>,

    /// Minimum k-mer length to produce
    #[arg(long, default_value = "8")]
    pub min_size: usize,

    /// Maximum k-mer length to produce
    #[arg(long, default_value = "30")]
    pub max_size: usize,

    /// Minimum occurrence count for a k-mer to be emitted
    #[arg(long, default_value = "1")]
    pub min_abundance: u32,
}

impl MergeArgs {
    /// Returns the requested output lengths, resolving `--counts` against
    /// `--min-size`/`--max-size`.
    #[must_use]
    pub fn lengths(&self) -> Vec<usize> {
        match &self.counts {
            Some(list) => {
                let mut lengths = list.clone();
                lengths.sort_unstable();
                lengths.dedup();
                lengths
            }
            None => (self.min_size..=self.max_size).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_args() {
        let args = Args::try_parse_from(["sectormer", "genome.fa"]).expect("should parse");
        assert_eq!(args.path, PathBuf::from("genome.fa"));
        assert_eq!(args.min_size, 8);
        assert_eq!(args.max_size, 30);
        assert_eq!(args.min_abundance, 3);
        assert!(!args.canonical);
    }

    #[test]
    fn counts_conflicts_with_min_max_size() {
        let err = Args::try_parse_from([
            "sectormer",
            "genome.fa",
            "--counts",
            "21",
            "--min-size",
            "10",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn lengths_from_counts() {
        let args = Args::try_parse_from(["sectormer", "genome.fa", "--counts", "21,18,21"])
            .expect("should parse");
        assert_eq!(args.lengths(), vec![18, 21]);
    }

    #[test]
    fn lengths_from_min_max() {
        let args = Args::try_parse_from(["sectormer", "genome.fa", "--min-size", "4", "--max-size", "6"])
            .expect("should parse");
        assert_eq!(args.lengths(), vec![4, 5, 6]);
    }

    #[test]
    fn output_prefix_defaults_from_input() {
        let args = Args::try_parse_from(["sectormer", "genome.fa"]).expect("should parse");
        assert_eq!(args.output_prefix(), PathBuf::from("genome.fa.pcount"));
    }

    #[test]
    fn output_prefix_stdin_default() {
        let args = Args::try_parse_from(["sectormer"]).expect("should parse");
        assert_eq!(args.output_prefix(), PathBuf::from("stdin.pcount"));
    }

    #[test]
    fn merge_requires_two_inputs() {
        let err = Cli::try_parse_from(["sectormer", "merge", "--out", "m", "one.pcount"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::TooFewValues);
    }

    #[test]
    fn merge_parses_with_two_inputs() {
        let cli = Cli::try_parse_from([
            "sectormer",
            "merge",
            "--out",
            "merged",
            "one.pcount",
            "two.pcount",
        ])
        .expect("should parse");
        let Some(Command::Merge(merge_args)) = cli.command else {
            panic!("expected merge subcommand");
        };
        assert_eq!(merge_args.inputs.len(), 2);
        assert_eq!(merge_args.min_abundance, 1);
    }
}
