// src/cli.rs
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "triplex", author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(help_template = "\
{before-help}{name} v{version}
{author-with-newline}{about-with-newline}
{usage-heading}
{usage}

{all-args}{after-help}
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set the number of threads for parallel processing.
    ///
    /// - 0: Auto-detect (Use all available cores).
    /// - 1: Sequential (Single-threaded, good for debugging).
    /// - >1: Force specific thread count.
    #[arg(short = 'j', long, global = true, default_value_t = 0, value_name = "THREADS")]
    pub jobs: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search a sequence for intramolecular triplex-forming regions.
    #[command(visible_alias = "find")]
    Search {
        /// Input sequence file: raw ACGT(+IUPAC) or a single-record
        /// FASTA (">"-prefixed header is skipped). Use "-" for stdin.
        #[arg(value_name = "SEQUENCE_FILE")]
        input: String,

        /// Triplex geometry class(es) to search for (0-7). Repeatable;
        /// defaults to all eight.
        #[arg(long = "type", value_name = "0-7")]
        types: Vec<usize>,

        /// Minimum raw DP score for a candidate to be considered.
        #[arg(long, default_value_t = 10, value_name = "N")]
        min_score: i32,

        /// Maximum p-value for a candidate to be exported.
        #[arg(long, default_value_t = 0.05, value_name = "F")]
        p_val: f64,

        /// Minimum stem length.
        #[arg(long, default_value_t = 8, value_name = "N")]
        min_len: i32,

        /// Maximum stem length.
        #[arg(long, default_value_t = 30, value_name = "N")]
        max_len: i32,

        /// Minimum loop length.
        #[arg(long, default_value_t = 3, value_name = "N")]
        min_loop: i32,

        /// Maximum loop length.
        #[arg(long, default_value_t = 10, value_name = "N")]
        max_loop: i32,

        /// Mismatch penalty.
        #[arg(long, default_value_t = 7, value_name = "N")]
        mismatch: i32,

        /// Insertion/deletion penalty.
        #[arg(long, default_value_t = 9, value_name = "N")]
        insertion: i32,

        /// Penalty for switching isomorphic group between chained triplets.
        #[arg(long, default_value_t = 5, value_name = "N")]
        iso_change: i32,

        /// Bonus for staying within the same isomorphic group.
        #[arg(long, default_value_t = 0, value_name = "N")]
        iso_stay: i32,

        /// Maximum tolerated twist drift (degrees) between chained triplets.
        #[arg(long, default_value_t = 10, value_name = "N")]
        dtwist: i32,

        /// Which default (lambda, mu) statistics to use.
        #[arg(long, value_enum, default_value_t = SeqClassArg::Prokaryotic)]
        seq_class: SeqClassArg,

        /// Write the CSV result here instead of stdout.
        #[arg(short, long, value_name = "CSV_FILE")]
        output: Option<String>,
    },

    /// Align and render a single candidate sequence as `body1=loop=body2`.
    Align {
        /// Input sequence file, or "-" for stdin.
        #[arg(value_name = "SEQUENCE_FILE")]
        input: String,

        /// Triplex geometry class to align under (0-7).
        #[arg(long = "type", value_name = "0-7")]
        tri_type: usize,

        /// Minimum loop length (bounds the DP's starting antidiagonal).
        #[arg(long, default_value_t = 3, value_name = "N")]
        min_loop: i32,

        /// Maximum loop length.
        #[arg(long, default_value_t = 10, value_name = "N")]
        max_loop: i32,

        /// Mismatch penalty.
        #[arg(long, default_value_t = 7, value_name = "N")]
        mismatch: i32,

        /// Insertion/deletion penalty.
        #[arg(long, default_value_t = 9, value_name = "N")]
        insertion: i32,

        /// Penalty for switching isomorphic group between chained triplets.
        #[arg(long, default_value_t = 5, value_name = "N")]
        iso_change: i32,

        /// Bonus for staying within the same isomorphic group.
        #[arg(long, default_value_t = 0, value_name = "N")]
        iso_stay: i32,

        /// Maximum tolerated twist drift (degrees) between chained triplets.
        #[arg(long, default_value_t = 10, value_name = "N")]
        dtwist: i32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SeqClassArg {
    Prokaryotic,
    Eukaryotic,
}
