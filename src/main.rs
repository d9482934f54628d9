// src/main.rs
// TRIPLEX: Intramolecular Triplex-Forming Region Search & Alignment Engine
// Entry point for the Command Line Interface.

mod cli;

use triplex::align::align;
use triplex::candidate::Candidate;
use triplex::cell::Penalization;
use triplex::parallel::ParallelSearchDriver;
use triplex::progress::ProgressEvent;
use triplex::search::{search, SearchParams};
use triplex::stats::{SeqClass, StatTable};
use triplex::tables::{default_tables, NUM_TRI_TYPES};
use crate::cli::{Cli, Commands, SeqClassArg};

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};

fn main() -> Result<()> {
    let cli = Cli::parse();

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.jobs)
        .build_global()
        .map_err(|e| anyhow::anyhow!("Failed to configure thread pool: {}", e))?;

    let num_threads = rayon::current_num_threads();
    if num_threads == 1 {
        println!("[i] Mode: SEQUENTIAL (Single-threaded)");
    } else {
        println!("[i] Mode: PARALLEL ({} threads active)", num_threads);
    }

    match &cli.command {
        Commands::Search {
            input,
            types,
            min_score,
            p_val,
            min_len,
            max_len,
            min_loop,
            max_loop,
            mismatch,
            insertion,
            iso_change,
            iso_stay,
            dtwist,
            seq_class,
            output,
        } => {
            println!("[*] Reading sequence from {}...", input);
            let seq = read_sequence(input)?;
            println!("[i] Sequence length: {} bases", seq.len());

            let types: Vec<usize> = if types.is_empty() {
                (0..NUM_TRI_TYPES).collect()
            } else {
                types.clone()
            };

            let params = SearchParams {
                min_score: *min_score,
                p_val: *p_val,
                min_len: *min_len,
                max_len: *max_len,
                min_loop: *min_loop,
                max_loop: *max_loop,
            };
            let pen = Penalization {
                dtwist: *dtwist,
                mismatch: *mismatch,
                insertion: *insertion,
                iso_change: *iso_change,
                iso_stay: *iso_stay,
            };
            let tables = default_tables();
            let stats = StatTable::for_seq_class(match seq_class {
                SeqClassArg::Prokaryotic => SeqClass::Prokaryotic,
                SeqClassArg::Eukaryotic => SeqClass::Eukaryotic,
            });

            println!("[*] Searching types {:?}...", types);
            let candidates = if num_threads == 1 {
                let mut sink = |event: ProgressEvent| {
                    if let ProgressEvent::ChunkFinished { chunk_index } = event {
                        print!("\r    -> Chunk {} done... ", chunk_index);
                        let _ = io::stdout().flush();
                    }
                };
                search(&seq, &types, &params, &pen, &tables, &stats, Some(&mut sink))
                    .context("search failed")?
            } else {
                ParallelSearchDriver::search(&seq, &types, &params, &pen, &tables, &stats).context("search failed")?
            };

            println!("\n[✔] Found {} candidate regions.", candidates.len());

            let csv = render_csv(&candidates);
            match output {
                Some(path) => {
                    let mut f = File::create(path).context(format!("Failed to create output: {}", path))?;
                    f.write_all(csv.as_bytes())?;
                    println!("[+] Wrote results to {}.", path);
                }
                None => {
                    io::stdout().write_all(csv.as_bytes())?;
                }
            }
        }

        Commands::Align {
            input,
            tri_type,
            min_loop,
            max_loop,
            mismatch,
            insertion,
            iso_change,
            iso_stay,
            dtwist,
        } => {
            println!("[*] Reading sequence from {}...", input);
            let seq = read_sequence(input)?;

            let params = SearchParams {
                min_score: 0,
                p_val: 1.0,
                min_len: 1,
                max_len: seq.len() as i32,
                min_loop: *min_loop,
                max_loop: *max_loop,
            };
            let pen = Penalization {
                dtwist: *dtwist,
                mismatch: *mismatch,
                insertion: *insertion,
                iso_change: *iso_change,
                iso_stay: *iso_stay,
            };
            let tables = default_tables();

            let rendered = align(&seq, *tri_type, &params, &pen, &tables).context("alignment failed")?;
            println!("[✔] Rendered alignment:");
            println!("{}", rendered);
        }
    }

    Ok(())
}

/// Reads a raw ACGT(+IUPAC) sequence, or a single-record FASTA (the
/// leading ">"-prefixed header line is skipped), from a file or stdin
/// ("-"), concatenating every remaining line.
fn read_sequence(path: &str) -> Result<Vec<u8>> {
    let mut reader: Box<dyn BufRead> = if path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(path).context(format!("Failed to open input: {}", path))?;
        Box::new(BufReader::new(file))
    };

    let mut first_line = String::new();
    let mut seq = Vec::new();

    let n = reader.read_line(&mut first_line)?;
    if n > 0 && !first_line.starts_with('>') {
        seq.extend_from_slice(first_line.trim_end().as_bytes());
    }

    let mut rest = String::new();
    reader.read_to_string(&mut rest)?;
    for line in rest.lines() {
        seq.extend_from_slice(line.trim_end().as_bytes());
    }

    Ok(seq)
}

fn render_csv(candidates: &[Candidate]) -> String {
    let mut out = String::from("type,strand,start,end,lstart,lend,score,pvalue,insdel\n");
    for c in candidates {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{:.6},{}\n",
            c.tri_type, c.strand, c.start, c.end, c.lstart, c.lend, c.score, c.pvalue, c.insdel
        ));
    }
    out
}
