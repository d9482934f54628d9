// src/parallel.rs
// PARALLEL SEARCH DRIVER
// Fans the antidiagonal sweep out across (chunk, type) pairs with
// Rayon. Each worker owns its own DP cell buffer and its own
// chunk-scoped candidate list; group filtering per type and the final
// cross-type merge both happen on the main thread once every worker
// is back, exactly as the sequential driver does them.

use rayon::prelude::*;

use crate::candidate::{merge_candidate_lists, Candidate, CandidateList};
use crate::cell::Penalization;
use crate::chunk::{chunk_sequence, encode_sequence};
use crate::error::Result;
use crate::search::{chunk_bases, search_chunk_into, type_run, validate, SearchParams};
use crate::stats::StatTable;
use crate::tables::TypeTables;

pub struct ParallelSearchDriver;

impl ParallelSearchDriver {
    /// Same contract as `search::search`, but every `(chunk, type)` pair
    /// runs on its own Rayon worker.
    ///
    /// 1. Split `seq` into unambiguous chunks, same as the sequential
    ///    driver.
    /// 2. Build the full `(tri_type, chunk)` job list and fan it out
    ///    with `into_par_iter`, each job sweeping its own `Vec<DpCell>`
    ///    and filling its own chunk-scoped `CandidateList`.
    /// 3. Re-insert every job's candidates into one list per type (a
    ///    chunk boundary never lets two chunks' candidates overlap, so
    ///    this re-insertion only sorts and merges, nothing is pruned
    ///    away that survived step 2), then run the per-type group
    ///    filter.
    /// 4. Merge the per-type lists into one sorted result, via the same
    ///    k-way merge the sequential driver uses.
    ///
    /// Progress reporting isn't threaded through the worker pool - a
    /// `&mut dyn ProgressSink` can't be shared across Rayon tasks. Use
    /// `search::search` directly when progress events matter.
    pub fn search(
        seq: &[u8],
        types: &[usize],
        params: &SearchParams,
        pen: &Penalization,
        tables: &TypeTables,
        stats: &StatTable,
    ) -> Result<Vec<Candidate>> {
        validate(params, pen, types)?;

        let symbols = encode_sequence(seq)?;
        let chunks = chunk_sequence(&symbols);
        let max_len = params.max_len + params.max_loop;

        let mut jobs = Vec::with_capacity(types.len() * chunks.len());
        for &tri_type in types {
            for (chunk_index, chunk) in chunks.iter().enumerate() {
                jobs.push((tri_type, chunk_index, chunk));
            }
        }

        let job_results: Vec<(usize, Vec<Candidate>)> = jobs
            .into_par_iter()
            .map(|(tri_type, chunk_index, chunk)| {
                let run = type_run(tri_type, params, pen, tables, stats);
                let bases = chunk_bases(&symbols, chunk);
                let mut list = CandidateList::new(max_len);
                search_chunk_into(
                    &bases, chunk.start, chunk_index, &run, tri_type, params, pen, tables, stats, &mut list, None,
                );
                (tri_type, list.into_sorted_vec())
            })
            .collect();

        let per_type_lists: Vec<CandidateList> = types
            .iter()
            .map(|&tri_type| {
                let mut list = CandidateList::new(max_len);
                for (job_type, candidates) in &job_results {
                    if *job_type == tri_type {
                        for &c in candidates {
                            list.insert(c);
                        }
                    }
                }
                list.group_filter();
                list
            })
            .collect();

        Ok(merge_candidate_lists(per_type_lists))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::search;
    use crate::tables::default_tables;

    fn pen() -> Penalization {
        Penalization {
            dtwist: 10,
            mismatch: 7,
            insertion: 9,
            iso_change: 5,
            iso_stay: 0,
        }
    }

    fn params() -> SearchParams {
        SearchParams {
            min_score: 10,
            p_val: 1.0,
            min_len: 8,
            max_len: 30,
            min_loop: 3,
            max_loop: 10,
        }
    }

    #[test]
    fn matches_sequential_driver_on_a_single_chunk() {
        let tables = default_tables();
        let stats = StatTable::default_table();
        let seq = b"gaaaaagggagggagggaggg";

        let sequential = search(seq, &[0], &params(), &pen(), &tables, &stats, None).unwrap();
        let parallel = ParallelSearchDriver::search(seq, &[0], &params(), &pen(), &tables, &stats).unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn matches_sequential_driver_across_chunk_boundaries_and_types() {
        let tables = default_tables();
        let stats = StatTable::default_table();
        let seq = b"gaaaaagggagggagggagggnnnnntttttccccccccccccccnnnnngaaaaagggagggagggaggg";
        let types = [0, 1, 2, 3];

        let sequential = search(seq, &types, &params(), &pen(), &tables, &stats, None).unwrap();
        let parallel = ParallelSearchDriver::search(seq, &types, &params(), &pen(), &tables, &stats).unwrap();

        assert_eq!(sequential, parallel);
    }
}
