// src/search.rs
// SEARCH DRIVER (C4)
// Drives the antidiagonal DP sweep per (chunk, type), exporting
// candidates on quality/length transitions, and merges the per-type
// results into one sorted list.

use crate::candidate::{merge_candidate_lists, Candidate, CandidateList};
use crate::cell::{status, update_cell, DpCell, Penalization};
use crate::chunk::{chunk_sequence, encode_sequence, ChunkInterval, Symbol};
use crate::error::{Result, TriplexError};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::stats::StatTable;
use crate::tables::{Base, TypeTables, NUM_TRI_TYPES, TAB_STRAND};

/// Long chunks are split into overlapping pieces of this size before the
/// DP sweep runs, so memory use stays bounded regardless of input length.
pub const MAX_PIECE_SIZE: usize = 10 * 1024;

/// Search-scoped tunables (spec.md's `Parameters`).
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    pub min_score: i32,
    pub p_val: f64,
    pub min_len: i32,
    pub max_len: i32,
    pub min_loop: i32,
    pub max_loop: i32,
}

pub(crate) fn validate(params: &SearchParams, pen: &Penalization, types: &[usize]) -> Result<()> {
    if params.min_loop > params.max_loop {
        return Err(TriplexError::BadParameters(format!(
            "min_loop ({}) > max_loop ({})",
            params.min_loop, params.max_loop
        )));
    }
    if params.min_len > params.max_len {
        return Err(TriplexError::BadParameters(format!(
            "min_len ({}) > max_len ({})",
            params.min_len, params.max_len
        )));
    }
    if params.min_len < 1 {
        return Err(TriplexError::BadParameters("min_len must be positive".into()));
    }
    if params.min_loop < 0 {
        return Err(TriplexError::BadParameters("min_loop must be non-negative".into()));
    }
    if !(0.0..=1.0).contains(&params.p_val) {
        return Err(TriplexError::BadParameters("p_val must be in [0,1]".into()));
    }
    if pen.insertion <= 0 {
        return Err(TriplexError::BadParameters("insertion penalty must be positive".into()));
    }
    if pen.mismatch < 0 || pen.iso_change < 0 || pen.iso_stay < 0 || pen.dtwist < 0 {
        return Err(TriplexError::BadParameters("penalizations must be non-negative".into()));
    }
    for &t in types {
        if t >= NUM_TRI_TYPES {
            return Err(TriplexError::BadParameters(format!("triplex type {} out of range", t)));
        }
    }
    Ok(())
}

fn get_n_antidiag(max_bonus: i32, insertion: i32, max_len: i32, min_score: i32, max_loop: i32) -> i32 {
    let total_bonus = max_bonus * max_len;
    let score_surplus = total_bonus - min_score;
    let n_ins = if score_surplus > 0 { score_surplus / insertion } else { 0 };
    max_loop + 2 * max_len + n_ins
}

fn get_length(start_antidiag: i32, end_antidiag: i32, insertions: u8) -> i32 {
    (end_antidiag - start_antidiag - insertions as i32) / 2 + 1
}

/// `(rel_offset, piece_len)` pairs covering a chunk of length `chunk_len`,
/// each piece overlapping the next by `pieces_overlap` bases so any
/// feasible triplex is fully contained in at least one piece.
fn split_into_pieces(chunk_len: usize, pieces_overlap: usize) -> Vec<(usize, usize)> {
    let mut npieces = (chunk_len + MAX_PIECE_SIZE - 1) / MAX_PIECE_SIZE;
    let delta = MAX_PIECE_SIZE;
    let mut last_piece_l = chunk_len - (npieces - 1) * MAX_PIECE_SIZE;

    if last_piece_l <= pieces_overlap && npieces > 1 {
        npieces -= 1;
        last_piece_l = chunk_len - (npieces - 1) * MAX_PIECE_SIZE;
    }

    let mut out = Vec::with_capacity(npieces);
    for j in 0..npieces {
        let piece_offset = j * delta;
        let piece_l = if j == npieces - 1 {
            last_piece_l
        } else {
            (MAX_PIECE_SIZE + pieces_overlap).min(chunk_len - piece_offset)
        };
        out.push((piece_offset, piece_l));
    }
    out
}

fn export_candidate(d: &DpCell, tri_type: usize, offset: i32, stats: &StatTable, list: &mut CandidateList) {
    let end_stem = (d.max_score_pos.diag + d.max_score_pos.antidiag - 1) / 2;
    let start_stem = end_stem - d.max_score_pos.antidiag;

    let end_loop = (d.start.diag + d.start.antidiag - 1) / 2;
    let start_loop = end_loop - d.start.antidiag;

    let candidate = Candidate {
        start: offset + start_stem + 1,
        end: offset + end_stem + 1,
        lstart: offset + start_loop + 1 + 1,
        lend: offset + end_loop + 1 - 1,
        score: d.max_score as i32,
        pvalue: stats.p_value(d.max_score as i32, tri_type),
        insdel: d.max_indels as i32,
        tri_type: tri_type as i32,
        strand: TAB_STRAND[tri_type] as i32,
        mark: 0,
    };
    list.insert(candidate);
}

/// Per-type quantities that only depend on `tri_type`, not on which
/// chunk is being processed - shared by every chunk's sweep for that
/// type, and by the parallel driver's per-`(chunk, type)` workers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TypeRun {
    pub max_bonus: i32,
    pub effective_min_score: i32,
    pub n_antidiag_full: i32,
    pub pieces_overlap: usize,
}

pub(crate) fn type_run(tri_type: usize, params: &SearchParams, pen: &Penalization, tables: &TypeTables, stats: &StatTable) -> TypeRun {
    let max_bonus = tables.max_bonus(tri_type, pen.iso_stay);
    let p_val_min_score = stats.min_score_for_pvalue(params.p_val, tri_type);
    let effective_min_score = params.min_score.max(p_val_min_score);
    let n_antidiag_full = get_n_antidiag(max_bonus, pen.insertion, params.max_len, effective_min_score, params.max_loop);
    TypeRun {
        max_bonus,
        effective_min_score,
        n_antidiag_full,
        pieces_overlap: n_antidiag_full as usize,
    }
}

/// Decodes one chunk's symbols into its concrete bases. Chunks never
/// contain ambiguity codes (that's what makes them chunks).
pub(crate) fn chunk_bases(symbols: &[Symbol], chunk: &ChunkInterval) -> Vec<Base> {
    symbols[chunk.start..=chunk.end]
        .iter()
        .map(|s| match s {
            Symbol::Base(b) => *b,
            Symbol::Ambiguous(_) => unreachable!("chunks never contain ambiguity codes"),
        })
        .collect()
}

/// Runs every piece of one chunk through the DP sweep for `tri_type`,
/// inserting exported candidates into `list`. The sequential driver
/// calls this once per chunk with a list shared across the whole type;
/// the parallel driver calls it once per `(chunk, type)` pair with a
/// list scoped to that pair alone.
#[allow(clippy::too_many_arguments)]
pub(crate) fn search_chunk_into(
    bases: &[Base],
    chunk_start: usize,
    chunk_index: usize,
    run: &TypeRun,
    tri_type: usize,
    params: &SearchParams,
    pen: &Penalization,
    tables: &TypeTables,
    stats: &StatTable,
    list: &mut CandidateList,
    mut progress: Option<&mut dyn ProgressSink>,
) {
    let chunk_len = bases.len();
    if let Some(sink) = progress.as_deref_mut() {
        sink.on_event(ProgressEvent::ChunkStarted { chunk_index, len: chunk_len });
    }

    for (rel_offset, piece_l) in split_into_pieces(chunk_len, run.pieces_overlap) {
        let piece = &bases[rel_offset..rel_offset + piece_l];
        let offset = (chunk_start + rel_offset) as i32;
        if let Some(sink) = progress.as_deref_mut() {
            sink.on_event(ProgressEvent::PieceStarted { chunk_index, piece_offset: offset as usize, piece_len: piece_l });
        }
        search_piece(
            piece,
            offset,
            run.n_antidiag_full,
            run.max_bonus,
            tri_type,
            params,
            run.effective_min_score,
            pen,
            tables,
            stats,
            list,
            progress.as_deref_mut(),
        );
    }

    if let Some(sink) = progress.as_deref_mut() {
        sink.on_event(ProgressEvent::ChunkFinished { chunk_index });
    }
}

#[allow(clippy::too_many_arguments)]
fn search_piece(
    piece: &[Base],
    offset: i32,
    n_antidiag_full: i32,
    max_bonus: i32,
    tri_type: usize,
    params: &SearchParams,
    effective_min_score: i32,
    pen: &Penalization,
    tables: &TypeTables,
    stats: &StatTable,
    list: &mut CandidateList,
    mut progress: Option<&mut dyn ProgressSink>,
) {
    let piece_l = piece.len();
    let mut cells: Vec<DpCell> = (0..2 * piece_l)
        .map(|i| DpCell::fresh(i as i32, params.min_loop))
        .collect();

    let ad_start = params.min_loop + 1;
    let n_antidiag = n_antidiag_full.min(piece_l as i32);

    for ad in ad_start..n_antidiag {
        let mut d_count = 0u32;
        let mut d_under_tres = 0u32;
        let threshold = effective_min_score - (n_antidiag - ad + 1) / 2 * max_bonus;

        let mut i = ad as usize;
        let mut d = (ad + 1) as usize;
        while i < piece_l {
            let a = piece[i];
            let b = piece[i - ad as usize];

            let dl = cells[d - 1];
            let dr = cells[d + 1];
            update_cell(a, b, &dl, &mut cells[d], &dr, d as i32, ad, tables, tri_type, params.max_loop, pen);

            let length = get_length(cells[d].start.antidiag, cells[d].max_score_pos.antidiag, cells[d].max_indels);
            cells[d].status = if length >= params.min_len {
                cells[d].status | status::MINLEN
            } else {
                cells[d].status & !status::MINLEN
            };

            if cells[d].score as i32 >= effective_min_score {
                cells[d].status |= status::QUALITY;
                if (cells[d].status & status::MINLEN) != 0 && (d == ad as usize + 1 || d == 2 * piece_l - ad as usize - 1) {
                    cells[d].status = status::EXPORT;
                    if stats.p_value(cells[d].max_score as i32, tri_type) <= params.p_val {
                        export_candidate(&cells[d], tri_type, offset, stats, list);
                    }
                }
            } else if (cells[d - 1].status & status::QUALITY) == 0
                && (cells[d + 1].status & status::QUALITY) == 0
                && (cells[d].status & status::QUALITY) != 0
                && (cells[d].status & status::MINLEN) != 0
            {
                cells[d].status = status::EXPORT;
                if stats.p_value(cells[d].max_score as i32, tri_type) <= params.p_val {
                    export_candidate(&cells[d], tri_type, offset, stats, list);
                }
                cells[d].max_score = 0;
            } else {
                cells[d].status = status::NONE;
            }

            d_count += 1;
            if (cells[d].score as i32) < threshold {
                d_under_tres += 1;
            }

            i += 1;
            d += 2;
        }

        if let Some(sink) = progress.as_deref_mut() {
            sink.on_event(ProgressEvent::AntidiagonalStats {
                tri_type,
                antidiagonal: ad,
                threshold,
                under_threshold_ratio: d_under_tres as f64 / d_count.max(1) as f64,
            });
        }
    }

    for i in 1..2 * piece_l {
        if (cells[i].status & status::QUALITY) != 0 && (cells[i].status & status::MINLEN) != 0 {
            if stats.p_value(cells[i].max_score as i32, tri_type) <= params.p_val {
                export_candidate(&cells[i], tri_type, offset, stats, list);
            }
        }
    }
}

/// Finds intramolecular triplex-forming regions for every requested type
/// over `seq`, returning the group-filtered, merged, sorted candidate set.
pub fn search(
    seq: &[u8],
    types: &[usize],
    params: &SearchParams,
    pen: &Penalization,
    tables: &TypeTables,
    stats: &StatTable,
    mut progress: Option<&mut dyn ProgressSink>,
) -> Result<Vec<Candidate>> {
    validate(params, pen, types)?;

    let symbols = encode_sequence(seq)?;
    let chunks = chunk_sequence(&symbols);
    let max_len = params.max_len + params.max_loop;

    let mut per_type_lists = Vec::with_capacity(types.len());

    for &tri_type in types {
        let run = type_run(tri_type, params, pen, tables, stats);
        let mut list = CandidateList::new(max_len);

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let bases = chunk_bases(&symbols, chunk);
            search_chunk_into(
                &bases,
                chunk.start,
                chunk_index,
                &run,
                tri_type,
                params,
                pen,
                tables,
                stats,
                &mut list,
                progress.as_deref_mut(),
            );
        }

        list.group_filter();
        per_type_lists.push(list);
    }

    Ok(merge_candidate_lists(per_type_lists))
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn single_match_scenario_yields_one_record_spanning_whole_sequence() {
        let tables = default_tables();
        let stats = StatTable::default_table();
        let results = search(
            b"gaaaaagggagggagggaggg",
            &[0],
            &params(),
            &pen(),
            &tables,
            &stats,
            None,
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        let c = results[0];
        assert_eq!((c.start, c.end), (1, 21));
        assert!(c.score >= 10);
        assert!(c.start <= c.lstart && c.lstart <= c.lend && c.lend <= c.end);
    }

    #[test]
    fn all_a_sequence_yields_no_records() {
        let tables = default_tables();
        let stats = StatTable::default_table();
        let seq = vec![b'a'; 100];
        let results = search(&seq, &[0], &params(), &pen(), &tables, &stats, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn palindrome_yields_full_span_record() {
        let tables = default_tables();
        let stats = StatTable::default_table();
        let mut p = params();
        p.min_score = 1;
        p.min_len = 1;
        let results = search(b"aaaaaatttttt", &[0], &p, &pen(), &tables, &stats, None).unwrap();
        assert!(!results.is_empty());
        let c = results[0];
        assert_eq!(c.start, 1);
        assert_eq!(c.end, 12);
    }

    #[test]
    fn emitted_records_respect_coordinate_ordering() {
        let tables = default_tables();
        let stats = StatTable::default_table();
        let results = search(
            b"gaaaaagggagggagggagggtttttcccccccccccccc",
            &[0, 1, 2, 3],
            &params(),
            &pen(),
            &tables,
            &stats,
            None,
        )
        .unwrap();
        for c in &results {
            assert!(c.start <= c.lstart);
            assert!(c.lstart <= c.lend);
            assert!(c.lend <= c.end);
        }
        let mut sorted = results.clone();
        sorted.sort_by_key(|c| (c.start, c.end));
        assert_eq!(results, sorted);
    }

    #[test]
    fn rejects_inverted_loop_bounds() {
        let tables = default_tables();
        let stats = StatTable::default_table();
        let mut p = params();
        p.min_loop = 20;
        p.max_loop = 5;
        let err = search(b"acgtacgt", &[0], &p, &pen(), &tables, &stats, None).unwrap_err();
        assert!(matches!(err, TriplexError::BadParameters(_)));
    }
}
