// src/cell.rs
// DP CELL UPDATE (C2)
// One virtual-matrix cell, tracked per diagonal, carrying score,
// isomorphic-group and twist-angle state across antidiagonal sweeps.

use crate::chunk::Symbol;
use crate::tables::{Base, TypeTables, SCORE_MISMATCH};

/// Coordinate of a DP matrix position, expressed as (diagonal, antidiagonal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub diag: i32,
    pub antidiag: i32,
}

/// Which transition produced the current cell score. `Stop` and
/// `MainAntidiag` only appear in the alignment rule matrix (C6), where
/// they terminate the traceback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpRule {
    Match,
    Mismatch,
    Left,
    Right,
    Stop,
    MainAntidiag,
}

/// Cell status bits, set each antidiagonal step by the search driver.
pub mod status {
    pub const NONE: u8 = 0;
    pub const QUALITY: u8 = 1;
    pub const MINLEN: u8 = 2;
    pub const EXPORT: u8 = 4;
}

/// Penalty/bonus configuration for the DP recurrence.
#[derive(Debug, Clone, Copy)]
pub struct Penalization {
    /// Maximum tolerated twist drift (degrees) between chained triplets.
    pub dtwist: i32,
    pub mismatch: i32,
    pub insertion: i32,
    pub iso_change: i32,
    pub iso_stay: i32,
}

/// Per-diagonal DP state. Copy, since an insertion/deletion transition
/// clones an entire neighbour cell before overriding a few fields - the
/// same in-place copy the reference recurrence performs.
#[derive(Debug, Clone, Copy)]
pub struct DpCell {
    pub start: Pos,
    pub max_score_pos: Pos,

    pub bound: u8,
    pub twist: u8,
    pub dtwist: i8,
    pub status: u8,

    pub score: i16,
    pub max_score: i16,

    pub dp_rule: DpRule,
    pub indels: u8,
    pub max_indels: u8,
}

impl DpCell {
    /// Fresh cell for diagonal `diag`, with the loop-parity-dependent
    /// starting antidiagonal used by both the search driver and the
    /// alignment matrix.
    pub fn fresh(diag: i32, min_loop: i32) -> DpCell {
        let start_antidiag = if (min_loop + diag) % 2 == 0 {
            min_loop + 1
        } else {
            min_loop + 2
        };
        let start = Pos { diag, antidiag: start_antidiag };
        DpCell {
            start,
            max_score_pos: start,
            bound: 0,
            twist: 90,
            dtwist: 0,
            status: status::NONE,
            score: 0,
            max_score: 0,
            dp_rule: DpRule::Mismatch,
            indels: 0,
            max_indels: 0,
        }
    }
}

/// Applies one DP recurrence step to cell `d`, given its left/right
/// antidiagonal neighbours `dl`/`dr` (read-only: they hold state from
/// the previous antidiagonal and are never written by this call).
///
/// `a` comes from the forward half of the piece, `b` from the reverse
/// half offset by the antidiagonal index. See spec module 4.2.
#[allow(clippy::too_many_arguments)]
pub fn update_cell(
    a: Base,
    b: Base,
    dl: &DpCell,
    d: &mut DpCell,
    dr: &DpCell,
    diag: i32,
    antidiag: i32,
    tables: &TypeTables,
    tri_type: usize,
    max_loop: i32,
    pen: &Penalization,
) {
    let inc = tables.score[tri_type][a.idx()][b.idx()] as i32;
    let is_match = inc > SCORE_MISMATCH as i32;

    let mm_score = if is_match {
        let mut s = d.score as i32 + inc;
        if d.dp_rule == DpRule::Match {
            let group = tables.group[tri_type][a.idx()][b.idx()];
            let twist = tables.twist[tri_type][a.idx()][b.idx()] as i32;
            let same_group = group == d.bound;
            let twist_ok = (twist - d.twist as i32).abs() <= pen.dtwist
                || (twist - d.twist as i32 + d.dtwist as i32).abs() <= pen.dtwist;
            if same_group || twist_ok {
                s += pen.iso_stay;
            } else {
                s -= pen.iso_change;
            }
        }
        s
    } else {
        d.score as i32 - pen.mismatch
    };

    if mm_score >= dl.score as i32 - pen.insertion && mm_score >= dr.score as i32 - pen.insertion {
        d.dp_rule = if is_match { DpRule::Match } else { DpRule::Mismatch };
        d.score = mm_score as i16;

        if is_match {
            let group = tables.group[tri_type][a.idx()][b.idx()];
            let twist = tables.twist[tri_type][a.idx()][b.idx()];
            d.dtwist = (twist as i32 - d.twist as i32) as i8;
            d.bound = group;
            d.twist = twist;

            if mm_score >= d.max_score as i32 {
                d.max_score = mm_score as i16;
                d.max_score_pos = Pos { diag, antidiag };
                d.max_indels = d.indels;
            }
        }
    } else if dl.score > dr.score {
        let from_left = dl.score - pen.insertion as i16;
        *d = *dl;
        d.score = from_left;
        d.dp_rule = DpRule::Left;
        d.indels += 1;
    } else {
        let from_right = dr.score - pen.insertion as i16;
        *d = *dr;
        d.score = from_right;
        d.dp_rule = DpRule::Right;
        d.indels += 1;
    }
    if (d.score as i32) < 0 && antidiag <= max_loop {
        d.score = 0;
        d.max_score = 0;
        d.start = Pos { diag, antidiag };
        d.max_score_pos = Pos { diag, antidiag };
        d.indels = 0;
        d.max_indels = 0;
    }
}

/// Chooses, among every concrete base pair consistent with ambiguity
/// codes `a`/`b`, the one maximising `score[t][i][j]` plus whatever
/// isomorphic bonus/penalty that pair would earn against `d`'s current
/// `bound`/`twist` state (spec module 4.8). Chunking (C3) never leaves
/// an ambiguity code inside a chunk, so this only matters for a caller
/// that runs the recurrence without chunking first (alignment).
pub fn resolve_iupac(tables: &TypeTables, tri_type: usize, a: Symbol, b: Symbol, d: &DpCell, pen: &Penalization) -> (Base, Base) {
    let a_opts = a.candidates();
    let b_opts = b.candidates();
    let mut best = (a_opts[0], b_opts[0]);
    let mut best_score = i32::MIN;
    for &ab in &a_opts {
        for &bb in &b_opts {
            let inc = tables.score[tri_type][ab.idx()][bb.idx()] as i32;
            let mut s = inc;
            if inc > SCORE_MISMATCH as i32 && d.dp_rule == DpRule::Match {
                let group = tables.group[tri_type][ab.idx()][bb.idx()];
                let twist = tables.twist[tri_type][ab.idx()][bb.idx()] as i32;
                let same_group = group == d.bound;
                let twist_ok = (twist - d.twist as i32).abs() <= pen.dtwist
                    || (twist - d.twist as i32 + d.dtwist as i32).abs() <= pen.dtwist;
                s += if same_group || twist_ok { pen.iso_stay } else { -pen.iso_change };
            }
            if s > best_score {
                best_score = s;
                best = (ab, bb);
            }
        }
    }
    best
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

    #[test]
    fn fresh_cell_parity_matches_min_loop() {
        let c = DpCell::fresh(4, 3);
        assert_eq!(c.start.antidiag, 5);
        let c2 = DpCell::fresh(5, 3);
        assert_eq!(c2.start.antidiag, 4);
    }

    #[test]
    fn single_match_increases_score() {
        let tables = default_tables();
        let dl = DpCell::fresh(0, 3);
        let dr = DpCell::fresh(2, 3);
        let mut d = DpCell::fresh(1, 3);
        update_cell(Base::G, Base::A, &dl, &mut d, &dr, 1, 4, &tables, 0, 10, &pen());
        assert!(d.score > 0);
        assert_eq!(d.dp_rule, DpRule::Match);
    }

    #[test]
    fn negative_score_resets_within_loop() {
        let tables = default_tables();
        let dl = DpCell::fresh(0, 3);
        let dr = DpCell::fresh(2, 3);
        let mut d = DpCell::fresh(1, 3);
        d.score = -1;
        d.dp_rule = DpRule::Mismatch;
        update_cell(Base::A, Base::A, &dl, &mut d, &dr, 1, 2, &tables, 0, 10, &pen());
        assert_eq!(d.score, 0);
        assert_eq!(d.indels, 0);
    }

    #[test]
    fn resolve_iupac_picks_highest_scoring_concrete_pair() {
        let tables = default_tables();
        let d = DpCell::fresh(1, 3);
        // type 0, a=G (fixed) vs b in {A,G} (R): G/A scores TW=1, G/G scores TM=-9
        // in DEFAULT_SCORE[0][2] = [TS, TW, TM, TM] -> index 0 (A) = TS = 2.
        let (ra, rb) = resolve_iupac(&tables, 0, Symbol::Base(Base::G), Symbol::Ambiguous(crate::chunk::Ambiguity::R), &d, &pen());
        assert_eq!(ra, Base::G);
        assert_eq!(rb, Base::A);
    }

    #[test]
    fn resolve_iupac_is_identity_for_two_concrete_bases() {
        let tables = default_tables();
        let d = DpCell::fresh(1, 3);
        let (ra, rb) = resolve_iupac(&tables, 0, Symbol::Base(Base::G), Symbol::Base(Base::A), &d, &pen());
        assert_eq!((ra, rb), (Base::G, Base::A));
    }
}
