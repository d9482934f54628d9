// src/stats.rs
// STATISTICS (C7)
// Gumbel/extreme-value p-value and its score-threshold inverse.

use crate::tables::NUM_TRI_TYPES;

/// Per-type Gumbel (extreme value) distribution parameters.
#[derive(Debug, Clone, Copy)]
pub struct GumbelParams {
    pub lambda: f64,
    pub mu: f64,
}

/// Default per-type `(lambda, mu)` pairs, shared by parallel types
/// 0,1,4,5 and antiparallel types 2,3,6,7 respectively.
pub const DEFAULT_LAMBDA: [f64; NUM_TRI_TYPES] = [0.71, 0.71, 0.67, 0.67, 0.71, 0.71, 0.67, 0.67];
pub const DEFAULT_MU: [f64; NUM_TRI_TYPES] = [5.88, 5.88, 6.05, 6.05, 5.88, 5.88, 6.05, 6.05];

/// Which sequence class a second, alternative set of statistical
/// parameters should be drawn from, per spec's prokaryotic/eukaryotic
/// distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqClass {
    Prokaryotic,
    Eukaryotic,
}

#[derive(Debug, Clone)]
pub struct StatTable {
    pub params: [GumbelParams; NUM_TRI_TYPES],
}

impl StatTable {
    pub fn default_table() -> StatTable {
        Self::for_seq_class(SeqClass::Prokaryotic)
    }

    /// Builds the table for a given sequence class. Only one literal
    /// `(lambda, mu)` set was recovered from the reference package, so
    /// both classes currently share it; this is the seam a distinct
    /// eukaryotic parameter set would plug into without touching any
    /// caller.
    pub fn for_seq_class(_class: SeqClass) -> StatTable {
        let mut params = [GumbelParams { lambda: 0.0, mu: 0.0 }; NUM_TRI_TYPES];
        for t in 0..NUM_TRI_TYPES {
            params[t] = GumbelParams {
                lambda: DEFAULT_LAMBDA[t],
                mu: DEFAULT_MU[t],
            };
        }
        StatTable { params }
    }

    pub fn p_value(&self, score: i32, tri_type: usize) -> f64 {
        p_value(score, self.params[tri_type])
    }

    /// Smallest integer score whose p-value is `<= p_val`. Relies on
    /// `p_value` being non-increasing in `score`, per spec invariant 2.
    pub fn min_score_for_pvalue(&self, p_val: f64, tri_type: usize) -> i32 {
        min_score_for_pvalue(p_val, self.params[tri_type])
    }
}

fn p_value(score: i32, p: GumbelParams) -> f64 {
    1.0 - (-(-p.lambda * (score as f64 - p.mu)).exp()).exp()
}

/// `score` is stored as `i16` throughout the DP (see `DpCell`), so no
/// candidate can ever exceed `i16::MAX`; that's the natural, overflow-safe
/// cap for this search. `p_value` only approaches 0 in the limit and never
/// reaches it, so a `p_val` of exactly 0 (in-range per `validate`, spec
/// §7's "degenerate parameters ... produce an empty result set") would
/// otherwise loop forever and then overflow `i32`. Capping here just means
/// the effective cutoff becomes unreachable, yielding the empty result set
/// spec §4.10 calls for instead of hanging.
const MAX_SEARCHABLE_SCORE: i32 = i16::MAX as i32;

fn min_score_for_pvalue(p_val: f64, p: GumbelParams) -> i32 {
    let mut score = 1;
    while score < MAX_SEARCHABLE_SCORE && p_value(score, p) > p_val {
        score += 1;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p_value_is_monotone_non_increasing() {
        let table = StatTable::default_table();
        for t in 0..NUM_TRI_TYPES {
            let mut prev = f64::INFINITY;
            for score in -5..40 {
                let p = table.p_value(score, t);
                assert!(p <= prev + 1e-12);
                prev = p;
            }
        }
    }

    #[test]
    fn min_score_for_pvalue_satisfies_threshold() {
        let table = StatTable::default_table();
        let min = table.min_score_for_pvalue(0.05, 0);
        assert!(table.p_value(min, 0) <= 0.05);
        assert!(table.p_value(min - 1, 0) > 0.05);
    }

    #[test]
    fn scenario_type0_min_score_matches_expectation() {
        // Matches the spec's literal scenario: lambda=0.71, mu=5.88.
        let p = GumbelParams { lambda: 0.71, mu: 5.88 };
        assert!(p_value(10, p) <= 0.05);
    }

    #[test]
    fn zero_pvalue_caps_instead_of_hanging_or_overflowing() {
        let table = StatTable::default_table();
        let min = table.min_score_for_pvalue(0.0, 0);
        assert_eq!(min, MAX_SEARCHABLE_SCORE);
    }
}
