// src/tables.rs
// SCORING TABLES (C1)
// Tabulated triplet score, isomorphic group and C1-C1-C1 twist angle for
// the eight geometric triplex classes, plus the symmetry that relates
// them to two base tables (parallel, antiparallel).

/// A DNA base, mapped to the array index used throughout the scoring
/// tables (A=0, C=1, G=2, T=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    pub fn idx(self) -> usize {
        match self {
            Base::A => 0,
            Base::C => 1,
            Base::G => 2,
            Base::T => 3,
        }
    }

    pub fn from_idx(i: usize) -> Base {
        match i {
            0 => Base::A,
            1 => Base::C,
            2 => Base::G,
            3 => Base::T,
            _ => unreachable!("base index out of range"),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Base::A => 'a',
            Base::C => 'c',
            Base::G => 'g',
            Base::T => 't',
        }
    }

    pub fn complement(self) -> Base {
        match self {
            Base::A => Base::T,
            Base::C => Base::G,
            Base::G => Base::C,
            Base::T => Base::A,
        }
    }
}

pub const NUM_TRI_TYPES: usize = 8;
pub const NUM_SEQ_TYPES: usize = 2;
pub const NBASES: usize = 4;

/// Mismatch sentinel. Must remain strictly less than any achievable
/// score after a single bonus (`TS + ISO_STAY` in the default tables).
pub const SCORE_MISMATCH: i8 = -9;
pub const SCORE_WEAK: i8 = 1;
pub const SCORE_STRONG: i8 = 2;

/// Isomorphic group labels, named after the triplet classification in
/// Lexa et al. 2011. `IN` covers non-isomorphic (low-confidence) triplets.
pub mod iso_group {
    pub const IN: u8 = 0;
    pub const IA: u8 = 1;
    pub const IB: u8 = 2;
    pub const IC: u8 = 3;
    pub const ID: u8 = 4;
    pub const IE: u8 = 5;
}

/// Which strand (0 or 1) a given triplex type binds, indexed by type.
pub const TAB_STRAND: [u8; NUM_TRI_TYPES] = [0, 0, 1, 1, 1, 1, 0, 0];

pub type ScoreTable = [[i8; NBASES]; NBASES];
pub type GroupTable = [[u8; NBASES]; NBASES];
pub type TwistTable = [[u8; NBASES]; NBASES];

/// Per-type score/group/twist tables, shared immutably across a search.
#[derive(Debug, Clone)]
pub struct TypeTables {
    pub score: [ScoreTable; NUM_TRI_TYPES],
    pub group: [GroupTable; NUM_TRI_TYPES],
    pub twist: [TwistTable; NUM_TRI_TYPES],
}

impl TypeTables {
    pub fn max_bonus(&self, tri_type: usize, iso_stay_bonus: i32) -> i32 {
        let mut max = 0i32;
        for row in &self.score[tri_type] {
            for &v in row {
                if v as i32 > max {
                    max = v as i32;
                }
            }
        }
        max + iso_stay_bonus
    }
}

use iso_group::*;

const TM: i8 = SCORE_MISMATCH;
const TW: i8 = SCORE_WEAK;
const TS: i8 = SCORE_STRONG;

/// The eight literal score tables, copied directly from the reference
/// package's tabulated triplet scores (types 0-3 parallel, 4-7 antiparallel).
const DEFAULT_SCORE: [ScoreTable; NUM_TRI_TYPES] = [
    [[TM, TM, TM, TM], [TM, TS, TM, TM], [TS, TW, TM, TM], [TM, TW, TW, TS]],
    [[TM, TM, TS, TM], [TM, TS, TW, TW], [TM, TM, TM, TW], [TM, TM, TM, TS]],
    [[TS, TW, TW, TM], [TM, TM, TW, TS], [TM, TM, TS, TM], [TM, TM, TM, TM]],
    [[TS, TM, TM, TM], [TW, TM, TM, TM], [TW, TW, TS, TM], [TM, TS, TM, TM]],
    [[TM, TM, TW, TS], [TM, TS, TM, TM], [TM, TM, TM, TW], [TM, TW, TM, TS]],
    [[TM, TM, TM, TM], [TM, TS, TM, TW], [TW, TM, TM, TM], [TS, TM, TW, TS]],
    [[TS, TM, TW, TM], [TW, TM, TM, TM], [TM, TM, TS, TM], [TS, TW, TM, TM]],
    [[TS, TW, TM, TS], [TM, TM, TM, TW], [TW, TM, TS, TM], [TM, TM, TM, TM]],
];

const DEFAULT_GROUP: [GroupTable; NUM_TRI_TYPES] = [
    [[IN, IN, IN, IN], [IN, IA, IN, IN], [IB, IB, IN, IN], [IN, IA, IB, IA]],
    [[IN, IN, IB, IN], [IN, IA, IB, IA], [IN, IN, IN, IB], [IN, IN, IN, IA]],
    [[IA, IB, IA, IN], [IN, IN, IB, IB], [IN, IN, IA, IN], [IN, IN, IN, IN]],
    [[IA, IN, IN, IN], [IB, IN, IN, IN], [IA, IB, IA, IN], [IN, IB, IN, IN]],
    [[IN, IN, IE, IC], [IN, IE, IN, IN], [IN, IN, IN, ID], [IN, ID, IN, IC]],
    [[IN, IN, IN, IN], [IN, IE, IN, ID], [IE, IN, IN, IN], [IC, IN, ID, IC]],
    [[IC, IN, ID, IN], [ID, IN, IN, IN], [IN, IN, IE, IN], [IC, IE, IN, IN]],
    [[IC, ID, IN, IC], [IN, IN, IN, IE], [ID, IN, IE, IN], [IN, IN, IN, IN]],
];

const DEFAULT_TWIST: [TwistTable; NUM_TRI_TYPES] = [
    [[0, 0, 0, 0], [0, 109, 0, 0], [126, 75, 0, 0], [0, 78, 71, 104]],
    [[0, 0, 126, 0], [0, 109, 75, 78], [0, 0, 0, 71], [0, 0, 0, 104]],
    [[104, 71, 78, 0], [0, 0, 75, 126], [0, 0, 109, 0], [0, 0, 0, 0]],
    [[104, 0, 0, 0], [71, 0, 0, 0], [78, 75, 109, 0], [0, 126, 0, 0]],
    [[0, 0, 94, 72], [0, 94, 0, 0], [0, 0, 0, 72], [0, 126, 0, 77]],
    [[0, 0, 0, 0], [0, 94, 0, 126], [94, 0, 0, 0], [72, 0, 72, 77]],
    [[77, 0, 126, 0], [72, 0, 0, 0], [0, 0, 94, 0], [72, 94, 0, 0]],
    [[77, 72, 0, 72], [0, 0, 0, 94], [126, 0, 94, 0], [0, 0, 0, 0]],
];

/// The reference eight-type tables, as tabulated directly.
pub fn default_tables() -> TypeTables {
    TypeTables {
        score: DEFAULT_SCORE,
        group: DEFAULT_GROUP,
        twist: DEFAULT_TWIST,
    }
}

/// Derives the eight type-specific tables from two user-supplied 4x4
/// base tables (parallel, antiparallel) by row/column complementing and
/// transposing, per the symmetry described for triplex geometry classes.
///
/// Types 0-3 are the four symmetries of the parallel table; 4-7 are the
/// four symmetries of the antiparallel table. The symmetries applied are:
/// identity, transpose, complement both, and transpose + complement both
/// - the same group of transformations that relates the four parallel
/// (or four antiparallel) binding geometries to one another.
pub fn derive_eight_from_two<T: Copy>(
    parallel: [[T; NBASES]; NBASES],
    antiparallel: [[T; NBASES]; NBASES],
) -> [[[T; NBASES]; NBASES]; NUM_TRI_TYPES] {
    let sym = |base: [[T; NBASES]; NBASES]| -> [[[T; NBASES]; NBASES]; 4] {
        let comp = |i: usize| Base::from_idx(i).complement().idx();
        let t0 = base;
        let mut t1 = base;
        let mut t2 = base;
        let mut t3 = base;
        for i in 0..NBASES {
            for j in 0..NBASES {
                t1[i][j] = base[j][i];
                t2[i][j] = base[comp(i)][comp(j)];
                t3[i][j] = base[comp(j)][comp(i)];
            }
        }
        [t0, t1, t2, t3]
    };

    let p = sym(parallel);
    let a = sym(antiparallel);
    [p[0], p[1], p[2], p[3], a[0], a[1], a[2], a[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_sentinel_below_any_bonus() {
        let tables = default_tables();
        for t in 0..NUM_TRI_TYPES {
            let max_bonus = tables.max_bonus(t, 5);
            assert!((SCORE_MISMATCH as i32) < max_bonus);
        }
    }

    #[test]
    fn derivation_reproduces_all_eight_literal_score_tables() {
        let derived = derive_eight_from_two(DEFAULT_SCORE[0], DEFAULT_SCORE[4]);
        for t in 0..NUM_TRI_TYPES {
            assert_eq!(derived[t], DEFAULT_SCORE[t], "type {t} mismatch");
        }
    }

    #[test]
    fn base_roundtrip() {
        for i in 0..NBASES {
            assert_eq!(Base::from_idx(i).idx(), i);
        }
    }
}
