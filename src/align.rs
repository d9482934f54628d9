// src/align.rs
// ALIGNMENT (C6)
// Full n*n rule-matrix DP over a single candidate sequence, with a
// traceback that renders `body1=loop=body2`.

use crate::cell::{resolve_iupac, update_cell, DpCell, DpRule, Penalization, Pos};
use crate::chunk::{encode_sequence, Symbol};
use crate::error::Result;
use crate::search::SearchParams;
use crate::tables::{Base, TypeTables};

/// Maps a recorded matrix position to the concrete base pair the DP
/// actually scored there. Spec module 4.8's side table: ambiguity
/// resolution never mutates the input, it only records what was chosen
/// for the current sweep so the traceback can render the right letters.
struct ResolvedPairs {
    pairs: Vec<(Base, Base)>,
    n: usize,
}

impl ResolvedPairs {
    fn new(n: usize) -> ResolvedPairs {
        ResolvedPairs { pairs: vec![(Base::A, Base::A); n * n], n }
    }

    fn set(&mut self, r: usize, c: usize, pair: (Base, Base)) {
        self.pairs[r * self.n + c] = pair;
    }

    fn get(&self, r: usize, c: usize) -> (Base, Base) {
        self.pairs[r * self.n + c]
    }
}

/// Flat, row-major `n*n` buffer of recorded DP cells (spec.md §9's
/// "raw 2D matrix" design note).
struct RuleMatrix {
    cells: Vec<DpCell>,
    n: usize,
}

impl RuleMatrix {
    fn new(n: usize) -> RuleMatrix {
        let mut cells = vec![DpCell::fresh(0, 0); n * n];
        for r in 0..n {
            for c in 0..n {
                let mut cell = DpCell::fresh(0, 0);
                cell.start = Pos { diag: 0, antidiag: 0 };
                cell.max_score_pos = cell.start;
                let on_main_antidiag = (r as isize) == (n as isize) - 1 - (c as isize)
                    || (r as isize) == (n as isize) - 2 - (c as isize);
                cell.dp_rule = if on_main_antidiag { DpRule::MainAntidiag } else { DpRule::Stop };
                cells[r * n + c] = cell;
            }
        }
        RuleMatrix { cells, n }
    }

    fn get(&self, r: usize, c: usize) -> DpCell {
        self.cells[r * self.n + c]
    }

    fn set(&mut self, r: usize, c: usize, cell: DpCell) {
        self.cells[r * self.n + c] = cell;
    }
}

/// Runs the DP over `piece` and records every update into the rule
/// matrix. Bases are resolved from `symbols` position-by-position via
/// `resolve_iupac` rather than collapsed up front, so two occurrences
/// of the same ambiguity code can resolve differently depending on the
/// cell context each one is scored against; the chosen pair is recorded
/// into `resolved` for the traceback to render.
fn search_align(
    symbols: &[Symbol],
    params: &SearchParams,
    tables: &TypeTables,
    tri_type: usize,
    pen: &Penalization,
    mat: &mut RuleMatrix,
    resolved: &mut ResolvedPairs,
) {
    let piece_l = symbols.len();
    let mut cells: Vec<DpCell> = (0..2 * piece_l)
        .map(|i| DpCell::fresh(i as i32, params.min_loop))
        .collect();

    for x in (params.min_loop + 1)..piece_l as i32 {
        let mut i = x as usize;
        let mut d = (x + 1) as usize;
        while i < piece_l {
            let prior = cells[d];
            let (a, b) = resolve_iupac(tables, tri_type, symbols[i], symbols[i - x as usize], &prior, pen);

            let dl = cells[d - 1];
            let dr = cells[d + 1];
            update_cell(a, b, &dl, &mut cells[d], &dr, d as i32, x, tables, tri_type, params.max_loop, pen);

            let (row, col) = (piece_l - 1 - (i - x as usize), i);
            mat.set(row, col, cells[d]);
            resolved.set(row, col, (a, b));

            i += 1;
            d += 2;
        }
    }
}

/// Renders the `body1=loop=body2` traceback string from a completed
/// rule matrix, mirroring the reference package's `print_triplex`.
/// `display` supplies a concrete base for positions the DP never
/// scored (the loop region printed verbatim between the two bodies);
/// `resolved` supplies the pair the DP actually chose for scored cells.
fn print_triplex(mat: &RuleMatrix, resolved: &ResolvedPairs, display: &[Base]) -> String {
    let n = display.len();
    let mut body1 = Vec::new();
    let mut body2 = Vec::new();

    let mut row = n - 1;
    let mut col = n - 1;

    loop {
        let cell = mat.get(row, col);
        match cell.dp_rule {
            DpRule::MainAntidiag | DpRule::Stop => break,
            DpRule::Match => {
                let (a, b) = resolved.get(row, col);
                body1.push(a.to_char());
                body2.push(b.to_char());
                row -= 1;
                col -= 1;
            }
            DpRule::Mismatch => {
                let (a, b) = resolved.get(row, col);
                body1.push(a.to_char().to_ascii_uppercase());
                body2.push(b.to_char().to_ascii_uppercase());
                row -= 1;
                col -= 1;
            }
            DpRule::Left => {
                let (_, b) = resolved.get(row, col);
                body1.push('-');
                body2.push(b.to_char());
                col -= 1;
            }
            DpRule::Right => {
                let (a, _) = resolved.get(row, col);
                body1.push(a.to_char());
                body2.push('-');
                row -= 1;
            }
        }
    }

    let body1_l = body1.iter().filter(|&&c| c != '-').count();
    let body2_l = body2.iter().filter(|&&c| c != '-').count();

    let mut out = String::with_capacity(2 * n + 2);
    out.extend(body1.iter());
    out.push('=');
    for x in body1_l..n.saturating_sub(body2_l) {
        out.push(display[x].to_char());
    }
    out.push('=');
    out.extend(body2.iter().rev());
    out
}

/// Aligns a single candidate sequence under `tri_type`, returning the
/// rendered `body1=loop=body2` string. Ambiguity codes inside `seq` are
/// resolved per DP step (spec module 4.8) rather than fixed up front -
/// chunking (C3) is what normally keeps ambiguity out of a DP sweep,
/// but this entry point takes a raw candidate span and never chunks it.
pub fn align(seq: &[u8], tri_type: usize, params: &SearchParams, pen: &Penalization, tables: &TypeTables) -> Result<String> {
    let symbols = encode_sequence(seq)?;
    let n = symbols.len();
    let display: Vec<Base> = symbols.iter().map(|s| s.candidates()[0]).collect();

    let mut mat = RuleMatrix::new(n);
    let mut resolved = ResolvedPairs::new(n);
    search_align(&symbols, params, tables, tri_type, pen, &mut mat, &mut resolved);
    Ok(print_triplex(&mat, &resolved, &display))
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
            min_score: 1,
            p_val: 1.0,
            min_len: 1,
            max_len: 30,
            min_loop: 3,
            max_loop: 10,
        }
    }

    #[test]
    fn rendered_string_has_two_separators() {
        let tables = default_tables();
        let rendered = align(b"gaaaaagggagggagggaggg", 0, &params(), &pen(), &tables).unwrap();
        assert_eq!(rendered.matches('=').count(), 2);
    }

    #[test]
    fn rendered_string_preserves_total_length() {
        let tables = default_tables();
        let seq = b"aaaaaatttttt";
        let rendered = align(seq, 0, &params(), &pen(), &tables).unwrap();
        let stripped: String = rendered.chars().filter(|&c| c != '=' && c != '-').collect();
        assert!(stripped.len() <= seq.len());
    }

    #[test]
    fn residual_ambiguity_code_still_aligns_without_error() {
        // 'r' here is never a chunk break (align never chunks), so it
        // must resolve via `resolve_iupac`, not be rejected as bad input.
        let tables = default_tables();
        let rendered = align(b"gaaaaagggrgggagggaggg", 0, &params(), &pen(), &tables).unwrap();
        assert_eq!(rendered.matches('=').count(), 2);
    }
}
