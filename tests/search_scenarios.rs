// tests/search_scenarios.rs
// Integration coverage for the literal input scenarios this engine is
// expected to handle correctly end to end, through the public API only.

use triplex::align::align;
use triplex::candidate::CandidateList;
use triplex::cell::Penalization;
use triplex::chunk::{chunk_sequence, encode_sequence, ChunkInterval};
use triplex::search::{search, SearchParams};
use triplex::stats::StatTable;
use triplex::tables::default_tables;

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
fn single_match_scenario_spans_whole_sequence() {
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
    assert_eq!((results[0].start, results[0].end), (1, 21));
    assert!(results[0].score >= 10);
}

#[test]
fn ambiguity_bounded_chunk_is_the_only_one_searched() {
    let symbols = encode_sequence(b"nnnnaaaaaggggaaaaatttttnnnn").unwrap();
    let chunks = chunk_sequence(&symbols);
    assert_eq!(chunks, vec![ChunkInterval { start: 4, end: 22 }]);
}

#[test]
fn all_a_sequence_yields_no_records_across_all_types() {
    let tables = default_tables();
    let stats = StatTable::default_table();
    let seq = vec![b'a'; 100];
    let results = search(&seq, &(0..8).collect::<Vec<_>>(), &params(), &pen(), &tables, &stats, None).unwrap();
    assert!(results.is_empty());
}

#[test]
fn palindrome_covers_full_span() {
    let tables = default_tables();
    let stats = StatTable::default_table();
    let mut p = params();
    p.min_score = 1;
    p.min_len = 1;
    let results = search(b"aaaaaatttttt", &[0], &p, &pen(), &tables, &stats, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!((results[0].start, results[0].end), (1, 12));
}

#[test]
fn every_iupac_ambiguity_code_splits_a_chunk_at_its_position() {
    // 'r' and 'n' both sit in the reference package's chunk-break table,
    // so each one ends the current chunk, not just the all-N runs.
    let symbols = encode_sequence(b"gggrggggnrgggg").unwrap();
    let chunks = chunk_sequence(&symbols);
    assert_eq!(
        chunks,
        vec![
            ChunkInterval { start: 0, end: 2 },
            ChunkInterval { start: 4, end: 7 },
            ChunkInterval { start: 10, end: 13 },
        ]
    );
}

#[test]
fn overlapping_near_duplicate_candidates_keep_only_the_higher_score() {
    let mut list = CandidateList::new(30);
    let base = |start: i32, end: i32, score: i32| triplex::candidate::Candidate {
        start,
        end,
        lstart: start + 1,
        lend: end - 1,
        score,
        pvalue: 0.01,
        insdel: 0,
        tri_type: 0,
        strand: 0,
        mark: 0,
    };
    list.insert(base(10, 45, 22));
    list.insert(base(11, 46, 21));
    list.group_filter();

    let survivors = list.into_sorted_vec();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].score, 22);
}

#[test]
fn emitted_records_are_coordinate_ordered_and_well_formed() {
    let tables = default_tables();
    let stats = StatTable::default_table();
    let results = search(
        b"gaaaaagggagggagggagggtttttcccccccccccccc",
        &[0, 1, 2, 3, 4, 5, 6, 7],
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
        assert!(stats.p_value(c.score, c.tri_type as usize) <= params().p_val + 1e-9);
    }
    let mut sorted = results.clone();
    sorted.sort_by_key(|c| (c.start, c.end));
    assert_eq!(results, sorted);
}

#[test]
fn aligning_an_emitted_records_own_span_is_well_formed() {
    let tables = default_tables();
    let stats = StatTable::default_table();
    let seq: &[u8] = b"gaaaaagggagggagggaggg";
    let results = search(seq, &[0], &params(), &pen(), &tables, &stats, None).unwrap();
    assert_eq!(results.len(), 1);
    let c = results[0];

    let span = &seq[(c.start - 1) as usize..c.end as usize];
    let rendered = align(span, c.tri_type as usize, &params(), &pen(), &tables).unwrap();
    assert_eq!(rendered.matches('=').count(), 2);
    let gap_count = rendered.chars().filter(|&ch| ch == '-').count() as i32;
    assert!(gap_count >= 0 && gap_count <= c.insdel.max(span.len() as i32));
}

#[test]
fn rejects_min_loop_greater_than_max_loop() {
    let tables = default_tables();
    let stats = StatTable::default_table();
    let mut p = params();
    p.min_loop = 20;
    p.max_loop = 5;
    assert!(search(b"acgtacgt", &[0], &p, &pen(), &tables, &stats, None).is_err());
}
