// src/candidate.rs
// CANDIDATE BOOKKEEPING (C5)
// A sorted doubly-linked list of candidate triplexes with online
// deduplication, inclusion pruning and overlap-group filtering.
//
// Modeled as an arena of nodes addressed by index (spec design note):
// node 0 is the sentinel head, never removed. Deleted nodes are
// unlinked from the chain but their arena slot is left behind rather
// than reused - the list never has more than a few thousand live
// candidates per chunk, so the wasted slots are immaterial.

/// One emitted candidate triplex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub start: i32,
    pub end: i32,
    pub lstart: i32,
    pub lend: i32,
    pub score: i32,
    pub pvalue: f64,
    pub insdel: i32,
    pub tri_type: i32,
    pub strand: i32,
    /// Scratch marker used only during group filtering; `-1` means
    /// "marked for deletion". Never meaningful outside a `group_filter` pass.
    pub mark: i32,
}

struct Node {
    data: Candidate,
    prev: Option<usize>,
    next: Option<usize>,
}

const SENTINEL: usize = 0;

pub struct CandidateList {
    arena: Vec<Node>,
    last: usize,
    size: usize,
    max_len: i32,
}

impl CandidateList {
    pub fn new(max_len: i32) -> CandidateList {
        let sentinel = Node {
            data: Candidate {
                start: -2 * max_len - 1,
                end: -1,
                lstart: 0,
                lend: 0,
                score: 0,
                pvalue: 1.0,
                insdel: 0,
                tri_type: -1,
                strand: 0,
                mark: 0,
            },
            prev: None,
            next: None,
        };
        CandidateList {
            arena: vec![sentinel],
            last: SENTINEL,
            size: 0,
            max_len,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Inserts `data`, keeping the list sorted by `(start asc, end asc)`,
    /// applying duplicate, inclusion and includes-existing pruning.
    /// Returns `true` if the candidate (or a replacement of it) ended up
    /// live in the list.
    pub fn insert(&mut self, data: Candidate) -> bool {
        let mut pointer = self.last;
        while data.start < self.arena[pointer].data.start
            || (data.start == self.arena[pointer].data.start && data.end < self.arena[pointer].data.end)
        {
            pointer = self.arena[pointer].prev.expect("walked past sentinel");
        }

        if self.test_duplication(pointer, &data) {
            return true;
        }
        if self.test_included(pointer, &data) {
            return false;
        }

        let next = self.arena[pointer].next;
        let new_idx = self.arena.len();
        self.arena.push(Node { data, prev: Some(pointer), next });
        self.arena[pointer].next = Some(new_idx);
        if let Some(n) = next {
            self.arena[n].prev = Some(new_idx);
        }
        if self.last == pointer {
            self.last = new_idx;
        }
        self.size += 1;

        self.test_include(new_idx);
        true
    }

    /// Exact duplicate (same start/lstart/lend/end/score): drop. Same
    /// (start,end) with a strictly better score: replace in place, drop
    /// new. Same (start,end) with an equal-or-worse score: drop new
    /// without updating.
    fn test_duplication(&mut self, pointer: usize, new: &Candidate) -> bool {
        let existing = self.arena[pointer].data;
        if existing.start == new.start
            && existing.lstart == new.lstart
            && existing.lend == new.lend
            && existing.end == new.end
            && existing.score == new.score
        {
            return true;
        }
        if existing.start == new.start && existing.end == new.end {
            if existing.score < new.score {
                self.arena[pointer].data = *new;
            }
            return true;
        }
        false
    }

    /// `new` is included in, and therefore dominated by, some existing node.
    fn test_included(&self, node: usize, new: &Candidate) -> bool {
        let mut pointer = self.arena[node].next;
        while let Some(p) = pointer {
            if self.arena[p].data.start != new.start {
                break;
            }
            if self.arena[p].data.score >= new.score {
                return true;
            }
            pointer = self.arena[p].next;
        }

        let mut pointer = node;
        while self.arena[pointer].data.start == new.start {
            pointer = self.arena[pointer].prev.expect("walked past sentinel");
        }

        while self.arena[pointer].data.start >= new.start - self.max_len {
            let d = self.arena[pointer].data;
            if d.end >= new.end && d.score >= new.score {
                return true;
            }
            match self.arena[pointer].prev {
                Some(p) => pointer = p,
                None => break,
            }
        }
        false
    }

    /// `new` (already inserted at `node`) dominates some existing
    /// neighbour: delete the dominated ones.
    fn test_include(&mut self, node: usize) {
        let new = self.arena[node].data;

        let mut pointer = self.arena[node].prev;
        while let Some(p) = pointer {
            if self.arena[p].data.start != new.start {
                break;
            }
            let temp = self.arena[p].prev;
            if self.arena[p].data.score <= new.score {
                self.delete(p);
            }
            pointer = temp;
        }

        let mut pointer = self.arena[node].next;
        while let Some(p) = pointer {
            if self.arena[p].data.start != new.start {
                break;
            }
            pointer = self.arena[p].next;
        }
        while let Some(p) = pointer {
            if self.arena[p].data.end > new.end {
                break;
            }
            let temp = self.arena[p].next;
            if self.arena[p].data.score <= new.score {
                self.delete(p);
            }
            pointer = temp;
        }
    }

    fn delete(&mut self, node: usize) {
        let prev = self.arena[node].prev.expect("sentinel is never deleted");
        let next = self.arena[node].next;
        self.arena[prev].next = next;
        match next {
            Some(n) => self.arena[n].prev = Some(prev),
            None => self.last = prev,
        }
        self.size -= 1;
    }

    fn first(&self) -> Option<usize> {
        self.arena[SENTINEL].next
    }

    fn overlaps(&self, a: usize, b: usize) -> bool {
        let n1 = self.arena[a].data;
        let n2 = self.arena[b].data;
        if n1.end > n2.start {
            let overlap = (n1.end - n2.start) as f64;
            let whole = (n2.end - n1.start) as f64;
            overlap / whole >= 0.8
        } else {
            false
        }
    }

    /// Marks the lower-scoring node of every adjacent >=80%-overlapping
    /// pair within `[start, end]` for deletion, deletes them, and
    /// repeats until a pass makes no change (spec invariant 4).
    fn local_group_filter(&mut self, mut start: usize, mut end: usize) {
        loop {
            let mut pointer = start;
            let mut changed = false;
            while pointer != end {
                let next = self.arena[pointer].next.expect("group end must follow");
                if self.overlaps(pointer, next) {
                    if self.arena[pointer].data.score < self.arena[next].data.score {
                        self.arena[pointer].data.mark = -1;
                    } else {
                        self.arena[next].data.mark = -1;
                    }
                    changed = true;
                }
                pointer = next;
            }

            if !changed {
                break;
            }

            let mut pointer = Some(start);
            let mut new_start = start;
            let mut new_end = end;
            let stop_after = self.arena[end].next;
            while pointer != stop_after {
                let p = pointer.expect("bounded by stop_after");
                let next = self.arena[p].next;
                if self.arena[p].data.mark == -1 {
                    if new_start == p {
                        new_start = next.expect("group cannot vanish entirely");
                    }
                    if new_end == p {
                        new_end = self.arena[p].prev.expect("group start survives");
                    }
                    self.delete(p);
                }
                pointer = next;
            }
            start = new_start;
            end = new_end;
        }
    }

    /// Post-pass: detect runs of mutually-overlapping adjacent
    /// candidates and resolve each run with `local_group_filter`.
    pub fn group_filter(&mut self) {
        let mut pointer = self.first();
        while let Some(p) = pointer {
            let group_start = p;
            let mut group_end = p;
            while let Some(next) = self.arena[group_end].next {
                if !self.overlaps(group_end, next) {
                    break;
                }
                group_end = next;
            }
            pointer = self.arena[group_end].next;
            if group_start != group_end {
                self.local_group_filter(group_start, group_end);
            }
        }
    }

    /// Drains the list into a plain, already-sorted `Vec`.
    pub fn into_sorted_vec(self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(self.size);
        let mut pointer = self.arena[SENTINEL].next;
        while let Some(p) = pointer {
            out.push(self.arena[p].data);
            pointer = self.arena[p].next;
        }
        out
    }
}

/// K-way merge of several already-sorted (by `(start,end)`) candidate
/// lists into one sorted vector.
pub fn merge_candidate_lists(lists: Vec<CandidateList>) -> Vec<Candidate> {
    let mut queues: Vec<std::collections::VecDeque<Candidate>> =
        lists.into_iter().map(|l| l.into_sorted_vec().into()).collect();

    let mut out = Vec::new();
    loop {
        let mut min_list: Option<usize> = None;
        for (i, q) in queues.iter().enumerate() {
            if let Some(head) = q.front() {
                match min_list {
                    None => min_list = Some(i),
                    Some(j) => {
                        let best = queues[j].front().unwrap();
                        if (head.start, head.end) < (best.start, best.end) {
                            min_list = Some(i);
                        }
                    }
                }
            }
        }
        match min_list {
            Some(i) => out.push(queues[i].pop_front().unwrap()),
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(start: i32, end: i32, score: i32) -> Candidate {
        Candidate {
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
        }
    }

    #[test]
    fn sorted_after_every_insertion() {
        let mut list = CandidateList::new(30);
        for (s, e, sc) in [(10, 20, 5), (5, 8, 3), (15, 25, 7), (1, 2, 1)] {
            list.insert(cand(s, e, sc));
            let v = {
                let mut p = list.arena[SENTINEL].next;
                let mut out = vec![];
                while let Some(i) = p {
                    out.push((list.arena[i].data.start, list.arena[i].data.end));
                    p = list.arena[i].next;
                }
                out
            };
            let mut sorted = v.clone();
            sorted.sort();
            assert_eq!(v, sorted);
        }
    }

    #[test]
    fn exact_duplicate_is_dropped() {
        let mut list = CandidateList::new(30);
        list.insert(cand(10, 20, 5));
        list.insert(cand(10, 20, 5));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn same_span_higher_score_replaces() {
        let mut list = CandidateList::new(30);
        list.insert(cand(10, 20, 5));
        list.insert(cand(10, 20, 9));
        assert_eq!(list.len(), 1);
        let v = list.into_sorted_vec();
        assert_eq!(v[0].score, 9);
    }

    #[test]
    fn same_span_lower_score_dropped_without_update() {
        let mut list = CandidateList::new(30);
        list.insert(cand(10, 20, 9));
        list.insert(cand(10, 20, 5));
        assert_eq!(list.len(), 1);
        let v = list.into_sorted_vec();
        assert_eq!(v[0].score, 9);
    }

    #[test]
    fn group_filter_keeps_higher_scoring_overlap() {
        let mut list = CandidateList::new(30);
        list.insert(cand(10, 45, 22));
        list.insert(cand(11, 46, 21));
        list.group_filter();
        let v = list.into_sorted_vec();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].score, 22);
    }

    #[test]
    fn merge_unions_sorted_output() {
        let mut a = CandidateList::new(30);
        a.insert(cand(1, 5, 2));
        a.insert(cand(20, 25, 3));
        let mut b = CandidateList::new(30);
        b.insert(cand(10, 15, 4));

        let merged = merge_candidate_lists(vec![a, b]);
        let starts: Vec<i32> = merged.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![1, 10, 20]);
    }
}
