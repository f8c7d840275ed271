//! Pair-merge machinery shared by the merge-based trainers.
//!
//! Sequences are held as interned symbol ids so pair counting and rewriting
//! compare integers rather than strings. Counting is a map-reduce over lines
//! with an associative merge; selection uses an order-independent total
//! order, so the chosen merge sequence is identical whether the counts were
//! accumulated in parallel or sequentially.

use ahash::AHashMap;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Interned symbol id, private to training.
pub(crate) type Sym = u32;
/// Adjacent symbol pair.
pub(crate) type SymPair = (Sym, Sym);

/// Interner mapping token strings to dense symbol ids and back.
#[derive(Debug, Default)]
pub(crate) struct SymbolTable {
    strings: Vec<String>,
    ids: AHashMap<String, Sym>,
}

impl SymbolTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `token`, interning it on first sight.
    pub(crate) fn intern(&mut self, token: &str) -> Sym {
        if let Some(&sym) = self.ids.get(token) {
            return sym;
        }
        let sym = self.strings.len() as Sym;
        self.strings.push(token.to_string());
        self.ids.insert(token.to_string(), sym);
        sym
    }

    /// Returns the string for an interned symbol.
    pub(crate) fn text(&self, sym: Sym) -> &str {
        &self.strings[sym as usize]
    }

    /// Iterates over all interned strings.
    pub(crate) fn strings(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}

/// Counts every adjacent symbol pair across all sequences.
pub(crate) fn count_pairs(sequences: &[Vec<Sym>]) -> FxHashMap<SymPair, usize> {
    sequences
        .par_iter()
        .map(|sequence| {
            let mut local = FxHashMap::default();
            for window in sequence.windows(2) {
                *local.entry((window[0], window[1])).or_insert(0usize) += 1;
            }
            local
        })
        .reduce(FxHashMap::default, |mut acc, local| {
            for (pair, count) in local {
                *acc.entry(pair).or_insert(0) += count;
            }
            acc
        })
}

/// Selects the most frequent pair; ties go to the pair whose
/// `(left, right)` token strings compare lexicographically smaller.
pub(crate) fn select_best_pair(
    counts: &FxHashMap<SymPair, usize>,
    symbols: &SymbolTable,
) -> Option<(SymPair, usize)> {
    let key = |pair: SymPair| (symbols.text(pair.0), symbols.text(pair.1));
    let mut best: Option<(SymPair, usize)> = None;
    for (&pair, &count) in counts {
        best = match best {
            None => Some((pair, count)),
            Some((best_pair, best_count)) => {
                if count > best_count || (count == best_count && key(pair) < key(best_pair)) {
                    Some((pair, count))
                } else {
                    Some((best_pair, best_count))
                }
            }
        };
    }
    best
}

/// Replaces non-overlapping left-to-right occurrences of `pair` in one
/// sequence, compacting in place. Returns the number of replacements.
pub(crate) fn merge_pair_in(sequence: &mut Vec<Sym>, pair: SymPair, replacement: Sym) -> usize {
    if sequence.len() < 2 {
        return 0;
    }
    let original_len = sequence.len();
    let mut read = 0usize;
    let mut write = 0usize;
    let mut merges = 0usize;
    while read < original_len {
        if read + 1 < original_len && sequence[read] == pair.0 && sequence[read + 1] == pair.1 {
            sequence[write] = replacement;
            write += 1;
            read += 2;
            merges += 1;
        } else {
            if write != read {
                sequence[write] = sequence[read];
            }
            write += 1;
            read += 1;
        }
    }
    sequence.truncate(write);
    merges
}

/// Applies one merge across all sequences, returning total replacements.
pub(crate) fn apply_merge(sequences: &mut [Vec<Sym>], pair: SymPair, replacement: Sym) -> usize {
    sequences
        .par_iter_mut()
        .map(|sequence| merge_pair_in(sequence, pair, replacement))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(tokens: &[&str]) -> (SymbolTable, Vec<Sym>) {
        let mut table = SymbolTable::new();
        let syms = tokens.iter().map(|token| table.intern(token)).collect();
        (table, syms)
    }

    #[test]
    fn intern_is_idempotent() {
        let mut table = SymbolTable::new();
        assert_eq!(table.intern("A"), table.intern("A"));
        assert_eq!(table.strings().count(), 1);
    }

    #[test]
    fn merge_replaces_left_to_right_without_overlap() {
        let (mut table, _) = table_with(&["A"]);
        let a = table.intern("A");
        let aa = table.intern("AA");
        // AAA merges the first two symbols only.
        let mut sequence = vec![a, a, a];
        let merges = merge_pair_in(&mut sequence, (a, a), aa);
        assert_eq!(merges, 1);
        assert_eq!(sequence, vec![aa, a]);
    }

    #[test]
    fn best_pair_breaks_ties_lexicographically() {
        let (table, syms) = table_with(&["A", "C", "G"]);
        let mut counts = FxHashMap::default();
        counts.insert((syms[1], syms[2]), 3usize); // "C","G"
        counts.insert((syms[0], syms[1]), 3usize); // "A","C"
        counts.insert((syms[2], syms[0]), 2usize);
        let (pair, count) = select_best_pair(&counts, &table).expect("non-empty");
        assert_eq!(count, 3);
        assert_eq!((table.text(pair.0), table.text(pair.1)), ("A", "C"));
    }

    #[test]
    fn pair_counts_merge_across_sequences() {
        let (_, syms) = table_with(&["A", "B"]);
        let sequences = vec![vec![syms[0], syms[1], syms[0]], vec![syms[0], syms[1]]];
        let counts = count_pairs(&sequences);
        assert_eq!(counts.get(&(syms[0], syms[1])), Some(&2));
        assert_eq!(counts.get(&(syms[1], syms[0])), Some(&1));
    }
}
