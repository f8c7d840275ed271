//! Encoding result types shared by every tokenizer variant.

/// Token identifier used throughout the crate.
pub type TokenId = u32;

/// Outcome of encoding one consumed span of input.
///
/// An unmatched symbol is an expected, handled state rather than a fault, so
/// it is carried as a named outcome instead of an error or a sentinel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The span matched a vocabulary token with the given id.
    Matched(TokenId),
    /// The symbol at this position had no vocabulary match and was skipped.
    Unmatched,
}

impl EncodeOutcome {
    /// Returns the token id for a matched outcome.
    #[must_use]
    pub fn id(&self) -> Option<TokenId> {
        match self {
            Self::Matched(id) => Some(*id),
            Self::Unmatched => None,
        }
    }
}

/// Ordered encoding outcomes produced by [`Tokenizer::encode`](crate::Tokenizer::encode).
///
/// The evaluation harness reads the full outcome stream; callers that only
/// want the id sequence use [`Encoding::token_ids`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    outcomes: Vec<EncodeOutcome>,
}

impl Encoding {
    /// Creates an empty encoding with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    /// Appends a matched token id.
    pub fn push_matched(&mut self, id: TokenId) {
        self.outcomes.push(EncodeOutcome::Matched(id));
    }

    /// Appends an unmatched marker for a skipped symbol.
    pub fn push_unmatched(&mut self) {
        self.outcomes.push(EncodeOutcome::Unmatched);
    }

    /// Returns the outcomes in input order.
    #[must_use]
    pub fn outcomes(&self) -> &[EncodeOutcome] {
        &self.outcomes
    }

    /// Returns the matched token ids in input order, dropping unmatched marks.
    #[must_use]
    pub fn token_ids(&self) -> Vec<TokenId> {
        self.outcomes.iter().filter_map(EncodeOutcome::id).collect()
    }

    /// Total outcomes emitted, matched and unmatched alike.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns `true` when nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of matched outcomes.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.id().is_some())
            .count()
    }

    /// Returns `true` when every emitted outcome matched a vocabulary token.
    #[must_use]
    pub fn is_fully_matched(&self) -> bool {
        self.matched_count() == self.len()
    }
}

impl IntoIterator for Encoding {
    type Item = EncodeOutcome;
    type IntoIter = std::vec::IntoIter<EncodeOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Encoding {
    type Item = &'a EncodeOutcome;
    type IntoIter = std::slice::Iter<'a, EncodeOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
