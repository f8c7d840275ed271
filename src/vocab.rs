//! The vocabulary store backing every tokenizer variant.

use ahash::AHashMap;

use crate::encoding::TokenId;

/// Bidirectional token-to-id mapping plus membership set.
///
/// Ids are dense in `[0, len)`. Trained instances are finalised through
/// [`Vocabulary::from_token_set`], which assigns ids by lexicographic token
/// order so that two trainings on identical data produce identical id
/// assignments. [`Vocabulary::add`] is the only mutator and is idempotent.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    token_ids: AHashMap<String, TokenId>,
    tokens_by_id: Vec<String>,
}

impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        // The id map is derived from the id-ordered token list.
        self.tokens_by_id == other.tokens_by_id
    }
}

impl Eq for Vocabulary {}

impl Vocabulary {
    /// Creates an empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vocabulary from a token set, assigning dense ids in
    /// lexicographic token order. Duplicates collapse to one entry.
    pub fn from_token_set<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens_by_id: Vec<String> = tokens.into_iter().map(Into::into).collect();
        tokens_by_id.sort_unstable();
        tokens_by_id.dedup();
        let token_ids = tokens_by_id
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as TokenId))
            .collect();
        Self {
            token_ids,
            tokens_by_id,
        }
    }

    /// Reconstructs a vocabulary from tokens already in id order.
    ///
    /// Used when loading persisted artifacts, where the id assignment is part
    /// of the stored state rather than recomputed.
    pub fn from_id_ordered_tokens(tokens: Vec<String>) -> Self {
        let token_ids = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as TokenId))
            .collect();
        Self {
            token_ids,
            tokens_by_id: tokens,
        }
    }

    /// Adds a token, returning its id. Re-adding an existing token returns
    /// the existing id without growing the mapping.
    pub fn add(&mut self, token: &str) -> TokenId {
        if let Some(&id) = self.token_ids.get(token) {
            return id;
        }
        let id = self.tokens_by_id.len() as TokenId;
        self.tokens_by_id.push(token.to_string());
        self.token_ids.insert(token.to_string(), id);
        id
    }

    /// Returns `true` when the token is a vocabulary member.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.token_ids.contains_key(token)
    }

    /// Returns the id assigned to a token, if present.
    #[must_use]
    pub fn id_of(&self, token: &str) -> Option<TokenId> {
        self.token_ids.get(token).copied()
    }

    /// Returns the token string for an id, if present.
    #[must_use]
    pub fn token_of(&self, id: TokenId) -> Option<&str> {
        self.tokens_by_id.get(id as usize).map(String::as_str)
    }

    /// Number of tokens in the vocabulary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens_by_id.len()
    }

    /// Returns `true` when the vocabulary holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens_by_id.is_empty()
    }

    /// Iterates over tokens in id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens_by_id.iter().map(String::as_str)
    }

    /// Finds the longest vocabulary token matching `symbols` at `start`,
    /// scanning at most `max_len` symbols. Returns the id and matched length.
    #[must_use]
    pub fn longest_match_at(
        &self,
        symbols: &[char],
        start: usize,
        max_len: usize,
    ) -> Option<(TokenId, usize)> {
        let available = symbols.len().saturating_sub(start);
        let cap = max_len.min(available);
        if cap == 0 {
            return None;
        }
        let mut probe: String = symbols[start..start + cap].iter().collect();
        for len in (1..=cap).rev() {
            if let Some(id) = self.id_of(&probe) {
                return Some((id, len));
            }
            probe.pop();
        }
        None
    }
}
