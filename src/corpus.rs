//! Facilities for loading line-oriented training and evaluation corpora.

use std::fs;
use std::path::Path;

use crate::error::{Result, SeqTokError};

/// An in-memory, restartable sequence of corpus lines.
///
/// Lines are trimmed on ingest and blank lines are discarded, so trainers
/// never observe degenerate empty sequences. The corpus is finite and can be
/// iterated any number of times, which multi-pass trainers rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    lines: Vec<String>,
}

impl Corpus {
    /// Builds a corpus from in-memory lines, trimming and dropping blanks.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self { lines }
    }

    /// Reads a corpus from a text file, one sequence per line.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|err| SeqTokError::io(err, Some(path.to_path_buf())))?;
        Ok(Self::from_lines(contents.lines()))
    }

    /// Returns the retained lines in ingest order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the number of retained lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` when no usable lines were ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates over the retained lines as string slices.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn from_lines_trims_and_drops_blanks() {
        let corpus = Corpus::from_lines(["  ACGT  ", "", "\t", "GATTACA\n"]);
        assert_eq!(corpus.lines(), &["ACGT".to_string(), "GATTACA".to_string()]);
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn from_path_reads_one_sequence_per_line() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "ACGT\n\nGATTACA\n").expect("write corpus");

        let corpus = Corpus::from_path(&path).expect("load corpus");
        assert_eq!(corpus.lines(), &["ACGT".to_string(), "GATTACA".to_string()]);
    }

    #[test]
    fn from_path_surfaces_missing_file() {
        let dir = tempdir().expect("tempdir");
        let err = Corpus::from_path(dir.path().join("absent.txt")).expect_err("should fail");
        assert!(matches!(err, SeqTokError::Io { .. }));
    }
}
