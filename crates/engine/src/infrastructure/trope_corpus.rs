//! Trope corpus loader (C4), grounded on `original_source/services/trope.py`
//! (`sample_random`, `search`, `sample_by_media`). Backed by a CSV file
//! rather than a database, loaded once at startup and held in memory.

use std::path::Path;

use taleweave_domain::Trope;
use thiserror::Error;

use crate::infrastructure::random::RandomPort;

#[derive(Debug, Error)]
pub enum TropeCorpusError {
    #[error("could not read trope corpus at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse trope corpus row: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, serde::Deserialize)]
struct TropeRow {
    name: String,
    description: String,
    #[serde(default)]
    media: String,
    #[serde(default)]
    title: String,
}

struct CorpusEntry {
    trope: Trope,
    media: String,
    title: String,
}

/// An in-memory trope corpus. Names are re-hashed into fresh `TropeId`s at
/// load time; the CSV itself carries no stable ids.
pub struct TropeCorpus {
    entries: Vec<CorpusEntry>,
}

impl TropeCorpus {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TropeCorpusError> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|source| TropeCorpusError::Io {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, source.to_string()),
        })?;

        let mut entries = Vec::new();
        for result in reader.deserialize() {
            let row: TropeRow = result?;
            entries.push(CorpusEntry {
                trope: Trope::new(row.name, row.description),
                media: row.media,
                title: row.title,
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draws `n` distinct tropes uniformly at random via the injected
    /// `RandomPort`, never `rand` directly.
    pub fn sample_random(&self, random: &dyn RandomPort, n: usize) -> Vec<Trope> {
        random
            .sample_indices(self.entries.len(), n)
            .into_iter()
            .map(|i| self.entries[i].trope.clone())
            .collect()
    }

    /// Case-insensitive substring match over name and description, capped
    /// at `n` results in corpus order.
    pub fn search(&self, query: &str, n: usize) -> Vec<Trope> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.trope.name.to_lowercase().contains(&needle)
                    || e.trope.description.to_lowercase().contains(&needle)
            })
            .take(n)
            .map(|e| e.trope.clone())
            .collect()
    }

    /// Tropes tagged with a given media category, optionally narrowed to a
    /// specific title within that media.
    pub fn sample_by_media(&self, media: &str, title: Option<&str>, n: usize) -> Vec<Trope> {
        self.entries
            .iter()
            .filter(|e| e.media.eq_ignore_ascii_case(media))
            .filter(|e| title.is_none_or(|t| e.title.eq_ignore_ascii_case(t)))
            .take(n)
            .map(|e| e.trope.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::random::FixedRandom;
    use std::io::Write;

    fn write_fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,description,media,title").unwrap();
        writeln!(file, "Chosen One,destiny finds the unwilling,fantasy,generic").unwrap();
        writeln!(file, "Red Herring,a clue that leads nowhere,mystery,generic").unwrap();
        writeln!(file, "Space Western,frontier tropes in orbit,sci-fi,Firefly").unwrap();
        file
    }

    #[test]
    fn loads_rows_from_csv() {
        let file = write_fixture();
        let corpus = TropeCorpus::load(file.path()).unwrap();
        assert_eq!(corpus.len(), 3);
    }

    #[test]
    fn search_matches_case_insensitively() {
        let file = write_fixture();
        let corpus = TropeCorpus::load(file.path()).unwrap();
        let found = corpus.search("herring", 10);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Red Herring");
    }

    #[test]
    fn sample_by_media_filters_and_narrows_by_title() {
        let file = write_fixture();
        let corpus = TropeCorpus::load(file.path()).unwrap();
        let found = corpus.sample_by_media("sci-fi", Some("Firefly"), 10);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Space Western");
    }

    #[test]
    fn sample_random_uses_injected_random_port() {
        let file = write_fixture();
        let corpus = TropeCorpus::load(file.path()).unwrap();
        let random = FixedRandom(0);
        let sampled = corpus.sample_random(&random, 2);
        assert_eq!(sampled.len(), 2);
    }
}
