//! Tropes: the literary-pattern corpus entries that bias dice resolution.

use serde::{Deserialize, Serialize};

use crate::ids::TropeId;

/// A single named literary pattern. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trope {
    pub id: TropeId,
    pub name: String,
    pub description: String,
}

impl Trope {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: TropeId::new(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Single-line rendering used when injecting tropes into a prompt.
    pub fn to_prompt_line(&self) -> String {
        format!("- {}: {}", self.name, self.description)
    }
}

/// Where a `TropeSample` came from -- carried through to the prompt as
/// provenance, and distinguishes "random fate" sampling from a director's
/// explicit `force_trope` search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TropeSampleSource {
    Random,
    Search,
    Media,
}

/// An ordered sequence of tropes plus a provenance tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TropeSample {
    pub tropes: Vec<Trope>,
    pub source: Option<TropeSampleSource>,
}

impl TropeSample {
    pub fn new(tropes: Vec<Trope>, source: TropeSampleSource) -> Self {
        Self {
            tropes,
            source: Some(source),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tropes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tropes.len()
    }

    /// Renders the sample as a bullet list for prompt injection.
    pub fn to_prompt_text(&self) -> String {
        self.tropes
            .iter()
            .map(Trope::to_prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_text_joins_lines() {
        let sample = TropeSample::new(
            vec![
                Trope::new("Chekhov's Gun", "An early detail pays off later."),
                Trope::new("Red Herring", "A clue that misleads."),
            ],
            TropeSampleSource::Random,
        );
        let text = sample.to_prompt_text();
        assert!(text.contains("Chekhov's Gun"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn empty_sample_has_empty_prompt_text() {
        assert_eq!(TropeSample::default().to_prompt_text(), "");
    }
}
