//! The story seed: Teleology, Context, Characters, Narrative-threads (TCCN).

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A lightweight TCCN reference to a character, before the full `Character`
/// is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub name: String,
    pub description: String,
}

/// A one-line tropic statement: "ACTION between ACTORS in CONTEXT serves
/// TELEOLOGY because REASON".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeThread {
    pub text: String,
}

impl NarrativeThread {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// The four-part story seed. Mutated only by the Act Engine, during
/// context-evolution and teleology-shift (SPEC_FULL.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tccn {
    pub teleology: String,
    pub context: String,
    pub characters: Vec<CharacterSummary>,
    pub narrative_threads: Vec<NarrativeThread>,
}

impl Tccn {
    /// Validates the `len(characters) >= 1` / `len(narrative_threads) >= 1`
    /// invariant before constructing.
    pub fn new(
        teleology: impl Into<String>,
        context: impl Into<String>,
        characters: Vec<CharacterSummary>,
        narrative_threads: Vec<NarrativeThread>,
    ) -> Result<Self, DomainError> {
        if characters.is_empty() {
            return Err(DomainError::invalid_tccn(
                "a story seed needs at least one character",
            ));
        }
        if narrative_threads.is_empty() {
            return Err(DomainError::invalid_tccn(
                "a story seed needs at least one narrative thread",
            ));
        }
        Ok(Self {
            teleology: teleology.into(),
            context: context.into(),
            characters,
            narrative_threads,
        })
    }

    pub fn to_prompt_text(&self) -> String {
        let characters = self
            .characters
            .iter()
            .map(|c| format!("- {}: {}", c.name, c.description))
            .collect::<Vec<_>>()
            .join("\n");
        let threads = self
            .narrative_threads
            .iter()
            .map(|t| format!("- {}", t.text))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Teleology: {}\n\nContext: {}\n\nCharacters:\n{}\n\nNarrative threads:\n{}",
            self.teleology, self.context, characters, threads
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str) -> CharacterSummary {
        CharacterSummary {
            name: name.to_string(),
            description: "a summary".to_string(),
        }
    }

    #[test]
    fn rejects_empty_characters() {
        let err = Tccn::new("t", "c", vec![], vec![NarrativeThread::new("x")]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTccn(_)));
    }

    #[test]
    fn rejects_empty_threads() {
        let err = Tccn::new("t", "c", vec![summary("A")], vec![]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTccn(_)));
    }

    #[test]
    fn accepts_minimal_valid_seed() {
        let seed = Tccn::new("t", "c", vec![summary("A")], vec![NarrativeThread::new("x")]);
        assert!(seed.is_ok());
    }
}
