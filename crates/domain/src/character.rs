//! The full `Character` entity. Created by the Character Service (engine
//! C16); subsequently mutated only by the per-scene update step, never
//! mid-scene (SPEC_FULL.md §3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub internal_state: String,
    pub ambitions: String,
    pub teleology: String,
    pub philosophy: String,
    pub physical_state: String,
    pub voice_style: String,
    #[serde(default)]
    pub long_term_memory: Vec<String>,
    #[serde(default)]
    pub short_term_memory: Vec<String>,
    #[serde(default)]
    pub internal_contradictions: Vec<String>,
}

impl Character {
    /// A minimal character, used as a last-resort fallback when generation
    /// fails outright (see the Seeding/Character Service's failure policy).
    pub fn minimal(name: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            name: name.into(),
            internal_state: description.clone(),
            ambitions: String::new(),
            teleology: String::new(),
            philosophy: String::new(),
            physical_state: String::new(),
            voice_style: String::new(),
            long_term_memory: Vec::new(),
            short_term_memory: vec![description],
            internal_contradictions: Vec::new(),
        }
    }

    pub fn to_prompt_text(&self) -> String {
        format!(
            "{name} -- internal state: {internal_state}; ambitions: {ambitions}; \
             teleology: {teleology}; philosophy: {philosophy}; physical state: \
             {physical_state}; voice: {voice_style}",
            name = self.name,
            internal_state = self.internal_state,
            ambitions = self.ambitions,
            teleology = self.teleology,
            philosophy = self.philosophy,
            physical_state = self.physical_state,
            voice_style = self.voice_style,
        )
    }

    /// Appends a short-term memory entry (used by beat-delta application
    /// and by `redirect_character`'s "director" entry).
    pub fn push_short_term_memory(&mut self, entry: impl Into<String>) {
        self.short_term_memory.push(entry.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_character_seeds_short_term_memory() {
        let c = Character::minimal("Keeper", "found a diary");
        assert_eq!(c.name, "Keeper");
        assert_eq!(c.short_term_memory, vec!["found a diary".to_string()]);
    }
}
