//! Prompt Registry (C2), grounded on the teacher's
//! `infrastructure/prompt_templates.rs` loader-and-cache idiom and
//! `original_source/prompts/loader.py`'s category/name directory layout.
//!
//! Templates live on disk as `{prompts_dir}/{category}/{name}.txt` and are
//! read once, then cached by `(category, name)` for the life of the
//! process -- a prompt edit on disk requires a restart, matching the
//! original's load-at-startup behavior.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt not found: {category}/{name}")]
    NotFound { category: String, name: String },
    #[error("could not read prompt {category}/{name}: {source}")]
    Io {
        category: String,
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub struct PromptRegistry {
    root: PathBuf,
    cache: HashMap<(String, String), String>,
}

impl PromptRegistry {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: prompts_dir.into(),
            cache: HashMap::new(),
        }
    }

    fn path_for(&self, category: &str, name: &str) -> PathBuf {
        self.root.join(category).join(format!("{name}.txt"))
    }

    fn load(&mut self, category: &str, name: &str) -> Result<&str, PromptError> {
        let key = (category.to_string(), name.to_string());
        if !self.cache.contains_key(&key) {
            let path = self.path_for(category, name);
            let text = std::fs::read_to_string(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PromptError::NotFound {
                        category: category.to_string(),
                        name: name.to_string(),
                    }
                } else {
                    PromptError::Io {
                        category: category.to_string(),
                        name: name.to_string(),
                        source: e,
                    }
                }
            })?;
            self.cache.insert(key.clone(), text);
        }
        Ok(self.cache.get(&key).expect("just inserted"))
    }

    /// Loads `category/name`, then substitutes every `{placeholder}` with
    /// the matching value from `vars`. A placeholder with no matching var is
    /// left verbatim in the output -- a safe partial render rather than a
    /// hard failure, matching the original loader's behavior.
    pub fn render(
        &mut self,
        category: &str,
        name: &str,
        vars: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        let template = self.load(category, name)?.to_string();
        Ok(substitute(&template, vars))
    }
}

fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close_rel) = rest[open..].find('}') else {
            result.push_str(rest);
            return result;
        };
        let close = open + close_rel;
        let key = &rest[open + 1..close];
        result.push_str(&rest[..open]);
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => result.push_str(value),
            None => result.push_str(&rest[open..=close]),
        }
        rest = &rest[close + 1..];
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("generators")).unwrap();
        fs::write(
            dir.path().join("generators/seed.txt"),
            "Create a world about {theme} with tone {tone}.",
        )
        .unwrap();
        dir
    }

    #[test]
    fn renders_known_placeholders() {
        let dir = fixture_dir();
        let mut registry = PromptRegistry::new(dir.path());
        let rendered = registry
            .render("generators", "seed", &[("theme", "betrayal"), ("tone", "noir")])
            .unwrap();
        assert_eq!(rendered, "Create a world about betrayal with tone noir.");
    }

    #[test]
    fn reports_not_found_for_missing_template() {
        let dir = fixture_dir();
        let mut registry = PromptRegistry::new(dir.path());
        let err = registry.render("generators", "missing", &[]).unwrap_err();
        assert!(matches!(err, PromptError::NotFound { .. }));
    }

    #[test]
    fn leaves_unmatched_placeholders_verbatim() {
        let dir = fixture_dir();
        let mut registry = PromptRegistry::new(dir.path());
        let rendered = registry.render("generators", "seed", &[("theme", "betrayal")]).unwrap();
        assert_eq!(rendered, "Create a world about betrayal with tone {tone}.");
    }

    #[test]
    fn caches_after_first_load() {
        let dir = fixture_dir();
        let mut registry = PromptRegistry::new(dir.path());
        registry
            .render("generators", "seed", &[("theme", "a"), ("tone", "b")])
            .unwrap();
        fs::remove_file(dir.path().join("generators/seed.txt")).unwrap();
        let rendered = registry
            .render("generators", "seed", &[("theme", "a"), ("tone", "b")])
            .unwrap();
        assert_eq!(rendered, "Create a world about a with tone b.");
    }
}
