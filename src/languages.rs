//! Language configuration for compilation and execution
//!
//! Each language entry describes how to turn submitted source text into a
//! runnable program: the file the source is written to, an optional compile
//! command, the run command, and the harness template that bridges the
//! sandbox to the submission's entry point.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::grader::GradeError;

/// Placeholder in harness templates replaced with the problem's entry point
pub const ENTRY_POINT_PLACEHOLDER: &str = "__ENTRY_POINT__";

/// Configuration for a supported programming language
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Name of the file the submission is written to (e.g., "solution.js")
    pub source_file: String,
    /// Name of the file the rendered harness is written to (e.g., "harness.js")
    pub harness_file: String,
    /// Harness template containing `__ENTRY_POINT__` placeholders
    pub harness: String,
    /// Compile command (None if the language is not compiled)
    pub compile_command: Option<Vec<String>>,
    /// Run command
    pub run_command: Vec<String>,
}

impl LanguageConfig {
    /// Render the harness for a concrete entry point name
    pub fn render_harness(&self, entry_point: &str) -> String {
        self.harness.replace(ENTRY_POINT_PLACEHOLDER, entry_point)
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    source_file: String,
    harness_file: String,
    harness: String,
    compile_command: Option<String>,
    run_command: String,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Read-only language registry keyed by lowercase language name
#[derive(Debug)]
pub struct LanguageRegistry {
    languages: HashMap<String, LanguageConfig>,
}

impl LanguageRegistry {
    /// Load the registry from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read language config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse language config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<String, RawLanguageConfig> = toml::from_str(content)?;

        let mut languages = HashMap::new();

        for (name, raw) in raw_configs {
            if !raw.harness.contains(ENTRY_POINT_PLACEHOLDER) {
                anyhow::bail!(
                    "Harness for {} has no {} placeholder",
                    name,
                    ENTRY_POINT_PLACEHOLDER
                );
            }

            let config = LanguageConfig {
                source_file: raw.source_file,
                harness_file: raw.harness_file,
                harness: raw.harness,
                compile_command: raw.compile_command.map(|cmd| into_command(&cmd)),
                run_command: into_command(&raw.run_command),
            };

            // Add main language name
            languages.insert(name.to_lowercase(), config.clone());

            // Add aliases
            for alias in raw.aliases {
                languages.insert(alias.to_lowercase(), config.clone());
            }
        }

        Ok(Self { languages })
    }

    /// Look up a language by name or alias (case-insensitive)
    pub fn get(&self, language: &str) -> Result<&LanguageConfig, GradeError> {
        self.languages
            .get(&language.to_lowercase())
            .ok_or_else(|| GradeError::UnsupportedLanguage(language.to_string()))
    }

    /// All registered names, including aliases
    pub fn names(&self) -> Vec<String> {
        self.languages.keys().cloned().collect()
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[javascript]
source_file = "solution.js"
harness_file = "harness.js"
run_command = "node harness.js"
aliases = ["js", "node"]
harness = '''
const entry = __ENTRY_POINT__;
'''

[c]
source_file = "solution.c"
harness_file = "harness.c"
compile_command = "gcc -O2 -o program harness.c"
run_command = "./program"
harness = '''
/* calls __ENTRY_POINT__ */
'''
"#;

    #[test]
    fn test_load_registry() {
        let registry = LanguageRegistry::from_toml(SAMPLE).unwrap();

        let js = registry.get("javascript").unwrap();
        assert_eq!(js.source_file, "solution.js");
        assert_eq!(js.run_command, vec!["node", "harness.js"]);
        assert!(js.compile_command.is_none());

        let c = registry.get("c").unwrap();
        let compile = c.compile_command.as_ref().unwrap();
        assert_eq!(compile[0], "gcc");
        assert_eq!(compile.last().unwrap(), "harness.c");
    }

    #[test]
    fn test_aliases_resolve_case_insensitively() {
        let registry = LanguageRegistry::from_toml(SAMPLE).unwrap();
        assert!(registry.get("JS").is_ok());
        assert!(registry.get("Node").is_ok());
        assert!(registry.get("JavaScript").is_ok());
    }

    #[test]
    fn test_unsupported_language() {
        let registry = LanguageRegistry::from_toml(SAMPLE).unwrap();
        let err = registry.get("cobol").unwrap_err();
        assert!(matches!(err, GradeError::UnsupportedLanguage(ref l) if l == "cobol"));
    }

    #[test]
    fn test_render_harness_replaces_every_placeholder() {
        let registry = LanguageRegistry::from_toml(SAMPLE).unwrap();
        let js = registry.get("javascript").unwrap();
        let rendered = js.render_harness("twoSum");
        assert!(rendered.contains("const entry = twoSum;"));
        assert!(!rendered.contains(ENTRY_POINT_PLACEHOLDER));
    }

    #[test]
    fn test_harness_without_placeholder_rejected() {
        let bad = r#"
[broken]
source_file = "solution.txt"
harness_file = "harness.txt"
run_command = "cat harness.txt"
harness = "no placeholder here"
"#;
        assert!(LanguageRegistry::from_toml(bad).is_err());
    }
}
