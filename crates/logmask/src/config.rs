//! Masking configuration.
//!
//! Rules are declared as data so deployments can ship them in a config
//! file instead of code. The JSON shape mirrors [`Rule`] directly:
//!
//! ```json
//! {
//!   "rules": [
//!     {"transform": "mask-email", "fields": ["email"]},
//!     {"transform": "full-exclusion", "fields": ["password", "token"]}
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rule::{Converter, Rule};
use crate::transform::Transform;

/// One configured rule: a transform and the fields it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub transform: Transform,
    pub fields: Vec<String>,
}

/// Declarative masking configuration, usually loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl MaskingConfig {
    /// Reads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: MaskingConfig = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), rules = config.rules.len(), "masking rules loaded");
        Ok(config)
    }

    /// Writes this configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Builds the converter described by these rules.
    pub fn build(&self) -> Result<Converter> {
        let rules = self
            .rules
            .iter()
            .map(|rule| Rule::new(rule.transform, rule.fields.iter().cloned()));
        Converter::new(rules)
    }

    /// Builds the converter and installs it process-wide.
    pub fn install(&self) -> Result<()> {
        let converter = self.build()?;
        crate::redactor::set_active_converter(converter);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MaskError;

    const SAMPLE: &str = r#"{
        "rules": [
            {"transform": "mask-email", "fields": ["email"]},
            {"transform": "full-exclusion", "fields": ["password", "token"]}
        ]
    }"#;

    #[test]
    fn parses_sample_config() {
        let config: MaskingConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].transform, Transform::MaskEmail);
        assert_eq!(config.rules[0].fields, vec!["email"]);
        assert_eq!(config.rules[1].fields, vec!["password", "token"]);
    }

    #[test]
    fn transform_names_use_kebab_case() {
        let config = MaskingConfig {
            rules: vec![RuleConfig {
                transform: Transform::MaskPhoneAndCard,
                fields: vec!["phone".into()],
            }],
        };
        let raw = serde_json::to_string(&config).unwrap();
        assert!(raw.contains(r#""transform":"mask-phone-and-card""#), "{raw}");
        let back: MaskingConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_rules_key_means_empty() {
        let config: MaskingConfig = serde_json::from_str("{}").unwrap();
        assert!(config.rules.is_empty());
        assert_eq!(config.build().unwrap().len(), 0);
    }

    #[test]
    fn unknown_transform_is_rejected() {
        let raw = r#"{"rules":[{"transform":"mask-everything","fields":[]}]}"#;
        assert!(serde_json::from_str::<MaskingConfig>(raw).is_err());
    }

    #[test]
    fn build_produces_working_converter() {
        let config: MaskingConfig = serde_json::from_str(SAMPLE).unwrap();
        let converter = config.build().unwrap();
        assert_eq!(converter.len(), 3);
        assert_eq!(converter.hide("password", "awesome"), "*******");
        assert_eq!(converter.hide("email", "employer@now.com"), "emp*****@now.com");
    }

    #[test]
    fn build_rejects_duplicate_fields_across_rules() {
        let config = MaskingConfig {
            rules: vec![
                RuleConfig {
                    transform: Transform::MaskEmail,
                    fields: vec!["login".into()],
                },
                RuleConfig {
                    transform: Transform::FullExclusion,
                    fields: vec!["login".into()],
                },
            ],
        };
        match config.build() {
            Err(MaskError::DuplicateField { field }) => assert_eq!(field, "login"),
            other => panic!("expected duplicate field error, got {other:?}"),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("masking.json");
        let config: MaskingConfig = serde_json::from_str(SAMPLE).unwrap();

        config.save(&path).unwrap();
        let loaded = MaskingConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_reports_io_and_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(MaskingConfig::load(&missing), Err(MaskError::Io(_))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{nope").unwrap();
        assert!(matches!(MaskingConfig::load(&bad), Err(MaskError::Config(_))));
    }

    #[test]
    fn install_swaps_the_active_converter() {
        let _guard = crate::redactor::test_guard();

        let config: MaskingConfig = serde_json::from_str(SAMPLE).unwrap();
        config.install().unwrap();
        assert_eq!(crate::redactor::hide("token", "secret"), "******");

        crate::redactor::clear_active_converter();
    }
}
