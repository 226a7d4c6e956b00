//! Form configuration.
//!
//! ```
//! use formwork::config::{FormConfig, ValidityMode};
//!
//! let config = FormConfig::from_json(r#"{ "validity": "strict" }"#)?;
//! assert_eq!(config.validity, ValidityMode::Strict);
//! assert!(config.validate_on_set);
//! # Ok::<(), formwork::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::Result;

/// Which validity flag gates submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityMode {
    /// Submit when every field `is_valid`; warnings do not block.
    #[default]
    Normal,
    /// Submit only when every field `is_valid_strict`.
    Strict,
}

/// Per-form settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Validity flag consulted by `submit`.
    pub validity: ValidityMode,

    /// Default for `SetOptions::validate` when a bulk write leaves it unset.
    pub validate_on_set: bool,

    /// Mark every leaf touched when a submission is rejected as invalid.
    pub touch_on_invalid_submit: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            validity: ValidityMode::Normal,
            validate_on_set: true,
            touch_on_invalid_submit: true,
        }
    }
}

impl FormConfig {
    /// Parses a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the validity mode.
    pub fn with_validity(mut self, validity: ValidityMode) -> Self {
        self.validity = validity;
        self
    }

    /// Sets whether bulk writes revalidate by default.
    pub fn with_validate_on_set(mut self, validate: bool) -> Self {
        self.validate_on_set = validate;
        self
    }
}
