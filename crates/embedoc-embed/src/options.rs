//! Declaration options shared by single and collection embeddings.

use serde::{Deserialize, Serialize};

fn enabled() -> bool {
    true
}

/// Options for an embedding declaration.
///
/// Both flags default to `true`: the embedded document(s) are validated
/// along with the host, and an absent value is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedOptions {
    /// Cascade the embedded documents' validation errors into the host.
    #[serde(default = "enabled")]
    pub validate: bool,
    /// Allow the embedding to be absent. When `false`, an absent value is
    /// reported as `required`.
    #[serde(default = "enabled")]
    pub optional: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            validate: true,
            optional: true,
        }
    }
}

impl EmbedOptions {
    /// Report an absent value as a validation error.
    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    /// Do not cascade validation errors.
    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }
}
