//! Value formatting options

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// How a raw value is rendered
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Plain text
    #[default]
    #[serde(rename = "string")]
    Text,
    /// Grouped number
    Number,
    /// Locale date or date-time
    Date,
}

/// Formatting options
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct FormatOptions {
    /// Value kind
    #[serde(default, rename = "type")]
    pub kind: FormatKind,
    /// Fixed fraction digits for numbers (negative means default 0-2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dps: Option<i32>,
    /// Maximum characters before an ellipsis is added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate: Option<usize>,
    /// Prefix and suffix around the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FormatMeta>,
    /// Comma decimal separator and period thousands separator
    #[serde(default)]
    pub use_alt_locale: bool,
}

impl FormatOptions {
    /// Number formatting with default fraction digits
    pub fn number() -> Self {
        Self {
            kind: FormatKind::Number,
            ..Self::default()
        }
    }

    /// Date formatting
    pub fn date() -> Self {
        Self {
            kind: FormatKind::Date,
            ..Self::default()
        }
    }

    /// Use exactly `dps` fraction digits
    pub fn with_dps(mut self, dps: i32) -> Self {
        self.dps = Some(dps);
        self
    }

    /// Truncate the body after `len` characters
    pub fn with_truncate(mut self, len: usize) -> Self {
        self.truncate = Some(len);
        self
    }

    /// Switch to the comma-decimal locale
    pub fn with_alt_locale(mut self, alt: bool) -> Self {
        self.use_alt_locale = alt;
        self
    }

    /// Wrap the value in a prefix and suffix
    pub fn with_wrapper(mut self, pretext: impl Into<String>, posttext: impl Into<String>) -> Self {
        self.meta = Some(FormatMeta {
            pretext: Some(pretext.into()),
            posttext: Some(posttext.into()),
        });
        self
    }
}

/// Text placed around a formatted value
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct FormatMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posttext: Option<String>,
}
