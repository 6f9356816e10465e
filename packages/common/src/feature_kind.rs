#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length (in characters) of a `String` feature value.
pub const MAX_STRING_VALUE_LENGTH: usize = 100;

const TRUE_TOKENS: &[&str] = &["true", "yes", "on", "1"];
const FALSE_TOKENS: &[&str] = &["false", "no", "off", "0"];

/// The declared value kind of a content-type feature.
///
/// Feature values are always stored as text; the kind decides which texts are
/// acceptable and how they are normalised before storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum FeatureKind {
    /// Any finite decimal number, e.g. `42` or `-3.5`.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Number"))]
    Number,
    /// Free text of at most 100 characters.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "String"))]
    String,
    /// One of `true/false/yes/no/on/off/1/0`, stored as `true` or `false`.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Boolean"))]
    Boolean,
}

/// Why a raw value was rejected for a feature kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureValueError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a boolean (expected one of: true, false, yes, no, on, off, 1, 0)")]
    NotABoolean(String),

    #[error("Text must be at most {max} characters (it has {actual})")]
    TooLong { max: usize, actual: usize },
}

impl FeatureKind {
    pub const ALL: &'static [FeatureKind] = &[Self::Number, Self::String, Self::Boolean];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::String => "String",
            Self::Boolean => "Boolean",
        }
    }

    /// Check `raw` against this kind and return the text to store.
    pub fn parse_value(&self, raw: &str) -> Result<String, FeatureValueError> {
        match self {
            Self::Number => {
                let trimmed = raw.trim();
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(trimmed.to_string()),
                    _ => Err(FeatureValueError::NotANumber(raw.to_string())),
                }
            }
            Self::Boolean => {
                let token = raw.trim().to_ascii_lowercase();
                if TRUE_TOKENS.contains(&token.as_str()) {
                    Ok("true".into())
                } else if FALSE_TOKENS.contains(&token.as_str()) {
                    Ok("false".into())
                } else {
                    Err(FeatureValueError::NotABoolean(raw.to_string()))
                }
            }
            Self::String => {
                let actual = raw.chars().count();
                if actual > MAX_STRING_VALUE_LENGTH {
                    Err(FeatureValueError::TooLong {
                        max: MAX_STRING_VALUE_LENGTH,
                        actual,
                    })
                } else {
                    Ok(raw.to_string())
                }
            }
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown feature kind '{invalid}'. Valid values: Number, String, Boolean")]
pub struct ParseKindError {
    invalid: String,
}

impl FromStr for FeatureKind {
    type Err = ParseKindError;

    /// Kind names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseKindError {
                invalid: s.to_string(),
            })
    }
}
