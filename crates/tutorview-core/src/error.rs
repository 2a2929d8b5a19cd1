#![forbid(unsafe_code)]

use thiserror::Error;

use crate::channel::BlockId;

pub type Result<T> = std::result::Result<T, TutorialError>;

/// Part of an admonition the step parser could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    Title,
    Content,
}

impl core::fmt::Display for MissingPart {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Content => f.write_str("content"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TutorialError {
    /// Authoring defect in the generated markup. Never retried.
    #[error("malformed tutorial template: block {block}, child {child} has no {missing} element")]
    MalformedTemplate {
        block: BlockId,
        child: usize,
        missing: MissingPart,
    },

    #[error("unknown tutorial block: {0}")]
    UnknownBlock(BlockId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[cfg(feature = "config")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
}
