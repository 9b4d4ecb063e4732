//! Error types for skin loading and resource access.
//!
//! Only [`ConfigError`] ever reaches the caller as a hard failure. Resource
//! errors are logged by the compositor stages and the draw is skipped.

use std::path::PathBuf;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A skin document that cannot be turned into a [`Skin`](crate::Skin).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("skin parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("skin read error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("arity error: layer `{layer}` {what} has {found} values, expected {expected}")]
    Arity {
        layer: String,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid value for `{field}`: `{value}`")]
    InvalidValue { field: String, value: String },

    #[error("layer `{layer}` has an image rule for `{name}` which is not one of its attributes")]
    UnknownRuleAttribute { layer: String, name: String },

    #[error("layer with an empty attribute name")]
    EmptyLayerName,

    #[error("profile `{profile}` refers to missing layer set `{layer_set}`")]
    MissingLayerSet { profile: String, layer_set: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn arity(
        layer: impl Into<String>,
        what: &'static str,
        expected: usize,
        found: usize,
    ) -> Self {
        Self::Arity {
            layer: layer.into(),
            what,
            expected,
            found,
        }
    }
}

/// Failure to obtain an overlay image from the resources directory.
#[derive(thiserror::Error, Debug)]
pub enum ResourceError {
    #[error("missing resource: {0}")]
    Missing(PathBuf),

    #[error("unreadable resource: {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A batch render that could not be scheduled.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("batch render threads must be >= 1 when set")]
    ZeroThreads,

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// An artwork target string such as `posters` or `videoimages3` that is not recognised.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown artwork target: `{0}`")]
pub struct TargetParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ConfigError::invalid("align", "middle")
                .to_string()
                .contains("invalid value for `align`")
        );
        assert!(
            ConfigError::arity("HD/TV", "image rule", 2, 3)
                .to_string()
                .contains("arity error:")
        );
        assert!(
            ResourceError::Missing(PathBuf::from("hd.png"))
                .to_string()
                .starts_with("missing resource:")
        );
        assert!(
            TargetParseError("fanart".into())
                .to_string()
                .contains("fanart")
        );
    }

    #[test]
    fn json_error_converts() {
        let err: ConfigError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("skin parse error:"));
    }
}
