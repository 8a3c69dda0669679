use miette::Diagnostic;
use thiserror::Error;

/// Failure writing presentation markup for a block.
#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("failed to write markup: {0}")]
    #[diagnostic(code(twinline::render::write))]
    Write(#[from] std::fmt::Error),
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid direction {0:?}, expected `ltr` or `rtl`")]
    #[diagnostic(
        code(twinline::config::direction),
        help("the default direction must be either `ltr` or `rtl`")
    )]
    InvalidDirection(String),

    #[error("invalid config value for `{key}`: {reason}")]
    #[diagnostic(code(twinline::config::value))]
    InvalidValue { key: String, reason: String },
}

/// Error type for surface and clipboard operations.
///
/// Hosts report failures as opaque strings, so this only carries a message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{0}")]
#[diagnostic(code(twinline::platform))]
pub struct PlatformError(pub String);

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}
