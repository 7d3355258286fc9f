use std::{fmt, time::Duration};

/// Layout requested for a math expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MathMode {
    /// Flows with surrounding text.
    #[default]
    Inline,
    /// Set on its own, centred line.
    Display,
}

impl MathMode {
    /// Interprets the `mode` attribute of a math element. Only the exact value
    /// `display` selects display mode.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("display") => Self::Display,
            _ => Self::Inline,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Display => "display",
        }
    }
}

impl fmt::Display for MathMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single "typeset this element" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypesetRequest {
    /// TeX source taken from the element's text content.
    pub source: String,
    pub mode: MathMode,
}

/// Result of a successful typesetting pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypesetOutput {
    /// Rendered text ready to be drawn.
    pub rendered: String,
    pub mode: MathMode,
}

/// Error type returned by [`TypesetPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesetError {
    /// The engine did not answer within the allotted time.
    #[error("typesetting timed out after {timeout:?}")]
    Timeout {
        /// Maximum allotted time before aborting the request.
        timeout: Duration,
    },
    /// The engine could not be started or talked to.
    #[error("typesetting engine unavailable: {reason}")]
    Unavailable {
        /// Human readable error description.
        reason: String,
    },
    /// The engine ran but rejected the source.
    #[error("typesetting failed: {message}")]
    Rejected {
        /// Diagnostic reported by the engine.
        message: String,
    },
}

impl TypesetError {
    /// Helper for constructing [`TypesetError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Helper for constructing [`TypesetError::Rejected`].
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Contract implemented by typesetting engines.
///
/// Implementations may block; callers run them off the UI loop.
///
/// ```
/// use xtag_proto::ports::typeset::{
///     TypesetError, TypesetOutput, TypesetPort, TypesetRequest,
/// };
///
/// #[derive(Debug)]
/// struct Echo;
///
/// impl TypesetPort for Echo {
///     fn typeset(&self, request: &TypesetRequest) -> Result<TypesetOutput, TypesetError> {
///         Ok(TypesetOutput {
///             rendered: request.source.clone(),
///             mode: request.mode,
///         })
///     }
/// }
/// ```
pub trait TypesetPort: fmt::Debug + Send + Sync {
    /// Typesets one expression.
    fn typeset(&self, request: &TypesetRequest) -> Result<TypesetOutput, TypesetError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_display_attribute_selects_display_mode() {
        assert_eq!(MathMode::from_attribute(Some("display")), MathMode::Display);
        assert_eq!(MathMode::from_attribute(Some("inline")), MathMode::Inline);
        assert_eq!(MathMode::from_attribute(Some("Display")), MathMode::Inline);
        assert_eq!(MathMode::from_attribute(None), MathMode::Inline);
    }

    #[test]
    fn error_messages_name_the_failure() {
        let timeout = TypesetError::Timeout {
            timeout: Duration::from_millis(250),
        };

        assert_eq!(timeout.to_string(), "typesetting timed out after 250ms");
        assert_eq!(
            TypesetError::rejected("unbalanced braces").to_string(),
            "typesetting failed: unbalanced braces"
        );
    }
}
