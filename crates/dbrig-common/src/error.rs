//! Unified error types for the dbrig workspace.
//!
//! Creation and verification failures carry a [`Diagnostic`] so callers can
//! show what happened, why it matters, and how to fix it instead of a bare
//! runtime message.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Structured diagnostic attached to container-side failures.
///
/// Rendering is plain text; the caller decides where it goes (terminal,
/// log, test output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What happened, in one sentence.
    pub what: String,
    /// Why it matters for the caller.
    pub why: String,
    /// Ordered remediation steps.
    pub fix: Vec<String>,
    /// Pointer to further reading, if any.
    pub reference: Option<String>,
    /// Original runtime message, preserved verbatim.
    pub cause: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.what)?;
        writeln!(f, "  why: {}", self.why)?;
        if !self.fix.is_empty() {
            writeln!(f, "  fix:")?;
            for (i, step) in self.fix.iter().enumerate() {
                writeln!(f, "    {}. {step}", i + 1)?;
            }
        }
        if let Some(reference) = &self.reference {
            writeln!(f, "  see: {reference}")?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f, "  cause: {cause}")?;
        }
        Ok(())
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DbrigError {
    /// A descriptor, mount string, or policy is invalid. Raised before any
    /// runtime call and never retried.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The container runtime refused to create or start a container.
    #[error("container creation failed: {diagnostic}")]
    Creation {
        /// Translated diagnostic for the refusal.
        diagnostic: Box<Diagnostic>,
    },

    /// The container vanished, reported an unusable status, or failed
    /// mount verification after creation appeared to succeed.
    #[error("container verification failed: {diagnostic}")]
    Verification {
        /// Translated diagnostic for the verification failure.
        diagnostic: Box<Diagnostic>,
    },

    /// A runtime call other than create failed.
    #[error("container {operation} failed: {diagnostic}")]
    Runtime {
        /// Operation that failed (`start`, `stop`, `restart`, `inspect`, ...).
        operation: &'static str,
        /// Translated diagnostic for the failure.
        diagnostic: Box<Diagnostic>,
    },

    /// A policy actuator call failed. The monitor logs this and keeps its
    /// last known-good state.
    #[error("policy actuator {action} failed: {message}")]
    Actuator {
        /// Actuator operation that failed (`enable` or `disable`).
        action: &'static str,
        /// Underlying failure message.
        message: String,
    },

    /// The monitor loop did not exit within the stop timeout.
    #[error("monitor did not stop within {waited:?}; loop may be mid-actuation")]
    StopTimeout {
        /// How long the stop call waited.
        waited: Duration,
    },
}

impl DbrigError {
    /// Shorthand for a [`DbrigError::Configuration`] error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a [`DbrigError::Actuator`] error.
    #[must_use]
    pub fn actuator(action: &'static str, message: impl Into<String>) -> Self {
        Self::Actuator {
            action,
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DbrigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_renders_all_sections() {
        let diag = Diagnostic {
            what: "image 'pg:99' was not found".into(),
            why: "the container cannot be created without its image".into(),
            fix: vec!["check the tag".into(), "pull the image manually".into()],
            reference: Some("https://docs.docker.com/reference/cli/docker/image/pull/".into()),
            cause: Some("No such image: pg:99".into()),
        };
        let rendered = diag.to_string();
        assert!(rendered.contains("image 'pg:99' was not found"));
        assert!(rendered.contains("why: the container cannot be created"));
        assert!(rendered.contains("1. check the tag"));
        assert!(rendered.contains("2. pull the image manually"));
        assert!(rendered.contains("see: https://docs.docker.com"));
        assert!(rendered.contains("cause: No such image"));
    }

    #[test]
    fn diagnostic_display_skips_empty_sections() {
        let diag = Diagnostic {
            what: "something failed".into(),
            why: "it matters".into(),
            fix: vec![],
            reference: None,
            cause: None,
        };
        let rendered = diag.to_string();
        assert!(!rendered.contains("fix:"));
        assert!(!rendered.contains("see:"));
        assert!(!rendered.contains("cause:"));
    }

    #[test]
    fn config_shorthand_builds_configuration_variant() {
        let err = DbrigError::config("bad mount");
        assert!(matches!(err, DbrigError::Configuration { .. }));
        assert_eq!(err.to_string(), "invalid configuration: bad mount");
    }

    #[test]
    fn actuator_shorthand_names_action_and_cause() {
        let err = DbrigError::actuator("disable", "hook exited with status 1");
        assert!(matches!(err, DbrigError::Actuator { action: "disable", .. }));
        assert_eq!(
            err.to_string(),
            "policy actuator disable failed: hook exited with status 1"
        );
    }
}
