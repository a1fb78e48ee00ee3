//! Error types for nfcaction.
//!
//! This module defines the crate-level error type. Concerns with their own
//! failure vocabulary (NDEF decoding, tag access, action forms) keep a
//! dedicated enum that converts into [`Error`].

use thiserror::Error;

use crate::action::DraftError;
use crate::ndef::NdefError;
use crate::tag::TagError;

/// The main error type for nfcaction operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Codec Errors ===
    /// NDEF encoding or decoding failed.
    #[error("NDEF error: {0}")]
    Ndef(#[from] NdefError),

    /// Hex input could not be decoded.
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    /// An action form could not be turned into a descriptor.
    #[error("invalid action: {0}")]
    Draft(#[from] DraftError),

    // === Tag Errors ===
    /// Tag access failed.
    #[error("tag error: {0}")]
    Tag(#[from] TagError),

    // === Dispatch Errors ===
    /// A handler program could not be started.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        /// The program that was spawned.
        program: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A handler program ran but reported failure.
    #[error("'{program}' exited with {status}")]
    HandlerFailed {
        /// The program that was spawned.
        program: String,
        /// Its exit status.
        status: std::process::ExitStatus,
    },

    // === Platform Errors ===
    /// Platform-specific operation failed.
    #[error("platform error: {0}")]
    Platform(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for nfcaction operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new platform error.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a launch error for `program`.
    #[must_use]
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }

    /// Check if this error comes from a configuration problem.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad(_) | Self::ConfigValidation { .. })
    }

    /// Check if this error comes from starting or running a handler.
    #[must_use]
    pub fn is_launch_error(&self) -> bool {
        matches!(self, Self::Launch { .. } | Self::HandlerFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::platform("test error");
        assert_eq!(err.to_string(), "platform error: test error");
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_launch_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::launch("xdg-open", io_err);
        let msg = err.to_string();
        assert!(msg.contains("xdg-open"));
        assert!(msg.contains("no such file"));
        assert!(err.is_launch_error());
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid language".to_string(),
        };
        assert!(err.to_string().contains("invalid language"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_from_ndef_error() {
        let err: Error = NdefError::EmptyTextPayload.into();
        assert!(matches!(err, Error::Ndef(_)));
        assert!(err.to_string().contains("empty text record payload"));
    }

    #[test]
    fn test_from_hex_error() {
        let hex_err = hex::decode("zz").unwrap_err();
        let err: Error = hex_err.into();
        assert!(matches!(err, Error::Hex(_)));
    }

    #[test]
    fn test_from_draft_error() {
        let err: Error = DraftError::EmptyDuration.into();
        assert!(err.to_string().contains("Duration cannot be empty"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_tag_error() {
        let err: Error = TagError::ReadOnly.into();
        assert!(matches!(err, Error::Tag(TagError::ReadOnly)));
        assert!(err.to_string().starts_with("tag error: "));
    }
}
