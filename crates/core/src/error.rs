//! Engine error type
//!
//! A single error struct discriminated by [`ErrorKind`], carrying a human
//! message and optional structured details. Callers branch on `kind`, never
//! on the message text.

use std::fmt;

use crate::types::ErrorKind;

/// Result alias used across the workspace
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}{}", kind_code(.kind), DetailsSuffix(.details))]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
}

struct DetailsSuffix<'a>(&'a Option<String>);

impl fmt::Display for DetailsSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(d) => write!(f, " ({})", d),
            None => Ok(()),
        }
    }
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn invalid_placement(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPlacement, message)
    }

    pub fn insufficient_power_up(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientPowerUp, message)
    }

    pub fn not_playable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotPlayable, message)
    }

    pub fn corrupt_snapshot(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptSnapshot, message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, message)
    }

    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvariantViolation, message)
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        kind_code(&self.kind)
    }

    /// Whether the owning session must stop until a caller-initiated reset
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::InvariantViolation
    }
}

fn kind_code(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidPlacement => "invalid_placement",
        ErrorKind::InsufficientPowerUp => "insufficient_power_up",
        ErrorKind::NotPlayable => "not_playable",
        ErrorKind::CorruptSnapshot => "corrupt_snapshot",
        ErrorKind::InvalidConfig => "invalid_config",
        ErrorKind::InvariantViolation => "invariant_violation",
    }
}
