//! Common error infrastructure for battle-core.
//!
//! Errors fall into three groups:
//!
//! - **Data anomalies** (overusing a pool, healing a clone, applying a snapshot to
//!   the wrong unit) are logged through `tracing` and clamped. They never surface
//!   as values.
//! - **Illegal actions** (a cast with no valid target, a forbidden cast mode) are
//!   reported as structured values before any state is touched.
//! - **Invariant violations** (asking for the best attack of an empty candidate
//!   set) are errors of [`ErrorSeverity::Fatal`].
//!
//! Domain-specific error enums live next to the code that produces them and
//! implement [`EngineError`].

use crate::battle::BattleHex;
use crate::unit::UnitId;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The caller can retry with another target or another action.
    Recoverable,

    /// Invalid input, should not retry without changes.
    ///
    /// Examples: forbidden cast mode, no appropriate target
    Validation,

    /// Unexpected state inconsistency. These indicate bugs.
    Internal,

    /// Invariant violated, the caller cannot continue.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Unit that triggered the error (if applicable).
    pub unit: Option<UnitId>,

    /// Hex where the error occurred (if applicable).
    pub hex: Option<BattleHex>,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            unit: None,
            hex: None,
            message: None,
        }
    }

    #[must_use]
    pub const fn with_unit(mut self, unit: UnitId) -> Self {
        self.unit = Some(unit);
        self
    }

    #[must_use]
    pub const fn with_hex(mut self, hex: BattleHex) -> Self {
        self.hex = Some(hex);
        self
    }

    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all errors produced by the battle crates.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
