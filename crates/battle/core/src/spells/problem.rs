use super::SpellId;
use crate::error::{EngineError, ErrorSeverity};

/// Why a cast was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ProblemKind {
    /// The cast is not allowed at all, whatever the target.
    Invalid,
    NoAppropriateTarget,
    /// The caster has no casts or mana left.
    CasterCannotCast,
}

/// Structured refusal of a cast, produced before anything is changed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("{spell}: {kind} ({message})")]
pub struct Problem {
    pub kind: ProblemKind,
    pub spell: SpellId,
    pub message: &'static str,
}

impl Problem {
    pub fn new(kind: ProblemKind, spell: SpellId, message: &'static str) -> Self {
        Self {
            kind,
            spell,
            message,
        }
    }

    pub fn invalid(spell: SpellId, message: &'static str) -> Self {
        Self::new(ProblemKind::Invalid, spell, message)
    }

    pub fn no_target(spell: SpellId, message: &'static str) -> Self {
        Self::new(ProblemKind::NoAppropriateTarget, spell, message)
    }
}

/// Errors returned by a cast request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    #[error("spell {0} is not in the catalog")]
    UnknownSpell(SpellId),

    #[error("cast refused: {0}")]
    Refused(#[from] Problem),
}

impl EngineError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownSpell(_) => ErrorSeverity::Internal,
            Self::Refused(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSpell(_) => "CAST_UNKNOWN_SPELL",
            Self::Refused(problem) => match problem.kind {
                ProblemKind::Invalid => "CAST_INVALID",
                ProblemKind::NoAppropriateTarget => "CAST_NO_APPROPRIATE_TARGET",
                ProblemKind::CasterCannotCast => "CAST_CASTER_CANNOT_CAST",
            },
        }
    }
}

/// Errors building effects from spell data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectConfigError {
    #[error("no effect registered under `{0}`")]
    UnknownEffect(String),

    #[error("invalid parameters for `{effect}`: {reason}")]
    InvalidParameter {
        effect: &'static str,
        reason: &'static str,
    },
}

impl EngineError for EffectConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEffect(_) => "EFFECT_UNKNOWN",
            Self::InvalidParameter { .. } => "EFFECT_INVALID_PARAMETER",
        }
    }
}
