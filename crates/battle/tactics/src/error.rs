use battle_core::{EngineError, ErrorContext, ErrorSeverity, UnitId};

/// Errors produced while ranking attacks.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TacticsError {
    /// `best_action` was asked for on an empty candidate set. Callers must
    /// check for possible attacks first.
    #[error("no attack candidates for {attacker}")]
    NoCandidates {
        attacker: UnitId,
        context: ErrorContext,
    },
}

impl TacticsError {
    pub fn no_candidates(attacker: UnitId) -> Self {
        Self::NoCandidates {
            attacker,
            context: ErrorContext::new()
                .with_unit(attacker)
                .with_message("best action requested without possible attacks"),
        }
    }
}

impl EngineError for TacticsError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoCandidates { .. } => ErrorSeverity::Fatal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::NoCandidates { context, .. } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoCandidates { .. } => "TACTICS_NO_CANDIDATES",
        }
    }
}
