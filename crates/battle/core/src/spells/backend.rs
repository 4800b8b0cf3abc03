//! Where effects write.

use tracing::warn;

use crate::battle::{BattleQuery, BattleRecord, BattleStateMut, ReplicationSink};
use crate::rng::RandomSource;

/// Which backend a cast is applied through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum ApplyStrategy {
    /// Authoritative: every record is replicated to all observers.
    Replicated,
    /// Speculative: records go straight into a detached battle.
    Direct,
}

/// The two ways of applying an effect.
pub enum ApplyBackend<'a> {
    Replicated(&'a mut dyn ReplicationSink),
    Direct(&'a mut dyn BattleStateMut),
}

/// Everything an effect needs while applying: the battle, a way to change
/// it, and the random source.
///
/// Effects build [`BattleRecord`]s from what they read and hand them to
/// [`ApplyContext::submit`]. Both backends apply a record the same way, so
/// the resulting unit states do not depend on the strategy.
pub struct ApplyContext<'a> {
    backend: ApplyBackend<'a>,
    rng: &'a mut dyn RandomSource,
}

impl<'a> ApplyContext<'a> {
    pub fn replicated(sink: &'a mut dyn ReplicationSink, rng: &'a mut dyn RandomSource) -> Self {
        Self {
            backend: ApplyBackend::Replicated(sink),
            rng,
        }
    }

    pub fn direct(state: &'a mut dyn BattleStateMut, rng: &'a mut dyn RandomSource) -> Self {
        Self {
            backend: ApplyBackend::Direct(state),
            rng,
        }
    }

    pub fn strategy(&self) -> ApplyStrategy {
        match self.backend {
            ApplyBackend::Replicated(_) => ApplyStrategy::Replicated,
            ApplyBackend::Direct(_) => ApplyStrategy::Direct,
        }
    }

    /// Current battle with every submitted record applied.
    pub fn battle(&self) -> &dyn BattleQuery {
        match &self.backend {
            ApplyBackend::Replicated(sink) => sink.battle(),
            ApplyBackend::Direct(state) => state.as_query(),
        }
    }

    pub fn rng(&mut self) -> &mut dyn RandomSource {
        &mut *self.rng
    }

    /// Battle and random source at once, for effects that roll while reading.
    pub fn parts(&mut self) -> (&dyn BattleQuery, &mut dyn RandomSource) {
        let battle = match &self.backend {
            ApplyBackend::Replicated(sink) => sink.battle(),
            ApplyBackend::Direct(state) => state.as_query(),
        };
        (battle, &mut *self.rng)
    }

    pub fn submit(&mut self, record: BattleRecord) {
        match &mut self.backend {
            ApplyBackend::Replicated(sink) => sink.send_and_apply(record),
            ApplyBackend::Direct(state) => state.apply_record(&record),
        }
    }

    /// Reports a request that cannot be carried out.
    pub fn complain(&mut self, problem: &str) {
        match &mut self.backend {
            ApplyBackend::Replicated(sink) => sink.complain(problem),
            ApplyBackend::Direct(_) => warn!(problem, "speculative cast refused a request"),
        }
    }
}
