//! Game session engine.
//!
//! [`Engine`] ties a [`SessionStore`] to the rules in [`EngineConfig`]. The
//! operations live next to the concern they implement: session creation and
//! joining in `lifecycle`, moves in `resolver`, history in `history`.

use chrono::{NaiveDateTime, Utc};
use tracing::{info, instrument};

use crate::{CodeGenerator, EngineConfig, EngineError, GameId, GameSession, RandomCodes, SessionStore};

/// Server-authoritative session engine.
pub struct Engine<S> {
    pub(crate) store: S,
    pub(crate) config: EngineConfig,
    pub(crate) codes: Box<dyn CodeGenerator>,
}

impl<S: SessionStore> Engine<S> {
    /// Creates an engine over `store` issuing random join codes.
    #[instrument(skip(store))]
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_code_generator(store, config, RandomCodes)
    }

    /// Creates an engine with a specific join code source.
    #[instrument(skip(store, codes))]
    pub fn with_code_generator(
        store: S,
        config: EngineConfig,
        codes: impl CodeGenerator + 'static,
    ) -> Self {
        info!(
            join_code_attempts = config.join_code_attempts(),
            turn_policy = %config.turn_policy(),
            "Engine ready"
        );
        Self {
            store,
            config,
            codes: Box::new(codes),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rules in effect.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current state of a session.
    ///
    /// # Errors
    ///
    /// [`NotFound`](crate::EngineErrorKind::NotFound) if no session has this id.
    #[instrument(skip(self))]
    pub fn get_session(&self, id: GameId) -> Result<GameSession, EngineError> {
        self.store
            .get_by_id(id)?
            .ok_or_else(|| EngineError::not_found(format!("No game found with id {id}")))
    }
}

impl<S> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
