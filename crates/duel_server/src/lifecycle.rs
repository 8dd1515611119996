//! Session creation and joining.

use tracing::{debug, info, instrument, warn};

use crate::engine::now;
use crate::{
    Engine, EngineError, EngineErrorKind, GameSession, JoinCode, NewSession, PlayerId,
    SessionStore,
};

/// How a successful join seated the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The player took the empty O seat.
    Joined,
    /// The player already held a seat; nothing changed.
    Rejoined,
}

impl<S: SessionStore> Engine<S> {
    /// Opens a new session with `creator` seated as X.
    ///
    /// Join codes are drawn from the engine's generator until one is free.
    /// A code that turns out to be taken at insert time counts as a
    /// collision, like one found by the lookup.
    ///
    /// # Errors
    ///
    /// [`ExhaustedRetries`](EngineErrorKind::ExhaustedRetries) if every
    /// attempt collided; storage errors are returned as they occur.
    #[instrument(skip(self), fields(creator = %creator))]
    pub fn create_session(&self, creator: PlayerId) -> Result<GameSession, EngineError> {
        let attempts = (*self.config.join_code_attempts()).max(1);

        for attempt in 1..=attempts {
            let code = self.codes.generate();
            if self.store.get_by_code(&code)?.is_some() {
                debug!(attempt, code = %code, "Join code in use, retrying");
                continue;
            }

            match self.store.create(NewSession::new(code, creator, now())) {
                Ok(session) => {
                    info!(
                        session_id = %session.id(),
                        code = %session.join_code(),
                        attempt,
                        "Session created"
                    );
                    return Ok(session);
                }
                Err(e) if e.kind == EngineErrorKind::CodeTaken => {
                    debug!(attempt, "Join code claimed concurrently, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(attempts, "No free join code found");
        Err(EngineError::new(
            EngineErrorKind::ExhaustedRetries,
            format!("Could not generate a unique join code after {attempts} attempts"),
        ))
    }

    /// Seats `player` in the session identified by `code`.
    ///
    /// Rejoining a session the player already sits in returns it unchanged
    /// with [`JoinOutcome::Rejoined`].
    ///
    /// # Errors
    ///
    /// - [`InvalidJoinCode`](EngineErrorKind::InvalidJoinCode) if the code is blank or malformed
    /// - [`NotFound`](EngineErrorKind::NotFound) if no session uses the code
    /// - [`GameFinished`](EngineErrorKind::GameFinished) if the session is over
    /// - [`GameFull`](EngineErrorKind::GameFull) if both seats belong to others
    #[instrument(skip(self), fields(player = %player))]
    pub fn join_session(
        &self,
        code: &str,
        player: PlayerId,
    ) -> Result<(GameSession, JoinOutcome), EngineError> {
        let code = JoinCode::parse(code)?;
        let found = self
            .store
            .get_by_code(&code)?
            .ok_or_else(|| EngineError::not_found(format!("No game found with code {code}")))?;

        self.store
            .with_exclusive_access(*found.id(), |mut session, writer| {
                if session.is_finished() {
                    warn!(session_id = %session.id(), "Join attempted on finished game");
                    return Err(EngineError::new(
                        EngineErrorKind::GameFinished,
                        format!("Game {} has already finished", session.id()),
                    ));
                }

                if session.is_seated(player) {
                    debug!(session_id = %session.id(), "Player already seated, rejoining");
                    return Ok((session, JoinOutcome::Rejoined));
                }

                if session.player_o().is_some() {
                    warn!(session_id = %session.id(), "Join attempted on full game");
                    return Err(EngineError::new(
                        EngineErrorKind::GameFull,
                        format!("Game {} already has two players", session.id()),
                    ));
                }

                session.seat_o(player, now());
                writer.save(&session)?;
                info!(session_id = %session.id(), "Player joined as O");
                Ok((session, JoinOutcome::Joined))
            })
    }
}
