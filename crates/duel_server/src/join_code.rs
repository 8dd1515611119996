//! Join code generation.

use tracing::{debug, instrument};

use crate::JoinCode;

/// Source of candidate join codes.
///
/// Candidates need not be unique; the lifecycle manager checks each one
/// against the store and retries on collision.
pub trait CodeGenerator: Send + Sync {
    /// Produces the next candidate code.
    fn generate(&self) -> JoinCode;
}

/// Three random bytes rendered as six uppercase hex digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    #[instrument(skip(self))]
    fn generate(&self) -> JoinCode {
        let code = JoinCode::from_bytes(rand::random::<[u8; 3]>());
        debug!(code = %code, "Generated join code candidate");
        code
    }
}

impl<F> CodeGenerator for F
where
    F: Fn() -> JoinCode + Send + Sync,
{
    fn generate(&self) -> JoinCode {
        self()
    }
}
