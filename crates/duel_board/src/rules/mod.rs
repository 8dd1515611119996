//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board). Rules are separated from
//! board storage so the server can run them against a replayed ledger.

mod draw;
mod win;

pub use draw::is_full;
pub use win::{Outcome, WIN_PATTERNS, detect};
