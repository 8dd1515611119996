//! Pure tic-tac-toe board logic.
//!
//! Nothing here performs I/O. The server crate stores moves and uses this
//! crate to rebuild boards from history and to decide outcomes.
//!
//! # Example
//!
//! ```
//! use duel_board::{Board, Outcome, Placement, Position, Symbol, detect};
//!
//! let board = Board::replay([
//!     Placement::new(Position::TopLeft, Symbol::X),
//!     Placement::new(Position::Center, Symbol::O),
//!     Placement::new(Position::TopCenter, Symbol::X),
//! ])
//! .unwrap();
//! assert_eq!(board.next_symbol(), Symbol::O);
//! assert_eq!(detect(&board), Outcome::None);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod position;
mod replay;
mod rules;
mod types;

pub use position::Position;
pub use replay::{Placement, PlacementError};
pub use rules::{Outcome, WIN_PATTERNS, detect, is_full};
pub use types::{Board, Square, Symbol};
