pub mod handlers;
pub mod index;
pub mod parser;

pub use handlers::{AppState, router};
pub use index::{TokenIndex, TokenMatch};
pub use parser::{LevelMatch, LevelMatches, ParseTrace, StaticParser, TokenSpan};
