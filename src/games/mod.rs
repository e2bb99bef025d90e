pub mod classifier;
pub mod draw;
pub mod processor;
pub mod settlement;
pub mod types;

pub use classifier::{classify, Classification};
pub use draw::{DrawSource, ScriptedDraw, SecureDraw};
pub use processor::BetProcessor;
pub use settlement::{Settlement, SettlementEngine};
pub use types::*;
