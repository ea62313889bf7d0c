//! Kakitori Application
//!
//! The writer engine facade tying glyph loading, input capture, matching,
//! timers and rendering together, plus configuration and the command-line
//! shell for native builds.

#[cfg(feature = "native")]
pub mod cli;
mod config;
mod error;
pub mod replay;
mod writer;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use writer::{KanjiWriter, WriterHandle};
