//! Draft auditor replies to an audited party's statement.
//!
//! The [`reply`] module turns one free-form completion into exactly three
//! validated replies; the rest wires prompts, models and history around it.

pub mod config;
pub mod generator;
pub mod history;
pub mod prompt;
pub mod reply;

pub use config::AppConfig;
pub use generator::{ConnectionReport, Generation, ReplyGenerator};
pub use history::{HistoryItem, HistoryStore};
pub use prompt::{Intensity, build_prompt};
pub use reply::{ResponseTriple, normalize, normalize_to_triple};
