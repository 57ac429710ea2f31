// src/lib.rs

pub mod categories;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod panel;
pub mod repl;

pub use client::{ChatResponse, ConversationClient};
pub use config::{ClientConfig, ConfigUpdate};
pub use error::ClientError;
pub use message::{Message, Role};
pub use panel::ChatPanel;
