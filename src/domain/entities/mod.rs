//! Domain entities - Core business objects

pub mod client;
pub mod command;
pub mod event;
pub mod message;

pub use client::Client;
pub use command::{CommandFn, CommandHandler, CommandRegistry, Invocation};
pub use event::{Event, EventRegistry, EventType, Observer};
pub use message::{Content, Message};
