//! Connection adapters

pub mod console;

pub use console::ConsoleConnection;
