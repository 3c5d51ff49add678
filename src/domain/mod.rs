//! Domain layer - Core business logic
//!
//! This layer contains:
//! - Entities: Clients, messages, events and the command/event registries
//! - Traits: Abstractions for infrastructure (Connection)

pub mod entities;
pub mod traits;
