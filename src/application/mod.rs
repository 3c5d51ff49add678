//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Registry: Where plugins attach handlers, observers and hooks
//! - Services: Module loading, command dispatch, shutdown
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing

pub mod bot;
pub mod errors;
pub mod messaging;
pub mod registry;
pub mod services;
