//! Application layer - Use cases and orchestration

pub mod services;
