//! FlowPilot client.
//!
//! This crate contains the client side of a server-driven UI: ports to the
//! outside world, their adapters, the session and screen services, and the
//! presentation controllers a renderer binds to.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod presentation;

// Re-export commonly used entrypoints
pub use application::services::{
    ActionDispatcher, RetryPolicy, ScreenCache, ScreenResult, SessionStore, WorkflowManager,
    WorkflowRepository, WorkflowSessionRepository,
};
pub use config::ClientConfig;
pub use presentation::{ScreenController, WorkflowController};
