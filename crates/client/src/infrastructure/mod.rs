//! Infrastructure implementations.
//!
//! Contains port trait implementations for storage, HTTP transport, and time.

pub mod clock;
pub mod http;
pub mod resilient_workflow_api;
pub mod static_screens;
pub mod storage;

pub use clock::SystemClock;
pub use http::{HttpScreenSource, HttpTimeouts, HttpWorkflowApi};
pub use resilient_workflow_api::RetryingWorkflowApi;
pub use static_screens::StaticScreenSource;
pub use storage::{FileStorage, InMemoryStorage};
