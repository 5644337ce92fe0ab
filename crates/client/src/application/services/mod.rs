//! Application services - Use case implementations
//!
//! Each service accepts its collaborators as port trait objects and returns
//! domain types, so the same services run against HTTP, canned, or mocked
//! infrastructure.

pub mod action_dispatcher;
pub mod retry;
pub mod screen_cache;
pub mod session_store;
pub mod workflow_manager;
pub mod workflow_repository;

pub use action_dispatcher::ActionDispatcher;
pub use retry::{retry_io, retry_io_if, RetryPolicy};
pub use screen_cache::{ScreenCache, ScreenResult};
pub use session_store::SessionStore;
pub use workflow_manager::WorkflowManager;
pub use workflow_repository::{WorkflowRepository, WorkflowSessionRepository};

#[cfg(any(test, feature = "testing"))]
pub use workflow_repository::MockWorkflowRepository;
