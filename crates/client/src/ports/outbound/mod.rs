//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing application services to talk to storage, the workflow server, and the
//! screen endpoint without depending on concrete implementations.

pub mod action_effects_port;
pub mod clock_port;
pub mod screen_source_port;
pub mod storage_port;
pub mod workflow_api_port;

pub use action_effects_port::{ActionEffects, DispatchError, DispatchResult};
pub use clock_port::ClockPort;
pub use screen_source_port::{ScreenFetchError, ScreenSource};
pub use storage_port::{storage_keys, StorageProvider};
pub use workflow_api_port::WorkflowApiPort;

#[cfg(any(test, feature = "testing"))]
pub use action_effects_port::MockActionEffects;
#[cfg(any(test, feature = "testing"))]
pub use clock_port::MockClockPort;
#[cfg(any(test, feature = "testing"))]
pub use screen_source_port::MockScreenSource;
#[cfg(any(test, feature = "testing"))]
pub use storage_port::MockStorageProvider;
#[cfg(any(test, feature = "testing"))]
pub use workflow_api_port::MockWorkflowApiPort;
