// Public modules
pub mod assemble;
pub mod config;
pub mod error;
pub mod layout;
pub mod paths;
pub mod pipeline;
pub mod process;
pub mod shortcut;
pub mod stages;
pub mod version;

// Re-exports for convenient access
pub use error::{Error, ErrorCode, Result};
pub use pipeline::{run_release, Pipeline, PipelineRunResult};
pub use process::{Invocation, ProcessRunner, SystemProcessRunner};
