//! Sandbox module - Isolated execution of untrusted code
//!
//! Each execution is staged into its own workspace, run inside an ephemeral
//! container with resource limits and no network, and torn down afterwards:
//! - [`language`]: language identifiers to images and commands
//! - [`workspace`]: per-execution temporary directories
//! - [`runtime`]: the container primitives the controller relies on
//! - [`docker`]: the Docker implementation of those primitives
//! - [`controller`]: lifecycle, timeouts and cleanup

pub mod controller;
pub mod docker;
pub mod language;
pub mod output;
pub mod runtime;
pub mod workspace;

#[cfg(test)]
pub(crate) mod mock;

pub use controller::{
    ControllerSettings, ExecutionOutput, ExecutionRequest, InteractiveRun, SandboxController,
    SandboxGuard, SandboxState,
};
pub use docker::DockerRuntime;
pub use language::{LanguageProfile, LanguageRegistry};
pub use output::{OutputChannel, OutputChunk, Utf8Decoder};
pub use runtime::{ContainerRuntime, InputSink, OutputStream, ResourceLimits, SandboxSpec};
pub use workspace::{Workspace, WorkspaceManager};
