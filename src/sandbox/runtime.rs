//! Container runtime abstraction
//!
//! The controller talks to the isolation primitive only through
//! [`ContainerRuntime`], which lets tests substitute a recording double for
//! the Docker daemon.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::AsyncWrite;

use crate::error::Result;
use crate::sandbox::output::OutputChunk;

/// Combined output stream of an attached sandbox
pub type OutputStream = BoxStream<'static, Result<OutputChunk>>;

/// Writable stdin of an attached sandbox
pub type InputSink = Pin<Box<dyn AsyncWrite + Send>>;

/// Resource ceilings applied to every sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Memory ceiling in bytes
    pub memory_bytes: i64,
    /// Relative CPU weight
    pub cpu_shares: i64,
    /// Whether the sandbox is cut off from the network
    pub network_disabled: bool,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            memory_bytes: 256 * 1024 * 1024,
            cpu_shares: 512,
            network_disabled: true,
        }
    }
}

/// Host directory exposed inside the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host: PathBuf,
    pub container: String,
}

impl BindMount {
    /// Docker-style `host:container` string
    pub fn to_bind_string(&self) -> String {
        format!("{}:{}", self.host.display(), self.container)
    }
}

/// Everything the runtime needs to create one sandbox
#[derive(Debug, Clone)]
pub struct SandboxSpec {
    /// Unique sandbox name
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub mount: BindMount,
    pub limits: ResourceLimits,
    /// Allocate a TTY and keep stdin open
    pub interactive: bool,
}

/// Streams obtained by attaching to a sandbox
pub struct Attachment {
    pub output: OutputStream,
    /// Present only when stdin was requested
    pub input: Option<InputSink>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("input", &self.input.is_some())
            .finish_non_exhaustive()
    }
}

/// Primitives of the container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Get the runtime name
    fn name(&self) -> &str;

    /// Check the runtime is reachable
    async fn ping(&self) -> Result<()>;

    /// Make sure `image` is available locally, pulling it if needed
    async fn ensure_image(&self, image: &str) -> Result<()>;

    /// Create (but do not start) a sandbox, returning its id
    async fn create(&self, spec: &SandboxSpec) -> Result<String>;

    /// Attach to the combined output (and optionally stdin) of a sandbox
    async fn attach(&self, id: &str, stdin: bool) -> Result<Attachment>;

    /// Start a created sandbox
    async fn start(&self, id: &str) -> Result<()>;

    /// Wait for the sandbox to exit, returning its exit code
    async fn wait(&self, id: &str) -> Result<i64>;

    /// Stop a running sandbox, killing it after `grace`
    async fn stop(&self, id: &str, grace: Duration) -> Result<()>;

    /// Forcibly remove a sandbox
    async fn remove(&self, id: &str) -> Result<()>;
}
