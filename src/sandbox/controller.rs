//! Sandbox controller
//!
//! Drives one sandbox through its lifecycle:
//!
//! ```text
//! Unstarted -> Created -> Running -> Completed | TimedOut | Failed -> TornDown
//! ```
//!
//! Every sandbox is owned by a [`SandboxGuard`] from the moment its workspace
//! exists. The guard's `teardown` stops and removes the container and deletes
//! the workspace; it runs on every exit path, and `Drop` covers futures that
//! are cancelled before reaching it.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{Config, SandboxConfig};
use crate::error::{Error, Result};
use crate::sandbox::language::{LanguageProfile, LanguageRegistry};
use crate::sandbox::output::OutputAccumulator;
use crate::sandbox::runtime::{
    ContainerRuntime, InputSink, OutputStream, ResourceLimits, SandboxSpec,
};
use crate::sandbox::workspace::{Workspace, WorkspaceManager};

/// Request to execute code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Language identifier; absent means unsupported
    #[serde(default)]
    pub language: String,
    /// Source code
    #[serde(default)]
    pub code: String,
}

impl ExecutionRequest {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        ExecutionRequest {
            language: language.into(),
            code: code.into(),
        }
    }
}

/// Output of a batch execution that exited with code 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
    pub duration: Duration,
}

/// Lifecycle state of a sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    Unstarted,
    Created,
    Running,
    Completed,
    TimedOut,
    Failed,
    TornDown,
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SandboxState::Unstarted => "unstarted",
            SandboxState::Created => "created",
            SandboxState::Running => "running",
            SandboxState::Completed => "completed",
            SandboxState::TimedOut => "timed-out",
            SandboxState::Failed => "failed",
            SandboxState::TornDown => "torn-down",
        };
        f.write_str(name)
    }
}

/// Tunables shared by every execution
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub limits: ResourceLimits,
    pub timeout: Duration,
    pub stop_grace_period: Duration,
    pub drain_timeout: Duration,
    pub pull_missing_images: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings::from_config(&SandboxConfig::default())
    }
}

impl ControllerSettings {
    pub fn from_config(config: &SandboxConfig) -> Self {
        let defaults = ResourceLimits::default();
        ControllerSettings {
            limits: ResourceLimits {
                memory_bytes: config.memory_bytes().unwrap_or(defaults.memory_bytes),
                cpu_shares: config.cpu_shares,
                network_disabled: config.network_disabled(),
            },
            timeout: config.timeout,
            stop_grace_period: config.stop_grace_period,
            drain_timeout: config.drain_timeout,
            pull_missing_images: config.pull_missing_images,
        }
    }
}

/// Owns a sandbox and its workspace until teardown
pub struct SandboxGuard {
    runtime: Arc<dyn ContainerRuntime>,
    container_id: Option<String>,
    workspace: Option<Workspace>,
    state: SandboxState,
    started: bool,
    stop_grace_period: Duration,
}

impl SandboxGuard {
    fn new(runtime: Arc<dyn ContainerRuntime>, workspace: Workspace, stop_grace_period: Duration) -> Self {
        SandboxGuard {
            runtime,
            container_id: None,
            workspace: Some(workspace),
            state: SandboxState::Unstarted,
            started: false,
            stop_grace_period,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SandboxState {
        self.state
    }

    /// Runtime id of the sandbox, once created
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    fn transition(&mut self, next: SandboxState) {
        debug!(
            "Sandbox {} {} -> {}",
            self.container_id.as_deref().unwrap_or("-"),
            self.state,
            next
        );
        if next == SandboxState::Running {
            self.started = true;
        }
        self.state = next;
    }

    /// Started and not known to have exited or been stopped
    fn may_be_running(&self) -> bool {
        self.started && !matches!(self.state, SandboxState::Completed | SandboxState::TimedOut)
    }

    fn set_container(&mut self, id: String) {
        self.container_id = Some(id);
        self.transition(SandboxState::Created);
    }

    fn id(&self) -> Result<&str> {
        self.container_id
            .as_deref()
            .ok_or_else(|| Error::Internal("sandbox has not been created".to_string()))
    }

    /// Stop the sandbox, swallowing errors from one that already exited
    async fn stop_quietly(&self) {
        if let Some(id) = &self.container_id {
            if let Err(e) = self.runtime.stop(id, self.stop_grace_period).await {
                debug!("Ignoring stop error for {}: {}", id, e);
            }
        }
    }

    /// Stop (if still running) and remove the sandbox, then delete the
    /// workspace. Runtime errors are swallowed.
    pub async fn teardown(mut self) {
        self.release().await;
    }

    async fn release(&mut self) {
        // The id stays set until removal returns so a cancelled teardown
        // still reaches the Drop fallback
        if let Some(id) = self.container_id.clone() {
            if self.may_be_running() {
                if let Err(e) = self.runtime.stop(&id, self.stop_grace_period).await {
                    debug!("Ignoring stop error for {}: {}", id, e);
                }
            }
            if let Err(e) = self.runtime.remove(&id).await {
                debug!("Ignoring remove error for {}: {}", id, e);
            }
            self.container_id = None;
        }
        if let Some(mut workspace) = self.workspace.take() {
            workspace.destroy();
        }
        self.transition(SandboxState::TornDown);
    }
}

impl Drop for SandboxGuard {
    fn drop(&mut self) {
        // Workspace removes itself on drop; the container needs the runtime
        let Some(id) = self.container_id.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("Sandbox {} dropped before teardown; removing in background", id);
                let runtime = Arc::clone(&self.runtime);
                handle.spawn(async move {
                    if let Err(e) = runtime.remove(&id).await {
                        debug!("Ignoring remove error for {}: {}", id, e);
                    }
                });
            }
            Err(_) => warn!("Sandbox {} leaked: no runtime available for removal", id),
        }
    }
}

impl fmt::Debug for SandboxGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxGuard")
            .field("container_id", &self.container_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// A started interactive sandbox
pub struct InteractiveRun {
    /// Terminal output, in arrival order
    pub output: OutputStream,
    /// Program stdin
    pub input: InputSink,
    /// Teardown handle; must be torn down by the session
    pub guard: SandboxGuard,
}

impl fmt::Debug for InteractiveRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractiveRun")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum Termination {
    Exited(i64),
    TimedOut,
}

#[derive(Clone, Copy)]
enum Mode {
    Batch,
    Interactive,
}

/// Runs untrusted code in sandboxes
pub struct SandboxController {
    runtime: Arc<dyn ContainerRuntime>,
    registry: Arc<LanguageRegistry>,
    workspaces: WorkspaceManager,
    settings: ControllerSettings,
}

impl SandboxController {
    /// Create a controller over an injected runtime and registry
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        registry: Arc<LanguageRegistry>,
        workspaces: WorkspaceManager,
        settings: ControllerSettings,
    ) -> Self {
        SandboxController {
            runtime,
            registry,
            workspaces,
            settings,
        }
    }

    /// Create a controller configured from `config`
    pub fn from_config(runtime: Arc<dyn ContainerRuntime>, config: &Config) -> Self {
        Self::new(
            runtime,
            Arc::new(LanguageRegistry::with_overrides(&config.languages)),
            WorkspaceManager::from_config(&config.sandbox),
            ControllerSettings::from_config(&config.sandbox),
        )
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Verify the runtime is reachable before allocating anything
    pub async fn preflight(&self) -> Result<()> {
        self.runtime.ping().await
    }

    /// Run code to completion or timeout and collect its output
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutput> {
        let profile = self.registry.resolve(&request.language)?;
        self.preflight().await?;

        let workspace = self.workspaces.stage(profile, &request.code)?;
        let mut guard = self.guard(workspace);

        let started = Instant::now();
        let result = self.run_batch(&mut guard, profile).await;
        if result.is_err()
            && !matches!(guard.state(), SandboxState::Completed | SandboxState::TimedOut)
        {
            guard.transition(SandboxState::Failed);
        }
        guard.teardown().await;

        let output = result?;
        let duration = started.elapsed();
        info!(
            "{} execution completed in {:?} (exit code {})",
            profile.name, duration, output.0
        );

        Ok(ExecutionOutput {
            exit_code: output.0,
            stdout: output.1,
            stderr: output.2,
            duration,
        })
    }

    /// Start an interactive sandbox with a TTY and return its streams.
    /// The caller owns the returned guard and must tear it down.
    pub async fn launch_interactive(&self, request: &ExecutionRequest) -> Result<InteractiveRun> {
        let profile = self.registry.resolve(&request.language)?;
        self.preflight().await?;

        let workspace = self.workspaces.stage(profile, &request.code)?;
        let mut guard = self.guard(workspace);

        match self.start_interactive(&mut guard, profile).await {
            Ok((output, input)) => {
                info!(
                    "Interactive {} sandbox {} started",
                    profile.name,
                    guard.container_id().unwrap_or("-")
                );
                Ok(InteractiveRun {
                    output,
                    input,
                    guard,
                })
            }
            Err(e) => {
                guard.transition(SandboxState::Failed);
                guard.teardown().await;
                Err(e)
            }
        }
    }

    fn guard(&self, workspace: Workspace) -> SandboxGuard {
        SandboxGuard::new(
            Arc::clone(&self.runtime),
            workspace,
            self.settings.stop_grace_period,
        )
    }

    async fn create(&self, guard: &mut SandboxGuard, profile: &LanguageProfile, mode: Mode) -> Result<()> {
        if self.settings.pull_missing_images {
            self.runtime.ensure_image(&profile.image).await?;
        }

        let workspace = guard
            .workspace
            .as_ref()
            .ok_or_else(|| Error::Internal("workspace already destroyed".to_string()))?;
        let source = workspace.container_source_file();
        let (command, interactive) = match mode {
            Mode::Batch => (profile.batch_argv(&source), false),
            Mode::Interactive => (profile.interactive_argv(&source), true),
        };

        let spec = SandboxSpec {
            name: format!("coderunner-{}", uuid::Uuid::new_v4()),
            image: profile.image.clone(),
            command,
            mount: workspace.mount(),
            limits: self.settings.limits,
            interactive,
        };

        let id = self.runtime.create(&spec).await.map_err(|e| match e {
            Error::SandboxCreation(_) => e,
            other => Error::SandboxCreation(other.to_string()),
        })?;
        debug!("Created sandbox {} ({}) from {}", spec.name, id, spec.image);
        guard.set_container(id);
        Ok(())
    }

    async fn run_batch(
        &self,
        guard: &mut SandboxGuard,
        profile: &LanguageProfile,
    ) -> Result<(i64, String, String)> {
        self.create(guard, profile, Mode::Batch).await?;
        let id = guard.id()?.to_string();

        // Attach before start so early output is not lost
        let mut output = self.runtime.attach(&id, false).await?.output;
        self.runtime.start(&id).await?;
        guard.transition(SandboxState::Running);

        let mut acc = OutputAccumulator::new();
        let mut stream_error: Option<Error> = None;
        let mut output_open = true;

        let deadline = tokio::time::sleep(self.settings.timeout);
        tokio::pin!(deadline);
        let exit = self.runtime.wait(&id);
        tokio::pin!(exit);

        let termination = loop {
            tokio::select! {
                chunk = output.next(), if output_open => match chunk {
                    Some(Ok(chunk)) => acc.push(&chunk),
                    Some(Err(e)) => {
                        warn!("Output stream of {} failed: {}", id, e);
                        stream_error = Some(e);
                        output_open = false;
                    }
                    None => output_open = false,
                },
                code = &mut exit => break Termination::Exited(code?),
                _ = &mut deadline => break Termination::TimedOut,
            }
        };

        match termination {
            Termination::Exited(_) => guard.transition(SandboxState::Completed),
            Termination::TimedOut => {
                warn!("Sandbox {} timed out after {:?}", id, self.settings.timeout);
                guard.transition(SandboxState::TimedOut);
                guard.stop_quietly().await;
            }
        }

        // Drain trailing output of fast-exiting programs
        if output_open {
            let drain = async {
                while let Some(chunk) = output.next().await {
                    match chunk {
                        Ok(chunk) => acc.push(&chunk),
                        Err(e) => {
                            stream_error = Some(e);
                            break;
                        }
                    }
                }
            };
            if tokio::time::timeout(self.settings.drain_timeout, drain).await.is_err() {
                warn!("Output stream of {} did not close within {:?}", id, self.settings.drain_timeout);
            }
        }

        let (stdout, stderr) = acc.finish();
        match termination {
            Termination::TimedOut => Err(Error::ExecutionTimeout {
                timeout: self.settings.timeout,
                stdout,
                stderr,
            }),
            Termination::Exited(code) if code != 0 => Err(Error::exited(code, stdout, stderr)),
            Termination::Exited(code) => match stream_error {
                Some(e) => Err(Error::ExecutionFailed {
                    message: e.to_string(),
                    exit_code: Some(code),
                    stdout,
                    stderr,
                }),
                None => Ok((code, stdout, stderr)),
            },
        }
    }

    async fn start_interactive(
        &self,
        guard: &mut SandboxGuard,
        profile: &LanguageProfile,
    ) -> Result<(OutputStream, InputSink)> {
        self.create(guard, profile, Mode::Interactive).await?;
        let id = guard.id()?.to_string();

        let attachment = self.runtime.attach(&id, true).await?;
        let input = attachment
            .input
            .ok_or_else(|| Error::Container(format!("Sandbox {} has no stdin", id)))?;

        self.runtime.start(&id).await?;
        guard.transition(SandboxState::Running);

        Ok((attachment.output, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::mock::{MockBehaviour, MockExit, MockRuntime};
    use crate::sandbox::output::OutputChunk;
    use tokio::io::AsyncWriteExt;

    fn controller(runtime: Arc<MockRuntime>) -> SandboxController {
        let settings = ControllerSettings {
            timeout: Duration::from_millis(200),
            drain_timeout: Duration::from_millis(200),
            ..ControllerSettings::default()
        };
        SandboxController::new(
            runtime,
            Arc::new(LanguageRegistry::default()),
            WorkspaceManager::default(),
            settings,
        )
    }

    #[tokio::test]
    async fn test_successful_run_returns_stdout() {
        let runtime = MockRuntime::new(MockBehaviour {
            chunks: vec![OutputChunk::stdout("hi\n")],
            ..MockBehaviour::default()
        });
        let controller = controller(runtime.clone());

        let output = controller
            .execute(&ExecutionRequest::new("python", "print(\"hi\")"))
            .await
            .unwrap();

        assert_eq!(output.stdout, "hi\n");
        assert_eq!(output.stderr, "");
        assert_eq!(output.exit_code, 0);

        let calls = runtime.calls();
        assert_eq!(calls.creates.len(), 1);
        assert_eq!(calls.removes.len(), 1);
        assert!(calls.stops.is_empty());
        assert!(!calls.creates[0].mount.host.exists());
    }

    #[tokio::test]
    async fn test_sandbox_spec_limits_and_command() {
        let runtime = MockRuntime::new(MockBehaviour::default());
        let controller = controller(runtime.clone());

        controller
            .execute(&ExecutionRequest::new("py", "print(1)"))
            .await
            .unwrap();

        let spec = runtime.calls().creates[0].clone();
        assert!(spec.name.starts_with("coderunner-"));
        assert_eq!(spec.image, "python:3.9-slim");
        assert_eq!(spec.limits.memory_bytes, 256 * 1024 * 1024);
        assert_eq!(spec.limits.cpu_shares, 512);
        assert!(spec.limits.network_disabled);
        assert!(!spec.interactive);
        assert_eq!(spec.mount.container, spec.mount.host.to_string_lossy());
        assert_eq!(
            spec.command,
            vec![
                "python".to_string(),
                format!("{}/code.py", spec.mount.container)
            ]
        );
    }

    #[tokio::test]
    async fn test_unsupported_language_allocates_nothing() {
        let runtime = MockRuntime::new(MockBehaviour::default());
        let controller = controller(runtime.clone());

        let err = controller
            .execute(&ExecutionRequest::new("cobol", "DISPLAY 'HI'"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedLanguage(_)));
        let calls = runtime.calls();
        assert_eq!(calls.pings, 0);
        assert!(calls.creates.is_empty());
    }

    #[tokio::test]
    async fn test_runtime_unavailable_fails_before_create() {
        let runtime = MockRuntime::new(MockBehaviour {
            available: false,
            ..MockBehaviour::default()
        });
        let controller = controller(runtime.clone());

        let err = controller
            .execute(&ExecutionRequest::new("python", "print(1)"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RuntimeUnavailable(_)));
        assert!(runtime.calls().creates.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_stops_and_removes() {
        let runtime = MockRuntime::new(MockBehaviour {
            chunks: vec![OutputChunk::stdout("started\n")],
            exit: MockExit::Never,
            ..MockBehaviour::default()
        });
        let controller = controller(runtime.clone());

        let err = controller
            .execute(&ExecutionRequest::new("python", "import time; time.sleep(60)"))
            .await
            .unwrap_err();

        match err {
            Error::ExecutionTimeout { stdout, .. } => assert_eq!(stdout, "started\n"),
            other => panic!("expected timeout, got {:?}", other),
        }

        let calls = runtime.calls();
        assert_eq!(calls.stops.len(), 1);
        assert_eq!(calls.removes.len(), 1);
        assert!(!calls.creates[0].mount.host.exists());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_execution_failed() {
        let runtime = MockRuntime::new(MockBehaviour {
            chunks: vec![
                OutputChunk::stdout("partial"),
                OutputChunk::stderr("Traceback\n"),
            ],
            exit: MockExit::After(Duration::from_millis(10), 1),
            ..MockBehaviour::default()
        });
        let controller = controller(runtime.clone());

        let err = controller
            .execute(&ExecutionRequest::new("python", "raise SystemExit(1)"))
            .await
            .unwrap_err();

        match err {
            Error::ExecutionFailed {
                exit_code,
                stdout,
                stderr,
                ..
            } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stdout, "partial");
                assert_eq!(stderr, "Traceback\n");
            }
            other => panic!("expected execution failure, got {:?}", other),
        }
        assert_eq!(runtime.calls().removes.len(), 1);
    }

    #[tokio::test]
    async fn test_creation_failure_cleans_workspace() {
        let base = tempfile::tempdir().unwrap();
        let runtime = MockRuntime::new(MockBehaviour {
            fail_create: true,
            ..MockBehaviour::default()
        });
        let controller = SandboxController::new(
            runtime.clone(),
            Arc::new(LanguageRegistry::default()),
            WorkspaceManager::new(Some(base.path().to_path_buf()), Default::default()),
            ControllerSettings::default(),
        );

        let err = controller
            .execute(&ExecutionRequest::new("java", "class A {}"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SandboxCreation(_)));
        assert!(runtime.calls().removes.is_empty());
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_runtime_crash_mid_execution_cleans_up() {
        let runtime = MockRuntime::new(MockBehaviour {
            exit: MockExit::Crash,
            ..MockBehaviour::default()
        });
        let controller = controller(runtime.clone());

        let err = controller
            .execute(&ExecutionRequest::new("c", "int main() { return 0; }"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Container(_)));
        let calls = runtime.calls();
        // Exit status unknown, so teardown stops it first
        assert_eq!(calls.stops.len(), 1);
        assert_eq!(calls.removes.len(), 1);
        assert!(!calls.creates[0].mount.host.exists());
    }

    #[tokio::test]
    async fn test_cancelled_teardown_still_removes() {
        let runtime = MockRuntime::new(MockBehaviour {
            exit: MockExit::Crash,
            stop_delay: Some(Duration::from_secs(1)),
            ..MockBehaviour::default()
        });
        let controller = controller(runtime.clone());

        // Cancelled while teardown waits on the slow stop
        let cancelled = tokio::time::timeout(
            Duration::from_millis(200),
            controller.execute(&ExecutionRequest::new("python", "print(1)")),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(runtime.calls().stops.len(), 1);

        for _ in 0..50 {
            if runtime.calls().removes.len() == 1 {
                assert!(!runtime.calls().creates[0].mount.host.exists());
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("container was not removed after teardown was cancelled");
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent_against_runtime() {
        let runtime = MockRuntime::new(MockBehaviour::default());
        let controller = controller(runtime.clone());

        let run = controller
            .launch_interactive(&ExecutionRequest::new("python", "input()"))
            .await
            .unwrap();
        let id = run.guard.container_id().unwrap().to_string();

        // Someone already stopped and removed it
        runtime.stop(&id, Duration::ZERO).await.unwrap();
        runtime.remove(&id).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), run.guard.teardown())
            .await
            .expect("teardown must not block");

        let calls = runtime.calls();
        assert_eq!(calls.stops.len(), 2);
        assert_eq!(calls.removes.len(), 2);
    }

    #[tokio::test]
    async fn test_interactive_launch_uses_tty_and_stdin() {
        let runtime = MockRuntime::new(MockBehaviour {
            echo_input: true,
            exit: MockExit::Never,
            ..MockBehaviour::default()
        });
        let controller = controller(runtime.clone());

        let mut run = controller
            .launch_interactive(&ExecutionRequest::new("python", "print(input())"))
            .await
            .unwrap();

        let spec = runtime.calls().creates[0].clone();
        assert!(spec.interactive);
        assert_eq!(spec.command[0], "/bin/bash");
        assert_eq!(run.guard.state(), SandboxState::Running);

        run.input.write_all(b"ping\n").await.unwrap();
        run.input.flush().await.unwrap();
        let echoed = run.output.next().await.unwrap().unwrap();
        assert_eq!(echoed, OutputChunk::console("ping\n"));

        run.guard.teardown().await;
        assert!(!spec.mount.host.exists());
    }

    #[tokio::test]
    async fn test_dropped_guard_removes_in_background() {
        let runtime = MockRuntime::new(MockBehaviour::default());
        let controller = controller(runtime.clone());

        let run = controller
            .launch_interactive(&ExecutionRequest::new("python", "input()"))
            .await
            .unwrap();
        let host = runtime.calls().creates[0].mount.host.clone();
        drop(run);

        assert!(!host.exists());
        for _ in 0..50 {
            if runtime.calls().removes.len() == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("container was not removed after the guard was dropped");
    }
}
