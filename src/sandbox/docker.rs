//! Docker-backed container runtime
//!
//! Sandboxes are ephemeral containers with a memory ceiling, a CPU weight,
//! networking disabled and the workspace bind-mounted at its translated path.

use async_trait::async_trait;
use bollard::container::{
    AttachContainerOptions, AttachContainerResults, Config, CreateContainerOptions, LogOutput,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::Docker;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::sandbox::output::OutputChunk;
use crate::sandbox::runtime::{Attachment, ContainerRuntime, SandboxSpec};

/// Docker container runtime
#[derive(Clone)]
pub struct DockerRuntime {
    /// Docker client
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using the local defaults (`DOCKER_HOST` or the platform socket)
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::RuntimeUnavailable(format!("Failed to connect to Docker: {}", e)))?;

        Ok(DockerRuntime { docker })
    }

    /// Wrap an existing client
    pub fn with_client(docker: Docker) -> Self {
        DockerRuntime { docker }
    }

    async fn image_exists(&self, image: &str) -> bool {
        self.docker.inspect_image(image).await.is_ok()
    }
}

/// Translate a sandbox spec into a Docker container configuration
pub fn container_config(spec: &SandboxSpec) -> Config<String> {
    let limits = spec.limits;
    let network_mode = if limits.network_disabled { "none" } else { "bridge" };

    Config {
        image: Some(spec.image.clone()),
        cmd: Some(spec.command.clone()),
        tty: Some(spec.interactive),
        attach_stdin: Some(spec.interactive),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        open_stdin: Some(spec.interactive),
        stdin_once: Some(false),
        network_disabled: Some(limits.network_disabled),
        host_config: Some(HostConfig {
            binds: Some(vec![spec.mount.to_bind_string()]),
            memory: Some(limits.memory_bytes),
            // Equal to memory: no swap on top of the ceiling
            memory_swap: Some(limits.memory_bytes),
            cpu_shares: Some(limits.cpu_shares),
            network_mode: Some(network_mode.to_string()),
            auto_remove: Some(false), // removed explicitly during teardown
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Route a Docker log frame to its output channel. Echoed stdin is dropped.
pub fn chunk_from_log(output: LogOutput) -> Option<OutputChunk> {
    match output {
        LogOutput::StdOut { message } => Some(OutputChunk::stdout(message.to_vec())),
        LogOutput::StdErr { message } => Some(OutputChunk::stderr(message.to_vec())),
        LogOutput::Console { message } => Some(OutputChunk::console(message.to_vec())),
        LogOutput::StdIn { .. } => None,
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    fn name(&self) -> &str {
        "docker"
    }

    async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map_err(|e| Error::RuntimeUnavailable(format!("Docker ping failed: {}", e)))?;
        Ok(())
    }

    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.image_exists(image).await {
            return Ok(());
        }

        info!("Pulling Docker image: {}", image);

        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        debug!("Pull status: {}", status);
                    }
                }
                Err(e) => {
                    return Err(Error::SandboxCreation(format!(
                        "Failed to pull image {}: {}",
                        image, e
                    )));
                }
            }
        }

        info!("Image {} pulled successfully", image);
        Ok(())
    }

    async fn create(&self, spec: &SandboxSpec) -> Result<String> {
        let options = CreateContainerOptions {
            name: spec.name.as_str(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await
            .map_err(|e| Error::SandboxCreation(e.to_string()))?;

        for warning in &response.warnings {
            debug!("Container {} warning: {}", spec.name, warning);
        }

        Ok(response.id)
    }

    async fn attach(&self, id: &str, stdin: bool) -> Result<Attachment> {
        let options = AttachContainerOptions::<String> {
            stdin: Some(stdin),
            stdout: Some(true),
            stderr: Some(true),
            stream: Some(true),
            logs: Some(false),
            detach_keys: None,
        };

        let AttachContainerResults { output, input } = self
            .docker
            .attach_container(id, Some(options))
            .await
            .map_err(|e| Error::Container(format!("Failed to attach: {}", e)))?;

        let output = output
            .filter_map(|frame| async move {
                match frame {
                    Ok(log) => chunk_from_log(log).map(Ok),
                    Err(e) => Some(Err(Error::Container(format!("Output stream error: {}", e)))),
                }
            })
            .boxed();

        Ok(Attachment {
            output,
            input: stdin.then_some(input),
        })
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::Container(format!("Failed to start container: {}", e)))
    }

    async fn wait(&self, id: &str) -> Result<i64> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(id, Some(options));

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // Non-zero exits surface as an error carrying the code
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(Error::Container(format!("Wait failed: {}", e))),
            None => Err(Error::Container("Container wait stream ended".to_string())),
        }
    }

    async fn stop(&self, id: &str, grace: Duration) -> Result<()> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };

        self.docker
            .stop_container(id, Some(options))
            .await
            .map_err(|e| Error::Container(format!("Failed to stop container: {}", e)))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| Error::Container(format!("Failed to remove container: {}", e)))?;

        debug!("Removed container: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::runtime::{BindMount, ResourceLimits};
    use std::path::PathBuf;

    fn spec(interactive: bool) -> SandboxSpec {
        SandboxSpec {
            name: "coderunner-test".to_string(),
            image: "python:3.9-slim".to_string(),
            command: vec!["python".to_string(), "/tmp/code-x/code.py".to_string()],
            mount: BindMount {
                host: PathBuf::from("/tmp/code-x"),
                container: "/tmp/code-x".to_string(),
            },
            limits: ResourceLimits::default(),
            interactive,
        }
    }

    #[test]
    fn test_batch_container_config() {
        let config = container_config(&spec(false));
        let host = config.host_config.as_ref().unwrap();

        assert_eq!(config.tty, Some(false));
        assert_eq!(config.open_stdin, Some(false));
        assert_eq!(config.network_disabled, Some(true));
        assert_eq!(host.memory, Some(256 * 1024 * 1024));
        assert_eq!(host.cpu_shares, Some(512));
        assert_eq!(host.network_mode.as_deref(), Some("none"));
        assert_eq!(
            host.binds.as_deref(),
            Some(&["/tmp/code-x:/tmp/code-x".to_string()][..])
        );
    }

    #[test]
    fn test_interactive_container_config() {
        let config = container_config(&spec(true));
        assert_eq!(config.tty, Some(true));
        assert_eq!(config.attach_stdin, Some(true));
        assert_eq!(config.open_stdin, Some(true));
        assert_eq!(config.stdin_once, Some(false));
    }

    #[test]
    fn test_log_frames_route_to_channels() {
        let out = chunk_from_log(LogOutput::StdOut {
            message: "hi\n".into(),
        })
        .unwrap();
        assert_eq!(out, OutputChunk::stdout("hi\n"));

        let err = chunk_from_log(LogOutput::StdErr {
            message: "oops".into(),
        })
        .unwrap();
        assert_eq!(err, OutputChunk::stderr("oops"));

        assert!(chunk_from_log(LogOutput::StdIn {
            message: "typed".into()
        })
        .is_none());
    }
}
