//! Recording container runtime for tests

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, watch};

use crate::error::{Error, Result};
use crate::sandbox::output::OutputChunk;
use crate::sandbox::runtime::{Attachment, ContainerRuntime, InputSink, SandboxSpec};

/// How a mock sandbox terminates
#[derive(Debug, Clone, Copy)]
pub(crate) enum MockExit {
    /// Exit with the code after the delay
    After(Duration, i64),
    /// Run until stopped
    Never,
    /// Waiting fails as if the runtime lost the sandbox
    Crash,
}

#[derive(Debug, Clone)]
pub(crate) struct MockBehaviour {
    pub available: bool,
    pub fail_create: bool,
    /// Emitted right after attach
    pub chunks: Vec<OutputChunk>,
    pub exit: MockExit,
    pub attach_delay: Option<Duration>,
    pub stop_delay: Option<Duration>,
    /// Echo stdin back as console output
    pub echo_input: bool,
}

impl Default for MockBehaviour {
    fn default() -> Self {
        MockBehaviour {
            available: true,
            fail_create: false,
            chunks: Vec::new(),
            exit: MockExit::After(Duration::from_millis(10), 0),
            attach_delay: None,
            stop_delay: None,
            echo_input: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockCalls {
    pub pings: usize,
    pub creates: Vec<SandboxSpec>,
    pub starts: Vec<String>,
    pub stops: Vec<String>,
    pub removes: Vec<String>,
}

pub(crate) struct MockRuntime {
    behaviour: MockBehaviour,
    calls: Mutex<MockCalls>,
    stopped: Mutex<HashMap<String, watch::Sender<bool>>>,
    removed: Mutex<HashSet<String>>,
}

async fn until_stopped(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

impl MockRuntime {
    pub fn new(behaviour: MockBehaviour) -> Arc<Self> {
        Arc::new(MockRuntime {
            behaviour,
            calls: Mutex::new(MockCalls::default()),
            stopped: Mutex::new(HashMap::new()),
            removed: Mutex::new(HashSet::new()),
        })
    }

    /// Snapshot of the calls made so far
    pub fn calls(&self) -> MockCalls {
        self.calls.lock().unwrap().clone()
    }

    fn stop_signal(&self, id: &str) -> Result<watch::Receiver<bool>> {
        self.stopped
            .lock()
            .unwrap()
            .get(id)
            .map(|tx| tx.subscribe())
            .ok_or_else(|| Error::Container(format!("No such container: {}", id)))
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    fn name(&self) -> &str {
        "mock"
    }

    async fn ping(&self) -> Result<()> {
        self.calls.lock().unwrap().pings += 1;
        if self.behaviour.available {
            Ok(())
        } else {
            Err(Error::RuntimeUnavailable(
                "Cannot connect to the Docker daemon".to_string(),
            ))
        }
    }

    async fn ensure_image(&self, _image: &str) -> Result<()> {
        Ok(())
    }

    async fn create(&self, spec: &SandboxSpec) -> Result<String> {
        let id = {
            let mut calls = self.calls.lock().unwrap();
            calls.creates.push(spec.clone());
            format!("mock-{}", calls.creates.len())
        };

        if self.behaviour.fail_create {
            return Err(Error::SandboxCreation(format!(
                "No such image: {}",
                spec.image
            )));
        }

        let (tx, _rx) = watch::channel(false);
        self.stopped.lock().unwrap().insert(id.clone(), tx);
        Ok(id)
    }

    async fn attach(&self, id: &str, stdin: bool) -> Result<Attachment> {
        if let Some(delay) = self.behaviour.attach_delay {
            tokio::time::sleep(delay).await;
        }

        let stop = self.stop_signal(id)?;
        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in &self.behaviour.chunks {
            let _ = tx.send(Ok(chunk.clone()));
        }

        let (client, mut server) = tokio::io::duplex(4096);
        let echo = self.behaviour.echo_input && stdin;
        let exit = self.behaviour.exit;

        tokio::spawn(async move {
            if echo {
                let mut buf = [0u8; 1024];
                let stopped = until_stopped(stop);
                tokio::pin!(stopped);
                loop {
                    tokio::select! {
                        read = server.read(&mut buf) => match read {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                let _ = tx.send(Ok(OutputChunk::console(&buf[..n])));
                            }
                        },
                        _ = &mut stopped => break,
                    }
                }
                return;
            }

            match exit {
                MockExit::After(delay, _) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = until_stopped(stop) => {}
                    }
                }
                MockExit::Never => until_stopped(stop).await,
                MockExit::Crash => {}
            }
        });

        let output = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed();

        let input: Option<InputSink> = if stdin { Some(Box::pin(client)) } else { None };
        Ok(Attachment { output, input })
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.calls.lock().unwrap().starts.push(id.to_string());
        Ok(())
    }

    async fn wait(&self, id: &str) -> Result<i64> {
        let stop = self.stop_signal(id)?;
        match self.behaviour.exit {
            MockExit::After(delay, code) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => Ok(code),
                    _ = until_stopped(stop) => Ok(137),
                }
            }
            MockExit::Never => {
                until_stopped(stop).await;
                Ok(137)
            }
            MockExit::Crash => Err(Error::Container("Container vanished".to_string())),
        }
    }

    async fn stop(&self, id: &str, _grace: Duration) -> Result<()> {
        self.calls.lock().unwrap().stops.push(id.to_string());
        if let Some(delay) = self.behaviour.stop_delay {
            tokio::time::sleep(delay).await;
        }

        let stopped = self.stopped.lock().unwrap();
        let tx = stopped
            .get(id)
            .ok_or_else(|| Error::Container(format!("No such container: {}", id)))?;
        if tx.send_replace(true) {
            return Err(Error::Container(format!("Container {} is not running", id)));
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.calls.lock().unwrap().removes.push(id.to_string());

        if !self.removed.lock().unwrap().insert(id.to_string()) {
            return Err(Error::Container(format!("No such container: {}", id)));
        }
        if let Some(tx) = self.stopped.lock().unwrap().get(id) {
            tx.send_replace(true);
        }
        Ok(())
    }
}
