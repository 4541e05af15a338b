//! Interactive execution sessions
//!
//! A session is bound to one client connection and runs at most one program.
//! All session state lives in the loop task driving [`InteractiveSession::run`];
//! the launch and the output relay run as separate tasks and report back
//! through their join handles.
//!
//! ```text
//! Idle -> Executing -> StreamEnded | Disconnected -> CleanedUp
//! ```

use futures::{Stream, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::gateway::protocol::{ClientMessage, ServerMessage};
use crate::sandbox::{
    ExecutionRequest, InputSink, InteractiveRun, OutputChannel, OutputStream, SandboxController,
    SandboxGuard, Utf8Decoder,
};

/// Sent once the program's output stream ends
pub const PROCESS_FINISHED: &str = "\r\nProcess finished.";

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Executing,
    StreamEnded,
    Disconnected,
    CleanedUp,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Executing => "executing",
            SessionPhase::StreamEnded => "stream-ended",
            SessionPhase::Disconnected => "disconnected",
            SessionPhase::CleanedUp => "cleaned-up",
        };
        f.write_str(name)
    }
}

/// Program stdin, queued until the sandbox is attached.
///
/// Once attached, input goes through a channel to a writer task, so a
/// program that never reads stdin cannot stall the session loop.
pub enum InputBuffer {
    Buffering(VecDeque<String>),
    Attached(mpsc::UnboundedSender<String>),
}

impl Default for InputBuffer {
    fn default() -> Self {
        InputBuffer::Buffering(VecDeque::new())
    }
}

impl InputBuffer {
    /// Queue or forward `data`
    pub fn push(&mut self, data: String) -> std::result::Result<(), SendError<String>> {
        match self {
            InputBuffer::Buffering(queue) => {
                queue.push_back(data);
                Ok(())
            }
            InputBuffer::Attached(tx) => tx.send(data),
        }
    }

    /// Start the writer task for `sink`, handing it the queue in arrival
    /// order. Later pushes are forwarded to the same task.
    pub fn attach(&mut self, sink: InputSink) -> JoinHandle<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let InputBuffer::Buffering(queue) = std::mem::take(self) {
            for data in queue {
                let _ = tx.send(data);
            }
        }
        *self = InputBuffer::Attached(tx);
        tokio::spawn(forward_input(sink, rx))
    }

    /// Number of queued entries
    pub fn pending(&self) -> usize {
        match self {
            InputBuffer::Buffering(queue) => queue.len(),
            InputBuffer::Attached(_) => 0,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, InputBuffer::Attached(_))
    }
}

async fn forward_input(mut sink: InputSink, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(data) = rx.recv().await {
        let written = async {
            sink.write_all(data.as_bytes()).await?;
            sink.flush().await
        };
        if let Err(e) = written.await {
            debug!("Dropping input, program stdin is closed: {}", e);
            return;
        }
    }
}

/// Resolves with the handle's output, or never when there is no handle
async fn join_next<T>(handle: &mut Option<JoinHandle<T>>) -> std::result::Result<T, JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// One client's interactive session
pub struct InteractiveSession {
    controller: Arc<SandboxController>,
    outbound: mpsc::Sender<ServerMessage>,
    phase: SessionPhase,
    input: InputBuffer,
    guard: Option<SandboxGuard>,
    launch: Option<JoinHandle<Result<InteractiveRun>>>,
    relay: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl InteractiveSession {
    pub fn new(controller: Arc<SandboxController>, outbound: mpsc::Sender<ServerMessage>) -> Self {
        InteractiveSession {
            controller,
            outbound,
            phase: SessionPhase::Idle,
            input: InputBuffer::default(),
            guard: None,
            launch: None,
            relay: None,
            writer: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Serve client messages until `inbound` ends, then clean up.
    /// Returns the final phase.
    pub async fn run<S>(mut self, mut inbound: S) -> SessionPhase
    where
        S: Stream<Item = std::result::Result<ClientMessage, serde_json::Error>> + Unpin,
    {
        loop {
            tokio::select! {
                message = inbound.next() => match message {
                    Some(Ok(message)) => self.handle_message(message).await,
                    Some(Err(e)) => self.notify(format!("Invalid message: {}", e)).await,
                    None => break,
                },
                launched = join_next(&mut self.launch) => {
                    self.launch = None;
                    self.on_launched(launched).await;
                }
                _ = join_next(&mut self.relay) => {
                    self.relay = None;
                    self.transition(SessionPhase::StreamEnded);
                }
            }
        }

        self.transition(SessionPhase::Disconnected);
        self.cleanup().await
    }

    fn transition(&mut self, next: SessionPhase) {
        debug!("Session {} -> {}", self.phase, next);
        self.phase = next;
    }

    async fn notify(&mut self, data: impl Into<String>) {
        if self.outbound.send(ServerMessage::output(data)).await.is_err() {
            debug!("Client went away before a notice could be sent");
        }
    }

    async fn handle_message(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::Execute { language, code } => self.execute(language, code).await,
            ClientMessage::Input { data } => match self.phase {
                SessionPhase::Executing => {
                    if self.input.push(data).is_err() {
                        debug!("Dropping input, program stdin is closed");
                    }
                }
                phase => debug!("Ignoring input while {}", phase),
            },
        }
    }

    async fn execute(&mut self, language: String, code: String) {
        match self.phase {
            SessionPhase::Idle => {}
            SessionPhase::StreamEnded => {
                self.notify("The program in this session has already finished.")
                    .await;
                return;
            }
            _ => {
                self.notify("A program is already running in this session.")
                    .await;
                return;
            }
        }

        if !self.controller.registry().supports(&language) {
            self.notify("Unsupported language").await;
            return;
        }

        info!("Launching interactive {} program", language.trim());
        self.transition(SessionPhase::Executing);

        let controller = Arc::clone(&self.controller);
        let request = ExecutionRequest::new(language, code);
        self.launch = Some(tokio::spawn(async move {
            controller.launch_interactive(&request).await
        }));
    }

    async fn on_launched(&mut self, launched: std::result::Result<Result<InteractiveRun>, JoinError>) {
        match launched {
            Ok(Ok(run)) => {
                let InteractiveRun {
                    output,
                    input,
                    guard,
                } = run;
                self.guard = Some(guard);

                self.writer = Some(self.input.attach(input));
                self.relay = Some(tokio::spawn(relay_output(output, self.outbound.clone())));
            }
            Ok(Err(e)) => {
                warn!("Interactive launch failed: {}", e);
                self.input = InputBuffer::default();
                self.transition(SessionPhase::Idle);
                self.notify(format!("Error: {}", e)).await;
            }
            Err(e) => {
                warn!("Interactive launch task failed: {}", e);
                self.input = InputBuffer::default();
                self.transition(SessionPhase::Idle);
                self.notify("Error: failed to start the program").await;
            }
        }
    }

    async fn cleanup(mut self) -> SessionPhase {
        // Let an in-flight launch settle so its sandbox is torn down too
        if let Some(launch) = self.launch.take() {
            match launch.await {
                Ok(Ok(run)) => self.guard = Some(run.guard),
                Ok(Err(e)) => debug!("Launch after disconnect failed: {}", e),
                Err(e) => warn!("Launch task failed during cleanup: {}", e),
            }
        }

        if let Some(relay) = self.relay.take() {
            relay.abort();
        }
        // The writer may be blocked on a full stdin
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
        self.input = InputBuffer::default();

        if let Some(guard) = self.guard.take() {
            guard.teardown().await;
        }

        self.transition(SessionPhase::CleanedUp);
        self.phase
    }
}

/// Forward decoded output to the client until the stream ends
async fn relay_output(mut output: OutputStream, outbound: mpsc::Sender<ServerMessage>) {
    let mut decoders: HashMap<OutputChannel, Utf8Decoder> = HashMap::new();

    while let Some(chunk) = output.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Interactive output stream failed: {}", e);
                break;
            }
        };

        let text = decoders.entry(chunk.channel).or_default().push(&chunk.data);
        if text.is_empty() {
            continue;
        }
        if outbound
            .send(ServerMessage::from_channel(chunk.channel, text))
            .await
            .is_err()
        {
            return;
        }
    }

    for (channel, mut decoder) in decoders {
        let rest = decoder.finish();
        if !rest.is_empty() {
            let _ = outbound.send(ServerMessage::from_channel(channel, rest)).await;
        }
    }
    let _ = outbound.send(ServerMessage::output(PROCESS_FINISHED)).await;
}
