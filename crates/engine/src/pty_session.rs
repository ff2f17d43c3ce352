// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat Runtime Manager: PTY spawn, output fan-out, the input side channel,
//! resize/signal plumbing, and shutdown.

use crate::terminal::InputSideChannel;
use agent_hub_core::{ChatId, HubError, HubResult};
use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const PTY_COLS: u16 = 160;
pub const PTY_ROWS: u16 = 48;

/// How long `terminate` waits after SIGTERM before escalating to SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(4);

/// Per-listener queue depth before the oldest buffered chunk is dropped.
const LISTENER_QUEUE_DEPTH: usize = 256;

/// Size cap on the backlog handed to a newly attached listener.
const BACKLOG_CAP_BYTES: usize = 150 * 1024;

#[derive(Debug, Clone)]
pub enum ChatRuntimeEvent {
    PromptSubmitted { chat_id: ChatId, prompt: String },
    Exited { chat_id: ChatId, exit_code: Option<i32> },
}

struct OutputListener {
    queue: VecDeque<Vec<u8>>,
    lagged: bool,
}

impl OutputListener {
    fn push(&mut self, chunk: Vec<u8>) {
        if self.queue.len() >= LISTENER_QUEUE_DEPTH {
            self.queue.pop_front();
            self.lagged = true;
        }
        self.queue.push_back(chunk);
    }
}

/// Bounded, drop-oldest fan-out of a chat's PTY output to every attached
/// listener (typically one per open WebSocket connection).
#[derive(Clone, Default)]
pub struct OutputFanout {
    listeners: Arc<Mutex<HashMap<u64, OutputListener>>>,
    next_id: Arc<Mutex<u64>>,
    backlog: Arc<Mutex<VecDeque<u8>>>,
}

pub struct OutputSubscription {
    id: u64,
    fanout: OutputFanout,
}

impl OutputFanout {
    /// Attach a new listener, returning its current backlog (the tail of
    /// the chat's output so far, capped in size) plus the subscription.
    pub fn subscribe(&self) -> (Vec<u8>, OutputSubscription) {
        let mut next_id = self.next_id.lock();
        let id = *next_id;
        *next_id += 1;
        self.listeners.lock().insert(id, OutputListener { queue: VecDeque::new(), lagged: false });
        let backlog = self.backlog.lock().iter().copied().collect();
        (backlog, OutputSubscription { id, fanout: self.clone() })
    }

    fn publish(&self, chunk: &[u8]) {
        {
            let mut backlog = self.backlog.lock();
            backlog.extend(chunk.iter().copied());
            while backlog.len() > BACKLOG_CAP_BYTES {
                backlog.pop_front();
            }
        }
        for listener in self.listeners.lock().values_mut() {
            listener.push(chunk.to_vec());
        }
    }
}

impl OutputSubscription {
    /// Drain everything queued for this listener, in order, plus whether
    /// chunks were dropped since the last drain.
    pub fn drain(&self) -> (Vec<Vec<u8>>, bool) {
        let mut listeners = self.fanout.listeners.lock();
        let Some(listener) = listeners.get_mut(&self.id) else {
            return (Vec::new(), false);
        };
        let lagged = std::mem::take(&mut listener.lagged);
        (listener.queue.drain(..).collect(), lagged)
    }
}

impl Drop for OutputSubscription {
    fn drop(&mut self) {
        self.fanout.listeners.lock().remove(&self.id);
    }
}

/// Buffers trailing incomplete UTF-8 bytes across PTY reads so the log file
/// only ever receives whole characters.
#[derive(Default)]
struct Utf8Incremental {
    pending: Vec<u8>,
}

impl Utf8Incremental {
    fn feed(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending) {
            Ok(s) => {
                let text = s.to_string();
                self.pending.clear();
                text
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid_up_to]).into_owned();
                self.pending.drain(..valid_up_to);
                text
            }
        }
    }
}

/// A running chat's PTY-attached process and its output/input plumbing.
pub struct ChatRuntime {
    chat_id: ChatId,
    child: Mutex<Box<dyn Child + Send + Sync>>,
    master: Mutex<Box<dyn MasterPty + Send>>,
    writer: Mutex<Box<dyn Write + Send>>,
    pub output: OutputFanout,
    input: Mutex<InputSideChannel>,
    log_path: PathBuf,
    pub pid: Option<u32>,
    events: tokio::sync::mpsc::Sender<ChatRuntimeEvent>,
}

impl ChatRuntime {
    /// Open a PTY, spawn `argv` attached to its slave, and start the
    /// background reader thread. `argv[0]` is the program (typically
    /// `docker`); the rest are its arguments.
    pub fn spawn(chat_id: ChatId, argv: &[String], log_path: PathBuf, events: tokio::sync::mpsc::Sender<ChatRuntimeEvent>) -> HubResult<Arc<ChatRuntime>> {
        let (program, rest) = argv.split_first().ok_or_else(|| HubError::config("empty launch argv"))?;

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize { rows: PTY_ROWS, cols: PTY_COLS, pixel_width: 0, pixel_height: 0 })
            .map_err(|e| HubError::Internal(format!("failed to open pty: {e}")))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(rest);

        let child = pair.slave.spawn_command(cmd).map_err(|e| HubError::Internal(format!("failed to spawn chat process: {e}")))?;
        let pid = child.process_id();

        // The parent never reads or writes the slave directly; dropping it
        // here is what lets the reader see EOF once the child exits.
        drop(pair.slave);

        let reader = pair.master.try_clone_reader().map_err(|e| HubError::Internal(format!("failed to clone pty reader: {e}")))?;
        let writer = pair.master.take_writer().map_err(|e| HubError::Internal(format!("failed to take pty writer: {e}")))?;

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let runtime = Arc::new(ChatRuntime {
            chat_id: chat_id.clone(),
            child: Mutex::new(child),
            master: Mutex::new(pair.master),
            writer: Mutex::new(writer),
            output: OutputFanout::default(),
            input: Mutex::new(InputSideChannel::new()),
            log_path,
            pid,
            events: events.clone(),
        });

        spawn_reader_thread(runtime.clone(), reader, events);

        Ok(runtime)
    }

    /// Write raw bytes to the PTY master (as typed by the UI), and return
    /// any prompt the input side channel judges was just submitted.
    pub fn write_input(&self, bytes: &[u8]) -> std::io::Result<Vec<String>> {
        self.writer.lock().write_all(bytes)?;
        Ok(self.input.lock().observe(bytes))
    }

    /// Forward prompts [`Self::write_input`] detected were just submitted
    /// as [`ChatRuntimeEvent::PromptSubmitted`], so the title generator and
    /// artifact-history archiver (consumers of the chat event channel) see
    /// them the same way they would any other runtime event.
    pub async fn notify_prompts_submitted(&self, prompts: Vec<String>) {
        for prompt in prompts {
            if self.events.send(ChatRuntimeEvent::PromptSubmitted { chat_id: self.chat_id.clone(), prompt }).await.is_err() {
                tracing::warn!(chat_id = %self.chat_id, "failed to send prompt-submitted event: receiver dropped");
                return;
            }
        }
    }

    pub fn resize(&self, cols: u16, rows: u16) -> HubResult<()> {
        self.master
            .lock()
            .resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })
            .map_err(|e| HubError::Internal(format!("failed to resize pty: {e}")))?;
        self.send_sigwinch();
        Ok(())
    }

    #[cfg(unix)]
    fn send_sigwinch(&self) {
        if let Some(pid) = self.pid {
            let _ = nix::sys::signal::killpg(nix::unistd::Pid::from_raw(pid as i32), nix::sys::signal::Signal::SIGWINCH);
        }
    }

    #[cfg(not(unix))]
    fn send_sigwinch(&self) {}

    /// SIGTERM the process group, wait up to [`KILL_GRACE`], then SIGKILL.
    #[cfg(unix)]
    pub fn terminate(&self) {
        let Some(pid) = self.pid else { return };
        let pgid = nix::unistd::Pid::from_raw(pid as i32);
        let _ = nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGTERM);

        let deadline = Instant::now() + KILL_GRACE;
        loop {
            if self.child.lock().try_wait().ok().flatten().is_some() {
                return;
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        let _ = nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL);
    }

    #[cfg(not(unix))]
    pub fn terminate(&self) {
        let _ = self.child.lock().kill();
    }
}

fn spawn_reader_thread(runtime: Arc<ChatRuntime>, mut reader: Box<dyn Read + Send>, events: tokio::sync::mpsc::Sender<ChatRuntimeEvent>) {
    std::thread::spawn(move || {
        let mut decoder = Utf8Incremental::default();
        let mut log_file = match std::fs::OpenOptions::new().create(true).append(true).open(&runtime.log_path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(chat_id = %runtime.chat_id, error = %e, "failed to open chat log file");
                return;
            }
        };

        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = &buf[..n];
                    runtime.output.publish(chunk);
                    let text = decoder.feed(chunk);
                    if !text.is_empty() {
                        if let Err(e) = log_file.write_all(text.as_bytes()) {
                            tracing::warn!(chat_id = %runtime.chat_id, error = %e, "failed to append chat log");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(chat_id = %runtime.chat_id, error = %e, "pty read error");
                    break;
                }
            }
        }

        let exit_code = runtime
            .child
            .lock()
            .try_wait()
            .ok()
            .flatten()
            .map(|status| status.exit_code() as i32);

        if events.blocking_send(ChatRuntimeEvent::Exited { chat_id: runtime.chat_id.clone(), exit_code }).is_err() {
            tracing::warn!(chat_id = %runtime.chat_id, "failed to send chat exit event: receiver dropped");
        }
    });
}

/// Tracks every live chat's [`ChatRuntime`], keyed by chat id.
#[derive(Clone, Default)]
pub struct ChatRuntimeRegistry {
    runtimes: Arc<Mutex<HashMap<String, Arc<ChatRuntime>>>>,
}

impl ChatRuntimeRegistry {
    pub fn insert(&self, chat_id: &ChatId, runtime: Arc<ChatRuntime>) {
        self.runtimes.lock().insert(chat_id.as_str().to_string(), runtime);
    }

    pub fn get(&self, chat_id: &ChatId) -> Option<Arc<ChatRuntime>> {
        self.runtimes.lock().get(chat_id.as_str()).cloned()
    }

    pub fn remove(&self, chat_id: &ChatId) -> Option<Arc<ChatRuntime>> {
        self.runtimes.lock().remove(chat_id.as_str())
    }

    /// Terminate every tracked chat with the shutdown deadline, for use
    /// during graceful hub shutdown.
    pub fn terminate_all(&self) {
        let runtimes: Vec<_> = self.runtimes.lock().values().cloned().collect();
        for runtime in runtimes {
            runtime.terminate();
        }
    }

    pub fn len(&self) -> usize {
        self.runtimes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "pty_session_tests.rs"]
mod tests;
