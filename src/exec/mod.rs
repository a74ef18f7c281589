//! Exec session (`spec.md` §4.F): spawns a child process and multiplexes
//! its stdin/stdout/stderr through the same `Stream` contract the
//! network side uses, with bounded FIFO buffers and pause/resume flow
//! control so a slow network peer can't let an unbounded amount of
//! child output pile up in memory. Three backends cover the platforms
//! that can't share one I/O model: Linux gets an `io_uring` fast path
//! behind a feature flag, other POSIX targets get an `mio`-driven
//! poll loop, and Windows gets a thread per pipe because overlapped
//! I/O on anonymous pipes doesn't integrate with `mio`'s readiness
//! model. `std::process::Command` is the spawn primitive across all
//! three, the same entry point the pack's own process-invocation code
//! uses for an external tool.

#[cfg(all(target_os = "linux", feature = "io_uring"))]
pub mod linux;
pub mod poll;
#[cfg(windows)]
pub mod windows;

use crate::config::ExecConfig;
use crate::error::{CoreError, CoreResult};
use std::collections::VecDeque;
use std::process::{Child, Command, Stdio};

/// Which stream a chunk of child output came from, so a caller that
/// wants to keep stdout/stderr separate on the wire (§4.F "an exec
/// session multiplexes stdout and stderr over a single stream, tagged
/// by origin") can still distinguish them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStream {
    Stdout,
    Stderr,
}

/// A per-channel bounded byte FIFO (`spec.md` §4.F "each of the three
/// channels ... is a bounded FIFO"). Its own capacity is the per-channel
/// ceiling ("an individual channel whose own buffer is full also pauses
/// its source even if the global threshold is not reached") — the
/// cross-channel `max_total_buffer_bytes` gate lives in `GlobalFlow`,
/// shared by all three channels of one session.
pub struct FlowBuffer {
    queue: VecDeque<u8>,
    capacity: usize,
}

impl FlowBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity.min(64 * 1024)),
            capacity,
        }
    }

    /// Appends as much of `data` as fits under `capacity`, returning the
    /// byte count actually accepted so the caller can credit it to the
    /// session's `GlobalFlow`.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let room = self.capacity.saturating_sub(self.queue.len());
        let take = data.len().min(room);
        self.queue.extend(&data[..take]);
        take
    }

    pub fn drain(&mut self, max: usize) -> Vec<u8> {
        let take = max.min(self.queue.len());
        self.queue.drain(..take).collect()
    }

    /// True once this channel alone is at capacity, independent of the
    /// session-wide `GlobalFlow` state.
    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// The session-wide "sum of buffered bytes" gate shared by stdin,
/// stdout, and stderr (`spec.md` §4.F "when the sum of buffered bytes
/// exceeds `max_total_buffer_bytes × pause_threshold_pct`, the source
/// side of every channel is paused"; §5 "the exec session's global
/// byte-count for flow control ... an atomic counter with relaxed
/// ordering suffices" on the threaded backend — the poll/io_uring
/// backends are single-threaded so a plain `Cell` is enough here).
#[derive(Clone)]
pub struct GlobalFlow {
    total: std::rc::Rc<std::cell::Cell<usize>>,
    paused: std::rc::Rc<std::cell::Cell<bool>>,
    pause_at: usize,
    resume_at: usize,
}

impl GlobalFlow {
    pub fn new(max_total_buffer_bytes: usize, pause_threshold_pct: f64, resume_threshold_pct: f64) -> Self {
        Self {
            total: std::rc::Rc::new(std::cell::Cell::new(0)),
            paused: std::rc::Rc::new(std::cell::Cell::new(false)),
            pause_at: (max_total_buffer_bytes as f64 * pause_threshold_pct) as usize,
            resume_at: (max_total_buffer_bytes as f64 * resume_threshold_pct) as usize,
        }
    }

    pub fn record_push(&self, n: usize) {
        let total = self.total.get() + n;
        self.total.set(total);
        if total >= self.pause_at {
            self.paused.set(true);
        }
    }

    pub fn record_drain(&self, n: usize) {
        let total = self.total.get().saturating_sub(n);
        self.total.set(total);
        if total <= self.resume_at {
            self.paused.set(false);
        }
    }

    pub fn should_pause(&self) -> bool {
        self.paused.get()
    }

    pub fn total(&self) -> usize {
        self.total.get()
    }
}

/// Spawns an exec session from an already-validated `Command` (`spec.md`
/// §9 open question: exec security validation — arg whitelisting,
/// shell-escaping policy, privilege drop — is the caller's
/// responsibility before this function ever sees the command; this
/// function only wires stdio to pipes so the backend can multiplex them).
pub fn spawn(mut command: Command) -> CoreResult<Child> {
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CoreError::ExecFlow(format!("failed to spawn child: {}", e)))
}

/// Waits for `child` to exit, respecting `timeouts.overall_ms` as a hard
/// ceiling (`spec.md` §4.F "an overall session timeout kills the child
/// if it hasn't exited"). `0` means no ceiling.
pub fn wait_with_timeout(child: &mut Child, overall_ms: u64) -> CoreResult<i32> {
    if overall_ms == 0 {
        let status = child.wait().map_err(CoreError::Io)?;
        return Ok(status.code().unwrap_or(-1));
    }

    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(overall_ms);
    loop {
        if let Some(status) = child.try_wait().map_err(CoreError::Io)? {
            return Ok(status.code().unwrap_or(-1));
        }
        if std::time::Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CoreError::Timeout("exec overall timeout"));
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
}

/// Picks the platform backend at compile time (`spec.md` §4.F "backend
/// selection is a build-time concern, not a runtime one").
pub fn run_exec(
    command: Command,
    config: &ExecConfig,
    stdin_source: impl FnMut() -> CoreResult<Option<Vec<u8>>>,
    on_output: impl FnMut(ExecStream, &[u8]),
) -> CoreResult<i32> {
    #[cfg(all(target_os = "linux", feature = "io_uring"))]
    {
        linux::run(command, config, stdin_source, on_output)
    }
    #[cfg(all(unix, not(all(target_os = "linux", feature = "io_uring"))))]
    {
        poll::run(command, config, stdin_source, on_output)
    }
    #[cfg(windows)]
    {
        windows::run(command, config, stdin_source, on_output)
    }
}

/// Builds the three per-channel buffers plus the `GlobalFlow` they all
/// report into, each channel capped at its own configured size.
pub fn flow_buffers_from_config(config: &ExecConfig) -> (FlowBuffer, FlowBuffer, FlowBuffer, GlobalFlow) {
    let stdin = FlowBuffer::new(config.buffers.stdin_capacity);
    let stdout = FlowBuffer::new(config.buffers.stdout_capacity);
    let stderr = FlowBuffer::new(config.buffers.stderr_capacity);
    let global = GlobalFlow::new(
        config.flow.max_total_buffer_bytes,
        config.flow.pause_threshold_pct,
        config.flow.resume_threshold_pct,
    );
    (stdin, stdout, stderr, global)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_buffer_reports_full_at_capacity() {
        let mut buf = FlowBuffer::new(100);
        buf.push(&vec![0u8; 90]);
        assert!(!buf.is_full());
        buf.push(&vec![0u8; 10]);
        assert!(buf.is_full());
    }

    #[test]
    fn flow_buffer_truncates_past_capacity() {
        let mut buf = FlowBuffer::new(10);
        let taken = buf.push(&vec![1u8; 20]);
        assert_eq!(taken, 10);
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn global_flow_pauses_at_threshold_and_resumes_with_hysteresis() {
        // pause_at = 870, resume_at = 614.
        let global = GlobalFlow::new(1024, 0.85, 0.60);
        global.record_push(900);
        assert!(global.should_pause());
        global.record_drain(100); // total 800, still above resume_at
        assert!(global.should_pause(), "still above the resume threshold");
        global.record_drain(300); // total 500, below resume_at
        assert!(!global.should_pause());
    }

    #[test]
    fn flow_buffers_from_config_sizes_each_channel_independently() {
        let config = ExecConfig::default();
        let (stdin, stdout, stderr, _global) = flow_buffers_from_config(&config);
        assert_eq!(stdin.capacity, config.buffers.stdin_capacity);
        assert_eq!(stdout.capacity, config.buffers.stdout_capacity);
        assert_eq!(stderr.capacity, config.buffers.stderr_capacity);
    }
}
