//! Windows exec backend: a thread per pipe. Overlapped I/O on anonymous
//! pipes doesn't plug into `mio`'s readiness model the way a named pipe
//! or socket does, so each of stdin/stdout/stderr gets its own blocking
//! thread relaying through `std::sync::mpsc::sync_channel`. This is
//! backpressure expressed as bounded channel depth rather than the
//! `FlowBuffer`/`GlobalFlow` byte-count thresholds the POSIX backends
//! share; a full channel blocks the producer thread on `send` instead.

use crate::config::ExecConfig;
use crate::error::{CoreError, CoreResult};
use crate::exec::{spawn, ExecStream};
use std::io::{Read, Write};
use std::process::Command;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

enum OutputMsg {
    Chunk(ExecStream, Vec<u8>),
    Eof(ExecStream),
}

/// Runs the child to completion on Windows, relaying stdin from
/// `stdin_source` and stdout/stderr chunks to `on_output`.
pub fn run(
    command: Command,
    config: &ExecConfig,
    mut stdin_source: impl FnMut() -> CoreResult<Option<Vec<u8>>>,
    mut on_output: impl FnMut(ExecStream, &[u8]),
) -> CoreResult<i32> {
    let mut child = spawn(command)?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| CoreError::ExecFlow("child stdin was not piped".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| CoreError::ExecFlow("child stdout was not piped".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| CoreError::ExecFlow("child stderr was not piped".to_string()))?;

    // Channel depth of 1 means a reader thread blocks on `send` until the
    // previous chunk is consumed, which is the backpressure signal this
    // backend uses instead of `FlowBuffer`'s pause/resume thresholds.
    let (tx, rx): (SyncSender<OutputMsg>, Receiver<OutputMsg>) = sync_channel(4);

    spawn_reader(stdout, ExecStream::Stdout, tx.clone(), config.buffers.stdout_capacity);
    spawn_reader(stderr, ExecStream::Stderr, tx, config.buffers.stderr_capacity);

    let mut stdout_done = false;
    let mut stderr_done = false;

    while !(stdout_done && stderr_done) {
        if let Some(chunk) = stdin_source()? {
            stdin
                .write_all(&chunk)
                .map_err(|e| CoreError::ExecFlow(format!("stdin write failed: {}", e)))?;
        }

        match rx.recv_timeout(std::time::Duration::from_millis(50)) {
            Ok(OutputMsg::Chunk(stream, data)) => on_output(stream, &data),
            Ok(OutputMsg::Eof(ExecStream::Stdout)) => stdout_done = true,
            Ok(OutputMsg::Eof(ExecStream::Stderr)) => stderr_done = true,
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    crate::exec::wait_with_timeout(&mut child, config.timeouts.overall_ms)
}

fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    which: ExecStream,
    tx: SyncSender<OutputMsg>,
    buffer_size: usize,
) {
    std::thread::spawn(move || {
        let mut buf = vec![0u8; buffer_size];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    let _ = tx.send(OutputMsg::Eof(which));
                    break;
                }
                Ok(n) => {
                    if tx.send(OutputMsg::Chunk(which, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(_) => {
                    let _ = tx.send(OutputMsg::Eof(which));
                    break;
                }
            }
        }
    });
}
