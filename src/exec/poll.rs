//! POSIX fallback exec backend: drives the child's stdin/stdout/stderr
//! pipes through `mio`, the same readiness-poll crate `transfer.rs` uses
//! for the network side. Used on every POSIX target except Linux builds
//! with the `io_uring` feature enabled.

use crate::config::ExecConfig;
use crate::error::{CoreError, CoreResult};
use crate::exec::{flow_buffers_from_config, spawn, ExecStream};
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::process::{Child, Command};

const STDOUT: Token = Token(0);
const STDERR: Token = Token(1);

/// Runs the child to completion, calling `on_output(stream, data)` for
/// each chunk read and `stdin_source()` to pull bytes to forward into
/// the child's stdin. Returns the exit code.
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
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| CoreError::ExecFlow("child stdout was not piped".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| CoreError::ExecFlow("child stderr was not piped".to_string()))?;

    set_nonblocking(&stdout)?;
    set_nonblocking(&stderr)?;

    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(8);
    poll.registry().register(
        &mut SourceFd(&stdout.as_raw_fd()),
        STDOUT,
        Interest::READABLE,
    )?;
    poll.registry().register(
        &mut SourceFd(&stderr.as_raw_fd()),
        STDERR,
        Interest::READABLE,
    )?;

    let (mut stdin_buf, mut stdout_buf, mut stderr_buf, global) = flow_buffers_from_config(config);
    let mut scratch = vec![0u8; config.buffers.stdout_capacity.max(config.buffers.stderr_capacity)];
    let mut stdout_done = false;
    let mut stderr_done = false;

    loop {
        if stdout_done && stderr_done && stdin_buf.is_empty() {
            break;
        }

        // Pull more from the source only if neither the global nor the
        // stdin channel's own gate says to pause (`spec.md` §4.F).
        if !global.should_pause() && !stdin_buf.is_full() {
            if let Some(chunk) = stdin_source()? {
                let taken = stdin_buf.push(&chunk);
                global.record_push(taken);
            }
        }
        if !stdin_buf.is_empty() {
            let chunk = stdin_buf.drain(stdin_buf.len());
            stdin
                .write_all(&chunk)
                .map_err(|e| CoreError::ExecFlow(format!("stdin write failed: {}", e)))?;
            global.record_drain(chunk.len());
        }

        poll.poll(
            &mut events,
            Some(std::time::Duration::from_millis(50)),
        )?;

        for event in events.iter() {
            match event.token() {
                STDOUT if !stdout_done && !global.should_pause() && !stdout_buf.is_full() => {
                    match stdout.read(&mut scratch) {
                        Ok(0) => stdout_done = true,
                        Ok(n) => {
                            let taken = stdout_buf.push(&scratch[..n]);
                            global.record_push(taken);
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                        Err(e) => return Err(CoreError::Io(e)),
                    }
                }
                STDERR if !stderr_done && !global.should_pause() && !stderr_buf.is_full() => {
                    match stderr.read(&mut scratch) {
                        Ok(0) => stderr_done = true,
                        Ok(n) => {
                            let taken = stderr_buf.push(&scratch[..n]);
                            global.record_push(taken);
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                        Err(e) => return Err(CoreError::Io(e)),
                    }
                }
                _ => {}
            }
        }

        if !stdout_buf.is_empty() {
            let chunk = stdout_buf.drain(config.buffers.stdout_capacity);
            global.record_drain(chunk.len());
            on_output(ExecStream::Stdout, &chunk);
        }
        if !stderr_buf.is_empty() {
            let chunk = stderr_buf.drain(config.buffers.stderr_capacity);
            global.record_drain(chunk.len());
            on_output(ExecStream::Stderr, &chunk);
        }
    }

    crate::exec::wait_with_timeout(&mut child, config.timeouts.overall_ms)
}

fn set_nonblocking<T: AsRawFd>(handle: &T) -> CoreResult<()> {
    let fd = handle.as_raw_fd();
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            return Err(CoreError::Io(std::io::Error::last_os_error()));
        }
        if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            return Err(CoreError::Io(std::io::Error::last_os_error()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecConfig;

    #[test]
    fn echo_program_produces_expected_stdout() {
        let config = ExecConfig::default();
        let mut command = std::process::Command::new("echo");
        command.arg("hello");
        let mut collected = Vec::new();
        let code = run(
            command,
            &config,
            || Ok(None),
            |stream, data| {
                if stream == ExecStream::Stdout {
                    collected.extend_from_slice(data);
                }
            },
        )
        .unwrap();
        assert_eq!(code, 0);
        assert_eq!(collected, b"hello\n");
    }
}
