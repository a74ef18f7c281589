//! Linux `io_uring` exec backend, built only with the `io_uring` feature
//! (`spec.md` §4.F "a Linux fast path may use `io_uring` for the child's
//! pipes instead of readiness polling"). Submits one read SQE per pipe
//! and one write SQE for pending stdin, reaping completions from a
//! single shared ring rather than the per-fd readiness loop `poll.rs`
//! uses.

use crate::config::ExecConfig;
use crate::error::{CoreError, CoreResult};
use crate::exec::{flow_buffers_from_config, spawn, ExecStream};
use io_uring::{opcode, types, IoUring};
use std::os::fd::AsRawFd;
use std::process::Command;

const STDOUT_TAG: u64 = 0;
const STDERR_TAG: u64 = 1;

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

    let mut ring = IoUring::new(8).map_err(CoreError::Io)?;
    let (mut stdin_buf, mut stdout_buf, mut stderr_buf, global) = flow_buffers_from_config(config);

    let mut stdout_scratch = vec![0u8; config.buffers.stdout_capacity];
    let mut stderr_scratch = vec![0u8; config.buffers.stderr_capacity];
    let mut stdout_done = false;
    let mut stderr_done = false;

    submit_read(&mut ring, stdout.as_raw_fd(), &mut stdout_scratch, STDOUT_TAG)?;
    submit_read(&mut ring, stderr.as_raw_fd(), &mut stderr_scratch, STDERR_TAG)?;

    loop {
        if stdout_done && stderr_done && stdin_buf.is_empty() {
            break;
        }

        if !global.should_pause() && !stdin_buf.is_full() {
            if let Some(chunk) = stdin_source()? {
                let taken = stdin_buf.push(&chunk);
                global.record_push(taken);
            }
        }
        if !stdin_buf.is_empty() {
            use std::io::Write;
            let chunk = stdin_buf.drain(stdin_buf.len());
            stdin
                .write_all(&chunk)
                .map_err(|e| CoreError::ExecFlow(format!("stdin write failed: {}", e)))?;
            global.record_drain(chunk.len());
        }

        ring.submit_and_wait(1).map_err(CoreError::Io)?;
        let completions: Vec<_> = ring.completion().map(|cqe| cqe).collect();

        for cqe in completions {
            let n = cqe.result();
            match cqe.user_data() {
                STDOUT_TAG if !stdout_done => {
                    if n <= 0 {
                        stdout_done = true;
                    } else {
                        let taken = stdout_buf.push(&stdout_scratch[..n as usize]);
                        global.record_push(taken);
                        if !global.should_pause() && !stdout_buf.is_full() {
                            submit_read(&mut ring, stdout.as_raw_fd(), &mut stdout_scratch, STDOUT_TAG)?;
                        }
                    }
                }
                STDERR_TAG if !stderr_done => {
                    if n <= 0 {
                        stderr_done = true;
                    } else {
                        let taken = stderr_buf.push(&stderr_scratch[..n as usize]);
                        global.record_push(taken);
                        if !global.should_pause() && !stderr_buf.is_full() {
                            submit_read(&mut ring, stderr.as_raw_fd(), &mut stderr_scratch, STDERR_TAG)?;
                        }
                    }
                }
                _ => {}
            }
        }

        if !stdout_buf.is_empty() {
            let chunk = stdout_buf.drain(config.buffers.stdout_capacity);
            global.record_drain(chunk.len());
            on_output(ExecStream::Stdout, &chunk);
            if !global.should_pause() && !stdout_buf.is_full() && !stdout_done {
                submit_read(&mut ring, stdout.as_raw_fd(), &mut stdout_scratch, STDOUT_TAG)?;
            }
        }
        if !stderr_buf.is_empty() {
            let chunk = stderr_buf.drain(config.buffers.stderr_capacity);
            global.record_drain(chunk.len());
            on_output(ExecStream::Stderr, &chunk);
            if !global.should_pause() && !stderr_buf.is_full() && !stderr_done {
                submit_read(&mut ring, stderr.as_raw_fd(), &mut stderr_scratch, STDERR_TAG)?;
            }
        }
    }

    crate::exec::wait_with_timeout(&mut child, config.timeouts.overall_ms)
}

fn submit_read(
    ring: &mut IoUring,
    fd: std::os::fd::RawFd,
    buf: &mut [u8],
    tag: u64,
) -> CoreResult<()> {
    let read_e = opcode::Read::new(types::Fd(fd), buf.as_mut_ptr(), buf.len() as u32)
        .build()
        .user_data(tag);
    unsafe {
        ring.submission()
            .push(&read_e)
            .map_err(|_| CoreError::ExecFlow("io_uring submission queue full".to_string()))?;
    }
    Ok(())
}
