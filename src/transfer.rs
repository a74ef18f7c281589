//! Bidirectional transfer loop (`spec.md` §4.E): shuffles bytes between
//! a "local" stream (usually stdio) and a "remote" stream (the
//! connection), applying CRLF translation, traffic shaping, and EOF
//! policy, until both directions are closed or a timeout fires. Driven
//! by `mio`, the same readiness-poll crate the teacher already lists as
//! a dependency for its own connection handling.

use crate::config::TransferConfig;
use crate::error::{CoreError, CoreResult};
use crate::sink::{Direction, OutputSink};
use crate::stream::{PollHandle, Stream};
#[cfg(unix)]
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use std::time::{Duration, Instant};

#[cfg(windows)]
use std::os::windows::io::FromRawSocket;

const LOCAL: Token = Token(0);
const REMOTE: Token = Token(1);

/// Outcome of a finished transfer, surfaced for callers that report
/// exit status (`spec.md` §4.E "observable termination reasons").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    BothClosed,
    IdleTimeout,
    LocalEof,
    RemoteEof,
}

struct Side {
    buf: Vec<u8>,
    eof: bool,
    shutdown_sent: bool,
}

impl Side {
    fn new() -> Self {
        Self {
            buf: Vec::new(),
            eof: false,
            shutdown_sent: false,
        }
    }
}

/// Drains `from` into `to`, applying CRLF translation outbound-to-remote
/// only (`spec.md` §4.E "translation happens on data flowing toward the
/// remote side, never on the way back").
fn translate_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\n' && (i == 0 || data[i - 1] != b'\r') {
            out.push(b'\r');
        }
        out.push(data[i]);
        i += 1;
    }
    out
}

/// The two optional observer sinks `spec.md` §4.E names (an output-to-file
/// logger and a hex dumper): every byte that flows through either
/// direction reaches both, but neither is in the critical path of
/// correctness — a sink write error is logged and otherwise ignored, it
/// never aborts the transfer.
#[derive(Default)]
pub struct Sinks<'a> {
    pub logger: Option<&'a mut dyn OutputSink>,
    pub hex_dump: Option<&'a mut dyn OutputSink>,
}

impl<'a> Sinks<'a> {
    fn observe(&mut self, direction: Direction, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        if let Some(sink) = self.logger.as_deref_mut() {
            if let Err(e) = sink.write(direction, data) {
                log::warn!("output sink write failed: {}", e);
            }
        }
        if let Some(sink) = self.hex_dump.as_deref_mut() {
            if let Err(e) = sink.write(direction, data) {
                log::warn!("hex-dump sink write failed: {}", e);
            }
        }
    }
}

/// Runs the transfer loop until `TransferOutcome` is reached.
///
/// `local` and `remote` are any two `Stream` implementors; the loop
/// itself has no idea whether `remote` is plain TCP, TLS, or a telnet
/// wrapper — that's the point of the `Stream` abstraction (`spec.md`
/// §4.A). `sinks` observes every byte that crosses either direction.
pub fn run(
    local: &mut dyn Stream,
    remote: &mut dyn Stream,
    config: &TransferConfig,
    mut sinks: Sinks,
) -> CoreResult<TransferOutcome> {
    config.validate().map_err(CoreError::Config)?;

    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(16);

    register(&mut poll, local.poll_handle(), LOCAL)?;
    register(&mut poll, remote.poll_handle(), REMOTE)?;

    let mut local_side = Side::new();
    let mut remote_side = Side::new();
    // Bytes already translated/queued for the opposite stream that a
    // short write hasn't flushed yet (`spec.md` §4.A "a write of less
    // than input length requires the caller to retry the remainder").
    // Retrying from here, rather than re-deriving from `local_side.buf`/
    // `remote_side.buf`, keeps CRLF-translated output byte-stable across
    // retries instead of re-running the translation on a resliced input.
    let mut local_out_pending: Vec<u8> = Vec::new();
    let mut remote_out_pending: Vec<u8> = Vec::new();
    let mut last_activity = Instant::now();
    let idle_timeout = (config.idle_timeout_ms > 0)
        .then(|| Duration::from_millis(config.idle_timeout_ms));
    let read_buf_len = config.read_buffer_bytes;
    let mut scratch = vec![0u8; read_buf_len];

    loop {
        if local_side.eof && remote_side.eof {
            return Ok(TransferOutcome::BothClosed);
        }
        if let Some(timeout) = idle_timeout {
            if last_activity.elapsed() >= timeout {
                return Ok(TransferOutcome::IdleTimeout);
            }
        }

        let wait = idle_timeout
            .map(|t| t.saturating_sub(last_activity.elapsed()))
            .unwrap_or(Duration::from_millis(200));
        poll.poll(&mut events, Some(wait))?;

        for event in events.iter() {
            match event.token() {
                LOCAL if !config.recv_only => {
                    if pump_read(local, &mut scratch, &mut local_side)? {
                        last_activity = Instant::now();
                    }
                }
                REMOTE if !config.send_only => {
                    if pump_read(remote, &mut scratch, &mut remote_side)? {
                        last_activity = Instant::now();
                    }
                }
                _ => {}
            }
        }

        if config.delay_ms > 0 && (!local_side.buf.is_empty() || !remote_side.buf.is_empty()) {
            std::thread::sleep(Duration::from_millis(config.delay_ms));
        }

        if !local_out_pending.is_empty() {
            let sent = remote.write(&local_out_pending)?;
            sinks.observe(Direction::LocalToRemote, &local_out_pending[..sent]);
            local_out_pending.drain(..sent);
        }
        if local_out_pending.is_empty() && !local_side.buf.is_empty() && !config.recv_only {
            let payload = if config.crlf_translate {
                translate_crlf(&local_side.buf)
            } else {
                std::mem::take(&mut local_side.buf)
            };
            local_side.buf.clear();
            let sent = remote.write(&payload)?;
            sinks.observe(Direction::LocalToRemote, &payload[..sent]);
            if sent < payload.len() {
                local_out_pending.extend_from_slice(&payload[sent..]);
            }
        }
        if !remote_out_pending.is_empty() {
            let sent = local.write(&remote_out_pending)?;
            sinks.observe(Direction::RemoteToLocal, &remote_out_pending[..sent]);
            remote_out_pending.drain(..sent);
        }
        if remote_out_pending.is_empty() && !remote_side.buf.is_empty() && !config.send_only {
            remote.maintain()?;
            let payload = std::mem::take(&mut remote_side.buf);
            let sent = local.write(&payload)?;
            sinks.observe(Direction::RemoteToLocal, &payload[..sent]);
            if sent < payload.len() {
                remote_out_pending.extend_from_slice(&payload[sent..]);
            }
        }

        if local_side.eof && !local_side.shutdown_sent {
            local_side.shutdown_sent = true;
            if config.close_on_eof && !config.no_shutdown {
                remote.close()?;
            }
            if config.send_only {
                return Ok(TransferOutcome::LocalEof);
            }
        }
        if remote_side.eof && !remote_side.shutdown_sent {
            remote_side.shutdown_sent = true;
            if config.recv_only {
                return Ok(TransferOutcome::RemoteEof);
            }
        }
    }
}

/// Reads what's available from `stream` into `side.buf`, translating
/// CRLF when writing toward the remote direction is the caller's job
/// (not this function's — translation is applied at the write site in
/// `run` so it stays symmetric with whichever side is "remote").
fn pump_read(stream: &mut dyn Stream, scratch: &mut [u8], side: &mut Side) -> CoreResult<bool> {
    match stream.read(scratch) {
        Ok(0) => {
            side.eof = true;
            Ok(false)
        }
        Ok(n) => {
            side.buf.extend_from_slice(&scratch[..n]);
            Ok(true)
        }
        Err(CoreError::WouldBlock) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn register(poll: &mut Poll, handle: PollHandle, token: Token) -> CoreResult<()> {
    let PollHandle::Socket(fd) = handle;
    poll.registry()
        .register(&mut SourceFd(&fd), token, Interest::READABLE)?;
    Ok(())
}

#[cfg(windows)]
fn register(poll: &mut Poll, handle: PollHandle, token: Token) -> CoreResult<()> {
    match handle {
        PollHandle::Socket(sock) => {
            let mut source = mio::net::TcpStream::from_std(unsafe {
                std::net::TcpStream::from_raw_socket(sock)
            });
            poll.registry()
                .register(&mut source, token, Interest::READABLE)?;
            std::mem::forget(source);
        }
        PollHandle::Pipe(_) => {
            return Err(CoreError::Protocol(
                "named-pipe readiness polling needs a Windows-specific mio source".to_string(),
            ))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MirrorSink;

    #[test]
    fn crlf_translation_inserts_cr_before_bare_lf() {
        let out = translate_crlf(b"hi\nthere");
        assert_eq!(out, b"hi\r\nthere");
    }

    #[test]
    fn crlf_translation_is_a_noop_on_existing_crlf() {
        let out = translate_crlf(b"hi\r\nthere");
        assert_eq!(out, b"hi\r\nthere");
    }

    #[test]
    fn sinks_observe_is_a_noop_with_nothing_attached() {
        let mut sinks = Sinks::default();
        sinks.observe(Direction::LocalToRemote, b"hello");
    }

    #[test]
    fn sinks_observe_forwards_to_both_attached_sinks() {
        let mut logger_buf = Vec::new();
        let mut dump_buf = Vec::new();
        let mut logger = MirrorSink::new(&mut logger_buf);
        let mut dump = MirrorSink::new(&mut dump_buf);
        let mut sinks = Sinks {
            logger: Some(&mut logger),
            hex_dump: Some(&mut dump),
        };
        sinks.observe(Direction::RemoteToLocal, b"payload");
        drop(sinks);
        assert_eq!(logger_buf, b"payload");
        assert_eq!(dump_buf, b"payload");
    }
}
