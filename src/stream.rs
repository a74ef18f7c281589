//! The single polymorphic contract every connection variant implements
//! (`spec.md` §3 "Stream (capability abstraction)", §4.A, §9 "replace [deep
//! inheritance] with a single capability-set vtable"). Connection variants
//! are a tagged union (`crate::connection::Connection`), not a trait-object
//! hierarchy — `Stream` is the vtable that union dispatches to.

use crate::error::CoreResult;

#[cfg(unix)]
use std::os::fd::RawFd;
#[cfg(windows)]
use std::os::windows::io::RawHandle;

/// The OS-level descriptor a readiness primitive polls. A named-pipe
/// handle is *not* a socket; keeping it a distinct variant stops a caller
/// from handing it to a socket-only readiness API by accident (§9, Windows
/// pre-AF_UNIX open question).
#[derive(Debug, Clone, Copy)]
pub enum PollHandle {
    #[cfg(unix)]
    Socket(RawFd),
    #[cfg(windows)]
    Socket(std::os::windows::io::RawSocket),
    #[cfg(windows)]
    Pipe(RawHandle),
}

/// Capability-set contract shared by every connection variant: plain
/// socket, TLS, DTLS, SRP, telnet(inner), IPC.
///
/// A `Stream` is single-owner; ownership moves into the transfer loop or
/// the exec session, which are then responsible for `close`.
pub trait Stream {
    /// Read into `buf`, returning the byte count. `Ok(0)` is an orderly
    /// half-close, not an error.
    fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize>;

    /// Write from `buf`, returning the accepted byte count. A short write
    /// does not imply an error; the caller retries the remainder.
    fn write(&mut self, buf: &[u8]) -> CoreResult<usize>;

    /// Idempotent. Flushes a crypto-layer close alert where the
    /// underlying session supports one but never closes the OS
    /// descriptor twice.
    fn close(&mut self) -> CoreResult<()>;

    /// The descriptor a readiness wait should poll.
    fn poll_handle(&self) -> PollHandle;

    /// Periodic housekeeping hook, called opportunistically by the
    /// transfer loop after each poll wakeup. A no-op for plain and
    /// crypto streams; for telnet, drains queued NAWS/signal bytes and
    /// returns them for the caller to write.
    fn maintain(&mut self) -> CoreResult<Vec<u8>> {
        Ok(Vec::new())
    }
}
