//! The `ipc` connection variant (`spec.md` §4.B): wraps a Unix-domain
//! socket. On the Windows pre-AF_UNIX target, an alternate backend wraps
//! a named-pipe handle and presents the same `Stream` contract,
//! translating "pipe busy" into an exponential-backoff connect (initial
//! 10 ms, factor 2, ceiling 5 s).

use crate::error::{CoreError, CoreResult};
use crate::stream::{PollHandle, Stream};
use std::time::Duration;

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;

    pub struct IpcConnection {
        inner: UnixStream,
    }

    impl IpcConnection {
        pub fn new(inner: UnixStream) -> CoreResult<Self> {
            inner.set_nonblocking(true)?;
            Ok(Self { inner })
        }

        pub fn connect(path: &str) -> CoreResult<Self> {
            Self::new(UnixStream::connect(path)?)
        }
    }

    impl Stream for IpcConnection {
        fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize> {
            use std::io::Read;
            Ok(self.inner.read(buf)?)
        }

        fn write(&mut self, buf: &[u8]) -> CoreResult<usize> {
            use std::io::Write;
            Ok(self.inner.write(buf)?)
        }

        fn close(&mut self) -> CoreResult<()> {
            let _ = self.inner.shutdown(std::net::Shutdown::Both);
            Ok(())
        }

        fn poll_handle(&self) -> PollHandle {
            PollHandle::Socket(self.inner.as_raw_fd())
        }
    }
}

#[cfg(unix)]
pub use unix_impl::IpcConnection;

/// §4.B "Windows pre-AF_UNIX fallback uses named-pipes; a pipe handle is
/// exposed as the Stream's poll-handle even though it is not a socket"
/// (§9 open question, resolved by the `PollHandle::Pipe` variant).
#[cfg(windows)]
mod windows_impl {
    use super::*;
    use std::ffi::CString;
    use std::os::windows::io::RawHandle;
    use winapi::shared::minwindef::DWORD;
    use winapi::um::fileapi::{ReadFile, WriteFile};
    use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
    use winapi::um::namedpipeapi::WaitNamedPipeA;
    use winapi::um::winbase::{CreateFileA, OPEN_EXISTING, PIPE_ACCESS_DUPLEX};
    use winapi::um::winnt::{GENERIC_READ, GENERIC_WRITE, HANDLE};

    pub struct IpcConnection {
        handle: HANDLE,
    }

    unsafe impl Send for IpcConnection {}

    const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
    const MAX_BACKOFF: Duration = Duration::from_secs(5);

    impl IpcConnection {
        /// Retries on `ERROR_PIPE_BUSY` with exponential backoff (10ms,
        /// factor 2, ceiling 5s) up to `max_retries` attempts.
        pub fn connect(path: &str, max_retries: u32) -> CoreResult<Self> {
            let c_path = CString::new(path).map_err(|_| {
                CoreError::Protocol("named pipe path contains a NUL byte".to_string())
            })?;
            let mut backoff = INITIAL_BACKOFF;

            for attempt in 0..=max_retries {
                let handle = unsafe {
                    CreateFileA(
                        c_path.as_ptr(),
                        GENERIC_READ | GENERIC_WRITE,
                        0,
                        std::ptr::null_mut(),
                        OPEN_EXISTING,
                        0,
                        std::ptr::null_mut(),
                    )
                };
                if handle != INVALID_HANDLE_VALUE {
                    return Ok(Self { handle });
                }
                if attempt == max_retries {
                    return Err(CoreError::Io(std::io::Error::last_os_error()));
                }
                unsafe {
                    WaitNamedPipeA(c_path.as_ptr(), backoff.as_millis() as DWORD);
                }
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            unreachable!("loop always returns by its last iteration")
        }

        pub fn raw_handle(&self) -> RawHandle {
            self.handle as RawHandle
        }
    }

    impl Stream for IpcConnection {
        fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize> {
            let mut read: DWORD = 0;
            let ok = unsafe {
                ReadFile(
                    self.handle,
                    buf.as_mut_ptr() as *mut _,
                    buf.len() as DWORD,
                    &mut read,
                    std::ptr::null_mut(),
                )
            };
            if ok == 0 {
                return Err(CoreError::Io(std::io::Error::last_os_error()));
            }
            Ok(read as usize)
        }

        fn write(&mut self, buf: &[u8]) -> CoreResult<usize> {
            let mut written: DWORD = 0;
            let ok = unsafe {
                WriteFile(
                    self.handle,
                    buf.as_ptr() as *const _,
                    buf.len() as DWORD,
                    &mut written,
                    std::ptr::null_mut(),
                )
            };
            if ok == 0 {
                return Err(CoreError::Io(std::io::Error::last_os_error()));
            }
            Ok(written as usize)
        }

        fn close(&mut self) -> CoreResult<()> {
            if self.handle != INVALID_HANDLE_VALUE {
                unsafe { CloseHandle(self.handle) };
                self.handle = INVALID_HANDLE_VALUE;
            }
            Ok(())
        }

        fn poll_handle(&self) -> PollHandle {
            PollHandle::Pipe(self.raw_handle())
        }
    }

    impl Drop for IpcConnection {
        fn drop(&mut self) {
            let _ = self.close();
        }
    }
}

#[cfg(windows)]
pub use windows_impl::IpcConnection;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    #[test]
    fn unix_socket_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sock");
        let listener = UnixListener::bind(&path).unwrap();

        let client = std::os::unix::net::UnixStream::connect(&path).unwrap();
        let (server, _) = listener.accept().unwrap();

        let mut client = IpcConnection::new(client).unwrap();
        let mut server = IpcConnection::new(server).unwrap();

        client.write(b"ping").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let mut buf = [0u8; 8];
        let n = server.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }
}
