//! The `plain` connection variant (`spec.md` §4.B): wraps a connected OS
//! socket; read/write translate directly to the OS primitives.

use crate::error::CoreResult;
use crate::stream::{PollHandle, Stream};
use std::net::{TcpStream, UdpSocket};

#[cfg(unix)]
use std::os::fd::AsRawFd;
#[cfg(windows)]
use std::os::windows::io::AsRawSocket;

pub enum PlainConnection {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

impl PlainConnection {
    pub fn tcp(stream: TcpStream) -> CoreResult<Self> {
        stream.set_nonblocking(true)?;
        Ok(PlainConnection::Tcp(stream))
    }

    pub fn udp(socket: UdpSocket) -> CoreResult<Self> {
        socket.set_nonblocking(true)?;
        Ok(PlainConnection::Udp(socket))
    }
}

impl Stream for PlainConnection {
    fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize> {
        use std::io::Read;
        match self {
            PlainConnection::Tcp(s) => Ok(s.read(buf)?),
            PlainConnection::Udp(s) => Ok(s.recv(buf)?),
        }
    }

    fn write(&mut self, buf: &[u8]) -> CoreResult<usize> {
        use std::io::Write;
        match self {
            PlainConnection::Tcp(s) => Ok(s.write(buf)?),
            PlainConnection::Udp(s) => Ok(s.send(buf)?),
        }
    }

    fn close(&mut self) -> CoreResult<()> {
        if let PlainConnection::Tcp(s) = self {
            // Idempotent: a second shutdown on an already-shut-down socket
            // returns ENOTCONN, which we swallow rather than surface.
            let _ = s.shutdown(std::net::Shutdown::Both);
        }
        Ok(())
    }

    #[cfg(unix)]
    fn poll_handle(&self) -> PollHandle {
        let fd = match self {
            PlainConnection::Tcp(s) => s.as_raw_fd(),
            PlainConnection::Udp(s) => s.as_raw_fd(),
        };
        PollHandle::Socket(fd)
    }

    #[cfg(windows)]
    fn poll_handle(&self) -> PollHandle {
        let sock = match self {
            PlainConnection::Tcp(s) => s.as_raw_socket(),
            PlainConnection::Udp(s) => s.as_raw_socket(),
        };
        PollHandle::Socket(sock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn tcp_plain_connection_roundtrips() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();

        let mut client = PlainConnection::tcp(client).unwrap();
        let mut server = PlainConnection::tcp(server).unwrap();

        client.write(b"hello\n").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        let mut buf = [0u8; 16];
        let n = server.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello\n");
    }

    #[test]
    fn double_close_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let mut conn = PlainConnection::tcp(client).unwrap();
        conn.close().unwrap();
        conn.close().unwrap();
    }
}
