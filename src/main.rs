//! Thin wiring binary over the `relaycat` library. Full CLI argument
//! parsing (flag compatibility with existing netcat-class tools, proxy
//! traversal, relay-tunnel discovery) is an external collaborator's job
//! per this crate's scope; this binary only demonstrates the two modes
//! the core engine actually drives — connect-out and listen — using a
//! deliberately small `host port` / `-l port` argument shape.

use relaycat::{
    connect::{Connector, DirectConnector, Protocol},
    connection::{Connection, PlainConnection},
    error::CoreResult,
    stream::Stream,
    transfer::{self, TransferOutcome},
    TransferConfig,
};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

struct StdioStream;

impl Stream for StdioStream {
    fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize> {
        use std::io::Read;
        Ok(std::io::stdin().read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> CoreResult<usize> {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        stdout.write_all(buf)?;
        stdout.flush()?;
        Ok(buf.len())
    }

    fn close(&mut self) -> CoreResult<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn poll_handle(&self) -> relaycat::stream::PollHandle {
        use std::os::fd::AsRawFd;
        relaycat::stream::PollHandle::Socket(std::io::stdin().as_raw_fd())
    }

    #[cfg(windows)]
    fn poll_handle(&self) -> relaycat::stream::PollHandle {
        use std::os::windows::io::AsRawSocket;
        // stdin on Windows is a console/file handle, not a socket; a real
        // binary would need the named-pipe PollHandle variant here.
        relaycat::stream::PollHandle::Socket(0)
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("-l") => {
            let port: u16 = args.get(1).and_then(|p| p.parse().ok()).unwrap_or(31337);
            listen_mode(port)
        }
        Some(host) => {
            let port: u16 = args.get(1).and_then(|p| p.parse().ok()).unwrap_or(31337);
            connect_mode(host, port)
        }
        None => {
            eprintln!("usage: relaycat <host> <port>   |   relaycat -l <port>");
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        log::error!("session ended with an error: {}", e);
        std::process::exit(1);
    }
}

fn connect_mode(host: &str, port: u16) -> CoreResult<()> {
    log::info!("connecting to {}:{}", host, port);
    let connector = DirectConnector;
    let socket = connector.connect(host, port, Protocol::Tcp, Duration::from_secs(10))?;
    let stream = match socket {
        relaycat::connect::Socket::Tcp(s) => s,
        relaycat::connect::Socket::Udp(_) => {
            return Err(relaycat::error::CoreError::Protocol(
                "this demo binary only relays over TCP".to_string(),
            ))
        }
    };
    run_session(stream)
}

fn listen_mode(port: u16) -> CoreResult<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    log::info!("listening on port {}", port);
    let (stream, peer) = listener.accept()?;
    log::info!("accepted connection from {}", peer);
    run_session(stream)
}

fn run_session(stream: TcpStream) -> CoreResult<()> {
    let plain = PlainConnection::tcp(stream)?;
    let mut remote = Connection::plain(plain);
    let mut local = StdioStream;
    let config = TransferConfig::default();

    let outcome = transfer::run(&mut local, &mut remote, &config, transfer::Sinks::default())?;
    match outcome {
        TransferOutcome::BothClosed => log::info!("connection closed by both sides"),
        TransferOutcome::IdleTimeout => log::warn!("connection closed: idle timeout"),
        TransferOutcome::LocalEof => log::info!("local input reached EOF"),
        TransferOutcome::RemoteEof => log::info!("remote peer reached EOF"),
    }
    remote.close()
}
