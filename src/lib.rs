//! Bidirectional transfer engine for a netcat-class network utility:
//! TCP/UDP/SCTP/IPC streams, TLS/DTLS/SRP, telnet option negotiation, and
//! a multiplexed exec session. CLI argument parsing, proxy traversal,
//! and relay-tunnel discovery are external collaborators this crate
//! hands prepared streams to, not things it implements itself.

pub mod access;
pub mod config;
pub mod connect;
pub mod connection;
pub mod error;
pub mod exec;
pub mod sink;
pub mod stream;
pub mod terminal;
pub mod transfer;

pub use access::{AccessControl, AddressList};
pub use config::{ExecConfig, TlsConfig, TlsVersion, TransferConfig};
pub use connect::{Connector, DirectConnector, Protocol, RelayTunnel, Socket, SrpRole};
pub use connection::Connection;
pub use error::{ConfigError, CoreError, CoreResult};
pub use exec::{run_exec, ExecStream, FlowBuffer, GlobalFlow};
pub use sink::{Direction, HexDumpSink, MirrorSink, OutputSink};
pub use stream::{PollHandle, Stream};
pub use terminal::{CrosstermTerminal, TerminalControl, WindowSize};
pub use transfer::TransferOutcome;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
