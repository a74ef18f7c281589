//! # Telnet Negotiation Library
//!
//! A Rust library for implementing Telnet protocol negotiation as defined in:
//! - RFC 854: Telnet Protocol Specification
//! - RFC 1143: The Q Method of Implementing TELNET Option Negotiation
//! - RFC 857 (Echo), RFC 1091 (Terminal Type), RFC 1073 (NAWS)
//!
//! ## Architecture
//!
//! - `protocol`: Telnet protocol constants and wire types (RFC 854/855)
//! - `negotiation`: RFC 1143 Q-method option negotiation state machine
//! - `parser`: IAC byte-stream parser
//! - `options`: Individual option implementations (Echo, Terminal Type, NAWS)
//! - `stream`: `TelnetStream`, a `TcpStream`-owning convenience wrapper
//! - `engine`: `TelnetEngine`, a transport-agnostic negotiation/filtering
//!   engine for callers that already own their own connection (TLS, SRP,
//!   IPC...) and just need IAC handling layered on top of it.

pub mod engine;
pub mod negotiation;
pub mod options;
pub mod parser;
pub mod protocol;
pub mod stream;

pub use engine::{FeedResult, TelnetEngine, TelnetSignal};
pub use negotiation::{OptionNegotiator, OptionState, Side};
pub use options::{
    EchoOption, EchoState, NawsOption, OptionError, SubNegotiationCommand, TelnetOptionHandler,
    TerminalInfo, TerminalTypeOption, WindowSize,
};
pub use parser::{ParseResult, TelnetParser};
pub use protocol::{TelnetCommand, TelnetOption, TelnetSequence, IAC};
pub use stream::TelnetStream;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supported Telnet RFCs
pub const SUPPORTED_RFCS: &[&str] = &[
    "RFC 854 - Telnet Protocol Specification",
    "RFC 1143 - The Q Method of Implementing TELNET Option Negotiation",
    "RFC 857 - Telnet Echo Option",
    "RFC 1091 - Telnet Terminal-Type Option",
    "RFC 1073 - Telnet Window Size Option (NAWS)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_rfc_list() {
        assert!(SUPPORTED_RFCS.contains(&"RFC 854 - Telnet Protocol Specification"));
    }
}
