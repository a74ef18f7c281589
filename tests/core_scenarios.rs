//! Black-box scenarios from `spec.md` §8, run end-to-end through
//! `transfer::run` over real loopback sockets (so `mio` has an actual
//! descriptor to poll) plus a couple of scenarios that exercise a single
//! component directly where wiring two full transfer ends would only
//! add noise (`SPEC_FULL.md` §10.4).

use relaycat::config::{ExecConfig, TransferConfig};
use relaycat::connection::{Connection, PlainConnection};
use relaycat::error::CoreResult;
use relaycat::exec::{run_exec, ExecStream};
use relaycat::stream::Stream;
use relaycat::transfer::{self, TransferOutcome};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

/// A connected TCP pair usable as either side of a transfer. Returns
/// `(near, far)` where writes into `far` (via a plain `std::net`
/// handle) become readable from `near` through the `Stream` trait.
fn tcp_pair() -> (PlainConnection, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let far = TcpStream::connect(addr).unwrap();
    let (near, _) = listener.accept().unwrap();
    near.set_nodelay(true).unwrap();
    far.set_nodelay(true).unwrap();
    (PlainConnection::tcp(near).unwrap(), far)
}

fn run_with_deadline(
    local: &mut dyn Stream,
    remote: &mut dyn Stream,
    config: &TransferConfig,
) -> CoreResult<TransferOutcome> {
    transfer::run(local, remote, config, transfer::Sinks::default())
}

#[test]
fn echo_through_plain_tcp() {
    let (mut local_conn, mut local_far) = tcp_pair();
    let (mut remote_conn, mut remote_far) = tcp_pair();

    local_far.write_all(b"hello world").unwrap();
    local_far.shutdown(std::net::Shutdown::Write).unwrap();

    let mut config = TransferConfig::default();
    config.close_on_eof = true;
    let outcome = run_with_deadline(&mut local_conn, &mut remote_conn, &config).unwrap();
    assert_eq!(outcome, TransferOutcome::BothClosed);

    remote_far
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = [0u8; 64];
    let n = remote_far.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"hello world");
}

#[test]
fn crlf_translation_applies_to_local_to_remote_direction_only() {
    let (mut local_conn, mut local_far) = tcp_pair();
    let (mut remote_conn, mut remote_far) = tcp_pair();

    local_far.write_all(b"line one\nline two\n").unwrap();
    local_far.shutdown(std::net::Shutdown::Write).unwrap();

    let mut config = TransferConfig::default();
    config.crlf_translate = true;
    config.close_on_eof = true;
    run_with_deadline(&mut local_conn, &mut remote_conn, &config).unwrap();

    remote_far
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = [0u8; 64];
    let n = remote_far.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"line one\r\nline two\r\n");
}

#[test]
fn send_only_never_relays_remote_to_local() {
    let (mut local_conn, mut local_far) = tcp_pair();
    let (mut remote_conn, mut remote_far) = tcp_pair();

    local_far.write_all(b"outbound").unwrap();
    local_far.shutdown(std::net::Shutdown::Write).unwrap();
    remote_far.write_all(b"should not come back").unwrap();
    remote_far.shutdown(std::net::Shutdown::Write).unwrap();

    let mut config = TransferConfig::default();
    config.send_only = true;
    run_with_deadline(&mut local_conn, &mut remote_conn, &config).unwrap();

    remote_far
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = [0u8; 64];
    let n = remote_far.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"outbound");

    local_far
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = [0u8; 64];
    let result = local_far.read(&mut buf);
    match result {
        Ok(0) => {}
        Ok(n) => panic!("send_only leaked {} bytes back to local", n),
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
fn telnet_naws_on_resize_produces_exact_wire_bytes() {
    let mut engine = telnet_negotiation::TelnetEngine::new();
    let fed = engine.feed(&[telnet_negotiation::IAC, 253, 31]); // IAC DO NAWS
    assert!(fed.outbound.iter().any(|&b| b == telnet_negotiation::IAC));

    engine.notify_resize(132, 40);
    let pending = engine.maintain();
    assert_eq!(pending, vec![255, 250, 31, 0, 132, 0, 40, 255, 240]);
}

#[test]
fn telnet_connection_sends_initial_offer_through_a_real_socket() {
    let (inner_conn, mut far) = tcp_pair();
    let mut telnet = Connection::telnet(Connection::plain(inner_conn)).unwrap();

    far.set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = [0u8; 64];
    let n = far.read(&mut buf).unwrap();
    assert!(n > 0);
    assert_eq!(buf[0], telnet_negotiation::IAC);
    let _ = telnet.close();
}

/// `spec.md` §8 scenario 5: `max_total_buffer_bytes=1024, pause=0.85,
/// resume=0.60`; 900 bytes into the stdout channel pauses the source,
/// draining to 600 buffered bytes resumes it.
#[test]
fn exec_flow_pauses_before_max_buffer_and_resumes_after_drain() {
    let mut config = ExecConfig::default();
    config.flow.max_total_buffer_bytes = 1024;
    config.flow.pause_threshold_pct = 0.85;
    config.flow.resume_threshold_pct = 0.60;
    config.buffers.stdout_capacity = 1024;

    let (_stdin_buf, mut stdout_buf, _stderr_buf, global) =
        relaycat::exec::flow_buffers_from_config(&config);

    let taken = stdout_buf.push(&vec![0u8; 900]);
    global.record_push(taken);
    assert!(global.should_pause());

    let drained = stdout_buf.drain(300);
    global.record_drain(drained.len());
    assert!(!global.should_pause());
    assert_eq!(stdout_buf.len(), 600);
}

#[test]
fn exec_session_runs_echo_and_captures_stdout() {
    let config = ExecConfig::default();
    let mut command = std::process::Command::new("echo");
    command.arg("hi there");
    let mut collected = Vec::new();
    let code = run_exec(
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
    assert_eq!(collected, b"hi there\n");
}
