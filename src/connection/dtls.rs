//! The `dtls` connection variant (`spec.md` §4.D): `openssl`'s DTLS method
//! over a connected `UdpSocket`, with the RFC 6347 §4.2.1 cookie exchange
//! gating server-side handshake state. Mirrors `connection/tls.rs`'s
//! `SslConnector`/`SslStream` idiom, generalized from `TcpStream` to a
//! datagram socket wrapped in a small `Read`/`Write` adapter since DTLS's
//! record layer is connectionless at the wire.
//!
//! `openssl`'s safe bindings don't expose `BIO_dgram_get_peer`, so the
//! cookie below isn't bound to the client's source address the way
//! upstream OpenSSL's own cookie callback can reach via unsafe FFI into
//! the BIO. What it still provides: `SslStreamBuilder::stateless()` forces
//! a full round trip (HelloVerifyRequest, then a second ClientHello
//! echoing the cookie) before any `Ssl`/handshake state is allocated for
//! the accepting socket, which is the DoS mitigation §4.D actually asks
//! for — a single spoofed packet can't make the server commit resources.

use crate::config::{TlsConfig, TlsVersion};
use crate::error::{CoreError, CoreResult};
use crate::stream::{PollHandle, Stream};
use crate::connection::tls::handshake_with_deadline;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use openssl::ssl::{Ssl, SslContext, SslFiletype, SslMethod, SslOptions, SslStream, SslVerifyMode};
use std::io::{Read, Write};
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::fd::AsRawFd;
#[cfg(windows)]
use std::os::windows::io::AsRawSocket;

fn dtls_version(version: TlsVersion) -> CoreResult<openssl::ssl::SslVersion> {
    use openssl::ssl::SslVersion as V;
    match version {
        TlsVersion::Dtls1_0 => Ok(V::DTLS1),
        TlsVersion::Dtls1_2 => Ok(V::DTLS1_2),
        TlsVersion::Dtls1_3 => Ok(V::DTLS1_2), // openssl has no distinct DTLS1_3 constant yet
        other => Err(CoreError::Config(crate::error::ConfigError::InvalidValue(
            "tls_version".to_string(),
            format!("{:?} is a TLS version, not valid for a DTLS context", other),
        ))),
    }
}

/// Adapts a connected `UdpSocket` to `Read`/`Write` so it can back an
/// `SslStream`. Each datagram is one DTLS record (or fragment); `openssl`
/// handles reassembly internally.
#[derive(Debug)]
struct DatagramIo {
    socket: UdpSocket,
}

impl Read for DatagramIo {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.socket.recv(buf)
    }
}

impl Write for DatagramIo {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.socket.send(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn hmac_cookie(secret: &[u8; 32]) -> Result<Vec<u8>, openssl::error::ErrorStack> {
    let key = PKey::hmac(secret)?;
    let mut signer = Signer::new(MessageDigest::sha256(), &key)?;
    // No per-ClientHello transcript is reachable through the safe API, so
    // the signed message is the secret's own identity marker; see the
    // module doc comment for what this does and doesn't defend against.
    signer.update(b"relaycat-dtls-cookie")?;
    signer.sign_to_vec()
}

fn build_context(config: &TlsConfig, cookie_secret: Option<Arc<[u8; 32]>>) -> CoreResult<SslContext> {
    config.validate().map_err(CoreError::Config)?;

    let mut builder = SslContext::builder(SslMethod::dtls()).map_err(CoreError::from)?;
    builder.set_min_proto_version(Some(dtls_version(config.min_version)?))?;
    if let Some(max) = config.max_version {
        builder.set_max_proto_version(Some(dtls_version(max)?))?;
    }

    let ciphers = if config.cipher_suites.is_empty() {
        "ECDHE+AESGCM:ECDHE+CHACHA20:DHE+AESGCM:DHE+CHACHA20".to_string()
    } else {
        config.cipher_suites.join(":")
    };
    builder.set_cipher_list(&ciphers)?;

    if config.verify_peer {
        builder.set_verify(SslVerifyMode::PEER);
        if let Some(trust_file) = &config.trust_file {
            builder.set_ca_file(trust_file)?;
        }
    } else {
        builder.set_verify(SslVerifyMode::NONE);
    }

    if let (Some(cert), Some(key)) = (&config.cert_file, &config.key_file) {
        builder.set_certificate_file(cert, SslFiletype::PEM)?;
        builder.set_private_key_file(key, SslFiletype::PEM)?;
    }

    builder.set_options(SslOptions::NO_COMPRESSION);
    builder.set_options(SslOptions::NO_TICKET);
    builder.set_options(SslOptions::NO_RENEGOTIATION);

    if let Some(secret) = cookie_secret {
        let gen_secret = Arc::clone(&secret);
        builder.set_cookie_generate_cb(move |_ssl, buf| {
            let cookie = hmac_cookie(&gen_secret)?;
            let len = cookie.len().min(buf.len());
            buf[..len].copy_from_slice(&cookie[..len]);
            Ok(len)
        });
        let verify_secret = Arc::clone(&secret);
        builder.set_cookie_verify_cb(move |_ssl, received| {
            match hmac_cookie(&verify_secret) {
                Ok(expected) => openssl::memcmp::eq(&expected, received),
                Err(_) => false,
            }
        });
    }

    Ok(builder.build())
}

pub struct DtlsConnection {
    inner: SslStream<DatagramIo>,
}

impl DtlsConnection {
    /// Client handshake: the peer address is already fixed by connecting
    /// `socket` before calling this (`spec.md` §4.D hostname verification
    /// still applies against `config.server_name`).
    pub fn connect(socket: UdpSocket, config: &TlsConfig) -> CoreResult<Self> {
        let ctx = build_context(config, None)?;
        let mut ssl = Ssl::new(&ctx).map_err(CoreError::from)?;
        let server_name = config.server_name.as_deref().unwrap_or("");
        if config.verify_peer && !server_name.is_empty() {
            ssl.set_hostname(server_name)
                .map_err(|e| CoreError::Protocol(e.to_string()))?;
            ssl.param_mut().set_host(server_name).map_err(CoreError::from)?;
        }

        socket.set_nonblocking(true)?;
        let io = DatagramIo { socket };
        let builder = openssl::ssl::SslStreamBuilder::new(ssl, io);
        let inner = handshake_with_deadline(builder.connect(), config.handshake_timeout_ms)?;
        Ok(Self { inner })
    }

    /// Server accept with the cookie exchange gating handshake state
    /// (`spec.md` §4.D "DTLS cookie exchange", §8 scenario 4). `socket`
    /// must already be connected to the candidate peer — demultiplexing
    /// datagrams by source address across many clients sharing one
    /// listening socket is the caller's job (§6's connection-establishment
    /// external collaborator), same division as the TCP accept loop.
    pub fn accept(socket: UdpSocket, config: &TlsConfig) -> CoreResult<Self> {
        let mut secret_bytes = [0u8; 32];
        openssl::rand::rand_bytes(&mut secret_bytes).map_err(CoreError::from)?;
        let secret = Arc::new(secret_bytes);
        let ctx = build_context(config, Some(secret))?;

        socket.set_nonblocking(true)?;
        let io = DatagramIo { socket };
        let ssl = Ssl::new(&ctx).map_err(CoreError::from)?;
        let mut builder = openssl::ssl::SslStreamBuilder::new(ssl, io);

        // `stateless()` writes a HelloVerifyRequest and returns `false`
        // until the client echoes back a valid cookie in a second
        // ClientHello; no handshake state is allocated before that. On a
        // non-blocking socket a round trip still in flight also reads as
        // `false`, so this is the retry/deadline structure `spec.md` §4.D
        // wants for DTLS (~50x the configured RTT estimate), bounded by
        // the same `handshake_timeout_ms` ceiling as the handshake itself.
        let deadline = (config.handshake_timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(config.handshake_timeout_ms));
        while !builder.stateless().map_err(CoreError::from)? {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(CoreError::Timeout("dtls cookie exchange"));
                }
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        let inner = handshake_with_deadline(builder.accept(), config.handshake_timeout_ms)?;
        Ok(Self { inner })
    }
}

impl Stream for DtlsConnection {
    fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize> {
        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(CoreError::WouldBlock),
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    fn write(&mut self, buf: &[u8]) -> CoreResult<usize> {
        match self.inner.write(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(CoreError::WouldBlock),
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    fn close(&mut self) -> CoreResult<()> {
        // DTLS close-notify is best-effort (`spec.md` §4.D) — no peer ack
        // round trip unlike TLS's two-phase shutdown.
        let _ = self.inner.shutdown();
        Ok(())
    }

    #[cfg(unix)]
    fn poll_handle(&self) -> PollHandle {
        PollHandle::Socket(self.inner.get_ref().socket.as_raw_fd())
    }

    #[cfg(windows)]
    fn poll_handle(&self) -> PollHandle {
        PollHandle::Socket(self.inner.get_ref().socket.as_raw_socket())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_tls_version_as_dtls_min() {
        let mut config = TlsConfig::default();
        config.min_version = TlsVersion::Tls1_2;
        assert!(build_context(&config, None).is_err());
    }

    #[test]
    fn accepts_dtls_floor_version() {
        // Default `min_version` is `Tls1_2`, the wrong family for a DTLS
        // context — exercise the DTLS-appropriate floor explicitly.
        let mut config = TlsConfig::default();
        config.min_version = TlsVersion::Dtls1_2;
        assert!(build_context(&config, None).is_ok());
    }

    #[test]
    fn cookie_is_deterministic_for_a_fixed_secret_and_rejects_tampering() {
        let secret = [7u8; 32];
        let cookie = hmac_cookie(&secret).unwrap();
        assert!(openssl::memcmp::eq(&cookie, &hmac_cookie(&secret).unwrap()));

        let mut tampered = cookie.clone();
        tampered[0] ^= 0xFF;
        assert!(!openssl::memcmp::eq(&cookie, &tampered));
    }
}
