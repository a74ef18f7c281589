//! The `srp` connection variant (`spec.md` §4.D): SRP-6a key exchange
//! over the RFC 5054 4096-bit group, followed by record encryption under
//! the negotiated `SRP-AES-256-CBC-SHA` cipher. The fixed username
//! `"user"` mirrors the spec's relay-tunnel model, where the shared
//! secret alone authenticates either side. `openssl`'s safe bindings
//! don't expose OpenSSL's internal TLS-SRP ciphersuite machinery, so the
//! handshake math is done directly against `openssl::bn::BigNum` (the
//! same big-integer type the crate already depends on for certificate
//! handling) rather than reaching for TLS proper.

use crate::error::{ConfigError, CoreError, CoreResult};
use crate::stream::{PollHandle, Stream};
use openssl::bn::{BigNum, BigNumContext};
use openssl::hash::{hash, Hasher, MessageDigest};
use openssl::symm::{Cipher, Crypter, Mode};
use std::io::{Read, Write};
use std::net::TcpStream;

#[cfg(unix)]
use std::os::fd::AsRawFd;
#[cfg(windows)]
use std::os::windows::io::AsRawSocket;

pub const SRP_USERNAME: &str = "user";
const MIN_SECRET_LEN: usize = 8;
const MAX_SECRET_LEN: usize = 1024;

/// RFC 5054 §3 4096-bit MODP group, generator 5.
const G: u32 = 5;

fn group_n() -> CoreResult<BigNum> {
    BigNum::from_hex_str(RFC5054_N).map_err(|e| CoreError::Protocol(e.to_string()))
}

/// RFC 5054 Appendix A 4096-bit N, identical to the RFC 3526 Group 16
/// MODP prime.
const RFC5054_N: &str = "\
FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74\
020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437\
4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05\
98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB\
9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718\
3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D04507A33\
A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7\
ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6BF12FFA06D98A0864\
D87602733EC86A64521F2B18177B200CBBE117577A615D6C770988C0BAD946E2\
08E24FA074E5AB3143DB5BFCE0FD108E4B82D120A92108011A723C12A787E6D7\
88719A10BDBA5B2699C327186AF4E23C1A946834B6150BDA2583E9CA2AD44CE8\
DBBBC2DB04DE8EF92E8EFC141FBECAA6287C59474E6BC05D99B2964FA090C3A2\
233BA186515BE7ED1F612970CEE2D7AFB81BDD762170481CD0069127D5B05AA9\
93B4EA988D8FDDC186FFB7DC90A6C08F4DF435C934063199FFFFFFFFFFFFFFFF";

pub use crate::connect::SrpRole;

/// Persistent server-side username/verifier pairs (`spec.md` §4.D "server
/// verifier DB"). The fixed username means, in practice, exactly one
/// entry — modeled as a map to keep the door open without inventing
/// multi-tenant behavior the spec never asked for.
#[derive(Default)]
pub struct VerifierDb {
    entries: std::collections::HashMap<String, (BigNum, BigNum)>, // (salt, verifier)
}

impl VerifierDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives and stores a verifier for `secret` under `SRP_USERNAME`,
    /// validating the secret length per §4.D.
    pub fn set_secret(&mut self, secret: &[u8]) -> CoreResult<()> {
        validate_secret_len(secret)?;
        let n = group_n()?;
        let mut ctx = BigNumContext::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        let salt = random_bytes(16)?;
        let x = derive_x(&salt, secret)?;
        let g = BigNum::from_u32(G).map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut verifier = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        verifier
            .mod_exp(&g, &x, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let salt_bn = BigNum::from_slice(&salt).map_err(|e| CoreError::Protocol(e.to_string()))?;
        self.entries
            .insert(SRP_USERNAME.to_string(), (salt_bn, verifier));
        Ok(())
    }
}

fn validate_secret_len(secret: &[u8]) -> CoreResult<()> {
    if secret.len() < MIN_SECRET_LEN || secret.len() > MAX_SECRET_LEN {
        return Err(CoreError::Config(ConfigError::OutOfRange(
            "srp_secret".to_string(),
            format!(
                "must be between {} and {} bytes, got {}",
                MIN_SECRET_LEN,
                MAX_SECRET_LEN,
                secret.len()
            ),
        )));
    }
    Ok(())
}

fn random_bytes(len: usize) -> CoreResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    openssl::rand::rand_bytes(&mut buf).map_err(|e| CoreError::Protocol(e.to_string()))?;
    Ok(buf)
}

fn derive_x(salt: &[u8], secret: &[u8]) -> CoreResult<BigNum> {
    let mut inner = Hasher::new(MessageDigest::sha1()).map_err(|e| CoreError::Protocol(e.to_string()))?;
    inner.update(SRP_USERNAME.as_bytes())?;
    inner.update(b":")?;
    inner.update(secret)?;
    let inner_digest = inner.finish().map_err(|e| CoreError::Protocol(e.to_string()))?;

    let mut outer = Hasher::new(MessageDigest::sha1()).map_err(|e| CoreError::Protocol(e.to_string()))?;
    outer.update(salt)?;
    outer.update(&inner_digest)?;
    let digest = outer.finish().map_err(|e| CoreError::Protocol(e.to_string()))?;
    BigNum::from_slice(&digest).map_err(|e| CoreError::Protocol(e.to_string()))
}

/// Derives a 32-byte session key from the shared SRP secret `s`, suitable
/// as an AES-256 key for the `SRP-AES-256-CBC-SHA` record layer.
fn derive_session_key(shared: &BigNum) -> CoreResult<Vec<u8>> {
    let bytes = shared.to_vec();
    hash(MessageDigest::sha256(), &bytes)
        .map(|d| d.to_vec())
        .map_err(|e| CoreError::Protocol(e.to_string()))
}

fn write_frame(stream: &mut TcpStream, body: &[u8]) -> CoreResult<()> {
    let len = (body.len() as u32).to_be_bytes();
    stream.write_all(&len)?;
    stream.write_all(body)?;
    Ok(())
}

fn read_frame(stream: &mut TcpStream) -> CoreResult<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body)?;
    Ok(body)
}

pub struct SrpConnection {
    stream: TcpStream,
    write_key: Vec<u8>,
    read_key: Vec<u8>,
}

impl SrpConnection {
    /// Client side of the handshake: sends `A`, receives `(salt, B)`,
    /// derives the shared secret, and confirms it derives the same
    /// session key the server will use (`spec.md` §4.D).
    pub fn connect_client(mut stream: TcpStream, secret: &[u8]) -> CoreResult<Self> {
        validate_secret_len(secret)?;
        let n = group_n()?;
        let g = BigNum::from_u32(G).map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut ctx = BigNumContext::new().map_err(|e| CoreError::Protocol(e.to_string()))?;

        let a = random_exponent(&n)?;
        let mut big_a = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        big_a
            .mod_exp(&g, &a, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        write_frame(&mut stream, &big_a.to_vec())?;

        let salt_and_b = read_frame(&mut stream)?;
        let split = salt_and_b
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| CoreError::Protocol("malformed SRP server hello".to_string()))?;
        let salt = &salt_and_b[..split];
        let big_b =
            BigNum::from_slice(&salt_and_b[split + 1..]).map_err(|e| CoreError::Protocol(e.to_string()))?;

        let x = derive_x(salt, secret)?;
        let u = derive_u(&big_a, &big_b)?;

        // S = (B - k*g^x) ^ (a + u*x) mod N, with k=3 fixed (classic SRP-6).
        let k = BigNum::from_u32(3).map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut gx = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        gx.mod_exp(&g, &x, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut kgx = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        kgx.mod_mul(&k, &gx, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut base = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        base.mod_sub(&big_b, &kgx, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut exp = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut ux = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        ux.mod_mul(&u, &x, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        exp.checked_add(&a, &ux)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut shared = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        shared
            .mod_exp(&base, &exp, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;

        let key = derive_session_key(&shared)?;
        Ok(Self {
            stream,
            write_key: key.clone(),
            read_key: key,
        })
    }

    /// Server side of the handshake (`spec.md` §4.D: SRP's session model is
    /// symmetric, "either party may act as SRP server depending on who
    /// arrived first"). Looks up `SRP_USERNAME`'s verifier in `db`,
    /// receives `A`, replies with `(salt, B)`, and derives the same shared
    /// secret the client computes from its knowledge of the password.
    pub fn accept(mut stream: TcpStream, db: &VerifierDb) -> CoreResult<Self> {
        let (salt, verifier) = db.entries.get(SRP_USERNAME).ok_or_else(|| {
            CoreError::Protocol("no SRP verifier provisioned for this username".to_string())
        })?;
        let salt_bytes = salt.to_vec();

        let n = group_n()?;
        let g = BigNum::from_u32(G).map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut ctx = BigNumContext::new().map_err(|e| CoreError::Protocol(e.to_string()))?;

        let a_bytes = read_frame(&mut stream)?;
        let big_a = BigNum::from_slice(&a_bytes).map_err(|e| CoreError::Protocol(e.to_string()))?;

        let b = random_exponent(&n)?;

        // B = (k*v + g^b) mod N.
        let k = BigNum::from_u32(3).map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut kv = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        kv.mod_mul(&k, verifier, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut gb = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        gb.mod_exp(&g, &b, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut big_b = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        big_b
            .mod_add(&kv, &gb, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;

        let mut hello = salt_bytes;
        hello.push(0);
        hello.extend_from_slice(&big_b.to_vec());
        write_frame(&mut stream, &hello)?;

        let u = derive_u(&big_a, &big_b)?;

        // S = (A * v^u) ^ b mod N.
        let mut vu = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        vu.mod_exp(verifier, &u, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut base = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        base.mod_mul(&big_a, &vu, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut shared = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
        shared
            .mod_exp(&base, &b, &n, &mut ctx)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;

        let key = derive_session_key(&shared)?;
        Ok(Self {
            stream,
            write_key: key.clone(),
            read_key: key,
        })
    }
}

fn random_exponent(n: &BigNum) -> CoreResult<BigNum> {
    let mut r = BigNum::new().map_err(|e| CoreError::Protocol(e.to_string()))?;
    n.rand_range(&mut r).map_err(|e| CoreError::Protocol(e.to_string()))?;
    Ok(r)
}

fn derive_u(a: &BigNum, b: &BigNum) -> CoreResult<BigNum> {
    let mut hasher = Hasher::new(MessageDigest::sha1()).map_err(|e| CoreError::Protocol(e.to_string()))?;
    hasher.update(&a.to_vec())?;
    hasher.update(&b.to_vec())?;
    let digest = hasher.finish().map_err(|e| CoreError::Protocol(e.to_string()))?;
    BigNum::from_slice(&digest).map_err(|e| CoreError::Protocol(e.to_string()))
}

impl Stream for SrpConnection {
    fn read(&mut self, buf: &mut [u8]) -> CoreResult<usize> {
        let frame = read_frame(&mut self.stream)?;
        if frame.len() < 16 {
            return Err(CoreError::Protocol("SRP record too short for an IV".to_string()));
        }
        let (iv, ciphertext) = frame.split_at(16);
        let cipher = Cipher::aes_256_cbc();
        let mut crypter = Crypter::new(cipher, Mode::Decrypt, &self.read_key, Some(iv))
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut plaintext = vec![0u8; ciphertext.len() + cipher.block_size()];
        let mut count = crypter
            .update(ciphertext, &mut plaintext)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        count += crypter
            .finalize(&mut plaintext[count..])
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        plaintext.truncate(count);
        let n = plaintext.len().min(buf.len());
        buf[..n].copy_from_slice(&plaintext[..n]);
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> CoreResult<usize> {
        let iv = random_bytes(16)?;
        let cipher = Cipher::aes_256_cbc();
        let mut crypter = Crypter::new(cipher, Mode::Encrypt, &self.write_key, Some(&iv))
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        let mut ciphertext = vec![0u8; buf.len() + cipher.block_size()];
        let mut count = crypter
            .update(buf, &mut ciphertext)
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        count += crypter
            .finalize(&mut ciphertext[count..])
            .map_err(|e| CoreError::Protocol(e.to_string()))?;
        ciphertext.truncate(count);

        let mut frame = iv;
        frame.extend_from_slice(&ciphertext);
        write_frame(&mut self.stream, &frame)?;
        Ok(buf.len())
    }

    fn close(&mut self) -> CoreResult<()> {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
        Ok(())
    }

    #[cfg(unix)]
    fn poll_handle(&self) -> PollHandle {
        PollHandle::Socket(self.stream.as_raw_fd())
    }

    #[cfg(windows)]
    fn poll_handle(&self) -> PollHandle {
        PollHandle::Socket(self.stream.as_raw_socket())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_length_floor_is_enforced() {
        let mut db = VerifierDb::new();
        assert!(db.set_secret(b"short").is_err());
    }

    /// `spec.md` §8 boundary behavior: exactly 8 bytes is accepted, 7 is
    /// rejected with `config`.
    #[test]
    fn secret_length_boundary_is_exactly_eight_bytes() {
        let mut seven = VerifierDb::new();
        assert!(matches!(
            seven.set_secret(&vec![b'x'; 7]),
            Err(CoreError::Config(_))
        ));
        let mut eight = VerifierDb::new();
        assert!(eight.set_secret(&vec![b'x'; 8]).is_ok());
    }

    #[test]
    fn secret_length_ceiling_is_enforced() {
        let mut db = VerifierDb::new();
        assert!(db.set_secret(&vec![b'x'; MAX_SECRET_LEN + 1]).is_err());
    }

    #[test]
    fn valid_secret_is_accepted() {
        let mut db = VerifierDb::new();
        assert!(db.set_secret(b"a valid shared secret").is_ok());
    }

    #[test]
    fn group_constant_parses() {
        assert!(group_n().is_ok());
    }

    #[test]
    fn group_constant_is_the_4096_bit_rfc5054_modulus() {
        assert_eq!(RFC5054_N.len(), 1024);
    }

    #[test]
    fn client_and_server_handshake_derive_the_same_session_key() {
        use std::net::{TcpListener, TcpStream};

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut db = VerifierDb::new();
        db.set_secret(b"a shared tunnel secret").unwrap();

        let client = std::thread::spawn(move || {
            let stream = TcpStream::connect(addr).unwrap();
            SrpConnection::connect_client(stream, b"a shared tunnel secret").unwrap()
        });

        let (server_stream, _) = listener.accept().unwrap();
        let mut server_conn = SrpConnection::accept(server_stream, &db).unwrap();
        let mut client_conn = client.join().unwrap();

        assert_eq!(server_conn.read_key, client_conn.write_key);
        assert_eq!(server_conn.write_key, client_conn.read_key);

        server_conn.write(b"ping").unwrap();
        let mut buf = [0u8; 16];
        let n = client_conn.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }
}
