//! Configuration structs named in `spec.md` §3: `TransferConfig`,
//! `ExecConfig` (with its `Buffers`/`Timeouts`/`Flow` nested structs), and
//! `TlsConfig`. Validation lives on each struct's `validate()`, mirroring
//! the teacher's `parse_*` functions that return `Result` instead of
//! panicking on a bad value.

use crate::error::ConfigError;

/// §3 "Transfer configuration".
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub idle_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub send_only: bool,
    pub recv_only: bool,
    pub close_on_eof: bool,
    pub no_shutdown: bool,
    pub crlf_translate: bool,
    pub delay_ms: u64,
    pub read_buffer_bytes: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 0,
            connect_timeout_ms: 10_000,
            send_only: false,
            recv_only: false,
            close_on_eof: false,
            no_shutdown: false,
            crlf_translate: false,
            delay_ms: 0,
            read_buffer_bytes: 64 * 1024,
        }
    }
}

impl TransferConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_only && self.recv_only {
            return Err(ConfigError::InvalidValue(
                "send_only/recv_only".to_string(),
                "both set".to_string(),
            ));
        }
        if self.read_buffer_bytes == 0 {
            return Err(ConfigError::OutOfRange(
                "read_buffer_bytes".to_string(),
                "must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

/// §3 "Exec session configuration" — Buffers nested struct.
#[derive(Debug, Clone, Copy)]
pub struct ExecBuffers {
    pub stdin_capacity: usize,
    pub stdout_capacity: usize,
    pub stderr_capacity: usize,
}

impl Default for ExecBuffers {
    fn default() -> Self {
        Self {
            stdin_capacity: 32 * 1024,
            stdout_capacity: 64 * 1024,
            stderr_capacity: 32 * 1024,
        }
    }
}

/// Exec session configuration — Timeouts nested struct.
#[derive(Debug, Clone, Copy)]
pub struct ExecTimeouts {
    pub connection_ms: u64,
    pub idle_ms: u64,
    pub overall_ms: u64,
}

impl Default for ExecTimeouts {
    fn default() -> Self {
        Self {
            connection_ms: 10_000,
            idle_ms: 0,
            overall_ms: 0,
        }
    }
}

/// Exec session configuration — Flow nested struct.
#[derive(Debug, Clone, Copy)]
pub struct ExecFlow {
    pub max_total_buffer_bytes: usize,
    pub pause_threshold_pct: f64,
    pub resume_threshold_pct: f64,
}

impl Default for ExecFlow {
    fn default() -> Self {
        Self {
            max_total_buffer_bytes: 256 * 1024,
            pause_threshold_pct: 0.85,
            resume_threshold_pct: 0.60,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    pub buffers: ExecBuffers,
    pub timeouts: ExecTimeouts,
    pub flow: ExecFlow,
}

impl ExecConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.flow.pause_threshold_pct) {
            return Err(ConfigError::OutOfRange(
                "pause_threshold_pct".to_string(),
                "must be in [0.0, 1.0]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.flow.resume_threshold_pct) {
            return Err(ConfigError::OutOfRange(
                "resume_threshold_pct".to_string(),
                "must be in [0.0, 1.0]".to_string(),
            ));
        }
        if self.flow.resume_threshold_pct >= self.flow.pause_threshold_pct {
            return Err(ConfigError::OutOfRange(
                "resume_threshold_pct".to_string(),
                "must be strictly below pause_threshold_pct".to_string(),
            ));
        }
        if self.flow.max_total_buffer_bytes == 0 {
            return Err(ConfigError::OutOfRange(
                "max_total_buffer_bytes".to_string(),
                "must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

/// §3 "TLS version is a closed enum"; `tls1.2` is the enforced floor
/// unless a build-time escape hatch is set (§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls1_0,
    Tls1_1,
    Tls1_2,
    Tls1_3,
    Dtls1_0,
    Dtls1_2,
    Dtls1_3,
}

/// §3 "TLS/DTLS configuration". Version and cipher fields are already
/// the typed/list forms the `openssl` builders want — turning a config
/// file's raw strings into these is the external config-loader's job
/// (`spec.md` §1), this struct is what that loader hands the core.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub verify_peer: bool,
    pub trust_file: Option<String>,
    pub crl_file: Option<String>,
    pub server_name: Option<String>,
    pub alpn_protocols: Vec<String>,
    pub cipher_suites: Vec<String>,
    pub min_version: TlsVersion,
    pub max_version: Option<TlsVersion>,
    /// Build-time escape hatch below the TLS 1.2 / DTLS 1.2 floor (§4.D).
    pub allow_legacy_versions: bool,
    pub dtls_mtu: u32,
    pub dtls_initial_timeout_ms: u64,
    pub dtls_replay_window: u32,
    /// Wall-clock ceiling on the handshake, TLS and DTLS alike (§4.D
    /// "maximum handshake wall time is 30 seconds by default for TLS").
    /// `0` disables the deadline, matching `ExecTimeouts::overall_ms`'s
    /// "0 means no ceiling" convention.
    pub handshake_timeout_ms: u64,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_file: None,
            key_file: None,
            verify_peer: true,
            trust_file: None,
            crl_file: None,
            server_name: None,
            alpn_protocols: Vec::new(),
            cipher_suites: Vec::new(),
            min_version: TlsVersion::Tls1_2,
            max_version: None,
            allow_legacy_versions: false,
            dtls_mtu: 1200,
            dtls_initial_timeout_ms: 1000,
            dtls_replay_window: 64,
            handshake_timeout_ms: 30_000,
        }
    }
}

impl TlsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.cert_file {
            if path.len() > 4096 {
                return Err(ConfigError::OutOfRange(
                    "cert_file".to_string(),
                    "path exceeds 4096 bytes".to_string(),
                ));
            }
            if self.key_file.is_none() {
                return Err(ConfigError::MissingField("key_file".to_string()));
            }
        }

        let below_floor = matches!(self.min_version, TlsVersion::Tls1_0 | TlsVersion::Tls1_1)
            || self.min_version == TlsVersion::Dtls1_0;
        if below_floor && !self.allow_legacy_versions {
            return Err(ConfigError::OutOfRange(
                "min_version".to_string(),
                "below the enforced TLS 1.2 / DTLS 1.2 floor".to_string(),
            ));
        }
        if let Some(max) = self.max_version {
            if self.min_version > max {
                return Err(ConfigError::OutOfRange(
                    "min_version/max_version".to_string(),
                    "min exceeds max".to_string(),
                ));
            }
        }
        if self.dtls_mtu < 256 {
            return Err(ConfigError::OutOfRange(
                "dtls_mtu".to_string(),
                "below minimum usable MTU".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_config_rejects_send_and_recv_only() {
        let mut cfg = TransferConfig::default();
        cfg.send_only = true;
        cfg.recv_only = true;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn exec_flow_rejects_resume_above_pause() {
        let mut cfg = ExecConfig::default();
        cfg.flow.resume_threshold_pct = 0.90;
        cfg.flow.pause_threshold_pct = 0.85;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn exec_flow_defaults_are_valid() {
        assert!(ExecConfig::default().validate().is_ok());
    }

    #[test]
    fn tls_config_requires_key_when_cert_present() {
        let mut cfg = TlsConfig::default();
        cfg.cert_file = Some("cert.pem".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tls_config_rejects_sub_floor_min_version_by_default() {
        let mut cfg = TlsConfig::default();
        cfg.min_version = TlsVersion::Tls1_0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tls_config_allows_legacy_when_escape_hatch_set() {
        let mut cfg = TlsConfig::default();
        cfg.allow_legacy_versions = true;
        cfg.min_version = TlsVersion::Tls1_0;
        assert!(cfg.validate().is_ok());
    }
}
