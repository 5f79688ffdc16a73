//! # Engine Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//! Everything is an explicit struct handed to constructors at startup;
//! there is no ambient global state.
//!
//! ## Security Requirements
//!
//! - `gate_secret` MUST NOT be the default zero value in production
//! - A production engine loads its signing key from PEM; generated keys
//!   are for development only

use std::path::PathBuf;

/// Where version bytes are kept.
#[derive(Debug, Clone, Default)]
pub enum StorageBackend {
    /// Volatile in-memory storage (tests, demos).
    #[default]
    InMemory,
    /// Filesystem storage rooted at the given directory.
    Filesystem(PathBuf),
}

/// Signing key configuration.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    /// Path to an unencrypted PKCS#8 PEM private key.
    pub private_key_pem_path: Option<PathBuf>,
    /// Generate a throwaway key when no path is configured.
    pub generate_dev_key: bool,
    /// Modulus size for generated keys.
    pub dev_key_bits: usize,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            private_key_pem_path: None,
            generate_dev_key: true,
            dev_key_bits: shared_crypto::signing::DEFAULT_KEY_BITS,
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// HMAC secret authenticating download capability tokens.
    pub gate_secret: [u8; 32],
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            gate_secret: [0u8; 32],
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Byte storage backend.
    pub storage: StorageBackend,
    /// Signing key configuration.
    pub signing: SigningConfig,
    /// Security configuration.
    pub security: SecurityConfig,
    /// Validity window of download capabilities, in seconds.
    pub download_ttl_secs: Option<i64>,
}

impl EngineConfig {
    /// Development configuration: in-memory storage, generated key,
    /// random gate secret.
    pub fn development() -> Self {
        Self {
            security: SecurityConfig {
                gate_secret: rand::random(),
            },
            ..Self::default()
        }
    }

    /// Validate configuration for production readiness.
    ///
    /// Returns `Err` if the gate secret is the default zero value or the
    /// signing key would be generated rather than loaded.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.security.gate_secret == [0u8; 32] {
            return Err(ConfigError::InsecureGateSecret);
        }
        if self.signing.private_key_pem_path.is_none() && self.signing.generate_dev_key {
            return Err(ConfigError::GeneratedSigningKey);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Gate secret is not set (zero value).
    InsecureGateSecret,
    /// No managed signing key; a dev key would be generated.
    GeneratedSigningKey,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InsecureGateSecret => {
                write!(
                    f,
                    "SECURITY VIOLATION: gate secret is the default zero value. \
                     Provide a real secret in the engine configuration."
                )
            }
            ConfigError::GeneratedSigningKey => {
                write!(
                    f,
                    "SECURITY VIOLATION: production engines must load a managed \
                     signing key; refusing to generate one at startup."
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_fails_production_validation() {
        let config = EngineConfig::default();
        assert!(config.validate_for_production().is_err());
    }

    #[test]
    fn test_managed_key_and_secret_pass_validation() {
        let config = EngineConfig {
            security: SecurityConfig {
                gate_secret: [7u8; 32],
            },
            signing: SigningConfig {
                private_key_pem_path: Some("/etc/veridoc/signing.pem".into()),
                generate_dev_key: false,
                dev_key_bits: 2048,
            },
            ..EngineConfig::default()
        };
        assert!(config.validate_for_production().is_ok());
    }
}
