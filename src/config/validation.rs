//! Configuration validation rules.

use thiserror::Error;

use crate::config::StoreConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl StoreConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - a private header name is empty or not a valid field-name token
    /// - `lock_ttl_secs` or `default_ttl_secs` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in &self.private_headers {
            if name.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "private_headers".into(),
                    reason: "header names must not be empty".into(),
                });
            }
            if !name.bytes().all(is_token_byte) {
                return Err(ConfigError::Invalid {
                    field: "private_headers".into(),
                    reason: format!("{name:?} is not a valid header name"),
                });
            }
        }

        if self.lock_ttl_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "lock_ttl_secs".into(),
                reason: "must be greater than 0; leave unset to disable locking".into(),
            });
        }

        if self.default_ttl_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "default_ttl_secs".into(),
                reason: "must be greater than 0; leave unset for no default expiry".into(),
            });
        }

        if self.private_headers.is_empty() {
            tracing::warn!("private_headers is empty; Set-Cookie will be cached");
        }

        Ok(())
    }
}

// RFC 9110 §5.6.2 tchar
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
