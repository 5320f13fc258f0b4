//! Activation one-time passwords.
//!
//! Only the SHA-256 digest of a code is ever stored.

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::config::OTP_LENGTH;

/// Freshly generated code, handed to the mailer once
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimePassword(String);

impl std::fmt::Debug for OneTimePassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OneTimePassword([REDACTED])")
    }
}

impl OneTimePassword {
    /// Random zero-padded decimal code
    pub fn generate() -> Self {
        let bound = 10u32.pow(OTP_LENGTH as u32);
        let code = rand::thread_rng().gen_range(0..bound);
        Self(format!("{:0width$}", code, width = OTP_LENGTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest persisted in place of the code
    pub fn digest(&self) -> String {
        digest(&self.0)
    }
}

/// Stored activation code for one email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp {
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Wrong guesses so far
    pub attempts: i32,
}

impl PendingOtp {
    pub fn issue(email: &str, otp: &OneTimePassword, ttl_minutes: i64) -> Self {
        Self {
            email: email.to_string(),
            code_hash: otp.digest(),
            expires_at: Utc::now() + chrono::Duration::minutes(ttl_minutes),
            attempts: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn accepts(&self, code: &str) -> bool {
        matches(code, &self.code_hash)
    }
}

/// Hex SHA-256 of a submitted code
pub fn digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

/// Compare a submitted code to a stored digest
pub fn matches(code: &str, stored_digest: &str) -> bool {
    digest(code) == stored_digest
}
