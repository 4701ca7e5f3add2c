//! Token generation.
//!
//! Authorization codes and access tokens are opaque random strings with an
//! expiration. They carry no claims; the session record holds the context.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use time::{Duration, OffsetDateTime};

use crate::AuthResult;
use crate::error::AuthError;

/// Default number of random bytes per token (256 bits).
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Minimum number of random bytes per token (128 bits).
pub const MIN_TOKEN_BYTES: usize = 16;

/// Longest lifetime a generator accepts.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::days(7);

/// A freshly generated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Base64url-encoded random value.
    pub value: String,
    /// Point in time after which the token is invalid.
    pub expiration: OffsetDateTime,
    /// Lifetime the expiration was computed from.
    pub lifetime: Duration,
}

/// Generates time-bound random tokens with a fixed lifetime.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    lifetime: Duration,
    byte_length: usize,
}

impl TokenGenerator {
    /// Creates a generator producing 256-bit tokens.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `lifetime` is not positive.
    pub fn new(lifetime: Duration) -> AuthResult<Self> {
        Self::with_byte_length(lifetime, DEFAULT_TOKEN_BYTES)
    }

    /// Creates a generator with a custom token size.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `lifetime` is not positive or above
    /// [`MAX_TOKEN_LIFETIME`], or `byte_length` is below [`MIN_TOKEN_BYTES`].
    pub fn with_byte_length(lifetime: Duration, byte_length: usize) -> AuthResult<Self> {
        if !lifetime.is_positive() {
            return Err(AuthError::configuration("token lifetime must be positive"));
        }
        if lifetime > MAX_TOKEN_LIFETIME {
            return Err(AuthError::configuration(format!(
                "token lifetime must not exceed {MAX_TOKEN_LIFETIME}"
            )));
        }
        if byte_length < MIN_TOKEN_BYTES {
            return Err(AuthError::configuration(format!(
                "tokens need at least {MIN_TOKEN_BYTES} random bytes, got {byte_length}"
            )));
        }
        Ok(Self {
            lifetime,
            byte_length,
        })
    }

    /// Returns the configured lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Generates a new token expiring `lifetime` from now.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the expiration is not representable.
    pub fn create_token(&self) -> AuthResult<Token> {
        self.create_token_at(OffsetDateTime::now_utc())
    }

    /// Generates a new token expiring `lifetime` from `now`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if `now + lifetime` is not representable.
    pub fn create_token_at(&self, now: OffsetDateTime) -> AuthResult<Token> {
        let expiration = now
            .checked_add(self.lifetime)
            .ok_or_else(|| AuthError::internal("token expiration out of range"))?;

        let mut bytes = vec![0u8; self.byte_length];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        Ok(Token {
            value: URL_SAFE_NO_PAD.encode(&bytes),
            expiration,
            lifetime: self.lifetime,
        })
    }
}
