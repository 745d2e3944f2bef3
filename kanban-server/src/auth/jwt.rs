//! Bearer token issuance and verification
//!
//! Tokens carry the account email, an expiry and a `mode` claim that keeps
//! access and refresh tokens from standing in for each other.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::config::JwtConfig;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Purpose of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMode {
    AccessToken,
    RefreshToken,
}

/// JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub mode: TokenMode,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Response body of `/access` and `/refresh`
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

/// Signs and verifies tokens with one HMAC secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    header: Header,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            header: Header::new(config.algorithm),
            validation: Validation::new(config.algorithm),
            access_ttl: days(config.access_ttl_days),
            refresh_ttl: days(config.refresh_ttl_days),
        }
    }

    /// Sign a token of the given mode for an account.
    pub fn issue(&self, email: &str, mode: TokenMode) -> Result<String, AuthError> {
        let ttl = match mode {
            TokenMode::AccessToken => self.access_ttl,
            TokenMode::RefreshToken => self.refresh_ttl,
        };
        let expires = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(AuthError::Lifetime)?;
        let claims = Claims {
            email: email.to_owned(),
            mode,
            exp: expires.timestamp(),
        };
        Ok(encode(&self.header, &claims, &self.encoding)?)
    }

    /// Fresh access + refresh pair.
    pub fn issue_pair(&self, email: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            email: email.to_owned(),
            access_token: self.issue(email, TokenMode::AccessToken)?,
            refresh_token: self.issue(email, TokenMode::RefreshToken)?,
            token_type: "bearer",
        })
    }

    /// Check signature, expiry and mode.
    pub fn verify(&self, token: &str, expected: TokenMode) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::InvalidCredentials
        })?;

        if data.claims.mode != expected {
            tracing::debug!(mode = ?data.claims.mode, ?expected, "token used for the wrong purpose");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(data.claims)
    }
}

fn days(days: f64) -> Duration {
    let bound = if days < 0.0 { Duration::MIN } else { Duration::MAX };
    Duration::try_milliseconds((days * MILLIS_PER_DAY) as i64).unwrap_or(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    fn service(secret: &str, access_ttl_days: f64) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: secret.to_owned(),
            algorithm: Algorithm::HS256,
            access_ttl_days,
            refresh_ttl_days: 30.0,
        })
    }

    #[test]
    fn pair_round_trip() {
        let tokens = service("secret", 1.0);
        let pair = tokens.issue_pair("user@user.com").unwrap();
        assert_eq!(pair.token_type, "bearer");

        let claims = tokens.verify(&pair.access_token, TokenMode::AccessToken).unwrap();
        assert_eq!(claims.email, "user@user.com");
        assert!(claims.exp > Utc::now().timestamp());

        let claims = tokens.verify(&pair.refresh_token, TokenMode::RefreshToken).unwrap();
        assert_eq!(claims.mode, TokenMode::RefreshToken);
    }

    #[test]
    fn modes_are_not_interchangeable() {
        let tokens = service("secret", 1.0);
        let pair = tokens.issue_pair("user@user.com").unwrap();

        assert!(matches!(
            tokens.verify(&pair.access_token, TokenMode::RefreshToken),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            tokens.verify(&pair.refresh_token, TokenMode::AccessToken),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn foreign_and_malformed_tokens_are_rejected() {
        let ours = service("secret", 1.0);
        let theirs = service("other-secret", 1.0);
        let token = theirs.issue("user@user.com", TokenMode::AccessToken).unwrap();

        assert!(ours.verify(&token, TokenMode::AccessToken).is_err());
        assert!(ours.verify("not.a.token", TokenMode::AccessToken).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        // Two days in the past, well beyond the default leeway
        let tokens = service("secret", -2.0);
        let token = tokens.issue("user@user.com", TokenMode::AccessToken).unwrap();

        assert!(tokens.verify(&token, TokenMode::AccessToken).is_err());
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        let tokens = service("secret", 1e12);

        assert!(matches!(
            tokens.issue("user@user.com", TokenMode::AccessToken),
            Err(AuthError::Lifetime)
        ));
        assert!(tokens.issue_pair("user@user.com").is_err());
    }

    #[test]
    fn mode_claim_is_snake_case() {
        let json = serde_json::to_string(&TokenMode::RefreshToken).unwrap();
        assert_eq!(json, "\"refresh_token\"");
    }
}
