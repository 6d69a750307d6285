//! Token issuance and validation for API authentication.
//!
//! Tokens are HMAC-SHA256 based, scoped to the authenticated subject.
//! Format: `vplan_tk_<subject>_<hmac_hex>`

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Token prefix used to identify vplan API tokens.
const TOKEN_PREFIX: &str = "vplan_tk_";

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("missing token secret")]
    MissingSecret,
}

/// Configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// The HMAC secret key bytes.
    pub secret: Vec<u8>,
}

impl TokenConfig {
    /// Create a new TokenConfig with the given secret.
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Create a TokenConfig from the `VPLAN_TOKEN_SECRET` environment
    /// variable.
    ///
    /// The value must be a hex-encoded string (as written by `vplan init`).
    /// Returns an error if the variable is missing or contains invalid hex.
    pub fn from_env() -> Result<Self, TokenError> {
        let secret_hex =
            std::env::var("VPLAN_TOKEN_SECRET").map_err(|_| TokenError::MissingSecret)?;
        let secret = hex::decode(&secret_hex).map_err(|e| {
            TokenError::InvalidFormat(format!("VPLAN_TOKEN_SECRET is not valid hex: {e}"))
        })?;
        Ok(Self::new(secret))
    }
}

/// Claims extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// The subject (API username) this token was issued to.
    pub subject: String,
}

/// The credential pair accepted by the login endpoint.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub username: String,
    pub password: String,
}

impl ApiCredentials {
    /// Check a submitted username/password pair against the configured one.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// Generate an API token for the given subject.
///
/// The token format is: `vplan_tk_<subject>_<hmac_hex>`
/// where the HMAC-SHA256 is computed over the subject bytes.
pub fn generate_token(config: &TokenConfig, subject: &str) -> String {
    let mac = compute_hmac(&config.secret, subject.as_bytes());
    let hmac_hex = hex::encode(mac);
    format!("{TOKEN_PREFIX}{subject}_{hmac_hex}")
}

/// Validate an API token and extract its claims.
///
/// This function:
/// 1. Parses the token format
/// 2. Recomputes the HMAC
/// 3. Uses constant-time comparison to verify the HMAC
/// 4. Returns the extracted claims on success
pub fn validate_token(config: &TokenConfig, token: &str) -> Result<TokenClaims, TokenError> {
    let rest = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
        TokenError::InvalidFormat("token must start with 'vplan_tk_'".to_string())
    })?;

    // The HMAC hex follows the LAST underscore; the subject may itself
    // contain underscores.
    let (subject, hmac_hex) = rest.rsplit_once('_').ok_or_else(|| {
        TokenError::InvalidFormat("expected underscore between subject and hmac".to_string())
    })?;

    if subject.is_empty() {
        return Err(TokenError::InvalidFormat("empty subject".to_string()));
    }

    let provided_mac = hex::decode(hmac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;

    verify_hmac_constant_time(&config.secret, subject.as_bytes(), &provided_mac)?;

    Ok(TokenClaims {
        subject: subject.to_string(),
    })
}

/// Compute HMAC-SHA256 over the given message with the given key.
fn compute_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Verify HMAC using constant-time comparison.
///
/// This uses the `hmac` crate's `verify_slice` method which is
/// designed to be constant-time to prevent timing attacks.
fn verify_hmac_constant_time(
    key: &[u8],
    message: &[u8],
    expected_mac: &[u8],
) -> Result<(), TokenError> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(expected_mac)
        .map_err(|_| TokenError::HmacMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TokenConfig {
        TokenConfig::new(b"test-secret-key-for-vplan".to_vec())
    }

    #[test]
    fn generate_token_has_correct_format() {
        let config = test_config();
        let token = generate_token(&config, "admin");

        assert!(
            token.starts_with("vplan_tk_admin_"),
            "token must carry the prefix and subject"
        );

        // The HMAC hex portion is 64 chars (SHA-256 = 32 bytes).
        let (_, hmac_hex) = token
            .strip_prefix("vplan_tk_")
            .unwrap()
            .rsplit_once('_')
            .unwrap();
        assert_eq!(hmac_hex.len(), 64, "HMAC-SHA256 hex should be 64 chars");
    }

    #[test]
    fn generate_and_validate_roundtrip() {
        let config = test_config();
        let token = generate_token(&config, "admin");
        let claims = validate_token(&config, &token).unwrap();
        assert_eq!(claims.subject, "admin");
    }

    #[test]
    fn subject_with_underscores_roundtrips() {
        let config = test_config();
        let token = generate_token(&config, "api_service_user");
        let claims = validate_token(&config, &token).unwrap();
        assert_eq!(claims.subject, "api_service_user");
    }

    #[test]
    fn validate_rejects_wrong_prefix() {
        let config = test_config();
        let result = validate_token(&config, "other_tk_admin_deadbeef");
        assert!(matches!(result, Err(TokenError::InvalidFormat(_))));
    }

    #[test]
    fn validate_rejects_tampered_token() {
        let config = test_config();
        let mut token = generate_token(&config, "admin");
        let last = token.pop().unwrap();
        token.push(if last == 'a' { 'b' } else { 'a' });

        let result = validate_token(&config, &token);
        assert!(matches!(result, Err(TokenError::HmacMismatch)));
    }

    #[test]
    fn validate_rejects_wrong_secret() {
        let config = test_config();
        let token = generate_token(&config, "admin");

        let wrong_config = TokenConfig::new(b"completely-different-secret".to_vec());
        let result = validate_token(&wrong_config, &token);
        assert!(matches!(result, Err(TokenError::HmacMismatch)));
    }

    #[test]
    fn validate_rejects_subject_swap() {
        let config = test_config();
        let token = generate_token(&config, "admin");
        let forged = token.replace("_admin_", "_intruder_");

        let result = validate_token(&config, &forged);
        assert!(matches!(result, Err(TokenError::HmacMismatch)));
    }

    #[test]
    fn validate_rejects_garbage() {
        let config = test_config();
        for garbage in ["", "vplan_tk_", "vplan_tk_admin", "vplan_tk__aa"] {
            let result = validate_token(&config, garbage);
            assert!(result.is_err(), "garbage token {garbage:?} must not validate");
        }
    }

    #[test]
    fn credentials_verify_exact_match_only() {
        let creds = ApiCredentials {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        };
        assert!(creds.verify("admin", "s3cret"));
        assert!(!creds.verify("admin", "wrong"));
        assert!(!creds.verify("root", "s3cret"));
        assert!(!creds.verify("", ""));
    }

    #[test]
    fn token_error_display_messages() {
        let mismatch = TokenError::HmacMismatch;
        assert_eq!(mismatch.to_string(), "token HMAC verification failed");

        let missing = TokenError::MissingSecret;
        assert_eq!(missing.to_string(), "missing token secret");
    }
}
