//! Reading claims out of a bearer token.
//!
//! The client never verifies token signatures: that's the server's job,
//! and the client doesn't hold the key anyway. It only needs to peek at
//! the payload to learn when the token expires.
//!
//! Decoding sits behind the [`ClaimDecoder`] trait so tests (and apps with
//! non-JWT tokens) can plug in their own.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::SessionError;

/// The claims the session layer cares about.
///
/// Every field is optional: a token without `exp` decodes fine, and it's
/// up to the caller to decide what a missing claim means (the expiry
/// monitor treats it as expired).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry, in seconds since the Unix epoch.
    ///
    /// `f64` because some issuers emit fractional timestamps.
    #[serde(default)]
    pub exp: Option<f64>,

    /// The subject the token was issued to.
    #[serde(default)]
    pub sub: Option<String>,

    /// Everything else in the payload.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decodes a token into its claims.
///
/// # Example
///
/// ```rust
/// use lorekeep_session::{ClaimDecoder, SessionError, TokenClaims};
///
/// /// Tokens of the form "exp:<seconds>", for a dev backend.
/// struct DevDecoder;
///
/// impl ClaimDecoder for DevDecoder {
///     fn decode(&self, token: &str) -> Result<TokenClaims, SessionError> {
///         let exp = token
///             .strip_prefix("exp:")
///             .and_then(|s| s.parse::<f64>().ok())
///             .ok_or_else(|| SessionError::DecodeFailure("not a dev token".into()))?;
///         Ok(TokenClaims { exp: Some(exp), ..TokenClaims::default() })
///     }
/// }
/// ```
pub trait ClaimDecoder: Send + Sync + 'static {
    /// Returns the token's claims, or [`SessionError::DecodeFailure`].
    fn decode(&self, token: &str) -> Result<TokenClaims, SessionError>;
}

impl<D: ClaimDecoder + ?Sized> ClaimDecoder for Box<D> {
    fn decode(&self, token: &str) -> Result<TokenClaims, SessionError> {
        (**self).decode(token)
    }
}

/// Decodes the payload segment of a JWT (`header.payload.signature`).
///
/// No signature check is performed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtClaimDecoder;

impl ClaimDecoder for JwtClaimDecoder {
    fn decode(&self, token: &str) -> Result<TokenClaims, SessionError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(SessionError::DecodeFailure(
                "expected three dot-separated segments".into(),
            ));
        };

        // Some issuers pad their base64url; the no-pad engine rejects that.
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| SessionError::DecodeFailure(format!("payload is not base64url: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| SessionError::DecodeFailure(format!("payload is not a claims object: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_reads_exp_and_sub() {
        let claims = JwtClaimDecoder
            .decode(&jwt(r#"{"sub":"u1","exp":1700000000,"role":"gm"}"#))
            .unwrap();

        assert_eq!(claims.exp, Some(1_700_000_000.0));
        assert_eq!(claims.sub.as_deref(), Some("u1"));
        assert_eq!(claims.extra.get("role"), Some(&serde_json::json!("gm")));
    }

    #[test]
    fn test_decode_without_exp_yields_none() {
        let claims = JwtClaimDecoder.decode(&jwt(r#"{"sub":"u1"}"#)).unwrap();
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_decode_accepts_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        // 10 payload bytes → standard base64 would end in "==".
        let payload = URL_SAFE_NO_PAD.encode(r#"{"exp":10}"#);
        let token = format!("{header}.{payload}==.sig");

        let claims = JwtClaimDecoder.decode(&token).unwrap();

        assert_eq!(claims.exp, Some(10.0));
    }

    #[test]
    fn test_decode_rejects_wrong_segment_count() {
        assert!(matches!(
            JwtClaimDecoder.decode("only.two"),
            Err(SessionError::DecodeFailure(_))
        ));
        assert!(matches!(
            JwtClaimDecoder.decode("a.b.c.d"),
            Err(SessionError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_base64_payload() {
        assert!(matches!(
            JwtClaimDecoder.decode("x.!!!.y"),
            Err(SessionError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_numeric_exp() {
        assert!(matches!(
            JwtClaimDecoder.decode(&jwt(r#"{"exp":"tomorrow"}"#)),
            Err(SessionError::DecodeFailure(_))
        ));
    }
}
