//! Flash messages
//!
//! One-shot notices carried across a redirect in a signed cookie. The value
//! is `base64url(json(messages)) "." hex(hmac_sha256(secret, payload))`.
//! The next rendered page reads the messages and clears the cookie.

use axum::http::{header, HeaderMap, HeaderValue};
use data_encoding::{BASE64URL_NOPAD, HEXLOWER};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Severity of a flash message, used as a CSS class suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A single flash message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// Errors reading a flash cookie
#[derive(Debug, thiserror::Error)]
pub enum FlashError {
    #[error("Flash cookie is malformed")]
    Malformed,

    #[error("Flash cookie signature mismatch")]
    BadSignature,

    #[error("Flash cookie payload is invalid: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Invalid flash signing key")]
    InvalidKey,
}

/// Signs, verifies and (de)serializes flash cookies
pub struct FlashSigner {
    mac: HmacSha256,
    cookie_name: String,
}

impl FlashSigner {
    pub fn new(secret_key: &str, cookie_name: &str) -> Result<Self, FlashError> {
        let mac = HmacSha256::new_from_slice(secret_key.as_bytes()).map_err(|_| FlashError::InvalidKey)?;

        Ok(Self {
            mac,
            cookie_name: cookie_name.to_string(),
        })
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }

    /// Encode and sign messages into a cookie value
    pub fn encode(&self, messages: &[FlashMessage]) -> String {
        // Serializing plain structs of strings cannot fail
        let json = serde_json::to_vec(messages).unwrap_or_default();
        let payload = BASE64URL_NOPAD.encode(&json);

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = HEXLOWER.encode(&mac.finalize().into_bytes());

        format!("{}.{}", payload, signature)
    }

    /// Verify and decode a cookie value
    pub fn decode(&self, value: &str) -> Result<Vec<FlashMessage>, FlashError> {
        let (payload, signature) = value.rsplit_once('.').ok_or(FlashError::Malformed)?;
        let signature = HEXLOWER
            .decode(signature.as_bytes())
            .map_err(|_| FlashError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| FlashError::BadSignature)?;

        let json = BASE64URL_NOPAD
            .decode(payload.as_bytes())
            .map_err(|_| FlashError::Malformed)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// `Set-Cookie` value carrying `messages`
    pub fn set_cookie(&self, messages: &[FlashMessage]) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.cookie_name,
            self.encode(messages)
        )
    }

    /// `Set-Cookie` value removing the flash cookie
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        )
    }

    /// Raw flash cookie value from the request, if present
    pub fn cookie_value<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value)
    }

    /// Messages carried by the request.
    ///
    /// Returns the messages and whether a flash cookie was present at all,
    /// so the caller knows to clear it. Invalid cookies yield no messages.
    pub fn take(&self, headers: &HeaderMap) -> (Vec<FlashMessage>, bool) {
        let Some(value) = self.cookie_value(headers) else {
            return (Vec::new(), false);
        };

        match self.decode(value) {
            Ok(messages) => (messages, true),
            Err(e) => {
                tracing::warn!("Discarding flash cookie: {}", e);
                (Vec::new(), true)
            }
        }
    }
}

/// Header value for a `Set-Cookie` string, if it is representable
pub fn cookie_header(cookie: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(cookie) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Invalid Set-Cookie value: {}", e);
            None
        }
    }
}
