//! Telegram Mini App `initData` verification.
//!
//! The assertion is a form-encoded pair list signed with a two-level
//! HMAC-SHA256: the secret key is `HMAC("WebAppData", bot_token)` and the
//! signature is `HMAC(secret_key, check_string)`, where the check-string is the
//! remaining pairs sorted by key and joined as `key=value` lines.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SECRET_KEY_DOMAIN: &[u8] = b"WebAppData";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("user not found in initData")]
    MissingUser,
    #[error("Invalid user JSON")]
    InvalidPayload(#[source] serde_json::Error),
}

/// The `user` record embedded in a verified assertion, echoed back as sent.
/// Any well-formed JSON is accepted; the typed accessors return `None` when a
/// field is absent or has another type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebAppUser(serde_json::Value);

impl WebAppUser {
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(serde_json::Value::as_i64)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.get_str("first_name")
    }

    pub fn username(&self) -> Option<&str> {
        self.get_str("username")
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(serde_json::Value::as_str)
    }
}

fn keyed(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length")
}

/// Decode the assertion into ordered pairs. `&&` collapses to `&` and pairs
/// with an empty key are dropped.
pub fn parse_pairs(init_data: &str) -> Vec<(String, String)> {
    let normalized = init_data.replace("&&", "&");
    url::form_urlencoded::parse(normalized.as_bytes())
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Sort by key (bytewise, stable) and join as `key=value` lines.
pub fn check_string(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First level: the bot token authenticated under the fixed domain key.
pub fn secret_key(bot_token: &str) -> Vec<u8> {
    let mut mac = keyed(SECRET_KEY_DOMAIN);
    mac.update(bot_token.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Hex signature of a check-string under `bot_token`.
pub fn sign(check_string: &str, bot_token: &str) -> String {
    let mut mac = keyed(&secret_key(bot_token));
    mac.update(check_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify an assertion and return its user record.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> Result<WebAppUser, IdentityError> {
    let mut pairs = parse_pairs(init_data);
    let supplied = pairs
        .iter()
        .find(|(k, _)| k == "hash")
        .map(|(_, v)| v.clone())
        .ok_or(IdentityError::InvalidSignature)?;
    pairs.retain(|(k, _)| k != "hash");

    let expected = hex::decode(&supplied).map_err(|_| IdentityError::InvalidSignature)?;
    let mut mac = keyed(&secret_key(bot_token));
    mac.update(check_string(&pairs).as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| IdentityError::InvalidSignature)?;

    let (_, user) = pairs
        .iter()
        .find(|(k, _)| k == "user")
        .ok_or(IdentityError::MissingUser)?;
    serde_json::from_str(user).map_err(IdentityError::InvalidPayload)
}
