use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::models::{Identity, Role};

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("invalid signing key")]
    InvalidKey,
}

/// Signs `user_id:role` so that the identity can be trusted on later requests.
///
/// Token layout: `base64url(user_id ":" role) "." base64url(hmac_sha1(secret, payload))`.
pub fn issue_token(secret: &str, identity: &Identity) -> Result<String, TokenError> {
    let payload = format!("{}:{}", identity.user_id, identity.role.as_str());
    let signature = sign(secret, payload.as_bytes())?.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload),
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Identity, TokenError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Malformed)?;

    sign(secret, &payload)?
        .verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let payload = String::from_utf8(payload).map_err(|_| TokenError::Malformed)?;
    let (user_id, role) = payload.rsplit_once(':').ok_or(TokenError::Malformed)?;
    if user_id.is_empty() {
        return Err(TokenError::Malformed);
    }
    let role = Role::parse(role).ok_or_else(|| TokenError::UnknownRole(role.to_string()))?;

    Ok(Identity::new(user_id, role))
}

fn sign(secret: &str, payload: &[u8]) -> Result<HmacSha1, TokenError> {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
    mac.update(payload);
    Ok(mac)
}
