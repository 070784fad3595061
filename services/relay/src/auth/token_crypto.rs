//! 签名原语：Ed25519 / HMAC-SHA256 与 relay 密钥编解码。

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// 解码 32 字节 base64url 密钥。
fn decode_key_bytes(raw: &str) -> Option<[u8; 32]> {
    let bytes = URL_SAFE_NO_PAD.decode(raw.trim().as_bytes()).ok()?;
    bytes.try_into().ok()
}

/// 解析 Ed25519 私钥种子。
pub(crate) fn parse_signing_key(seed_b64: &str) -> Option<SigningKey> {
    decode_key_bytes(seed_b64).map(|seed| SigningKey::from_bytes(&seed))
}

/// 解析 Ed25519 公钥。
pub(crate) fn parse_verifying_key(public_key_b64: &str) -> Option<VerifyingKey> {
    let bytes = decode_key_bytes(public_key_b64)?;
    VerifyingKey::from_bytes(&bytes).ok()
}

/// 公钥编码为目录中使用的 base64url 字符串。
pub fn encode_verifying_key(key: &VerifyingKey) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

/// 公钥指纹，仅用于日志与诊断输出。
pub fn key_fingerprint(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("kid_{}", URL_SAFE_NO_PAD.encode(&digest[..10]))
}

/// Ed25519 签名并输出 base64url。
pub(crate) fn ed25519_sign_b64url(key: &SigningKey, payload: &[u8]) -> String {
    let signature: Signature = key.sign(payload);
    URL_SAFE_NO_PAD.encode(signature.to_bytes())
}

/// 校验 Ed25519 签名。
pub(crate) fn verify_ed25519_b64url(
    key: &VerifyingKey,
    payload: &[u8],
    signature_b64: &str,
) -> Result<(), AuthError> {
    let sig_raw = URL_SAFE_NO_PAD
        .decode(signature_b64.as_bytes())
        .map_err(|_| AuthError::invalid_token())?;
    let sig_bytes: [u8; 64] = sig_raw
        .try_into()
        .map_err(|_| AuthError::invalid_token())?;
    let signature = Signature::from_bytes(&sig_bytes);
    key.verify(payload, &signature)
        .map_err(|_| AuthError::invalid_token())
}

/// HMAC-SHA256 并输出 base64url。
pub(crate) fn hmac_b64url(secret: &str, payload: &[u8]) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AuthError::signing("shared secret rejected by hmac"))?;
    mac.update(payload);
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// 常量时间校验 HMAC-SHA256 签名。
pub(crate) fn verify_hmac_b64url(
    secret: &str,
    payload: &[u8],
    signature_b64: &str,
) -> Result<(), AuthError> {
    let sig = URL_SAFE_NO_PAD
        .decode(signature_b64.as_bytes())
        .map_err(|_| AuthError::invalid_token())?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::invalid_token())?;
    mac.update(payload);
    mac.verify_slice(&sig).map_err(|_| AuthError::invalid_token())
}

/// 生成进程内对称密钥，只存在于当前 Authorizer 实例。
pub(crate) fn generate_shared_secret() -> String {
    format!(
        "relay_sk_{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use ed25519_dalek::SigningKey;

    use super::{
        ed25519_sign_b64url, encode_verifying_key, generate_shared_secret, hmac_b64url,
        key_fingerprint, parse_signing_key, parse_verifying_key, verify_ed25519_b64url,
        verify_hmac_b64url,
    };

    #[test]
    fn keys_round_trip_through_base64url() {
        let seed = URL_SAFE_NO_PAD.encode([7u8; 32]);
        let signing = parse_signing_key(&seed).expect("seed");
        let public = encode_verifying_key(&signing.verifying_key());
        let parsed = parse_verifying_key(&public).expect("public key");
        assert_eq!(parsed, signing.verifying_key());

        assert!(parse_signing_key("not-a-key").is_none());
        assert!(parse_verifying_key(&URL_SAFE_NO_PAD.encode([1u8; 16])).is_none());
    }

    #[test]
    fn ed25519_signature_binds_payload_and_key() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let other = SigningKey::from_bytes(&[9u8; 32]);
        let sig = ed25519_sign_b64url(&key, b"payload");

        assert!(verify_ed25519_b64url(&key.verifying_key(), b"payload", &sig).is_ok());
        assert!(verify_ed25519_b64url(&key.verifying_key(), b"payloae", &sig).is_err());
        assert!(verify_ed25519_b64url(&other.verifying_key(), b"payload", &sig).is_err());
        assert!(verify_ed25519_b64url(&key.verifying_key(), b"payload", "short").is_err());
    }

    #[test]
    fn hmac_signature_binds_secret() {
        let sig = hmac_b64url("secret-a", b"payload").expect("sign");
        assert!(verify_hmac_b64url("secret-a", b"payload", &sig).is_ok());
        assert!(verify_hmac_b64url("secret-b", b"payload", &sig).is_err());
        assert!(verify_hmac_b64url("secret-a", b"other", &sig).is_err());
    }

    #[test]
    fn shared_secrets_are_unique() {
        let a = generate_shared_secret();
        assert!(a.starts_with("relay_sk_"));
        assert_ne!(a, generate_shared_secret());
    }

    #[test]
    fn fingerprint_is_stable() {
        let key = SigningKey::from_bytes(&[7u8; 32]).verifying_key();
        assert_eq!(key_fingerprint(&key), key_fingerprint(&key));
        assert!(key_fingerprint(&key).starts_with("kid_"));
    }
}
