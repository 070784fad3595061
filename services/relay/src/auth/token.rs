//! Token 信封编解码：`header.claims.signature`，三段均为 base64url。

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rt_shared_protocol::{ALG_EDDSA, ALG_HS256, IssuerPeek, TokenHeader};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    api::error::AuthError,
    auth::token_crypto::{
        ed25519_sign_b64url, hmac_b64url, verify_ed25519_b64url, verify_hmac_b64url,
    },
};

/// 签名所用密钥。
#[derive(Clone, Copy)]
pub(crate) enum TokenSigner<'a> {
    Ed25519(&'a SigningKey),
    Hmac(&'a str),
}

/// 验签所用密钥。算法由密钥类型决定，不信任 header 自述。
#[derive(Clone, Copy)]
pub(crate) enum TokenVerifier<'a> {
    Ed25519(&'a VerifyingKey),
    Hmac(&'a str),
}

impl TokenSigner<'_> {
    fn alg(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => ALG_EDDSA,
            Self::Hmac(_) => ALG_HS256,
        }
    }
}

impl TokenVerifier<'_> {
    fn alg(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => ALG_EDDSA,
            Self::Hmac(_) => ALG_HS256,
        }
    }
}

/// 编码 JSON 段。
fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let raw = serde_json::to_vec(value)
        .map_err(|err| AuthError::signing(format!("encode token segment failed: {err}")))?;
    Ok(URL_SAFE_NO_PAD.encode(raw))
}

/// 解码 JSON 段；任何失败都按无效 token 处理。
fn decode_segment<T: DeserializeOwned>(segment: &str, step: &'static str) -> Result<T, AuthError> {
    let raw = URL_SAFE_NO_PAD.decode(segment.as_bytes()).map_err(|_| {
        debug!(step, "token segment is not base64url");
        AuthError::invalid_token()
    })?;
    serde_json::from_slice(&raw).map_err(|_| {
        debug!(step, "token segment is not valid json");
        AuthError::invalid_token()
    })
}

/// 拆分三段式 token。
fn split_token(token: &str) -> Result<(&str, &str, &str), AuthError> {
    let mut parts = token.trim().split('.');
    let header = parts.next().unwrap_or_default();
    let claims = parts.next().unwrap_or_default();
    let sig = parts.next().unwrap_or_default();
    if header.is_empty() || claims.is_empty() || sig.is_empty() || parts.next().is_some() {
        debug!(step = "split", "token is not a three-segment envelope");
        return Err(AuthError::invalid_token());
    }
    Ok((header, claims, sig))
}

/// 签发 token。
pub(crate) fn encode_token<T: Serialize>(
    claims: &T,
    signer: TokenSigner<'_>,
) -> Result<String, AuthError> {
    let header_b64 = encode_segment(&TokenHeader::new(signer.alg()))?;
    let claims_b64 = encode_segment(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");
    let sig_b64 = match signer {
        TokenSigner::Ed25519(key) => ed25519_sign_b64url(key, signing_input.as_bytes()),
        TokenSigner::Hmac(secret) => hmac_b64url(secret, signing_input.as_bytes())?,
    };
    Ok(format!("{signing_input}.{sig_b64}"))
}

/// 不验签读取 issuerID，仅用于选择验签密钥。
pub(crate) fn peek_issuer(token: &str) -> Result<String, AuthError> {
    let (_, claims_b64, _) = split_token(token)?;
    let peek: IssuerPeek = decode_segment(claims_b64, "peek")?;
    match peek.issuer_id {
        Some(issuer) if !issuer.is_empty() => Ok(issuer),
        _ => {
            debug!(step = "peek", "token has no issuerID");
            Err(AuthError::invalid_token())
        }
    }
}

/// 校验 header 算法与签名，通过后返回 claims。
pub(crate) fn decode_token<T: DeserializeOwned>(
    token: &str,
    verifier: TokenVerifier<'_>,
) -> Result<T, AuthError> {
    let (header_b64, claims_b64, sig_b64) = split_token(token)?;
    let header: TokenHeader = decode_segment(header_b64, "header")?;
    if header.alg != verifier.alg() {
        debug!(
            step = "header",
            alg = %header.alg,
            expected = verifier.alg(),
            "token algorithm does not match verifying key"
        );
        return Err(AuthError::invalid_token());
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let verified = match verifier {
        TokenVerifier::Ed25519(key) => {
            verify_ed25519_b64url(key, signing_input.as_bytes(), sig_b64)
        }
        TokenVerifier::Hmac(secret) => {
            verify_hmac_b64url(secret, signing_input.as_bytes(), sig_b64)
        }
    };
    if let Err(err) = verified {
        debug!(step = "signature", "token signature rejected");
        return Err(err);
    }

    decode_segment(claims_b64, "claims")
}
