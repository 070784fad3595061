//! relay 身份授权：签发 access token，并按签发方选择本地或目录公钥验签。

use std::{fmt, sync::Arc};

use ed25519_dalek::{SigningKey, VerifyingKey};
use rt_shared_protocol::{AccessTokenClaims, RelayIdentityClaims};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::{
    api::{
        error::{AuthError, AuthErrorKind},
        types::RelayDirectory,
    },
    auth::{
        credentials::{CredentialClient, verify_password_off_executor},
        directory::DirectoryClient,
        store::ReplicatedStore,
        token::{TokenSigner, TokenVerifier, decode_token, encode_token, peek_issuer},
        token_crypto::{
            generate_shared_secret, key_fingerprint, parse_signing_key, parse_verifying_key,
        },
    },
    config::RelayConfig,
};

/// 签名模式，构造时确定，实例生命周期内不变。
pub enum SigningMode {
    /// Ed25519 密钥对，可被其他 relay 通过目录验签。
    Asymmetric {
        signing_key: SigningKey,
        verifying_key: VerifyingKey,
    },
    /// 进程内随机密钥，只有当前实例能验签。
    Symmetric { secret: String },
}

impl SigningMode {
    /// 两个密钥都配置时使用非对称模式，否则生成新的对称密钥。
    pub fn from_keys(
        private_key: Option<&str>,
        public_key: Option<&str>,
    ) -> Result<Self, AuthError> {
        match (private_key, public_key) {
            (Some(private_key), Some(public_key)) => {
                let signing_key = parse_signing_key(private_key).ok_or_else(|| {
                    AuthError::config("relay private key is not a base64url ed25519 seed")
                })?;
                let verifying_key = parse_verifying_key(public_key).ok_or_else(|| {
                    AuthError::config("relay public key is not a base64url ed25519 key")
                })?;
                if signing_key.verifying_key() != verifying_key {
                    return Err(AuthError::config(
                        "relay public key does not match relay private key",
                    ));
                }
                Ok(Self::Asymmetric {
                    signing_key,
                    verifying_key,
                })
            }
            (None, None) => Ok(Self::Symmetric {
                secret: generate_shared_secret(),
            }),
            _ => {
                warn!("only one relay key configured, falling back to symmetric signing");
                Ok(Self::Symmetric {
                    secret: generate_shared_secret(),
                })
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Asymmetric { .. } => "asymmetric",
            Self::Symmetric { .. } => "symmetric",
        }
    }

    fn signer(&self) -> TokenSigner<'_> {
        match self {
            Self::Asymmetric { signing_key, .. } => TokenSigner::Ed25519(signing_key),
            Self::Symmetric { secret } => TokenSigner::Hmac(secret),
        }
    }

    fn verifier(&self) -> TokenVerifier<'_> {
        match self {
            Self::Asymmetric { verifying_key, .. } => TokenVerifier::Ed25519(verifying_key),
            Self::Symmetric { secret } => TokenVerifier::Hmac(secret),
        }
    }
}

impl fmt::Debug for SigningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asymmetric { verifying_key, .. } => f
                .debug_struct("Asymmetric")
                .field("fingerprint", &key_fingerprint(verifying_key))
                .finish_non_exhaustive(),
            Self::Symmetric { .. } => f.debug_struct("Symmetric").finish_non_exhaustive(),
        }
    }
}

/// 当前 relay 的身份与签名材料。
#[derive(Debug)]
pub struct RelayIdentity {
    pub relay_id: String,
    pub mode: SigningMode,
}

/// relay 授权器。
pub struct Authorizer {
    identity: RelayIdentity,
    directory: DirectoryClient,
    credentials: CredentialClient,
}

impl Authorizer {
    /// 按配置构造；密钥无效时返回 `Config` 错误。
    pub fn new(config: &RelayConfig, store: Arc<dyn ReplicatedStore>) -> Result<Self, AuthError> {
        let relay_id = config.relay_id.trim();
        if relay_id.is_empty() {
            return Err(AuthError::config("relay id must not be empty"));
        }
        let mode = SigningMode::from_keys(
            config.relay_private_key.as_deref(),
            config.relay_public_key.as_deref(),
        )?;
        let authorizer = Self {
            identity: RelayIdentity {
                relay_id: relay_id.to_string(),
                mode,
            },
            directory: DirectoryClient::new(store.clone(), &config.namespace),
            credentials: CredentialClient::new(store, &config.namespace),
        };
        info!(
            relay_id = %authorizer.identity.relay_id,
            mode = authorizer.signing_mode_name(),
            fingerprint = authorizer.public_key_fingerprint().as_deref().unwrap_or("-"),
            namespace = %config.namespace,
            "relay authorizer ready"
        );
        Ok(authorizer)
    }

    pub fn relay_id(&self) -> &str {
        &self.identity.relay_id
    }

    pub fn signing_mode_name(&self) -> &'static str {
        self.identity.mode.name()
    }

    /// 非对称模式下的公钥指纹。
    pub fn public_key_fingerprint(&self) -> Option<String> {
        match &self.identity.mode {
            SigningMode::Asymmetric { verifying_key, .. } => Some(key_fingerprint(verifying_key)),
            SigningMode::Symmetric { .. } => None,
        }
    }

    /// 当前目录快照。
    pub async fn relay_directory(&self) -> RelayDirectory {
        self.directory.get_account_relays().await
    }

    /// 校验账号密码并签发 token。未知账号与密码错误同样返回 `None`。
    pub async fn generate_access_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, AuthError> {
        let Some(credential) = self.credentials.get_user_credentials(username).await? else {
            debug!("access token denied");
            return Ok(None);
        };
        if !verify_password_off_executor(password, &credential.hashed_password).await? {
            debug!("access token denied");
            return Ok(None);
        }
        self.sign_access_token().map(Some)
    }

    /// 不校验身份，直接以本 relay 名义签发匿名关联 token。
    pub fn generate_access_token_no_credentials(&self) -> Result<String, AuthError> {
        self.sign_access_token()
    }

    /// 校验 access token 并返回 claims。
    pub async fn decode_access_token(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        self.verify_claims(token).await
    }

    /// relay 是否在当前目录中。
    pub async fn is_relay_authorized(&self, relay_id: &str) -> bool {
        self.directory
            .get_account_relays()
            .await
            .contains_key(relay_id)
    }

    /// 以本 relay 私钥签发身份自证 token；仅非对称模式可用。
    pub fn generate_relay_identity_token(&self) -> Result<String, AuthError> {
        let SigningMode::Asymmetric { signing_key, .. } = &self.identity.mode else {
            return Err(AuthError::new(
                AuthErrorKind::Signing,
                "SIGNING_MODE_UNSUPPORTED",
                "relay identity tokens require an asymmetric relay key",
            ));
        };
        let claims = RelayIdentityClaims {
            issuer_id: self.identity.relay_id.clone(),
        };
        encode_token(&claims, TokenSigner::Ed25519(signing_key))
    }

    /// 校验其他 relay（或自身）的身份自证 token。
    pub async fn verify_relay_identity_token(
        &self,
        token: &str,
    ) -> Result<RelayIdentityClaims, AuthError> {
        self.verify_claims(token).await
    }

    fn sign_access_token(&self) -> Result<String, AuthError> {
        let claims = AccessTokenClaims::issued_by(self.identity.relay_id.clone());
        encode_token(&claims, self.identity.mode.signer())
    }

    /// 本 relay 签发的用本地密钥验签；其他 relay 必须在目录中并用目录公钥验签。
    async fn verify_claims<T: DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        let issuer_id = peek_issuer(token)?;
        if issuer_id == self.identity.relay_id {
            return decode_token(token, self.identity.mode.verifier());
        }

        let directory = self.directory.get_account_relays().await;
        let Some(listed_key) = directory.get(&issuer_id) else {
            debug!(issuer = %issuer_id, "token issuer is not in relay directory");
            return Err(AuthError::invalid_token());
        };
        let Some(issuer_key) = parse_verifying_key(listed_key) else {
            debug!(issuer = %issuer_id, "relay directory key is not a valid ed25519 key");
            return Err(AuthError::invalid_token());
        };
        decode_token(token, TokenVerifier::Ed25519(&issuer_key))
    }
}
