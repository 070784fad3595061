//! 账号凭证读取与密码校验。

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use rt_shared_protocol::user_record_key;
use tracing::debug;

use crate::{
    api::{error::AuthError, types::Credential},
    auth::store::ReplicatedStore,
};

/// 凭证读取客户端。只取第一个 sibling，不做合并。
#[derive(Clone)]
pub struct CredentialClient {
    store: Arc<dyn ReplicatedStore>,
    namespace: String,
}

impl CredentialClient {
    pub fn new(store: Arc<dyn ReplicatedStore>, namespace: &str) -> Self {
        Self {
            store,
            namespace: namespace.to_string(),
        }
    }

    /// 读取账号凭证。记录缺失或首个 sibling 结构无效时返回 `None`，存储错误原样上抛。
    pub async fn get_user_credentials(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, AuthError> {
        let key = user_record_key(&self.namespace, email);
        let Some(record) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let Some(first) = record.siblings.first() else {
            return Ok(None);
        };
        match serde_json::from_str::<Credential>(first) {
            Ok(credential) => Ok(Some(credential)),
            Err(err) => {
                debug!(%key, "credential record is malformed: {err}");
                Ok(None)
            }
        }
    }
}

/// 校验明文密码与 PHC 哈希；哈希无法解析视为不匹配。
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hashed_password) else {
        debug!("stored password hash is not a PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// 在阻塞线程池上校验密码，避免 Argon2 占用异步 worker。
pub async fn verify_password_off_executor(
    password: &str,
    hashed_password: &str,
) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hashed_password = hashed_password.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &hashed_password))
        .await
        .map_err(|err| AuthError::signing(format!("password check task failed: {err}")))
}

/// 测试用低成本 Argon2id 哈希。
#[cfg(test)]
pub(crate) fn hash_password_for_tests(password: &str) -> String {
    use argon2::{Algorithm, Params, PasswordHasher, Version, password_hash::SaltString};

    let params = Params::new(1024, 1, 1, None).expect("argon2 params");
    let salt = SaltString::from_b64("c29tZXNhbHQ").expect("salt");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .expect("hash password")
        .to_string()
}
