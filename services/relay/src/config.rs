//! 配置模块职责：
//! 1. 从环境变量读取 relay 身份、密钥与存储位置，并提供默认值。
//! 2. 以查找函数为输入，测试时无需改动进程环境。

use std::path::PathBuf;

use rt_shared_protocol::DEFAULT_NAMESPACE;

use crate::{api::error::AuthError, auth::store::default_store_path};

/// relay ID 环境变量。
pub const RELAY_ID_ENV: &str = "RELAY_ID";
/// Ed25519 私钥种子（base64url）。
pub const RELAY_PRIVATE_KEY_ENV: &str = "RELAY_PRIVATE_KEY";
/// Ed25519 公钥（base64url）。
pub const RELAY_PUBLIC_KEY_ENV: &str = "RELAY_PUBLIC_KEY";
/// 存储 key 命名空间。
pub const RELAY_STORE_NAMESPACE_ENV: &str = "RELAY_STORE_NAMESPACE";
/// 文件快照存储路径。
pub const RELAY_STORE_PATH_ENV: &str = "RELAY_STORE_PATH";

/// relay 运行配置。
#[derive(Clone)]
pub struct RelayConfig {
    pub relay_id: String,
    pub relay_private_key: Option<String>,
    pub relay_public_key: Option<String>,
    pub namespace: String,
    pub store_path: PathBuf,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("relay_id", &self.relay_id)
            .field(
                "relay_private_key",
                &self.relay_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("relay_public_key", &self.relay_public_key)
            .field("namespace", &self.namespace)
            .field("store_path", &self.store_path)
            .finish()
    }
}

impl RelayConfig {
    /// 仅指定 relay ID，其余取默认值（对称模式）。
    pub fn new(relay_id: impl Into<String>) -> Self {
        Self {
            relay_id: relay_id.into(),
            relay_private_key: None,
            relay_public_key: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            store_path: default_store_path(None),
        }
    }

    pub fn with_keys(
        mut self,
        private_key: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        self.relay_private_key = Some(private_key.into());
        self.relay_public_key = Some(public_key.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// 从进程环境读取。
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意查找函数读取；空白值视为未设置。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let relay_id = read(RELAY_ID_ENV)
            .ok_or_else(|| AuthError::config(format!("{RELAY_ID_ENV} is required")))?;
        let namespace =
            read(RELAY_STORE_NAMESPACE_ENV).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let store_path = read(RELAY_STORE_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_store_path(read("HOME").as_deref()));

        Ok(Self {
            relay_id,
            relay_private_key: read(RELAY_PRIVATE_KEY_ENV),
            relay_public_key: read(RELAY_PUBLIC_KEY_ENV),
            namespace,
            store_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::PathBuf};

    use super::RelayConfig;
    use crate::api::error::AuthErrorKind;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn reads_all_fields_and_trims() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("RELAY_ID", " relay-a "),
            ("RELAY_PRIVATE_KEY", "priv"),
            ("RELAY_PUBLIC_KEY", "pub"),
            ("RELAY_STORE_NAMESPACE", "fleet"),
            ("RELAY_STORE_PATH", "/var/lib/relay/store.json"),
        ]))
        .expect("config");

        assert_eq!(config.relay_id, "relay-a");
        assert_eq!(config.relay_private_key.as_deref(), Some("priv"));
        assert_eq!(config.relay_public_key.as_deref(), Some("pub"));
        assert_eq!(config.namespace, "fleet");
        assert_eq!(config.store_path, PathBuf::from("/var/lib/relay/store.json"));
    }

    #[test]
    fn applies_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("RELAY_ID", "relay-a"),
            ("RELAY_PRIVATE_KEY", "   "),
            ("HOME", "/home/relay"),
        ]))
        .expect("config");

        assert!(config.relay_private_key.is_none());
        assert!(config.relay_public_key.is_none());
        assert_eq!(config.namespace, "relay");
        assert_eq!(
            config.store_path,
            PathBuf::from("/home/relay/.config/relaytrust/store.json")
        );
    }

    #[test]
    fn relay_id_is_required() {
        let err = RelayConfig::from_lookup(lookup(&[])).expect_err("missing id");
        assert_eq!(err.kind, AuthErrorKind::Config);
    }

    #[test]
    fn debug_output_hides_private_key() {
        let config = RelayConfig::new("relay-a").with_keys("super-secret", "pub");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
