// 文件职责：
// 1) 定义 relay 集群内共用的 token claims 与 header 结构。
// 2) 提供复制存储 key 的命名规则，保证所有 relay 读到同一份记录。
// 3) 提供 associationID 等跨 relay 一致的标识生成函数。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 未配置时使用的存储命名空间。
pub const DEFAULT_NAMESPACE: &str = "relay";

/// 非对称模式签名算法名（Ed25519）。
pub const ALG_EDDSA: &str = "EdDSA";
/// 对称模式签名算法名（HMAC-SHA256）。
pub const ALG_HS256: &str = "HS256";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    // 签名算法。
    pub alg: String,
    // 固定为 `JWT`。
    #[serde(default = "default_token_type")]
    pub typ: String,
}

impl TokenHeader {
    /// 按算法名构造 header。
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            typ: default_token_type(),
        }
    }
}

fn default_token_type() -> String {
    "JWT".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(rename = "associationID")]
    // 本次授权关联 ID（32 位 hex）。
    pub association_id: String,
    #[serde(rename = "issuerID")]
    // 签发 relay 的 ID。
    pub issuer_id: String,
}

impl AccessTokenClaims {
    /// 为指定 relay 生成带新 associationID 的 claims。
    pub fn issued_by(issuer_id: impl Into<String>) -> Self {
        Self {
            association_id: new_association_id(),
            issuer_id: issuer_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayIdentityClaims {
    #[serde(rename = "issuerID")]
    // 自证身份的 relay ID。
    pub issuer_id: String,
}

/// 仅用于未验签阶段读取 issuer 的宽松 claims。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuerPeek {
    #[serde(rename = "issuerID", default)]
    pub issuer_id: Option<String>,
}

/// 生成 associationID：UUIDv4 的 16 字节转小写 hex。
pub fn new_association_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 账号凭证记录 key：`<namespace>.users.<email>`。
pub fn user_record_key(namespace: &str, email: &str) -> String {
    format!("{namespace}.users.{email}")
}

/// relay 公钥目录记录 key：`<namespace>.relays`。
pub fn relay_directory_key(namespace: &str) -> String {
    format!("{namespace}.relays")
}

#[cfg(test)]
mod tests {
    use super::{
        AccessTokenClaims, IssuerPeek, RelayIdentityClaims, TokenHeader, new_association_id,
        relay_directory_key, user_record_key,
    };

    #[test]
    fn association_id_is_lowercase_hex() {
        let id = new_association_id();
        assert_eq!(id.len(), 32);
        assert!(
            id.chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch))
        );
        assert_ne!(id, new_association_id());
    }

    #[test]
    fn store_keys_follow_namespace_layout() {
        assert_eq!(
            user_record_key("fleet", "a@example.com"),
            "fleet.users.a@example.com"
        );
        assert_eq!(relay_directory_key("fleet"), "fleet.relays");
    }

    #[test]
    fn claims_use_wire_field_names() {
        let claims = AccessTokenClaims {
            association_id: "abc".to_string(),
            issuer_id: "relay-1".to_string(),
        };
        let raw = serde_json::to_value(&claims).expect("encode claims");
        assert_eq!(raw["associationID"], "abc");
        assert_eq!(raw["issuerID"], "relay-1");

        let identity = RelayIdentityClaims {
            issuer_id: "relay-1".to_string(),
        };
        let raw = serde_json::to_string(&identity).expect("encode identity");
        assert_eq!(raw, r#"{"issuerID":"relay-1"}"#);
    }

    #[test]
    fn identity_claims_reject_access_claims() {
        let raw = r#"{"associationID":"abc","issuerID":"relay-1"}"#;
        assert!(serde_json::from_str::<RelayIdentityClaims>(raw).is_err());
        let identity: RelayIdentityClaims =
            serde_json::from_str(r#"{"issuerID":"relay-1"}"#).expect("identity");
        assert_eq!(identity.issuer_id, "relay-1");
    }

    #[test]
    fn issuer_peek_tolerates_missing_issuer() {
        let peek: IssuerPeek = serde_json::from_str(r#"{"associationID":"x"}"#).expect("peek");
        assert!(peek.issuer_id.is_none());
    }

    #[test]
    fn header_defaults_type() {
        let header: TokenHeader = serde_json::from_str(r#"{"alg":"EdDSA"}"#).expect("header");
        assert_eq!(header, TokenHeader::new("EdDSA"));
    }
}
