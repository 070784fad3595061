//! relay 公钥目录：读取复制记录并合并全部 sibling。
//!
//! 合并顺序固定为 sibling 原文的字典序升序，同一 relayID 出现在多个
//! sibling 中时，字典序最大的 sibling 中的值生效。无法解析的 sibling
//! 整体跳过，不影响其余 sibling。

use std::{collections::BTreeMap, sync::Arc};

use rt_shared_protocol::relay_directory_key;
use tracing::warn;

use crate::{api::types::RelayDirectory, auth::store::ReplicatedStore};

/// 目录读取客户端。
#[derive(Clone)]
pub struct DirectoryClient {
    store: Arc<dyn ReplicatedStore>,
    key: String,
}

impl DirectoryClient {
    pub fn new(store: Arc<dyn ReplicatedStore>, namespace: &str) -> Self {
        Self {
            store,
            key: relay_directory_key(namespace),
        }
    }

    /// 读取并合并当前目录。永不失败：存储异常降级为空目录。
    pub async fn get_account_relays(&self) -> RelayDirectory {
        match self.store.get(&self.key).await {
            Ok(Some(record)) => merge_siblings(record.siblings),
            Ok(None) => RelayDirectory::new(),
            Err(err) => {
                warn!(key = %self.key, "read relay directory failed, treating as empty: {err}");
                RelayDirectory::new()
            }
        }
    }
}

/// 解析单个 sibling；失败返回 `None`。
fn parse_sibling(raw: &str) -> Option<BTreeMap<String, String>> {
    serde_json::from_str(raw).ok()
}

/// 按字典序合并 sibling，后处理者覆盖先处理者。
pub fn merge_siblings(mut siblings: Vec<String>) -> RelayDirectory {
    siblings.sort();
    siblings.dedup();

    let mut merged = RelayDirectory::new();
    for raw in &siblings {
        let Some(parsed) = parse_sibling(raw) else {
            warn!(len = raw.len(), "skip malformed relay directory sibling");
            continue;
        };
        merged.extend(parsed);
    }
    merged
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{DirectoryClient, merge_siblings};
    use crate::{
        api::{error::AuthError, types::SiblingSet},
        auth::store::{MemoryStore, ReplicatedStore},
    };

    struct FailingStore;

    #[async_trait]
    impl ReplicatedStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<SiblingSet>, AuthError> {
            Err(AuthError::store("connection refused"))
        }
    }

    async fn client_with(siblings: Option<Vec<&str>>) -> DirectoryClient {
        let store = Arc::new(MemoryStore::new());
        if let Some(siblings) = siblings {
            store
                .put_siblings(
                    "ns.relays",
                    siblings.into_iter().map(str::to_string).collect(),
                )
                .await;
        }
        DirectoryClient::new(store, "ns")
    }

    #[tokio::test]
    async fn absent_or_empty_record_is_empty_directory() {
        assert!(client_with(None).await.get_account_relays().await.is_empty());
        assert!(
            client_with(Some(vec![]))
                .await
                .get_account_relays()
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn disjoint_siblings_are_merged() {
        let directory = client_with(Some(vec![r#"{"A":"pubA"}"#, r#"{"B":"pubB"}"#]))
            .await
            .get_account_relays()
            .await;
        assert_eq!(directory.len(), 2);
        assert_eq!(directory["A"], "pubA");
        assert_eq!(directory["B"], "pubB");
    }

    #[test]
    fn conflicting_key_resolves_to_greatest_sibling() {
        let low = r#"{"A":"pubA-1"}"#.to_string();
        let high = r#"{"A":"pubA-2"}"#.to_string();

        let forward = merge_siblings(vec![low.clone(), high.clone()]);
        let reverse = merge_siblings(vec![high, low]);
        assert_eq!(forward, reverse);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward["A"], "pubA-2");
    }

    #[test]
    fn malformed_sibling_is_skipped() {
        let directory = merge_siblings(vec![
            "{not json".to_string(),
            r#"{"A":"pubA"}"#.to_string(),
            r#"["A","B"]"#.to_string(),
            r#"{"B":42}"#.to_string(),
        ]);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory["A"], "pubA");
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty() {
        let client = DirectoryClient::new(Arc::new(FailingStore), "ns");
        assert!(client.get_account_relays().await.is_empty());
    }
}
