//! 存储记录与目录类型。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 合并后的 relay 公钥目录：relayID -> base64url 公钥。
pub type RelayDirectory = BTreeMap<String, String>;

/// 存储对单个 key 返回的冲突值集合。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingSet {
    pub siblings: Vec<String>,
}

impl SiblingSet {
    pub fn new(siblings: Vec<String>) -> Self {
        Self { siblings }
    }
}

/// 账号凭证记录（`<namespace>.users.<email>`）。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// PHC 格式密码哈希。
    pub hashed_password: String,
    /// 其余字段原样保留，本模块不解释。
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
