//! 鉴权模块：目录、凭证、token 编解码与授权器。

pub mod authorizer;
pub mod credentials;
pub mod directory;
pub mod store;
pub(crate) mod token;
pub mod token_crypto;
