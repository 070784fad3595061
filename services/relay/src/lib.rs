//! relay 身份授权核心：账号凭证签发、跨 relay 目录信任链验签。

pub mod api;
pub mod auth;
pub mod config;

pub use api::{
    error::{AuthError, AuthErrorKind},
    types::{Credential, RelayDirectory, SiblingSet},
};
pub use auth::{
    authorizer::{Authorizer, RelayIdentity, SigningMode},
    credentials::CredentialClient,
    directory::DirectoryClient,
    store::{FileStore, MemoryStore, ReplicatedStore},
};
pub use config::RelayConfig;
