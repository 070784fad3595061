//! 对外类型与错误定义。

pub mod error;
pub mod types;
