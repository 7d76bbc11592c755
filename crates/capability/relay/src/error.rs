//! 中继错误定义。

use thiserror::Error;

/// 广播中继错误。
#[derive(Debug, Error)]
pub enum RelayError {
    /// 监听地址绑定失败。
    #[error("bind error: {0}")]
    Bind(String),
    /// 其余 IO 失败。
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
