//! 协议端点错误类型定义

/// 协议端点错误。
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 不认识的协议标识
    #[error("unsupported protocol: {0}")]
    Unsupported(String),

    /// 端口绑定失败
    #[error("bind error: {0}")]
    Bind(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
