//! 统一错误类型定义.
//!
//! 所有 Zhu crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// Zhu 统一错误类型
#[derive(Debug, Error)]
pub enum ZhuError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的特性 (如运动向量数据)
    #[error("不支持的特性: {0}")]
    Unsupported(String),

    /// 编解码器状态错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 未找到指定的编解码器
    #[error("未找到编解码器: {0}")]
    CodecNotFound(String),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Zhu 统一 Result 类型
pub type ZhuResult<T> = Result<T, ZhuError>;
