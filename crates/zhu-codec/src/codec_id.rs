//! 编解码器标识符.
//!
//! 为每种编解码算法分配唯一标识, 与承载格式无关.

use std::fmt;

/// 媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// 视频
    Video,
    /// 数据 (未知)
    Data,
}

/// 编解码器标识符
///
/// 唯一标识一种编解码算法.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// 未知编解码器
    None,
    /// H.261 (ITU-T, 经典 RTP 负载, 固定 CIF 分辨率)
    H261,
    /// H.261AS (任意尺寸变体, 32 位自描述头部)
    H261As,
    /// Raw 视频 (未压缩)
    RawVideo,
}

impl CodecId {
    /// 获取编解码器对应的媒体类型
    pub const fn media_type(&self) -> MediaType {
        match self {
            Self::None => MediaType::Data,
            Self::H261 | Self::H261As | Self::RawVideo => MediaType::Video,
        }
    }

    /// 获取编解码器的人类可读名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::H261 => "h261",
            Self::H261As => "h261as",
            Self::RawVideo => "rawvideo",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
