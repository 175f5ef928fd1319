//! 编解码器参数.
//!
//! 传递给编解码器的配置信息, 通常由上层管线在格式协商时填写.

use zhu_core::{PixelFormat, Rational};

use crate::codec_id::CodecId;

/// 编解码器参数
#[derive(Debug, Clone)]
pub struct CodecParameters {
    /// 编解码器标识
    pub codec_id: CodecId,
    /// 额外数据 (带外配置信息)
    pub extra_data: Vec<u8>,
    /// 码率 (bits/s, 0 表示未指定)
    pub bit_rate: u64,
    /// 媒体类型特定参数
    pub params: CodecParamsType,
}

/// 媒体类型特定参数
#[derive(Debug, Clone)]
pub enum CodecParamsType {
    /// 视频参数
    Video(VideoCodecParams),
    /// 无特定参数
    None,
}

/// 视频编解码器参数
#[derive(Debug, Clone)]
pub struct VideoCodecParams {
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 像素格式
    pub pixel_format: PixelFormat,
    /// 帧率
    pub frame_rate: Rational,
    /// 采样宽高比 (SAR)
    pub sample_aspect_ratio: Rational,
}

impl CodecParameters {
    /// 获取视频参数 (如果是视频流)
    pub fn video(&self) -> Option<&VideoCodecParams> {
        match &self.params {
            CodecParamsType::Video(v) => Some(v),
            _ => None,
        }
    }
}
