//! 解码后的视频帧数据.

use zhu_core::{PixelFormat, Rational};

/// 视频帧
///
/// 包含解码后的原始像素数据, 支持多平面存储.
/// YUV420P 格式有 3 个平面: Y, Cb, Cr.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// 各平面的像素数据
    pub data: Vec<Vec<u8>>,
    /// 各平面每行的字节数 (linesize / stride)
    pub linesize: Vec<usize>,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 像素格式
    pub pixel_format: PixelFormat,
    /// 显示时间戳 (PTS)
    pub pts: i64,
    /// 时间基
    pub time_base: Rational,
    /// 帧时长 (以 time_base 为单位)
    pub duration: i64,
    /// 是否为关键帧
    pub is_keyframe: bool,
    /// 图片类型
    pub picture_type: PictureType,
}

impl VideoFrame {
    /// 创建空的视频帧
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        let plane_count = pixel_format.plane_count() as usize;
        Self {
            data: vec![Vec::new(); plane_count],
            linesize: vec![0; plane_count],
            width,
            height,
            pixel_format,
            pts: zhu_core::timestamp::NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
            is_keyframe: false,
            picture_type: PictureType::None,
        }
    }

    /// 创建已分配平面缓冲区的 YUV420P 帧
    ///
    /// 所有平面填 0, linesize 为平面宽度.
    pub fn alloc_yuv420p(width: u32, height: u32) -> Self {
        let mut frame = Self::new(width, height, PixelFormat::Yuv420p);
        let (w, h) = (width as usize, height as usize);
        frame.data[0] = vec![0u8; w * h];
        frame.data[1] = vec![0u8; (w / 2) * (h / 2)];
        frame.data[2] = vec![0u8; (w / 2) * (h / 2)];
        frame.linesize = vec![w, w / 2, w / 2];
        frame
    }
}

/// 图片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PictureType {
    /// 未指定
    #[default]
    None,
    /// I 帧 (关键帧, 帧内编码)
    I,
    /// P 帧 (条件补充更新, 仅重传变化的宏块)
    P,
}
