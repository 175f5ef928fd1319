//! 像素格式定义.
//!
//! 定义了视频帧中像素的存储格式. H.261 / H.261AS 编解码路径只接受
//! `Yuv420p`, 其余格式用于上层管线的格式协商与转换.

use std::fmt;

/// 像素格式
///
/// 定义了视频帧中每个像素的数据排列方式.
/// 命名规则: 颜色空间 + 位深 + 排列方式 (P=Planar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// 未指定
    None,
    /// YUV 4:2:0 平面格式, 8 位 (H.261 系编解码器唯一接受的格式)
    Yuv420p,
    /// YUV 4:2:2 平面格式, 8 位
    Yuv422p,
    /// YUV 4:4:4 平面格式, 8 位
    Yuv444p,
    /// RGB 各 8 位, 打包
    Rgb24,
    /// 灰度 8 位
    Gray8,
}

impl PixelFormat {
    /// 获取平面数量
    pub const fn plane_count(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Rgb24 | Self::Gray8 => 1,
        }
    }

    /// 获取色度子采样 (log2 水平, log2 垂直)
    ///
    /// 例如 YUV420 返回 (1, 1), 表示色度分辨率为亮度的 1/2 x 1/2.
    pub const fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p => (1, 1),
            Self::Yuv422p => (1, 0),
            _ => (0, 0),
        }
    }

    /// 计算一帧的总字节数 (8 位格式)
    pub const fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        let pixels = (width * height) as usize;
        match self {
            Self::Yuv420p => Some(pixels + pixels / 2),
            Self::Yuv422p => Some(pixels * 2),
            Self::Yuv444p => Some(pixels * 3),
            Self::Rgb24 => Some(pixels * 3),
            Self::Gray8 => Some(pixels),
            Self::None => None,
        }
    }

    /// 获取格式名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Rgb24 => "rgb24",
            Self::Gray8 => "gray8",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
