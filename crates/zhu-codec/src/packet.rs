//! 压缩数据包 (Packet).
//!
//! 表示一个 RTP 式的线格式数据包. H.261AS 编码器在一帧超出数据包
//! 字节预算时会把一帧拆成多个 Packet, 以 `marker` 标志标记帧边界.

use bytes::Bytes;
use zhu_core::Rational;

/// 压缩数据包
///
/// 一帧视频可能对应多个 Packet; 携带 `marker = true` 的包表示
/// 一个逻辑帧到此完整 (对应 RTP 标记位).
#[derive(Debug, Clone)]
pub struct Packet {
    /// 压缩数据
    pub data: Bytes,
    /// 显示时间戳 (PTS)
    pub pts: i64,
    /// 解码时间戳 (DTS)
    pub dts: i64,
    /// 数据包时长 (以 time_base 为单位)
    pub duration: i64,
    /// 时间基
    pub time_base: Rational,
    /// 所属流的索引
    pub stream_index: usize,
    /// 是否为关键帧 (所属帧强制全量重传)
    pub is_keyframe: bool,
    /// 帧边界标志 (对应 RTP marker 位)
    pub marker: bool,
    /// RTP 式序列号 (每包递增, 解码端用于检测丢包)
    pub sequence: u16,
    /// 在承载流中的字节偏移量 (-1 表示未知)
    pub pos: i64,
}

impl Packet {
    /// 创建空数据包
    pub fn empty() -> Self {
        Self {
            data: Bytes::new(),
            pts: zhu_core::timestamp::NOPTS_VALUE,
            dts: zhu_core::timestamp::NOPTS_VALUE,
            duration: 0,
            time_base: Rational::UNDEFINED,
            stream_index: 0,
            is_keyframe: false,
            marker: false,
            sequence: 0,
            pos: -1,
        }
    }

    /// 从数据创建数据包
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::empty()
        }
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空包 (flush packet)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
