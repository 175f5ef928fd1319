//! # Zhu (竹)
//!
//! 纯 Rust 实现的 H.261 / H.261AS 视频编解码器.
//!
//! Zhu 提供一对面向低时延视频会议的编解码器:
//! - **h261as 编码器**: 帧内编码 + 条件补充, 任意 16 倍数分辨率,
//!   一帧按载荷预算拆分为多个 RTP 式数据包
//! - **h261as 解码器**: 分辨率由包头自描述, 在持久参考帧上累积更新
//! - **h261 解码器**: 经典 CIF 码流 (无运动补偿子集)
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use zhu::codec::CodecId;
//!
//! let registry = zhu::default_codec_registry();
//! let mut encoder = registry.create_encoder(CodecId::H261As).unwrap();
//! let mut decoder = registry.create_decoder(CodecId::H261As).unwrap();
//! # let _ = (&mut encoder, &mut decoder);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `zhu-core` | 比特流读写, 错误类型, 像素格式, 时间基 |
//! | `zhu-codec` | 编解码器框架与 H.261 / H.261AS 实现 |

/// 核心类型与工具
pub use zhu_core as core;

/// 编解码器框架
pub use zhu_codec as codec;

/// 获取 Zhu 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置编解码器的注册表
pub fn default_codec_registry() -> zhu_codec::CodecRegistry {
    let mut registry = zhu_codec::CodecRegistry::new();
    zhu_codec::register_all(&mut registry);
    registry
}
