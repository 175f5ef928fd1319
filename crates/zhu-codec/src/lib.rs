//! zhu-codec: H.261 / H.261AS 视频编解码器.
//!
//! 提供统一的 Encoder / Decoder trait, 数据包与帧类型, 以及编解码器
//! 注册表. 具体实现:
//!
//! - `h261as` 解码器: 任意尺寸变体, 分辨率由包头自描述
//! - `h261` 解码器: 经典 CIF 码流 (RTP 封装, 无运动补偿)
//! - `h261as` 编码器: 帧内编码 + 条件补充

pub mod codec_id;
pub mod codec_parameters;
pub mod decoder;
pub mod decoders;
pub mod encoder;
pub mod encoders;
pub mod frame;
mod h261;
pub mod packet;
pub mod registry;

pub use codec_id::{CodecId, MediaType};
pub use codec_parameters::{CodecParameters, CodecParamsType, VideoCodecParams};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use frame::{PictureType, VideoFrame};
pub use packet::Packet;
pub use registry::CodecRegistry;

/// 注册所有内置编解码器
pub fn register_all(registry: &mut CodecRegistry) {
    decoders::register_all_decoders(registry);
    encoders::register_all_encoders(registry);
}
