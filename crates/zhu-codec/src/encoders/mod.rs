//! 编码器实现.

pub mod h261as;

use crate::codec_id::CodecId;
use crate::encoder::Encoder;
use crate::registry::CodecRegistry;

/// 注册所有内置编码器
pub fn register_all_encoders(registry: &mut CodecRegistry) {
    registry.register_encoder(CodecId::H261As, "h261as", || {
        Ok(Box::new(h261as::H261ASEncoder::new()) as Box<dyn Encoder>)
    });
}
