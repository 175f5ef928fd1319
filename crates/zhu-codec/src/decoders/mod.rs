//! 解码器实现.

pub mod h261;
pub mod h261as;

use crate::codec_id::CodecId;
use crate::decoder::Decoder;
use crate::registry::CodecRegistry;

/// 注册所有内置解码器
pub fn register_all_decoders(registry: &mut CodecRegistry) {
    registry.register_decoder(CodecId::H261, "h261", || {
        Ok(Box::new(h261::H261Decoder::new()) as Box<dyn Decoder>)
    });
    registry.register_decoder(CodecId::H261As, "h261as", || {
        Ok(Box::new(h261as::H261ASDecoder::new()) as Box<dyn Decoder>)
    });
}
