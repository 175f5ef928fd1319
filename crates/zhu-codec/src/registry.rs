//! 编解码器注册表.
//!
//! 支持动态查找和实例化编解码器.

use std::collections::HashMap;

use zhu_core::ZhuResult;

use crate::codec_id::CodecId;
use crate::decoder::Decoder;
use crate::encoder::Encoder;

/// 解码器工厂函数类型
pub type DecoderFactory = fn() -> ZhuResult<Box<dyn Decoder>>;

/// 编码器工厂函数类型
pub type EncoderFactory = fn() -> ZhuResult<Box<dyn Encoder>>;

/// 编解码器注册表
///
/// 管理所有已注册的编解码器, 支持按 CodecId 查找并创建实例.
pub struct CodecRegistry {
    /// 解码器工厂映射
    decoders: HashMap<CodecId, Vec<DecoderEntry>>,
    /// 编码器工厂映射
    encoders: HashMap<CodecId, Vec<EncoderEntry>>,
}

/// 解码器注册条目
struct DecoderEntry {
    /// 解码器名称
    name: String,
    /// 工厂函数
    factory: DecoderFactory,
}

/// 编码器注册条目
struct EncoderEntry {
    /// 编码器名称
    name: String,
    /// 工厂函数
    factory: EncoderFactory,
}

impl CodecRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
            encoders: HashMap::new(),
        }
    }

    /// 注册一个解码器
    pub fn register_decoder(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        factory: DecoderFactory,
    ) {
        self.decoders
            .entry(codec_id)
            .or_default()
            .push(DecoderEntry {
                name: name.into(),
                factory,
            });
    }

    /// 注册一个编码器
    pub fn register_encoder(
        &mut self,
        codec_id: CodecId,
        name: impl Into<String>,
        factory: EncoderFactory,
    ) {
        self.encoders
            .entry(codec_id)
            .or_default()
            .push(EncoderEntry {
                name: name.into(),
                factory,
            });
    }

    /// 创建指定编解码器 ID 的解码器实例
    pub fn create_decoder(&self, codec_id: CodecId) -> ZhuResult<Box<dyn Decoder>> {
        let entries = self.decoders.get(&codec_id).ok_or_else(|| {
            zhu_core::ZhuError::CodecNotFound(format!("未找到 {} 的解码器", codec_id))
        })?;
        // 使用第一个注册的解码器 (优先级最高)
        let entry = &entries[0];
        (entry.factory)()
    }

    /// 创建指定编解码器 ID 的编码器实例
    pub fn create_encoder(&self, codec_id: CodecId) -> ZhuResult<Box<dyn Encoder>> {
        let entries = self.encoders.get(&codec_id).ok_or_else(|| {
            zhu_core::ZhuError::CodecNotFound(format!("未找到 {} 的编码器", codec_id))
        })?;
        let entry = &entries[0];
        (entry.factory)()
    }

    /// 获取所有已注册的解码器名称
    pub fn list_decoders(&self) -> Vec<(CodecId, &str)> {
        let mut result = Vec::new();
        for (id, entries) in &self.decoders {
            for entry in entries {
                result.push((*id, entry.name.as_str()));
            }
        }
        result
    }

    /// 获取所有已注册的编码器名称
    pub fn list_encoders(&self) -> Vec<(CodecId, &str)> {
        let mut result = Vec::new();
        for (id, entries) in &self.encoders {
            for entry in entries {
                result.push((*id, entry.name.as_str()));
            }
        }
        result
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}
