//! # zhu-core
//!
//! Zhu 编解码库核心 crate, 提供基础类型定义、错误处理和位流工具.
//!
//! 位流读写器是所有压缩编解码路径 (H.261, H.261AS) 的基础设施.

pub mod bitreader;
pub mod bitwriter;
pub mod error;
pub mod pixel_format;
pub mod rational;
pub mod timestamp;

// 重导出常用类型
pub use bitreader::BitReader;
pub use bitwriter::BitWriter;
pub use error::{ZhuError, ZhuResult};
pub use pixel_format::PixelFormat;
pub use rational::Rational;
