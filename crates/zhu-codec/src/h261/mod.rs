//! H.261 / H.261AS 公共核心.
//!
//! 编码器与两个解码器共享的底层构件:
//!
//! - `tables`: 规范 VLC 码表 (MBA, MTYPE, CBP, run-level), 之字扫描序, 常量
//! - `huffman`: 直接查找解码表构建器与编码查找表
//! - `grid`: 宏块网格 (宏块索引 → 像素原点的不可变映射)
//! - `dct`: 正向 8x8 DCT (编码端)
//! - `idct`: 整数 8x8 IDCT (解码端, 含 DC 平铺快速路径)
//! - `quant`: 量化级别映射表与反量化
//! - `block`: 8x8 块级系数解码 (Intra/Inter)

pub(crate) mod block;
pub(crate) mod dct;
pub(crate) mod grid;
pub(crate) mod huffman;
pub(crate) mod idct;
pub(crate) mod quant;
pub(crate) mod tables;
