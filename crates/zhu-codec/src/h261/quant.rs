//! 量化与反量化.
//!
//! AC 系数按量化步长 quant 线性量化, 级别限幅在 ±127 (逃逸编码的
//! 8 位补码范围). 每个步长的系数 → 级别映射展开为查找表,
//! 首次使用时构建并缓存.
//!
//! Intra DC 单独处理: 8 位定长编码, 编码值限幅在 [1, 254]
//! (0 与 255 为保留值), 反量化为编码值左移 3 位.

use super::tables::{DC_CODED_MAX, DC_CODED_MIN};

/// 映射表覆盖的系数幅值范围 (|coeff| < 2048, 8 位源的 DCT 上界为 2040)
const COEFF_BIAS: i32 = 2048;

/// 高频滤波生效的之字扫描位置下界 (亮度块)
pub(crate) const FILTER_POS_LUMA: usize = 20;

/// 高频滤波生效的之字扫描位置下界 (色度块)
pub(crate) const FILTER_POS_CHROMA: usize = 10;

/// Intra DC 量化: 系数 → 8 位编码值
pub(crate) fn quantize_dc(coeff: i32) -> u32 {
    (coeff >> 3).clamp(DC_CODED_MIN, DC_CODED_MAX) as u32
}

/// Intra DC 反量化: 8 位编码值 → 重建系数
pub(crate) fn dequantize_dc(coded: u32) -> i32 {
    (coded << 3) as i32
}

/// AC 级别反量化.
///
/// 重建值向奇数靠拢 (quant 为偶数时减 1), 以抵消量化的系统性偏差.
pub(crate) fn dequantize_level(level: i32, quant: u32) -> i32 {
    if level == 0 {
        return 0;
    }
    let q = quant as i32;
    let odd = 1 - (q & 1);
    let mag = (2 * level.abs() + 1) * q - odd;
    if level < 0 { -mag } else { mag }
}

/// 单个量化步长的系数 → 级别查找表.
///
/// 前 4096 项为常规映射, 后 4096 项为滤波映射 (幅值 1 的级别置零,
/// 用于抑制高频扫描位置上的噪声系数), 均以 `coeff + 2048` 为下标.
pub(crate) struct LevelMap {
    table: Box<[i8]>,
}

impl LevelMap {
    fn build(quant: u32) -> Self {
        let divisor = 2 * quant as i32;
        let mut table = vec![0i8; 2 * (2 * COEFF_BIAS) as usize].into_boxed_slice();
        for coeff in -COEFF_BIAS..COEFF_BIAS {
            let level = (coeff / divisor).clamp(-127, 127) as i8;
            let idx = (coeff + COEFF_BIAS) as usize;
            table[idx] = level;
            table[idx + (2 * COEFF_BIAS) as usize] =
                if level.abs() <= 1 { 0 } else { level };
        }
        Self { table }
    }

    /// 量化一个 AC 系数
    #[inline]
    pub fn level(&self, coeff: i32, filtered: bool) -> i32 {
        let mut idx = (coeff + COEFF_BIAS) as usize;
        if filtered {
            idx += (2 * COEFF_BIAS) as usize;
        }
        self.table[idx] as i32
    }
}

/// 按量化步长缓存的级别映射表
pub(crate) struct LevelMapCache {
    maps: Vec<Option<LevelMap>>,
}

impl LevelMapCache {
    pub fn new() -> Self {
        let mut maps = Vec::with_capacity(32);
        maps.resize_with(32, || None);
        Self { maps }
    }

    /// 取步长 quant (1..=31) 的映射表, 缺失时构建
    pub fn get(&mut self, quant: u32) -> &LevelMap {
        debug_assert!((1..=31).contains(&quant));
        self.maps[quant as usize].get_or_insert_with(|| LevelMap::build(quant))
    }
}
