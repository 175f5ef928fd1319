//! VLC 直接查找解码与编码查找表.
//!
//! 解码表把最长码长的一段位窗直接映射到 (符号, 码长), 短码在表中
//! 复制到所有以其为前缀的表项, 单次查表即可完成解码, 无需逐位走树.
//! 表在进程内首次使用时构建一次, 此后只读共享.

use std::sync::OnceLock;

use zhu_core::{BitReader, ZhuError, ZhuResult};

use super::tables::{
    CBP_CODES, GOB_START_CODE, GOB_START_LEN, MBA_CODES, MBA_GOB_START, MBA_STUFFING,
    MBA_STUFFING_CODE, MTYPE_CODES, MtypeFlags, TCOEFF_CODES,
};

/// 非法码字在表项中的符号哨兵值
const ILLEGAL: u16 = u16::MAX;

/// 单个查找表项
#[derive(Clone, Copy)]
struct VlcEntry {
    /// 解码出的符号, `ILLEGAL` 表示非法码字
    symbol: u16,
    /// 消耗的位数
    len: u8,
}

/// 直接查找式 VLC 解码表
pub(crate) struct VlcTable {
    /// 查找窗口位宽 (等于表内最长码长)
    bits: u32,
    entries: Vec<VlcEntry>,
}

impl VlcTable {
    /// 从 (码长, 码字, 符号) 三元组构建查找表
    fn build(bits: u32, codes: impl IntoIterator<Item = (u8, u32, u16)>) -> Self {
        let mut entries = vec![
            VlcEntry {
                symbol: ILLEGAL,
                len: 0,
            };
            1 << bits
        ];
        for (len, code, symbol) in codes {
            debug_assert!(len as u32 <= bits);
            let shift = bits - len as u32;
            let base = (code << shift) as usize;
            for tail in 0..(1usize << shift) {
                entries[base + tail] = VlcEntry { symbol, len };
            }
        }
        Self { bits, entries }
    }

    /// 解码一个符号并前进读指针.
    ///
    /// 靠近码流末尾时查找窗口以零填充; 若命中的码字长于剩余位数,
    /// 或命中非法表项, 返回 `InvalidData`. 调用方负责判断此时
    /// 是否处于 end-bit 填充区内.
    pub(crate) fn decode(&self, reader: &mut BitReader) -> ZhuResult<u16> {
        let (window, avail) = reader.peek_bits_padded(self.bits)?;
        let entry = self.entries[window as usize];
        if entry.symbol == ILLEGAL || entry.len as u32 > avail {
            return Err(ZhuError::InvalidData(format!(
                "非法 VLC 码字 (位偏移 {})",
                reader.bits_read()
            )));
        }
        reader.skip_bits(entry.len as u32)?;
        Ok(entry.symbol)
    }
}

/// MBA 解码表: 符号 1..=33 为地址增量, 另含
/// [`MBA_STUFFING`] 与 [`MBA_GOB_START`]
pub(crate) fn mba_table() -> &'static VlcTable {
    static TABLE: OnceLock<VlcTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let codes = MBA_CODES
            .iter()
            .enumerate()
            .map(|(i, &(len, code))| (len, code as u32, (i + 1) as u16))
            .chain([
                (MBA_STUFFING_CODE.0, MBA_STUFFING_CODE.1 as u32, MBA_STUFFING),
                (GOB_START_LEN as u8, GOB_START_CODE, MBA_GOB_START),
            ]);
        VlcTable::build(GOB_START_LEN, codes)
    })
}

/// CBP 解码表: 符号即 CBP 值 (1..=63)
pub(crate) fn cbp_table() -> &'static VlcTable {
    static TABLE: OnceLock<VlcTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        VlcTable::build(
            9,
            CBP_CODES
                .iter()
                .map(|&(len, code, cbp)| (len, code as u32, cbp as u16)),
        )
    })
}

/// TCOEFF 解码表: 符号为 [`TCOEFF_CODES`] 的下标
pub(crate) fn tcoeff_table() -> &'static VlcTable {
    static TABLE: OnceLock<VlcTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        VlcTable::build(
            13,
            TCOEFF_CODES
                .iter()
                .enumerate()
                .map(|(i, &(len, code, _, _))| (len, code as u32, i as u16)),
        )
    })
}

/// 解码 MTYPE.
///
/// MTYPE 只有 10 个码字且强烈偏向短码, 按码长递增逐个试探比查表更直接.
pub(crate) fn decode_mtype(reader: &mut BitReader) -> ZhuResult<MtypeFlags> {
    let (window, avail) = reader.peek_bits_padded(10)?;
    for &(len, code, flags) in &MTYPE_CODES {
        if (len as u32) <= avail && window >> (10 - len as u32) == code as u32 {
            reader.skip_bits(len as u32)?;
            return Ok(flags);
        }
    }
    Err(ZhuError::InvalidData(format!(
        "非法 MTYPE 码字 (位偏移 {})",
        reader.bits_read()
    )))
}

/// MBA 编码查找: 地址增量 (1..=33) → (码字, 码长)
pub(crate) fn mba_code(diff: u32) -> Option<(u32, u32)> {
    let (len, code) = *MBA_CODES.get(diff.checked_sub(1)? as usize)?;
    Some((code as u32, len as u32))
}

/// MTYPE 编码查找: 属性位 → (码字, 码长)
pub(crate) fn mtype_code(flags: MtypeFlags) -> Option<(u32, u32)> {
    MTYPE_CODES
        .iter()
        .find(|&&(_, _, f)| f == flags)
        .map(|&(len, code, _)| (code as u32, len as u32))
}

/// CBP 编码查找: CBP 值 → (码字, 码长)
pub(crate) fn cbp_code(cbp: u8) -> Option<(u32, u32)> {
    CBP_CODES
        .iter()
        .find(|&&(_, _, c)| c == cbp)
        .map(|&(len, code, _)| (code as u32, len as u32))
}

/// TCOEFF 编码映射: `[run][|level|]` → (码字, 码长), 0 表示无码字 (走逃逸)
pub(crate) fn tcoeff_code(run: u32, level_abs: u32) -> Option<(u32, u32)> {
    static MAP: OnceLock<[[(u16, u8); 16]; 27]> = OnceLock::new();
    let map = MAP.get_or_init(|| {
        let mut map = [[(0u16, 0u8); 16]; 27];
        for &(len, code, run, level) in TCOEFF_CODES.iter().skip(2) {
            map[run as usize][level as usize] = (code, len);
        }
        map
    });
    let (code, len) = *map.get(run as usize)?.get(level_abs as usize)?;
    if len == 0 {
        None
    } else {
        Some((code as u32, len as u32))
    }
}
