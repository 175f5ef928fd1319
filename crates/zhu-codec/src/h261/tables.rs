//! H.261 规范码表与常量.
//!
//! 所有表均以 (码长, 码字) 的形式给出, 码字按最高位在前的顺序写入码流.
//! 解码查找表由 `huffman` 模块在首次使用时从这些三元组构建.

use bitflags::bitflags;

/// 之字扫描序: 扫描位置 → 8x8 块内的光栅索引
pub(crate) const ZIGZAG_SCAN: [u8; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, //
    17, 24, 32, 25, 18, 11, 4, 5, //
    12, 19, 26, 33, 40, 48, 41, 34, //
    27, 20, 13, 6, 7, 14, 21, 28, //
    35, 42, 49, 56, 57, 50, 43, 36, //
    29, 22, 15, 23, 30, 37, 44, 51, //
    58, 59, 52, 45, 38, 31, 39, 46, //
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// 单个数据包的载荷字节预算 (不含 4 字节包头)
pub(crate) const PACKET_BUDGET_BYTES: usize = 960;

/// H.261AS 中每个 GOB 的宏块数
pub(crate) const GOB_MB_COUNT: u32 = 33;

/// 量化步长上限 (GQUANT/MQUANT 为 5 位)
pub(crate) const QUANT_MAX: u32 = 31;

/// Intra DC 编码值下限 (0 保留)
pub(crate) const DC_CODED_MIN: i32 = 1;

/// Intra DC 编码值上限 (255 保留)
pub(crate) const DC_CODED_MAX: i32 = 254;

/// GOB 起始码码长 (0000 0000 0000 0001)
pub(crate) const GOB_START_LEN: u32 = 16;

/// GOB 起始码码字
pub(crate) const GOB_START_CODE: u32 = 0x0001;

/// MBA 表中表示填充码的符号 (非合法地址增量)
pub(crate) const MBA_STUFFING: u16 = 34;

/// MBA 表中表示 GOB 起始码的符号
pub(crate) const MBA_GOB_START: u16 = 35;

/// 宏块地址增量 (MBA) 码表: (码长, 码字), 下标 0 对应增量 1.
///
/// 增量 1..=33 之外另有填充码 MBA stuffing (0000 0001 111)
/// 与 16 位 GOB 起始码, 三者共用同一棵前缀树.
pub(crate) const MBA_CODES: [(u8, u16); 33] = [
    (1, 0b1),            // 1
    (3, 0b011),          // 2
    (3, 0b010),          // 3
    (4, 0b0011),         // 4
    (4, 0b0010),         // 5
    (5, 0b00011),        // 6
    (5, 0b00010),        // 7
    (7, 0b0000111),      // 8
    (7, 0b0000110),      // 9
    (8, 0b00001011),     // 10
    (8, 0b00001010),     // 11
    (8, 0b00001001),     // 12
    (8, 0b00001000),     // 13
    (8, 0b00000111),     // 14
    (8, 0b00000110),     // 15
    (10, 0b0000010111),  // 16
    (10, 0b0000010110),  // 17
    (10, 0b0000010101),  // 18
    (10, 0b0000010100),  // 19
    (10, 0b0000010011),  // 20
    (10, 0b0000010010),  // 21
    (11, 0b00000100011), // 22
    (11, 0b00000100010), // 23
    (11, 0b00000100001), // 24
    (11, 0b00000100000), // 25
    (11, 0b00000011111), // 26
    (11, 0b00000011110), // 27
    (11, 0b00000011101), // 28
    (11, 0b00000011100), // 29
    (11, 0b00000011011), // 30
    (11, 0b00000011010), // 31
    (11, 0b00000011001), // 32
    (11, 0b00000011000), // 33
];

/// MBA 填充码: (码长, 码字)
pub(crate) const MBA_STUFFING_CODE: (u8, u16) = (11, 0b00000001111);

bitflags! {
    /// 宏块类型 (MTYPE) 属性位
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct MtypeFlags: u8 {
        /// 帧内编码
        const INTRA = 0x01;
        /// 携带 MQUANT 字段
        const MQUANT = 0x02;
        /// 携带运动矢量 (MVD)
        const MVD = 0x04;
        /// 携带 CBP 字段
        const CBP = 0x08;
        /// 携带变换系数
        const TCOEFF = 0x10;
        /// 环路滤波
        const FILTER = 0x20;
    }
}

/// MTYPE 码表: (码长, 码字, 属性位), 按规范的 10 种类型排列
pub(crate) const MTYPE_CODES: [(u8, u16, MtypeFlags); 10] = [
    // Inter + CBP
    (1, 0b1, MtypeFlags::CBP.union(MtypeFlags::TCOEFF)),
    // Inter + MC + FIL + CBP
    (
        2,
        0b01,
        MtypeFlags::MVD
            .union(MtypeFlags::FILTER)
            .union(MtypeFlags::CBP)
            .union(MtypeFlags::TCOEFF),
    ),
    // Inter + MC + FIL (仅运动矢量)
    (3, 0b001, MtypeFlags::MVD.union(MtypeFlags::FILTER)),
    // Intra
    (4, 0b0001, MtypeFlags::INTRA.union(MtypeFlags::TCOEFF)),
    // Inter + MQUANT + CBP
    (
        5,
        0b00001,
        MtypeFlags::MQUANT
            .union(MtypeFlags::CBP)
            .union(MtypeFlags::TCOEFF),
    ),
    // Inter + MC + FIL + MQUANT + CBP
    (
        6,
        0b000001,
        MtypeFlags::MQUANT
            .union(MtypeFlags::MVD)
            .union(MtypeFlags::FILTER)
            .union(MtypeFlags::CBP)
            .union(MtypeFlags::TCOEFF),
    ),
    // Intra + MQUANT
    (
        7,
        0b0000001,
        MtypeFlags::INTRA
            .union(MtypeFlags::MQUANT)
            .union(MtypeFlags::TCOEFF),
    ),
    // Inter + MC (仅运动矢量)
    (8, 0b00000001, MtypeFlags::MVD),
    // Inter + MC + CBP
    (
        9,
        0b000000001,
        MtypeFlags::MVD.union(MtypeFlags::CBP).union(MtypeFlags::TCOEFF),
    ),
    // Inter + MC + MQUANT + CBP
    (
        10,
        0b0000000001,
        MtypeFlags::MQUANT
            .union(MtypeFlags::MVD)
            .union(MtypeFlags::CBP)
            .union(MtypeFlags::TCOEFF),
    ),
];

/// CBP (coded block pattern) 码表: (码长, 码字, CBP 值).
///
/// CBP 为 6 位掩码, 最高位对应块 0 (左上亮度块), 最低位对应 Cr 块.
/// CBP = 0 不可编码 (该情况由 MTYPE 不含 CBP 表达).
pub(crate) const CBP_CODES: [(u8, u16, u8); 63] = [
    (3, 0b111, 60),
    (4, 0b1101, 4),
    (4, 0b1100, 8),
    (4, 0b1011, 16),
    (4, 0b1010, 32),
    (5, 0b10011, 12),
    (5, 0b10010, 48),
    (5, 0b10001, 20),
    (5, 0b10000, 40),
    (5, 0b01111, 28),
    (5, 0b01110, 44),
    (5, 0b01101, 52),
    (5, 0b01100, 56),
    (5, 0b01011, 1),
    (5, 0b01010, 61),
    (5, 0b01001, 2),
    (5, 0b01000, 62),
    (6, 0b001111, 24),
    (6, 0b001110, 36),
    (6, 0b001101, 3),
    (6, 0b001100, 63),
    (7, 0b0010111, 5),
    (7, 0b0010110, 9),
    (7, 0b0010101, 17),
    (7, 0b0010100, 33),
    (7, 0b0010011, 6),
    (7, 0b0010010, 10),
    (7, 0b0010001, 18),
    (7, 0b0010000, 34),
    (8, 0b00011111, 7),
    (8, 0b00011110, 11),
    (8, 0b00011101, 19),
    (8, 0b00011100, 35),
    (8, 0b00011011, 13),
    (8, 0b00011010, 49),
    (8, 0b00011001, 21),
    (8, 0b00011000, 41),
    (8, 0b00010111, 14),
    (8, 0b00010110, 50),
    (8, 0b00010101, 22),
    (8, 0b00010100, 42),
    (8, 0b00010011, 15),
    (8, 0b00010010, 51),
    (8, 0b00010001, 23),
    (8, 0b00010000, 43),
    (8, 0b00001111, 25),
    (8, 0b00001110, 37),
    (8, 0b00001101, 26),
    (8, 0b00001100, 38),
    (8, 0b00001011, 29),
    (8, 0b00001010, 45),
    (8, 0b00001001, 53),
    (8, 0b00001000, 57),
    (8, 0b00000111, 30),
    (8, 0b00000110, 46),
    (8, 0b00000101, 54),
    (8, 0b00000100, 58),
    (9, 0b000000111, 31),
    (9, 0b000000110, 47),
    (9, 0b000000101, 55),
    (9, 0b000000100, 59),
    (9, 0b000000011, 27),
    (9, 0b000000010, 39),
];

/// TCOEFF 表中块结束符 (EOB) 的符号索引
pub(crate) const TCOEFF_EOB: u16 = 0;

/// TCOEFF 表中逃逸码的符号索引
pub(crate) const TCOEFF_ESCAPE: u16 = 1;

/// 逃逸编码的 run 字段位宽
pub(crate) const ESCAPE_RUN_BITS: u32 = 6;

/// 逃逸编码的 level 字段位宽 (8 位二进制补码)
pub(crate) const ESCAPE_LEVEL_BITS: u32 = 8;

/// 变换系数 (TCOEFF) 码表: (码长, 码字, run, |level|).
///
/// 前两项为 EOB 与逃逸码 (run/level 字段无意义, 记为 0).
/// 其余码字后跟 1 位符号位: 0 为正, 1 为负.
/// 码表之外的 (run, level) 组合走逃逸编码:
/// 6 位逃逸码 + 6 位 run + 8 位二进制补码 level.
pub(crate) const TCOEFF_CODES: [(u8, u16, u8, u8); 65] = [
    (2, 0b10, 0, 0),             // EOB
    (6, 0b000001, 0, 0),         // 逃逸
    (2, 0b11, 0, 1),             // 非首系数写法; 首系数缩短为 1 位
    (4, 0b0100, 0, 2),
    (5, 0b00101, 0, 3),
    (7, 0b0000110, 0, 4),
    (8, 0b00100110, 0, 5),
    (8, 0b00100001, 0, 6),
    (10, 0b0000001010, 0, 7),
    (12, 0b000000011101, 0, 8),
    (12, 0b000000011000, 0, 9),
    (12, 0b000000010011, 0, 10),
    (12, 0b000000010000, 0, 11),
    (13, 0b0000000011010, 0, 12),
    (13, 0b0000000011001, 0, 13),
    (13, 0b0000000011000, 0, 14),
    (13, 0b0000000010111, 0, 15),
    (3, 0b011, 1, 1),
    (6, 0b000110, 1, 2),
    (8, 0b00100101, 1, 3),
    (10, 0b0000001100, 1, 4),
    (12, 0b000000011011, 1, 5),
    (13, 0b0000000010110, 1, 6),
    (13, 0b0000000010101, 1, 7),
    (4, 0b0101, 2, 1),
    (7, 0b0000100, 2, 2),
    (10, 0b0000001011, 2, 3),
    (12, 0b000000010100, 2, 4),
    (13, 0b0000000010100, 2, 5),
    (5, 0b00111, 3, 1),
    (8, 0b00100100, 3, 2),
    (12, 0b000000011100, 3, 3),
    (13, 0b0000000010011, 3, 4),
    (5, 0b00110, 4, 1),
    (10, 0b0000001111, 4, 2),
    (12, 0b000000010010, 4, 3),
    (6, 0b000111, 5, 1),
    (10, 0b0000001001, 5, 2),
    (13, 0b0000000010010, 5, 3),
    (6, 0b000101, 6, 1),
    (12, 0b000000011110, 6, 2),
    (6, 0b000100, 7, 1),
    (12, 0b000000010101, 7, 2),
    (7, 0b0000111, 8, 1),
    (12, 0b000000010001, 8, 2),
    (7, 0b0000101, 9, 1),
    (13, 0b0000000010001, 9, 2),
    (8, 0b00100111, 10, 1),
    (13, 0b0000000010000, 10, 2),
    (8, 0b00100011, 11, 1),
    (8, 0b00100010, 12, 1),
    (8, 0b00100000, 13, 1),
    (10, 0b0000001110, 14, 1),
    (10, 0b0000001101, 15, 1),
    (10, 0b0000001000, 16, 1),
    (12, 0b000000011111, 17, 1),
    (12, 0b000000011010, 18, 1),
    (12, 0b000000011001, 19, 1),
    (12, 0b000000010111, 20, 1),
    (12, 0b000000010110, 21, 1),
    (13, 0b0000000011111, 22, 1),
    (13, 0b0000000011110, 23, 1),
    (13, 0b0000000011101, 24, 1),
    (13, 0b0000000011100, 25, 1),
    (13, 0b0000000011011, 26, 1),
];

#[cfg(test)]
mod tests {
    use super::*;

    /// 验证一组 (码长, 码字) 满足前缀条件
    fn assert_prefix_free(codes: &[(u8, u32)]) {
        for (i, &(la, ca)) in codes.iter().enumerate() {
            for &(lb, cb) in &codes[i + 1..] {
                let (short, long, ls, ll) = if la <= lb {
                    (ca, cb, la, lb)
                } else {
                    (cb, ca, lb, la)
                };
                assert_ne!(
                    short,
                    long >> (ll - ls),
                    "码字冲突: ({la}, {ca:b}) 与 ({lb}, {cb:b})"
                );
            }
        }
    }

    #[test]
    fn test_mba表前缀自由() {
        let mut codes: Vec<(u8, u32)> =
            MBA_CODES.iter().map(|&(l, c)| (l, c as u32)).collect();
        codes.push((MBA_STUFFING_CODE.0, MBA_STUFFING_CODE.1 as u32));
        codes.push((GOB_START_LEN as u8, GOB_START_CODE));
        assert_prefix_free(&codes);
    }

    #[test]
    fn test_mtype表前缀自由() {
        let codes: Vec<(u8, u32)> =
            MTYPE_CODES.iter().map(|&(l, c, _)| (l, c as u32)).collect();
        assert_prefix_free(&codes);
    }

    #[test]
    fn test_cbp表完整覆盖() {
        let codes: Vec<(u8, u32)> =
            CBP_CODES.iter().map(|&(l, c, _)| (l, c as u32)).collect();
        assert_prefix_free(&codes);

        let mut seen = [false; 64];
        for &(_, _, cbp) in &CBP_CODES {
            assert!((1..=63).contains(&cbp));
            assert!(!seen[cbp as usize], "CBP {cbp} 重复");
            seen[cbp as usize] = true;
        }
        assert_eq!(seen.iter().filter(|&&s| s).count(), 63);
    }

    #[test]
    fn test_tcoeff表前缀自由() {
        let codes: Vec<(u8, u32)> =
            TCOEFF_CODES.iter().map(|&(l, c, _, _)| (l, c as u32)).collect();
        assert_prefix_free(&codes);
    }

    #[test]
    fn test_之字扫描是置换() {
        let mut seen = [false; 64];
        for &idx in &ZIGZAG_SCAN {
            assert!(!seen[idx as usize]);
            seen[idx as usize] = true;
        }
        // 主对角线两侧对称性抽查
        assert_eq!(ZIGZAG_SCAN[0], 0);
        assert_eq!(ZIGZAG_SCAN[1], 1);
        assert_eq!(ZIGZAG_SCAN[2], 8);
        assert_eq!(ZIGZAG_SCAN[63], 63);
    }
}
