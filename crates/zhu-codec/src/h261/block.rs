//! 8x8 块级系数解码.
//!
//! 从码流中读出一个块的 run-level 序列, 反量化, 反之字扫描,
//! IDCT 后写入目标平面. Intra 块直接覆盖像素, Inter 块把残差
//! 叠加到参考像素上.

use zhu_core::{BitReader, ZhuError, ZhuResult};

use super::huffman::tcoeff_table;
use super::idct::idct_8x8;
use super::quant::{dequantize_dc, dequantize_level};
use super::tables::{
    ESCAPE_LEVEL_BITS, ESCAPE_RUN_BITS, TCOEFF_CODES, TCOEFF_EOB, TCOEFF_ESCAPE, ZIGZAG_SCAN,
};

/// 解出的一个 run-level 对, EOB 时为 None
fn next_run_level(reader: &mut BitReader) -> ZhuResult<Option<(u32, i32)>> {
    let symbol = tcoeff_table().decode(reader)?;
    if symbol == TCOEFF_EOB {
        return Ok(None);
    }
    if symbol == TCOEFF_ESCAPE {
        let run = reader.read_bits(ESCAPE_RUN_BITS)?;
        let level = reader.read_bits_signed(ESCAPE_LEVEL_BITS)?;
        if level == 0 || level == -128 {
            return Err(ZhuError::InvalidData(format!(
                "逃逸编码级别 {level} 为保留值"
            )));
        }
        return Ok(Some((run, level)));
    }
    let (_, _, run, magnitude) = TCOEFF_CODES[symbol as usize];
    let sign = reader.read_bit()?;
    let level = if sign == 1 {
        -(magnitude as i32)
    } else {
        magnitude as i32
    };
    Ok(Some((run as u32, level)))
}

/// 解码一个 Intra 块并写入目标平面.
///
/// 块结构: 8 位定长 DC + run-level 序列 + EOB.
/// 仅 DC 的块走平铺快速路径, 与完整 IDCT 逐位一致.
pub(crate) fn decode_intra_block(
    reader: &mut BitReader,
    quant: u32,
    dst: &mut [u8],
    offset: usize,
    stride: usize,
) -> ZhuResult<()> {
    let dc_coded = reader.read_bits(8)?;
    let dc = dequantize_dc(dc_coded);

    let mut block = [0i32; 64];
    block[0] = dc;
    let mut pos: usize = 0;
    let mut ac_count = 0u32;
    while let Some((run, level)) = next_run_level(reader)? {
        pos += run as usize + 1;
        if pos > 63 {
            return Err(ZhuError::InvalidData(format!(
                "系数扫描位置 {pos} 越界"
            )));
        }
        block[ZIGZAG_SCAN[pos] as usize] = dequantize_level(level, quant);
        ac_count += 1;
    }

    if ac_count == 0 {
        // 平铺快速路径
        let value = ((dc + 4) >> 3).clamp(0, 255) as u8;
        for row in 0..8 {
            let base = offset + row * stride;
            dst[base..base + 8].fill(value);
        }
        return Ok(());
    }

    idct_8x8(&mut block);
    for row in 0..8 {
        let base = offset + row * stride;
        for col in 0..8 {
            dst[base + col] = block[row * 8 + col].clamp(0, 255) as u8;
        }
    }
    Ok(())
}

/// 解码一个 Inter 块并把残差叠加到目标平面.
///
/// Inter 块没有定长 DC, 首系数使用缩短写法: 码流以 1 开头时,
/// 1 位码字 + 符号位表示 (run 0, level ±1); EOB 不会出现在首位.
pub(crate) fn decode_inter_block(
    reader: &mut BitReader,
    quant: u32,
    dst: &mut [u8],
    offset: usize,
    stride: usize,
) -> ZhuResult<()> {
    let mut block = [0i32; 64];
    let mut pos: i64 = -1;

    // 首系数
    if reader.peek_bit()? == 1 {
        reader.skip_bits(1)?;
        let sign = reader.read_bit()?;
        let level = if sign == 1 { -1 } else { 1 };
        block[0] = dequantize_level(level, quant);
        pos = 0;
    }

    while let Some((run, level)) = next_run_level(reader)? {
        pos += run as i64 + 1;
        if pos > 63 {
            return Err(ZhuError::InvalidData(format!(
                "系数扫描位置 {pos} 越界"
            )));
        }
        block[ZIGZAG_SCAN[pos as usize] as usize] = dequantize_level(level, quant);
    }

    idct_8x8(&mut block);
    for row in 0..8 {
        let base = offset + row * stride;
        for col in 0..8 {
            let rec = dst[base + col] as i32 + block[row * 8 + col];
            dst[base + col] = rec.clamp(0, 255) as u8;
        }
    }
    Ok(())
}
