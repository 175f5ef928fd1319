//! 整数 8x8 IDCT.
//!
//! 定点实现, 行变换右移 11 位, 列变换右移 20 位, 输入为反量化后的
//! DCT 系数, 输出为空间域样值 (Intra 时即像素值, Inter 时为残差).
//!
//! 常量为 cos(k*pi/16) 的 2^14.5 倍定标, 与 `dct` 模块的正向
//! 变换配对: 仅 DC 非零的块经过本变换得到恒定块, 数值与
//! `(dc + 4) >> 3` 的平铺快速路径逐位一致.

const W1: i64 = 22725;
const W2: i64 = 21407;
const W3: i64 = 19266;
const W4: i64 = 16383;
const W5: i64 = 12873;
const W6: i64 = 8867;
const W7: i64 = 4520;

const ROW_SHIFT: u32 = 11;
const COL_SHIFT: u32 = 20;

/// 一维 8 点蝶形, 输出右移 `shift` 位.
///
/// `x[0]` 以原值参与运算, 调用方预先乘 W4 并加入舍入项;
/// 其余各点的定标常量在蝶形内部施加.
#[inline]
fn butterfly(x: [i64; 8], shift: u32) -> [i64; 8] {
    let a0 = x[0] + W2 * x[2] + W4 * x[4] + W6 * x[6];
    let a1 = x[0] + W6 * x[2] - W4 * x[4] - W2 * x[6];
    let a2 = x[0] - W6 * x[2] - W4 * x[4] + W2 * x[6];
    let a3 = x[0] - W2 * x[2] + W4 * x[4] - W6 * x[6];

    let b0 = W1 * x[1] + W3 * x[3] + W5 * x[5] + W7 * x[7];
    let b1 = W3 * x[1] - W7 * x[3] - W1 * x[5] - W5 * x[7];
    let b2 = W5 * x[1] - W1 * x[3] + W7 * x[5] + W3 * x[7];
    let b3 = W7 * x[1] - W5 * x[3] + W3 * x[5] - W1 * x[7];

    [
        (a0 + b0) >> shift,
        (a1 + b1) >> shift,
        (a2 + b2) >> shift,
        (a3 + b3) >> shift,
        (a3 - b3) >> shift,
        (a2 - b2) >> shift,
        (a1 - b1) >> shift,
        (a0 - b0) >> shift,
    ]
}

/// 对 8x8 系数块做原地 IDCT
pub(crate) fn idct_8x8(block: &mut [i32; 64]) {
    // 行变换
    for row in 0..8 {
        let base = row * 8;
        let r = &block[base..base + 8];
        if r[1..].iter().all(|&v| v == 0) {
            // 行内仅 DC: 所有输出等于 DC 的 8 倍定标
            let dc = (r[0] as i64) << 3;
            for v in &mut block[base..base + 8] {
                *v = dc as i32;
            }
            continue;
        }
        let mut x = [0i64; 8];
        for (i, v) in r.iter().enumerate() {
            x[i] = *v as i64;
        }
        x[0] = x[0] * W4 + (1 << (ROW_SHIFT - 1));
        let out = butterfly(x, ROW_SHIFT);
        for (i, v) in out.iter().enumerate() {
            block[base + i] = *v as i32;
        }
    }
    // 列变换
    for col in 0..8 {
        let mut x = [0i64; 8];
        for i in 0..8 {
            x[i] = block[i * 8 + col] as i64;
        }
        if x[1..].iter().all(|&v| v == 0) {
            let dc = ((x[0] * W4 + (1 << (COL_SHIFT - 1))) >> COL_SHIFT) as i32;
            for i in 0..8 {
                block[i * 8 + col] = dc;
            }
            continue;
        }
        x[0] = x[0] * W4 + (1 << (COL_SHIFT - 1));
        let out = butterfly(x, COL_SHIFT);
        for (i, v) in out.iter().enumerate() {
            block[i * 8 + col] = *v as i32;
        }
    }
}
