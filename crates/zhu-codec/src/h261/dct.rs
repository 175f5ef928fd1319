//! 正向 8x8 DCT (编码端).
//!
//! 浮点分离式实现, 正交归一定标: 恒定值 v 的块变换后 DC = 8v,
//! AC 全零. 与 `idct` 模块的定点反变换配对使用.

use std::sync::OnceLock;

/// 余弦基: COS[u][n] = c(u) * cos((2n+1)*u*pi/16), c(0) = sqrt(1/8), 其余 1/2
fn cos_basis() -> &'static [[f64; 8]; 8] {
    static BASIS: OnceLock<[[f64; 8]; 8]> = OnceLock::new();
    BASIS.get_or_init(|| {
        let mut basis = [[0.0f64; 8]; 8];
        for (u, row) in basis.iter_mut().enumerate() {
            let c = if u == 0 {
                (1.0f64 / 8.0).sqrt()
            } else {
                0.5
            };
            for (n, v) in row.iter_mut().enumerate() {
                *v = c * ((2 * n + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        basis
    })
}

/// 对源平面中以 (offset, stride) 定位的 8x8 像素块做正向 DCT.
///
/// 返回光栅序的 64 个整数系数 (四舍五入).
pub(crate) fn fdct_8x8(plane: &[u8], offset: usize, stride: usize) -> [i32; 64] {
    let basis = cos_basis();

    // 列变换: tmp[u][n] = sum_m basis[u][m] * pix[m][n]
    let mut tmp = [[0.0f64; 8]; 8];
    for u in 0..8 {
        for n in 0..8 {
            let mut acc = 0.0;
            for m in 0..8 {
                acc += basis[u][m] * plane[offset + m * stride + n] as f64;
            }
            tmp[u][n] = acc;
        }
    }

    // 行变换: out[u][v] = sum_n basis[v][n] * tmp[u][n]
    let mut out = [0i32; 64];
    for u in 0..8 {
        for v in 0..8 {
            let mut acc = 0.0;
            for n in 0..8 {
                acc += basis[v][n] * tmp[u][n];
            }
            out[u * 8 + v] = acc.round() as i32;
        }
    }
    out
}
