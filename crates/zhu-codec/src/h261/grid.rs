//! 宏块网格.
//!
//! 把帧尺寸一次性展开为宏块索引 → 亮度平面像素原点的映射,
//! 编码器与解码器按同一线性序 (光栅序) 遍历宏块.

use zhu_core::{ZhuError, ZhuResult};

use super::tables::GOB_MB_COUNT;

/// 宏块网格
///
/// 构建后不可变, 描述一个确定分辨率下的宏块布局.
#[derive(Debug, Clone)]
pub(crate) struct MacroblockGrid {
    /// 帧宽 (像素)
    pub width: u32,
    /// 帧高 (像素)
    pub height: u32,
    /// 横向宏块数
    pub mb_cols: u32,
    /// 纵向宏块数
    pub mb_rows: u32,
}

impl MacroblockGrid {
    /// 创建网格. 宽高必须为 16 的整数倍.
    pub fn new(width: u32, height: u32) -> ZhuResult<Self> {
        if width == 0 || height == 0 || width % 16 != 0 || height % 16 != 0 {
            return Err(ZhuError::InvalidArgument(format!(
                "帧尺寸 {width}x{height} 不是 16 的整数倍"
            )));
        }
        Ok(Self {
            width,
            height,
            mb_cols: width / 16,
            mb_rows: height / 16,
        })
    }

    /// 宏块总数
    pub fn mb_count(&self) -> u32 {
        self.mb_cols * self.mb_rows
    }

    /// GOB 数 (每 GOB 固定 33 个宏块, 末尾 GOB 可不满)
    pub fn gob_count(&self) -> u32 {
        self.mb_count().div_ceil(GOB_MB_COUNT)
    }

    /// 宏块索引 → 亮度平面像素原点 (x, y)
    pub fn origin(&self, mb_index: u32) -> (u32, u32) {
        let x = (mb_index % self.mb_cols) * 16;
        let y = (mb_index / self.mb_cols) * 16;
        (x, y)
    }
}

/// 经典 H.261 CIF 的 GOB/MBA 寻址.
///
/// CIF 画面由 12 个 GOB 组成, 每个 GOB 为 11x3 宏块, 按两列排布:
/// 奇数号 GOB 在左半幅, 偶数号在右半幅, 自上而下.
/// `gobn` 为 1..=12 的 GOB 编号, `mba` 为 GOB 内 0 起的宏块序号.
pub(crate) fn cif_origin(gobn: u32, mba: u32) -> Option<(u32, u32)> {
    if !(1..=12).contains(&gobn) || mba >= 33 {
        return None;
    }
    let row = (gobn - 1) / 2;
    let col = (gobn - 1) % 2;
    let mbx = col * 11 + mba % 11;
    let mby = row * 3 + mba / 11;
    Some((mbx * 16, mby * 16))
}
