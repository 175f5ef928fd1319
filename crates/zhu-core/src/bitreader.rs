//! 比特流读取器.
//!
//! 提供从字节缓冲区中按位读取数据的能力, 是 H.261 / H.261AS 解码路径的基础设施.
//!
//! 按大端位序读取 (MSB first), 这是视频编解码器中最常用的位序.
//! 读取越过缓冲区末尾是致命错误 (`ZhuError::Eof`), 绝不静默返回 0.

use crate::{ZhuError, ZhuResult};

/// 比特流读取器
///
/// 从字节缓冲区中按位读取数据, 使用大端位序 (MSB first).
///
/// # 示例
/// ```
/// use zhu_core::bitreader::BitReader;
///
/// let data = [0b10110001, 0b01010101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(4).unwrap(), 0b0001);
/// assert_eq!(br.read_bits(8).unwrap(), 0b01010101);
/// ```
pub struct BitReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 当前字节索引
    byte_pos: usize,
    /// 当前字节中的位位置 (0-7, 0 表示最高位)
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// 获取已读取的总位数
    pub fn bits_read(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    /// 获取剩余可读位数 (包含尾部填充位)
    pub fn bits_left(&self) -> usize {
        if self.byte_pos >= self.data.len() {
            return 0;
        }
        (self.data.len() - self.byte_pos) * 8 - self.bit_pos as usize
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> ZhuResult<u32> {
        if self.byte_pos >= self.data.len() {
            return Err(ZhuError::Eof);
        }

        let bit = (self.data[self.byte_pos] >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos >= 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }

        Ok(u32::from(bit))
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// 按大端位序读取, 返回值的低 N 位有效.
    pub fn read_bits(&mut self, n: u32) -> ZhuResult<u32> {
        if n == 0 {
            return Ok(0);
        }
        if n > 32 {
            return Err(ZhuError::InvalidArgument(format!(
                "read_bits: n={} 超过 32 位",
                n,
            )));
        }
        if (n as usize) > self.bits_left() {
            return Err(ZhuError::Eof);
        }

        let mut result: u32 = 0;
        let mut remaining = n;

        while remaining > 0 {
            let available = 8 - self.bit_pos as u32;
            let to_read = remaining.min(available);

            // 从当前字节中提取位
            let shift = available - to_read;
            let mask = ((1u32 << to_read) - 1) as u8;
            let bits = (self.data[self.byte_pos] >> shift) & mask;

            result = (result << to_read) | u32::from(bits);

            self.bit_pos += to_read as u8;
            if self.bit_pos >= 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
            remaining -= to_read;
        }

        Ok(result)
    }

    /// 读取有符号整数 (二进制补码)
    pub fn read_bits_signed(&mut self, n: u32) -> ZhuResult<i32> {
        let val = self.read_bits(n)?;
        if n == 0 {
            return Ok(0);
        }
        if n >= 32 {
            return Ok(val as i32);
        }
        // 符号扩展: 若最高有效位为 1, 则填充高位
        if (val >> (n - 1)) & 1 != 0 {
            Ok(val as i32 | !((1i32 << n) - 1))
        } else {
            Ok(val as i32)
        }
    }

    /// 窥视 N 个位 (不移动位置)
    pub fn peek_bits(&mut self, n: u32) -> ZhuResult<u32> {
        let saved_byte = self.byte_pos;
        let saved_bit = self.bit_pos;
        let result = self.read_bits(n);
        self.byte_pos = saved_byte;
        self.bit_pos = saved_bit;
        result
    }

    /// 窥视下一个位 (不移动位置)
    pub fn peek_bit(&mut self) -> ZhuResult<u32> {
        self.peek_bits(1)
    }

    /// 窥视 N 个位, 允许越过末尾
    ///
    /// 变长码的直接查找解码需要固定宽度的前瞻窗口, 但靠近缓冲区末尾时
    /// 剩余位数可能不足 N. 此方法将剩余位左对齐到 N 位窗口中, 低位补 0,
    /// 并返回 `(窗口值, 有效位数)`. 调用方必须校验解出的码长不超过有效位数.
    pub fn peek_bits_padded(&mut self, n: u32) -> ZhuResult<(u32, u32)> {
        let avail = (self.bits_left() as u32).min(n);
        if avail == 0 {
            return Err(ZhuError::Eof);
        }
        let window = self.peek_bits(avail)? << (n - avail);
        Ok((window, avail))
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: u32) -> ZhuResult<()> {
        if (n as usize) > self.bits_left() {
            return Err(ZhuError::Eof);
        }

        let total_bits = self.bit_pos as u32 + n;
        self.byte_pos += (total_bits / 8) as usize;
        self.bit_pos = (total_bits % 8) as u8;

        Ok(())
    }

    /// 获取当前字节位置
    pub fn byte_position(&self) -> usize {
        self.byte_pos
    }

    /// 获取底层数据的引用
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}
