//! 比特流写入器.
//!
//! 提供向字节缓冲区按位写入数据的能力, 是 H.261AS 编码路径的基础设施.
//!
//! 按大端位序写入 (MSB first), 与 BitReader 对应.
//! 字节对齐时返回填充位数, 即线格式头部所需的 "end bit" 计数.

/// 比特流写入器
///
/// 向字节缓冲区按位写入数据, 使用大端位序 (MSB first).
///
/// # 示例
/// ```
/// use zhu_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b1011, 4);
/// bw.write_bits(0b0001, 4);
/// let data = bw.finish();
/// assert_eq!(data, vec![0b10110001]);
/// ```
pub struct BitWriter {
    /// 输出缓冲区
    data: Vec<u8>,
    /// 当前字节 (正在填充)
    current_byte: u8,
    /// 当前字节中已填充的位数 (0-7)
    bit_count: u8,
}

impl BitWriter {
    /// 创建新的比特流写入器
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// 以指定容量创建比特流写入器
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// 获取已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.data.len() * 8 + self.bit_count as usize
    }

    /// 写入 1 个位
    pub fn write_bit(&mut self, bit: u32) {
        self.current_byte = (self.current_byte << 1) | (bit & 1) as u8;
        self.bit_count += 1;
        if self.bit_count >= 8 {
            self.data.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// 写入 N 个位 (最多 32 位)
    ///
    /// 值的低 N 位被写入, 高位在前 (大端).
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={} 超过 32 位", n);

        if n == 0 {
            return;
        }

        let mut remaining = n;
        while remaining > 0 {
            let available = 8 - self.bit_count as u32;
            let to_write = remaining.min(available);

            // 提取要写入的位
            let shift = remaining - to_write;
            let mask = if to_write >= 32 {
                u32::MAX
            } else {
                (1u32 << to_write) - 1
            };
            let bits = ((value >> shift) & mask) as u8;

            if to_write >= 8 {
                // 整字节写入 (bit_count 必定为 0)
                self.current_byte = bits;
            } else {
                self.current_byte = (self.current_byte << to_write) | bits;
            }
            self.bit_count += to_write as u8;

            if self.bit_count >= 8 {
                self.data.push(self.current_byte);
                self.current_byte = 0;
                self.bit_count = 0;
            }

            remaining -= to_write;
        }
    }

    /// 写入有符号整数 (二进制补码)
    pub fn write_bits_signed(&mut self, value: i32, n: u32) {
        let mask = (1u64 << n) - 1;
        self.write_bits((value as u32) & mask as u32, n);
    }

    /// 对齐到字节边界, 返回填充的位数 (0-7)
    ///
    /// 用 0 填充. 返回值即 H.261AS 线格式头部中的 "end bit" 计数,
    /// 解码端据此判断最后一个字节中有效数据的边界.
    pub fn align_to_byte(&mut self) -> u32 {
        if self.bit_count == 0 {
            return 0;
        }
        let pad = 8 - self.bit_count as u32;
        self.current_byte <<= pad;
        self.data.push(self.current_byte);
        self.current_byte = 0;
        self.bit_count = 0;
        pad
    }

    /// 完成写入, 返回字节数据
    ///
    /// 如果当前不在字节边界, 自动用 0 填充.
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.data
    }

    /// 获取当前已完成的字节数据引用
    ///
    /// 注意: 不包括正在填充的当前字节.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 写入完整字节
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bit_count == 0 {
            // 快速路径: 已对齐
            self.data.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(u32::from(b), 8);
            }
        }
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}
