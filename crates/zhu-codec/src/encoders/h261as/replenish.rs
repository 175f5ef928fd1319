//! 条件补充 (conditional replenishment) 状态机.
//!
//! 编码器只传输与参考快照差异超过阈值的宏块. 每个宏块维护一个
//! 年龄计数: 静止的宏块逐渐老化, 到期后以精细量化补发一次
//! (背景刷新), 消除低速变化留下的残迹.
//!
//! 参考快照只在宏块实际发出时更新, 保证编解码两端对 "上次传输的
//! 内容" 的理解一致: 缓慢漂移的宏块迟早会超过与旧快照的差异阈值,
//! 不会被逐帧的小变化掩盖.

/// 宏块发送档位, 决定量化精细程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SendTier {
    /// 剧烈运动, 最粗量化
    HighMotion,
    /// 普通运动
    Motion,
    /// 背景刷新, 最细量化
    Background,
}

/// 静止宏块晋升为背景刷新所需的帧数
const BACKGROUND_AGE: u8 = 8;

/// 亮度绝对差之和的运动判定阈值 (采样半数行, 128 像素)
const MOTION_THRESHOLD: u32 = 380;

/// 剧烈运动判定阈值
const HIGH_MOTION_THRESHOLD: u32 = 4 * MOTION_THRESHOLD;

pub(super) struct ConditionalReplenishment {
    width: usize,
    mb_cols: usize,
    mb_count: usize,
    /// 亮度参考快照, 仅在宏块发出时更新
    reference: Vec<u8>,
    /// 各宏块的静止帧计数
    age: Vec<u8>,
    /// 本帧的发送决策
    decision: Vec<Option<SendTier>>,
    /// 下一帧强制全量发送
    force_key: bool,
}

impl ConditionalReplenishment {
    pub fn new(width: u32, height: u32) -> Self {
        let mb_cols = (width / 16) as usize;
        let mb_count = mb_cols * (height / 16) as usize;
        Self {
            width: width as usize,
            mb_cols,
            mb_count,
            reference: vec![0u8; (width * height) as usize],
            age: vec![0u8; mb_count],
            decision: vec![None; mb_count],
            force_key: false,
        }
    }

    /// 下一次 `classify` 将所有宏块判为待发送 (关键帧)
    pub fn next_frame_key(&mut self) {
        self.force_key = true;
    }

    /// 对一帧亮度平面做逐宏块发送决策
    pub fn classify(&mut self, luma: &[u8]) {
        if self.force_key {
            self.force_key = false;
            self.decision.fill(Some(SendTier::Motion));
            self.age.fill(0);
            return;
        }

        for mb in 0..self.mb_count {
            let diff = self.luma_difference(luma, mb);
            self.decision[mb] = if diff > HIGH_MOTION_THRESHOLD {
                self.age[mb] = 0;
                Some(SendTier::HighMotion)
            } else if diff > MOTION_THRESHOLD {
                self.age[mb] = 0;
                Some(SendTier::Motion)
            } else {
                self.age[mb] += 1;
                if self.age[mb] >= BACKGROUND_AGE {
                    self.age[mb] = 0;
                    Some(SendTier::Background)
                } else {
                    None
                }
            };
        }
    }

    /// 宏块的发送决策 (`classify` 之后有效)
    pub fn send(&self, mb: usize) -> Option<SendTier> {
        self.decision[mb]
    }

    /// 把本帧实际发出的宏块写入参考快照
    pub fn replenish(&mut self, luma: &[u8]) {
        for mb in 0..self.mb_count {
            if self.decision[mb].is_none() {
                continue;
            }
            let (x, y) = (mb % self.mb_cols * 16, mb / self.mb_cols * 16);
            for row in 0..16 {
                let base = (y + row) * self.width + x;
                self.reference[base..base + 16].copy_from_slice(&luma[base..base + 16]);
            }
        }
    }

    /// 宏块亮度与参考快照的绝对差之和, 隔行采样
    fn luma_difference(&self, luma: &[u8], mb: usize) -> u32 {
        let (x, y) = (mb % self.mb_cols * 16, mb / self.mb_cols * 16);
        let mut sum = 0u32;
        for row in (0..16).step_by(2) {
            let base = (y + row) * self.width + x;
            for col in 0..16 {
                sum += luma[base + col].abs_diff(self.reference[base + col]) as u32;
            }
        }
        sum
    }
}
