//! 时间戳常量与工具.
//!
//! 基于 `time_base` 的时间戳系统: 实际时间 (秒) = pts * time_base.

/// 表示"未定义"的时间戳值
pub const NOPTS_VALUE: i64 = i64::MIN;
