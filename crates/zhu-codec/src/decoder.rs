//! 解码器 trait 定义.
//!
//! 所有解码器实现必须实现 `Decoder` trait.

use zhu_core::ZhuResult;

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::frame::VideoFrame;
use crate::packet::Packet;

/// 解码器 trait
///
/// 定义了解码器的统一接口. 所有具体解码器 (H.261, H.261AS) 都实现此 trait.
///
/// 解码流程:
/// 1. 调用 `send_packet()` 送入压缩数据包
/// 2. 调用 `receive_frame()` 取出解码后的帧
/// 3. 重复以上步骤直到所有数据处理完毕
///
/// 一个逻辑帧可能横跨多个数据包; 在收到携带 `marker` 标志的包之前,
/// `receive_frame()` 返回 `Err(ZhuError::NeedMoreData)`.
///
/// 单个实例不支持并发调用, 调用方必须按实例串行化;
/// 实例之间共享的 VLC 查找表是只读的, 可安全共享.
pub trait Decoder: Send {
    /// 获取解码器标识
    fn codec_id(&self) -> CodecId;

    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 使用参数配置解码器
    ///
    /// 对于从码流头部自描述分辨率的解码器 (H.261AS), 参数可为空;
    /// 默认实现为空操作.
    fn open(&mut self, _params: &CodecParameters) -> ZhuResult<()> {
        Ok(())
    }

    /// 送入一个压缩数据包进行解码
    ///
    /// # 返回
    /// - `Ok(())`: 数据包已接受并解析
    /// - `Err(ZhuError::InvalidData | Unsupported)`: 码流损坏或包含
    ///   本解码器不支持的特性, 当前包作废
    fn send_packet(&mut self, packet: &Packet) -> ZhuResult<()>;

    /// 从解码器取出一帧解码数据
    ///
    /// # 返回
    /// - `Ok(frame)`: 成功取出一帧
    /// - `Err(ZhuError::NeedMoreData)`: 帧尚未完整, 需要送入更多数据包
    fn receive_frame(&mut self) -> ZhuResult<VideoFrame>;

    /// 刷新解码器, 清空内部状态
    ///
    /// 用于 seek 或丢包重同步后重置解码器状态.
    fn flush(&mut self);
}
