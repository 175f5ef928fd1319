//! 编码器 trait 定义.
//!
//! 所有编码器实现必须实现 `Encoder` trait.

use zhu_core::ZhuResult;

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::frame::VideoFrame;
use crate::packet::Packet;

/// 编码器 trait
///
/// 定义了编码器的统一接口.
///
/// 编码流程:
/// 1. 调用 `send_frame()` 送入原始帧数据
/// 2. 调用 `receive_packet()` 取出压缩数据包, 直到返回 `NeedMoreData`
/// 3. 重复以上步骤直到所有数据处理完毕
/// 4. 送入 None 表示编码结束
///
/// 一帧可能产生多个数据包 (超出单包字节预算时拆分),
/// 最后一个包携带 `marker = true`.
pub trait Encoder: Send {
    /// 获取编码器标识
    fn codec_id(&self) -> CodecId;

    /// 获取编码器名称
    fn name(&self) -> &str;

    /// 使用参数配置编码器
    ///
    /// 必须在编码前调用, 提供分辨率与像素格式.
    fn open(&mut self, _params: &CodecParameters) -> ZhuResult<()> {
        Ok(())
    }

    /// 送入一帧原始数据进行编码
    ///
    /// # 参数
    /// - `frame`: 原始帧数据. `None` 表示刷新 (flush).
    ///
    /// # 返回
    /// - `Ok(())`: 帧已接受
    /// - `Err(ZhuError::NeedMoreData)`: 内部数据包队列未取空, 需要先取出数据包
    fn send_frame(&mut self, frame: Option<&VideoFrame>) -> ZhuResult<()>;

    /// 从编码器取出一个压缩数据包
    ///
    /// # 返回
    /// - `Ok(packet)`: 成功取出一个数据包
    /// - `Err(ZhuError::NeedMoreData)`: 需要送入更多帧
    /// - `Err(ZhuError::Eof)`: 刷新后所有数据包已取出
    fn receive_packet(&mut self) -> ZhuResult<Packet>;

    /// 刷新编码器, 清空内部状态
    fn flush(&mut self);
}
