//! H.261AS 解码器.
//!
//! H.261AS 是 H.261 的任意尺寸 (Arbitrary Size) 变体: 分辨率由每个
//! 数据包的 32 位头部自描述, GOB 为线性的 33 宏块分组, 宏块的 6 个
//! 子块无条件全部传输 (不使用 CBP), 不使用运动补偿.
//!
//! 解码器在内部平面缓冲区上做条件补充: 未传输的宏块保留上一帧内容,
//! 收到携带 marker 的包后输出累积帧.

use log::{debug, trace, warn};
use zhu_core::{BitReader, Rational, ZhuError, ZhuResult};

use crate::codec_id::CodecId;
use crate::decoder::Decoder;
use crate::frame::{PictureType, VideoFrame};
use crate::h261::block::decode_intra_block;
use crate::h261::grid::MacroblockGrid;
use crate::h261::huffman::{decode_mtype, mba_table};
use crate::h261::tables::{GOB_MB_COUNT, MBA_GOB_START, MBA_STUFFING, MtypeFlags, QUANT_MAX};
use crate::packet::Packet;
use zhu_core::pixel_format::PixelFormat;

/// H.261AS 解码器
pub struct H261ASDecoder {
    grid: Option<MacroblockGrid>,
    /// 持久平面缓冲区 [Y, Cb, Cr], 跨帧保留用于条件补充
    planes: [Vec<u8>; 3],
    frame_ready: bool,
    keyframe: bool,
    pts: i64,
    time_base: Rational,
    duration: i64,
    expected_seq: Option<u16>,
}

impl H261ASDecoder {
    pub fn new() -> Self {
        Self {
            grid: None,
            planes: [Vec::new(), Vec::new(), Vec::new()],
            frame_ready: false,
            keyframe: false,
            pts: zhu_core::timestamp::NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
            expected_seq: None,
        }
    }

    /// 用外部帧预置内部参考平面.
    ///
    /// 丢包恢复用: 上层拿到一个完整参考帧 (如重传或关键帧) 后,
    /// 以其内容覆盖解码器的累积状态.
    pub fn fill_frame(&mut self, frame: &VideoFrame) -> ZhuResult<()> {
        let grid = self
            .grid
            .as_ref()
            .ok_or_else(|| ZhuError::InvalidArgument("解码器尚未收到任何数据包".into()))?;
        if frame.width != grid.width
            || frame.height != grid.height
            || frame.pixel_format != PixelFormat::Yuv420p
        {
            return Err(ZhuError::InvalidArgument(format!(
                "参考帧 {}x{} ({}) 与解码器状态不匹配",
                frame.width, frame.height, frame.pixel_format
            )));
        }
        for (plane, src) in self.planes.iter_mut().zip(&frame.data) {
            plane.copy_from_slice(src);
        }
        Ok(())
    }

    /// 按头部宣告的分辨率 (重新) 分配平面
    fn ensure_dimensions(&mut self, width: u32, height: u32) -> ZhuResult<()> {
        let unchanged = self
            .grid
            .as_ref()
            .is_some_and(|g| g.width == width && g.height == height);
        if unchanged {
            return Ok(());
        }
        debug!("h261as 解码器: 分辨率 {width}x{height}");
        let grid = MacroblockGrid::new(width, height)?;
        let luma = (width * height) as usize;
        self.planes = [vec![0u8; luma], vec![0u8; luma / 4], vec![0u8; luma / 4]];
        self.grid = Some(grid);
        Ok(())
    }

    /// 解析包头之后的宏块层码流
    fn decode_stream(&mut self, reader: &mut BitReader, end_bits: u32, quant: u32) -> ZhuResult<()> {
        let grid = self.grid.as_ref().unwrap().clone();
        let mba = mba_table();

        let mut gob: u32 = 0;
        // 当前 GOB 内已寻址的宏块数 (下一个 MBA 增量的基准)
        let mut addr: u32 = 0;
        let mut gob_quant = quant;
        let mut decoded = 0u32;

        while reader.bits_left() > end_bits as usize {
            let symbol = mba.decode(reader)?;
            match symbol {
                MBA_STUFFING => continue,
                MBA_GOB_START => {
                    gob = reader.read_bits(12)?;
                    gob_quant = reader.read_bits(5)?;
                    if gob >= grid.gob_count() {
                        return Err(ZhuError::InvalidData(format!(
                            "GOB 编号 {gob} 超出范围 (共 {} 个)",
                            grid.gob_count()
                        )));
                    }
                    if gob_quant == 0 || gob_quant > QUANT_MAX {
                        return Err(ZhuError::InvalidData(format!("GQUANT {gob_quant} 非法")));
                    }
                    addr = 0;
                }
                diff => {
                    let index_in_gob = addr + diff as u32 - 1;
                    if index_in_gob >= GOB_MB_COUNT {
                        return Err(ZhuError::InvalidData(format!(
                            "宏块地址 {index_in_gob} 超出 GOB 范围"
                        )));
                    }
                    let mb_index = gob * GOB_MB_COUNT + index_in_gob;
                    if mb_index >= grid.mb_count() {
                        return Err(ZhuError::InvalidData(format!(
                            "宏块索引 {mb_index} 超出帧范围 (共 {} 个)",
                            grid.mb_count()
                        )));
                    }
                    addr = index_in_gob + 1;

                    let mtype = decode_mtype(reader)?;
                    if mtype.contains(MtypeFlags::MVD) {
                        return Err(ZhuError::Unsupported(
                            "h261as 码流不应包含运动矢量".into(),
                        ));
                    }
                    if mtype.contains(MtypeFlags::CBP) {
                        return Err(ZhuError::Unsupported(
                            "h261as 的子块无条件传输, 不应携带 CBP".into(),
                        ));
                    }
                    let mut mb_quant = gob_quant;
                    if mtype.contains(MtypeFlags::MQUANT) {
                        mb_quant = reader.read_bits(5)?;
                        if mb_quant == 0 || mb_quant > QUANT_MAX {
                            return Err(ZhuError::InvalidData(format!("MQUANT {mb_quant} 非法")));
                        }
                        gob_quant = mb_quant;
                    }

                    self.decode_macroblock(reader, &grid, mb_index, mb_quant)?;
                    decoded += 1;
                }
            }
        }
        trace!("h261as 解码器: 本包解出 {decoded} 个宏块");
        Ok(())
    }

    /// 解码一个 Intra 宏块的 6 个子块 (4 亮度 + Cb + Cr)
    fn decode_macroblock(
        &mut self,
        reader: &mut BitReader,
        grid: &MacroblockGrid,
        mb_index: u32,
        quant: u32,
    ) -> ZhuResult<()> {
        let (x, y) = grid.origin(mb_index);
        let luma_stride = grid.width as usize;
        let chroma_stride = luma_stride / 2;

        for b in 0..4 {
            let offset =
                (y as usize + (b >> 1) * 8) * luma_stride + x as usize + (b & 1) * 8;
            decode_intra_block(reader, quant, &mut self.planes[0], offset, luma_stride)?;
        }
        let chroma_offset = (y as usize / 2) * chroma_stride + x as usize / 2;
        decode_intra_block(reader, quant, &mut self.planes[1], chroma_offset, chroma_stride)?;
        decode_intra_block(reader, quant, &mut self.planes[2], chroma_offset, chroma_stride)?;
        Ok(())
    }
}

impl Default for H261ASDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for H261ASDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H261As
    }

    fn name(&self) -> &str {
        "h261as"
    }

    fn send_packet(&mut self, packet: &Packet) -> ZhuResult<()> {
        if packet.is_empty() {
            return Ok(());
        }

        if let Some(expected) = self.expected_seq {
            if packet.sequence != expected {
                warn!(
                    "h261as 解码器: 序列号跳变, 期望 {expected} 实际 {}, 可能丢包",
                    packet.sequence
                );
            }
        }
        self.expected_seq = Some(packet.sequence.wrapping_add(1));

        if packet.size() < 4 {
            return Err(ZhuError::InvalidData(format!(
                "数据包过短: {} 字节",
                packet.size()
            )));
        }

        let data = packet.data.clone();
        let mut reader = BitReader::new(&data);
        // 32 位包头: end-bit 计数 (3) | 量化步长 (5) | 宽度码 (12) | 高度码 (12)
        let end_bits = reader.read_bits(3)?;
        let quant = reader.read_bits(5)?;
        let width = (reader.read_bits(12)? + 1) << 4;
        let height = (reader.read_bits(12)? + 1) << 4;
        if quant == 0 || quant > QUANT_MAX {
            return Err(ZhuError::InvalidData(format!("包头量化步长 {quant} 非法")));
        }

        self.ensure_dimensions(width, height)?;
        self.decode_stream(&mut reader, end_bits, quant)?;

        if packet.marker {
            self.frame_ready = true;
            self.keyframe = packet.is_keyframe;
            self.pts = packet.pts;
            self.time_base = packet.time_base;
            self.duration = packet.duration;
        }
        Ok(())
    }

    fn receive_frame(&mut self) -> ZhuResult<VideoFrame> {
        if !self.frame_ready {
            return Err(ZhuError::NeedMoreData);
        }
        self.frame_ready = false;

        let grid = self.grid.as_ref().unwrap();
        let mut frame = VideoFrame::alloc_yuv420p(grid.width, grid.height);
        for (dst, src) in frame.data.iter_mut().zip(&self.planes) {
            dst.copy_from_slice(src);
        }
        frame.pts = self.pts;
        frame.time_base = self.time_base;
        frame.duration = self.duration;
        frame.is_keyframe = self.keyframe;
        frame.picture_type = if self.keyframe {
            PictureType::I
        } else {
            PictureType::P
        };
        Ok(frame)
    }

    fn flush(&mut self) {
        self.frame_ready = false;
        self.expected_seq = None;
        for plane in &mut self.planes {
            plane.fill(0);
        }
    }
}
