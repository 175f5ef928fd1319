//! 经典 H.261 解码器 (CIF).
//!
//! 解码 RTP 封装的标准 H.261 码流, 固定 CIF 分辨率 (352x288).
//! 画面由 12 个 GOB 组成, 每个 GOB 为 11x3 宏块, 奇数号 GOB 在
//! 左半幅, 偶数号在右半幅. Inter 宏块按 CBP 传输部分子块,
//! 残差叠加到持久参考平面上 (无运动补偿的条件补充).
//!
//! 携带运动矢量的宏块类型不受支持, 遇到即报错.

use log::{debug, trace, warn};
use zhu_core::{BitReader, Rational, ZhuError, ZhuResult};

use crate::codec_id::CodecId;
use crate::decoder::Decoder;
use crate::frame::{PictureType, VideoFrame};
use crate::h261::block::{decode_inter_block, decode_intra_block};
use crate::h261::grid::cif_origin;
use crate::h261::huffman::{cbp_table, decode_mtype, mba_table};
use crate::h261::tables::{MBA_GOB_START, MBA_STUFFING, MtypeFlags, QUANT_MAX};
use crate::packet::Packet;
use zhu_core::pixel_format::PixelFormat;

/// CIF 宽度
const CIF_WIDTH: u32 = 352;

/// CIF 高度
const CIF_HEIGHT: u32 = 288;

/// 经典 H.261 解码器
pub struct H261Decoder {
    /// 持久平面缓冲区 [Y, Cb, Cr], 跨帧保留用于条件补充
    planes: [Vec<u8>; 3],
    frame_ready: bool,
    keyframe: bool,
    pts: i64,
    time_base: Rational,
    duration: i64,
    expected_seq: Option<u16>,
}

impl H261Decoder {
    pub fn new() -> Self {
        let luma = (CIF_WIDTH * CIF_HEIGHT) as usize;
        Self {
            planes: [vec![0u8; luma], vec![0u8; luma / 4], vec![0u8; luma / 4]],
            frame_ready: false,
            keyframe: false,
            pts: zhu_core::timestamp::NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
            expected_seq: None,
        }
    }

    /// 用外部帧预置内部参考平面 (丢包恢复)
    pub fn fill_frame(&mut self, frame: &VideoFrame) -> ZhuResult<()> {
        if frame.width != CIF_WIDTH
            || frame.height != CIF_HEIGHT
            || frame.pixel_format != PixelFormat::Yuv420p
        {
            return Err(ZhuError::InvalidArgument(format!(
                "参考帧 {}x{} ({}) 不是 CIF YUV420P",
                frame.width, frame.height, frame.pixel_format
            )));
        }
        for (plane, src) in self.planes.iter_mut().zip(&frame.data) {
            plane.copy_from_slice(src);
        }
        Ok(())
    }

    /// 解析 GOB/宏块层码流.
    ///
    /// `gobn`/`addr` 为包头给出的续传上下文: 包从上一包中断的
    /// GOB 中途继续时, 地址基准不是 0.
    fn decode_stream(
        &mut self,
        reader: &mut BitReader,
        end_bits: u32,
        mut gobn: u32,
        mut addr: u32,
        mut quant: u32,
    ) -> ZhuResult<()> {
        let mba = mba_table();
        let mut decoded = 0u32;

        while reader.bits_left() > end_bits as usize {
            let symbol = mba.decode(reader)?;
            match symbol {
                MBA_STUFFING => continue,
                MBA_GOB_START => {
                    let gn = reader.read_bits(4)?;
                    if gn == 0 {
                        // GN 0: 图像层头部, 跳过 TR/PTYPE 与扩展字段
                        let _tr = reader.read_bits(5)?;
                        let _ptype = reader.read_bits(6)?;
                        while reader.read_bit()? == 1 {
                            reader.skip_bits(8)?;
                        }
                        continue;
                    }
                    if gn > 12 {
                        return Err(ZhuError::InvalidData(format!("GOB 编号 {gn} 超出 CIF 范围")));
                    }
                    gobn = gn;
                    quant = reader.read_bits(5)?;
                    if quant == 0 || quant > QUANT_MAX {
                        return Err(ZhuError::InvalidData(format!("GQUANT {quant} 非法")));
                    }
                    addr = 0;
                }
                diff => {
                    let index_in_gob = addr + diff as u32 - 1;
                    let (x, y) = cif_origin(gobn, index_in_gob).ok_or_else(|| {
                        ZhuError::InvalidData(format!(
                            "宏块地址非法: GOB {gobn} 内第 {index_in_gob} 块"
                        ))
                    })?;
                    addr = index_in_gob + 1;

                    let mtype = decode_mtype(reader)?;
                    if mtype.contains(MtypeFlags::MVD) {
                        return Err(ZhuError::Unsupported(
                            "不支持带运动补偿的宏块类型".into(),
                        ));
                    }
                    if mtype.contains(MtypeFlags::MQUANT) {
                        quant = reader.read_bits(5)?;
                        if quant == 0 || quant > QUANT_MAX {
                            return Err(ZhuError::InvalidData(format!("MQUANT {quant} 非法")));
                        }
                    }

                    if mtype.contains(MtypeFlags::INTRA) {
                        self.decode_intra_macroblock(reader, quant, x, y)?;
                    } else {
                        let cbp = cbp_table().decode(reader)? as u32;
                        self.decode_inter_macroblock(reader, quant, x, y, cbp)?;
                    }
                    decoded += 1;
                }
            }
        }
        trace!("h261 解码器: 本包解出 {decoded} 个宏块");
        Ok(())
    }

    fn decode_intra_macroblock(
        &mut self,
        reader: &mut BitReader,
        quant: u32,
        x: u32,
        y: u32,
    ) -> ZhuResult<()> {
        let luma_stride = CIF_WIDTH as usize;
        let chroma_stride = luma_stride / 2;
        for b in 0..4 {
            let offset = (y as usize + (b >> 1) * 8) * luma_stride + x as usize + (b & 1) * 8;
            decode_intra_block(reader, quant, &mut self.planes[0], offset, luma_stride)?;
        }
        let chroma_offset = (y as usize / 2) * chroma_stride + x as usize / 2;
        decode_intra_block(reader, quant, &mut self.planes[1], chroma_offset, chroma_stride)?;
        decode_intra_block(reader, quant, &mut self.planes[2], chroma_offset, chroma_stride)?;
        Ok(())
    }

    /// Inter 宏块: 只传 CBP 标记的子块, 残差叠加到参考平面.
    /// CBP 的最高位对应子块 0 (左上亮度块), 最低位对应 Cr.
    fn decode_inter_macroblock(
        &mut self,
        reader: &mut BitReader,
        quant: u32,
        x: u32,
        y: u32,
        cbp: u32,
    ) -> ZhuResult<()> {
        let luma_stride = CIF_WIDTH as usize;
        let chroma_stride = luma_stride / 2;
        for b in 0..4 {
            if cbp & (1 << (5 - b)) == 0 {
                continue;
            }
            let offset = (y as usize + (b >> 1) * 8) * luma_stride + x as usize + (b & 1) * 8;
            decode_inter_block(reader, quant, &mut self.planes[0], offset, luma_stride)?;
        }
        let chroma_offset = (y as usize / 2) * chroma_stride + x as usize / 2;
        if cbp & 0b10 != 0 {
            decode_inter_block(reader, quant, &mut self.planes[1], chroma_offset, chroma_stride)?;
        }
        if cbp & 0b01 != 0 {
            decode_inter_block(reader, quant, &mut self.planes[2], chroma_offset, chroma_stride)?;
        }
        Ok(())
    }
}

impl Default for H261Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for H261Decoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H261
    }

    fn name(&self) -> &str {
        "h261"
    }

    fn send_packet(&mut self, packet: &Packet) -> ZhuResult<()> {
        if packet.is_empty() {
            return Ok(());
        }

        if let Some(expected) = self.expected_seq {
            if packet.sequence != expected {
                warn!(
                    "h261 解码器: 序列号跳变, 期望 {expected} 实际 {}, 可能丢包",
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
        // RTP H.261 包头 (32 位):
        // SBIT(3) EBIT(3) I(1) V(1) GOBN(4) MBAP(5) QUANT(5) HMVD(5) VMVD(5)
        let start_bits = reader.read_bits(3)?;
        let end_bits = reader.read_bits(3)?;
        let intra_only = reader.read_bits(1)?;
        let _motion = reader.read_bits(1)?;
        let gobn = reader.read_bits(4)?;
        let mbap = reader.read_bits(5)?;
        let quant = reader.read_bits(5)?;
        let hmvd = reader.read_bits(5)?;
        let vmvd = reader.read_bits(5)?;
        if hmvd != 0 || vmvd != 0 {
            // 运动矢量续传上下文只在带 MC 的码流中出现
            return Err(ZhuError::Unsupported("不支持带运动补偿的码流".into()));
        }
        reader.skip_bits(start_bits)?;
        debug!(
            "h261 解码器: 包 seq={} GOBN={gobn} MBAP={mbap} QUANT={quant} I={intra_only}",
            packet.sequence
        );

        self.decode_stream(&mut reader, end_bits, gobn, mbap, quant.max(1))?;

        if packet.marker {
            self.frame_ready = true;
            self.keyframe = packet.is_keyframe || intra_only == 1;
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

        let mut frame = VideoFrame::alloc_yuv420p(CIF_WIDTH, CIF_HEIGHT);
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
