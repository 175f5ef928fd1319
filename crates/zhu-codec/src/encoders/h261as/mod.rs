//! H.261AS 编码器.
//!
//! 仅帧内编码 + 条件补充: 每帧经 [`replenish`] 状态机决定哪些宏块
//! 需要传输, 选中的宏块做 DCT / 量化 / run-level 熵编码. 一帧超出
//! 数据包载荷预算时拆成多个包, 拆分处重发 GOB 头以便独立解码,
//! 最后一个包携带 marker.
//!
//! 量化分三档: 背景刷新用细步长, 普通运动用基准步长, 剧烈运动用
//! 粗步长. 单个宏块的系数超出逃逸编码的级别范围时, 就地加粗该
//! 宏块的步长并以 MQUANT 通告.

mod replenish;

use std::collections::VecDeque;

use log::{debug, trace};
use zhu_core::{BitWriter, ZhuError, ZhuResult};

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::encoder::Encoder;
use crate::frame::VideoFrame;
use crate::h261::dct::fdct_8x8;
use crate::h261::grid::MacroblockGrid;
use crate::h261::huffman::{mba_code, mtype_code, tcoeff_code};
use crate::h261::quant::{
    FILTER_POS_CHROMA, FILTER_POS_LUMA, LevelMapCache, quantize_dc,
};
use crate::h261::tables::{
    ESCAPE_LEVEL_BITS, ESCAPE_RUN_BITS, GOB_MB_COUNT, GOB_START_CODE, GOB_START_LEN,
    MtypeFlags, PACKET_BUDGET_BYTES, QUANT_MAX, TCOEFF_CODES, TCOEFF_ESCAPE, ZIGZAG_SCAN,
};
use crate::packet::Packet;
use replenish::{ConditionalReplenishment, SendTier};
use zhu_core::pixel_format::PixelFormat;

/// 默认基准量化步长
const DEFAULT_QUANT: u32 = 6;

/// 默认关键帧间隔 (帧)
const DEFAULT_KEY_INTERVAL: u32 = 30;

/// 一个宏块量化后的系数
struct MbCoeffs {
    /// 实际使用的量化步长 (可能因级别溢出而加粗)
    quant: u32,
    /// 6 个子块的 DC 编码值
    dc: [u32; 6],
    /// 6 个子块的 AC 级别, 按之字扫描位置索引
    levels: [[i8; 64]; 6],
}

/// 跨数据包的帧内扫描状态
struct FrameScan {
    /// 下一个待处理的宏块索引
    mb: u32,
}

/// H.261AS 编码器
pub struct H261ASEncoder {
    grid: Option<MacroblockGrid>,
    repl: Option<ConditionalReplenishment>,
    levels: LevelMapCache,
    queue: VecDeque<Packet>,
    sequence: u16,
    base_quant: u32,
    key_interval: u32,
    frames_since_key: u32,
    frame_count: u64,
    pending_key: bool,
    flushed: bool,
}

impl H261ASEncoder {
    pub fn new() -> Self {
        Self {
            grid: None,
            repl: None,
            levels: LevelMapCache::new(),
            queue: VecDeque::new(),
            sequence: 0,
            base_quant: DEFAULT_QUANT,
            key_interval: DEFAULT_KEY_INTERVAL,
            frames_since_key: 0,
            frame_count: 0,
            pending_key: false,
            flushed: false,
        }
    }

    /// 设置基准量化步长 (1..=31), 须在编码开始前调用
    pub fn set_quantizer(&mut self, quant: u32) -> ZhuResult<()> {
        if quant == 0 || quant > QUANT_MAX {
            return Err(ZhuError::InvalidArgument(format!("量化步长 {quant} 非法")));
        }
        self.base_quant = quant;
        Ok(())
    }

    /// 设置关键帧间隔 (0 表示只有首帧为关键帧)
    pub fn set_key_interval(&mut self, interval: u32) {
        self.key_interval = interval;
    }

    /// 强制下一帧为关键帧 (全量重传)
    pub fn force_keyframe(&mut self) {
        self.pending_key = true;
    }

    /// 发送档位 → 量化步长
    fn tier_quant(&self, tier: SendTier) -> u32 {
        match tier {
            SendTier::Background => (self.base_quant.saturating_sub(3)).max(1),
            SendTier::Motion => self.base_quant,
            SendTier::HighMotion => (self.base_quant + 4).min(QUANT_MAX),
        }
    }

    /// 对一个宏块的 6 个子块做 DCT 与量化
    fn quantize_macroblock(
        &mut self,
        frame: &VideoFrame,
        grid: &MacroblockGrid,
        mb: u32,
        tier_quant: u32,
    ) -> MbCoeffs {
        let (x, y) = grid.origin(mb);
        let luma_stride = grid.width as usize;
        let chroma_stride = luma_stride / 2;

        let mut raw = [[0i32; 64]; 6];
        for b in 0..4 {
            let offset = (y as usize + (b >> 1) * 8) * luma_stride + x as usize + (b & 1) * 8;
            raw[b] = fdct_8x8(&frame.data[0], offset, luma_stride);
        }
        let chroma_offset = (y as usize / 2) * chroma_stride + x as usize / 2;
        raw[4] = fdct_8x8(&frame.data[1], chroma_offset, chroma_stride);
        raw[5] = fdct_8x8(&frame.data[2], chroma_offset, chroma_stride);

        // 级别限幅在 ±127 (逃逸编码的补码范围): 超出时加粗步长
        let max_ac = raw
            .iter()
            .flat_map(|block| block[1..].iter())
            .map(|&c| c.unsigned_abs())
            .max()
            .unwrap_or(0);
        let mut quant = tier_quant;
        while quant < QUANT_MAX && max_ac / (2 * quant) > 127 {
            quant += 1;
        }

        let map = self.levels.get(quant);
        let mut coeffs = MbCoeffs {
            quant,
            dc: [0; 6],
            levels: [[0i8; 64]; 6],
        };
        for b in 0..6 {
            coeffs.dc[b] = quantize_dc(raw[b][0]);
            let filter_from = if b < 4 { FILTER_POS_LUMA } else { FILTER_POS_CHROMA };
            for pos in 1..64 {
                let coeff = raw[b][ZIGZAG_SCAN[pos] as usize];
                coeffs.levels[b][pos] = map.level(coeff, pos > filter_from) as i8;
            }
        }
        coeffs
    }

    /// 写一个宏块的 6 个子块 (DC + run-level + EOB)
    fn write_blocks(bw: &mut BitWriter, coeffs: &MbCoeffs) {
        let (escape_len, escape_code, _, _) = TCOEFF_CODES[TCOEFF_ESCAPE as usize];
        let (eob_len, eob_code, _, _) = TCOEFF_CODES[0];
        for b in 0..6 {
            bw.write_bits(coeffs.dc[b], 8);
            let mut run = 0u32;
            for pos in 1..64 {
                let level = coeffs.levels[b][pos] as i32;
                if level == 0 {
                    run += 1;
                    continue;
                }
                match tcoeff_code(run, level.unsigned_abs()) {
                    Some((code, len)) => {
                        bw.write_bits(code, len);
                        bw.write_bit(u32::from(level < 0));
                    }
                    None => {
                        bw.write_bits(escape_code as u32, escape_len as u32);
                        bw.write_bits(run, ESCAPE_RUN_BITS);
                        bw.write_bits_signed(level, ESCAPE_LEVEL_BITS);
                    }
                }
                run = 0;
            }
            bw.write_bits(eob_code as u32, eob_len as u32);
        }
    }

    /// 从扫描状态处编出一个数据包, 返回 (载荷, 发出的宏块数)
    fn encode_packet(
        &mut self,
        frame: &VideoFrame,
        grid: &MacroblockGrid,
        repl: &ConditionalReplenishment,
        scan: &mut FrameScan,
    ) -> ZhuResult<(Vec<u8>, u32, u32)> {
        let n_mb = grid.mb_count();
        let budget_bits = PACKET_BUDGET_BYTES * 8;
        let mut bw = BitWriter::with_capacity(PACKET_BUDGET_BYTES + 16);

        let (intra_code, intra_len) = mtype_code(MtypeFlags::INTRA | MtypeFlags::TCOEFF)
            .ok_or_else(|| ZhuError::Internal("MTYPE 码表缺少 Intra".into()))?;
        let (intra_q_code, intra_q_len) =
            mtype_code(MtypeFlags::INTRA | MtypeFlags::MQUANT | MtypeFlags::TCOEFF)
                .ok_or_else(|| ZhuError::Internal("MTYPE 码表缺少 Intra+MQUANT".into()))?;

        // 当前包内已写 GOB 头的 GOB
        let mut header_gob: Option<u32> = None;
        // GOB 内地址基准 (上一个已编码宏块的序号 + 1)
        let mut addr = 0u32;
        // 量化上下文 (GQUANT / MQUANT 的最近值)
        let mut context_quant = 0u32;
        let mut sent = 0u32;

        while scan.mb < n_mb {
            let mb = scan.mb;
            let Some(tier) = repl.send(mb as usize) else {
                scan.mb += 1;
                continue;
            };
            let gob = mb / GOB_MB_COUNT;
            let index_in_gob = mb % GOB_MB_COUNT;

            let coeffs = self.quantize_macroblock(frame, grid, mb, self.tier_quant(tier));

            if header_gob != Some(gob) {
                bw.write_bits(GOB_START_CODE, GOB_START_LEN);
                bw.write_bits(gob, 12);
                bw.write_bits(coeffs.quant, 5);
                header_gob = Some(gob);
                addr = 0;
                context_quant = coeffs.quant;
            }

            let diff = index_in_gob - addr + 1;
            let (mba, mba_len) = mba_code(diff)
                .ok_or_else(|| ZhuError::Internal(format!("MBA 增量 {diff} 超出码表")))?;
            bw.write_bits(mba, mba_len);

            if coeffs.quant != context_quant {
                bw.write_bits(intra_q_code, intra_q_len);
                bw.write_bits(coeffs.quant, 5);
                context_quant = coeffs.quant;
            } else {
                bw.write_bits(intra_code, intra_len);
            }
            Self::write_blocks(&mut bw, &coeffs);

            addr = index_in_gob + 1;
            scan.mb += 1;
            sent += 1;

            if bw.bits_written() >= budget_bits {
                // 预算已满: 先吞掉紧随其后的静止宏块, 避免产生只含头部的尾包
                while scan.mb < n_mb && repl.send(scan.mb as usize).is_none() {
                    scan.mb += 1;
                }
                break;
            }
        }

        let end_bits = bw.align_to_byte();
        Ok((bw.finish(), sent, end_bits))
    }

    /// 组装线格式数据包: 32 位头部 + 载荷
    fn assemble_packet(
        &mut self,
        grid: &MacroblockGrid,
        frame: &VideoFrame,
        payload: Vec<u8>,
        end_bits: u32,
        keyframe: bool,
    ) -> Packet {
        let mut bw = BitWriter::with_capacity(payload.len() + 4);
        bw.write_bits(end_bits, 3);
        bw.write_bits(self.base_quant, 5);
        bw.write_bits(grid.width / 16 - 1, 12);
        bw.write_bits(grid.height / 16 - 1, 12);
        bw.write_bytes(&payload);

        let mut packet = Packet::from_data(bw.finish());
        packet.pts = frame.pts;
        packet.dts = frame.pts;
        packet.duration = frame.duration;
        packet.time_base = frame.time_base;
        packet.is_keyframe = keyframe;
        packet.sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        packet
    }

    fn encode_frame(&mut self, frame: &VideoFrame) -> ZhuResult<()> {
        let grid = self
            .grid
            .as_ref()
            .ok_or_else(|| ZhuError::InvalidArgument("编码器尚未打开".into()))?
            .clone();
        if frame.width != grid.width
            || frame.height != grid.height
            || frame.pixel_format != PixelFormat::Yuv420p
        {
            return Err(ZhuError::InvalidArgument(format!(
                "帧 {}x{} ({}) 与编码器配置 {}x{} 不符",
                frame.width, frame.height, frame.pixel_format, grid.width, grid.height
            )));
        }

        let mut repl = self
            .repl
            .take()
            .ok_or_else(|| ZhuError::Internal("条件补充状态缺失".into()))?;

        let keyframe = self.frame_count == 0
            || self.pending_key
            || (self.key_interval > 0 && self.frames_since_key >= self.key_interval);
        if keyframe {
            self.pending_key = false;
            repl.next_frame_key();
        }
        repl.classify(&frame.data[0]);

        let mut scan = FrameScan { mb: 0 };
        let mut total_sent = 0u32;
        let mut packets = Vec::new();
        loop {
            let (payload, sent, end_bits) = self.encode_packet(frame, &grid, &repl, &mut scan)?;
            total_sent += sent;
            packets.push(self.assemble_packet(&grid, frame, payload, end_bits, keyframe));
            if scan.mb >= grid.mb_count() {
                break;
            }
        }
        if let Some(last) = packets.last_mut() {
            last.marker = true;
        }

        repl.replenish(&frame.data[0]);
        self.repl = Some(repl);

        self.frames_since_key = if keyframe { 1 } else { self.frames_since_key + 1 };
        self.frame_count += 1;
        trace!(
            "h261as 编码器: 第 {} 帧, 发出 {total_sent}/{} 个宏块, {} 个包, 关键帧 {keyframe}",
            self.frame_count,
            grid.mb_count(),
            packets.len()
        );
        self.queue.extend(packets);
        Ok(())
    }
}

impl Default for H261ASEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for H261ASEncoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H261As
    }

    fn name(&self) -> &str {
        "h261as"
    }

    fn open(&mut self, params: &CodecParameters) -> ZhuResult<()> {
        let video = params
            .video()
            .ok_or_else(|| ZhuError::InvalidArgument("缺少视频参数".into()))?;
        if video.pixel_format != PixelFormat::Yuv420p && video.pixel_format != PixelFormat::None {
            return Err(ZhuError::Unsupported(format!(
                "不支持的像素格式: {}",
                video.pixel_format
            )));
        }
        let grid = MacroblockGrid::new(video.width, video.height)?;
        if video.width / 16 > 4096 || video.height / 16 > 4096 {
            return Err(ZhuError::InvalidArgument(format!(
                "分辨率 {}x{} 超出 12 位尺寸码的表示范围",
                video.width, video.height
            )));
        }
        // GOB 编号为 12 位字段, 宏块总数不得超出其寻址范围
        if grid.gob_count() > 4096 {
            return Err(ZhuError::InvalidArgument(format!(
                "分辨率 {}x{} 共 {} 个 GOB, 超出 12 位 GOB 编号的寻址范围",
                video.width,
                video.height,
                grid.gob_count()
            )));
        }
        debug!(
            "打开 h261as 编码器: {}x{}, 基准量化 {}, 关键帧间隔 {}",
            video.width, video.height, self.base_quant, self.key_interval
        );
        self.repl = Some(ConditionalReplenishment::new(video.width, video.height));
        self.grid = Some(grid);
        Ok(())
    }

    fn send_frame(&mut self, frame: Option<&VideoFrame>) -> ZhuResult<()> {
        match frame {
            Some(frame) => {
                if !self.queue.is_empty() {
                    return Err(ZhuError::NeedMoreData);
                }
                self.encode_frame(frame)
            }
            None => {
                self.flushed = true;
                Ok(())
            }
        }
    }

    fn receive_packet(&mut self) -> ZhuResult<Packet> {
        match self.queue.pop_front() {
            Some(packet) => Ok(packet),
            None if self.flushed => Err(ZhuError::Eof),
            None => Err(ZhuError::NeedMoreData),
        }
    }

    fn flush(&mut self) {
        self.queue.clear();
        self.flushed = false;
        self.frames_since_key = 0;
        self.frame_count = 0;
        self.pending_key = false;
        if let Some(grid) = &self.grid {
            self.repl = Some(ConditionalReplenishment::new(grid.width, grid.height));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;
    use crate::decoders::h261as::H261ASDecoder;
    use zhu_core::Rational;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn video_params(width: u32, height: u32) -> CodecParameters {
        CodecParameters {
            codec_id: CodecId::H261As,
            extra_data: Vec::new(),
            bit_rate: 0,
            params: crate::codec_parameters::CodecParamsType::Video(
                crate::codec_parameters::VideoCodecParams {
                    width,
                    height,
                    pixel_format: PixelFormat::Yuv420p,
                    frame_rate: Rational::new(30, 1),
                    sample_aspect_ratio: Rational::new(1, 1),
                },
            ),
        }
    }

    fn make_frame(width: u32, height: u32, luma: impl Fn(u32, u32) -> u8) -> VideoFrame {
        let mut frame = VideoFrame::alloc_yuv420p(width, height);
        for y in 0..height {
            for x in 0..width {
                frame.data[0][(y * width + x) as usize] = luma(x, y);
            }
        }
        frame.data[1].fill(128);
        frame.data[2].fill(128);
        frame.pts = 0;
        frame.time_base = Rational::new(1, 30);
        frame
    }

    fn drain(enc: &mut H261ASEncoder) -> Vec<Packet> {
        let mut out = Vec::new();
        loop {
            match enc.receive_packet() {
                Ok(p) => out.push(p),
                Err(ZhuError::NeedMoreData) | Err(ZhuError::Eof) => break,
                Err(e) => panic!("取包失败: {e}"),
            }
        }
        out
    }

    fn decode_all(dec: &mut H261ASDecoder, packets: &[Packet]) -> VideoFrame {
        for p in packets {
            dec.send_packet(p).unwrap();
        }
        dec.receive_frame().unwrap()
    }

    #[test]
    fn test_灰场帧精确往返() {
        init_logs();
        let mut enc = H261ASEncoder::new();
        enc.open(&video_params(64, 48)).unwrap();
        let frame = make_frame(64, 48, |_, _| 128);
        enc.send_frame(Some(&frame)).unwrap();
        let packets = drain(&mut enc);

        assert!(!packets.is_empty());
        assert!(packets.last().unwrap().marker);
        assert!(packets[0].is_keyframe);

        let mut dec = H261ASDecoder::new();
        let decoded = decode_all(&mut dec, &packets);
        assert_eq!(decoded.width, 64);
        assert_eq!(decoded.height, 48);
        // 平坦块走 DC 快速路径, 128 精确重建
        for plane in 0..3 {
            assert_eq!(frame.data[plane], decoded.data[plane], "平面 {plane} 不一致");
        }
    }

    #[test]
    fn test_gob编号超界的分辨率拒绝() {
        // 5888x5888 的尺寸码本身合法, 但 368x368 宏块需要 4104 个
        // GOB, 超出 12 位 GOB 编号范围
        let mut enc = H261ASEncoder::new();
        assert!(matches!(
            enc.open(&video_params(5888, 5888)),
            Err(ZhuError::InvalidArgument(_))
        ));
        // 在范围内的大分辨率仍可打开
        let mut enc = H261ASEncoder::new();
        enc.open(&video_params(4096, 2048)).unwrap();
    }

    #[test]
    fn test_全零帧解码为直流下限() {
        let mut enc = H261ASEncoder::new();
        enc.open(&video_params(32, 32)).unwrap();
        let mut frame = make_frame(32, 32, |_, _| 0);
        frame.data[1].fill(0);
        frame.data[2].fill(0);
        enc.send_frame(Some(&frame)).unwrap();
        let packets = drain(&mut enc);

        let mut dec = H261ASDecoder::new();
        let decoded = decode_all(&mut dec, &packets);
        // DC 编码值下限为 1, 全零输入重建为全 1 平场
        for plane in 0..3 {
            assert!(decoded.data[plane].iter().all(|&p| p == 1));
        }
    }

    #[test]
    fn test_静止帧只发空包() {
        let mut enc = H261ASEncoder::new();
        enc.open(&video_params(64, 48)).unwrap();
        let frame = make_frame(64, 48, |x, y| (x + y) as u8);

        enc.send_frame(Some(&frame)).unwrap();
        let first = drain(&mut enc);
        let mut dec = H261ASDecoder::new();
        let decoded1 = decode_all(&mut dec, &first);

        // 同一帧再送一次: 无宏块需要传输, 只有 4 字节头部包
        enc.send_frame(Some(&frame)).unwrap();
        let second = drain(&mut enc);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].size(), 4);
        assert!(second[0].marker);
        assert!(!second[0].is_keyframe);

        let decoded2 = decode_all(&mut dec, &second);
        assert_eq!(decoded1.data[0], decoded2.data[0]);
        assert_eq!(decoded2.picture_type, crate::frame::PictureType::P);
    }

    #[test]
    fn test_渐变帧重建误差有界() {
        let mut enc = H261ASEncoder::new();
        enc.set_quantizer(2).unwrap();
        enc.open(&video_params(96, 64)).unwrap();
        let frame = make_frame(96, 64, |x, y| ((x * 2 + y) % 256) as u8);
        enc.send_frame(Some(&frame)).unwrap();
        let packets = drain(&mut enc);

        let mut dec = H261ASDecoder::new();
        let decoded = decode_all(&mut dec, &packets);
        let max_err = frame.data[0]
            .iter()
            .zip(&decoded.data[0])
            .map(|(&a, &b)| a.abs_diff(b) as u32)
            .max()
            .unwrap();
        assert!(max_err <= 24, "最大重建误差 {max_err} 超出容限");
    }

    #[test]
    fn test_棋盘格触发步长加粗仍可解() {
        // 最高频系数幅值约 2040, 步长 1 时级别远超逃逸范围, 须就地加粗
        let mut enc = H261ASEncoder::new();
        enc.set_quantizer(1).unwrap();
        enc.open(&video_params(32, 32)).unwrap();
        let frame = make_frame(32, 32, |x, y| if (x + y) % 2 == 0 { 0 } else { 255 });
        enc.send_frame(Some(&frame)).unwrap();
        let packets = drain(&mut enc);

        let mut dec = H261ASDecoder::new();
        let decoded = decode_all(&mut dec, &packets);
        assert_eq!(decoded.width, 32);
    }

    #[test]
    fn test_关键帧间隔() {
        let mut enc = H261ASEncoder::new();
        enc.set_key_interval(2);
        enc.open(&video_params(32, 32)).unwrap();
        let frame = make_frame(32, 32, |x, _| x as u8);

        let mut key_flags = Vec::new();
        for _ in 0..4 {
            enc.send_frame(Some(&frame)).unwrap();
            let packets = drain(&mut enc);
            key_flags.push(packets[0].is_keyframe);
        }
        assert_eq!(key_flags, vec![true, false, true, false]);
    }

    #[test]
    fn test_队列未取空时拒绝新帧() {
        let mut enc = H261ASEncoder::new();
        enc.open(&video_params(32, 32)).unwrap();
        let frame = make_frame(32, 32, |_, _| 128);
        enc.send_frame(Some(&frame)).unwrap();
        assert!(matches!(
            enc.send_frame(Some(&frame)),
            Err(ZhuError::NeedMoreData)
        ));
        drain(&mut enc);
    }

    #[test]
    fn test_刷新后eof() {
        let mut enc = H261ASEncoder::new();
        enc.open(&video_params(32, 32)).unwrap();
        enc.send_frame(None).unwrap();
        assert!(matches!(enc.receive_packet(), Err(ZhuError::Eof)));
    }
}
