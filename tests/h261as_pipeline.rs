//! H.261AS 编解码管线集成测试.
//!
//! 通过注册表走公开 API, 覆盖多包拆分、条件补充、丢包恢复等
//! 跨模块场景.

use zhu::codec::decoders::h261as::H261ASDecoder;
use zhu::codec::encoders::h261as::H261ASEncoder;
use zhu::codec::{
    CodecId, CodecParameters, CodecParamsType, Decoder, Encoder, Packet, VideoCodecParams,
    VideoFrame,
};
use zhu::core::{PixelFormat, Rational, ZhuError};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn video_params(width: u32, height: u32) -> CodecParameters {
    CodecParameters {
        codec_id: CodecId::H261As,
        extra_data: Vec::new(),
        bit_rate: 0,
        params: CodecParamsType::Video(VideoCodecParams {
            width,
            height,
            pixel_format: PixelFormat::Yuv420p,
            frame_rate: Rational::new(30, 1),
            sample_aspect_ratio: Rational::new(1, 1),
        }),
    }
}

fn make_frame(width: u32, height: u32, mut luma: impl FnMut(u32, u32) -> u8) -> VideoFrame {
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

/// 伪随机噪声帧, 逼迫每个宏块产出大量系数
fn make_noise_frame(width: u32, height: u32) -> VideoFrame {
    let mut seed: u32 = 0x2545f491;
    make_frame(width, height, move |_, _| {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        (seed >> 16) as u8
    })
}

fn drain(enc: &mut dyn Encoder) -> Vec<Packet> {
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

#[test]
fn test_注册表往返() {
    init_logs();
    let registry = zhu::default_codec_registry();
    let mut enc = registry.create_encoder(CodecId::H261As).unwrap();
    let mut dec = registry.create_decoder(CodecId::H261As).unwrap();

    enc.open(&video_params(176, 144)).unwrap();
    let frame = make_frame(176, 144, |_, _| 128);
    enc.send_frame(Some(&frame)).unwrap();
    let packets = drain(enc.as_mut());
    assert!(!packets.is_empty());

    for p in &packets {
        dec.send_packet(p).unwrap();
    }
    let decoded = dec.receive_frame().unwrap();
    assert_eq!(decoded.width, 176);
    assert_eq!(decoded.height, 144);
    assert_eq!(decoded.data[0], frame.data[0]);
}

#[test]
fn test_噪声帧多包拆分() {
    init_logs();
    let mut enc = H261ASEncoder::new();
    enc.set_quantizer(2).unwrap();
    enc.open(&video_params(352, 288)).unwrap();
    let frame = make_noise_frame(352, 288);
    enc.send_frame(Some(&frame)).unwrap();
    let packets = drain(&mut enc);

    // CIF 噪声帧远超单包载荷预算
    assert!(packets.len() > 1, "噪声帧只编出 {} 个包", packets.len());
    for (i, p) in packets.iter().enumerate() {
        // 预算检查发生在整宏块之后, 单包最多超出一个最坏情况宏块
        assert!(p.size() <= 2048, "包 {i} 大小 {} 超出预期上限", p.size());
        assert_eq!(p.sequence, packets[0].sequence + i as u16);
        assert_eq!(p.marker, i == packets.len() - 1);
        assert!(p.is_keyframe);
    }

    let mut dec = H261ASDecoder::new();
    for p in &packets {
        dec.send_packet(p).unwrap();
    }
    let decoded = dec.receive_frame().unwrap();
    assert_eq!(decoded.width, 352);
    assert!(decoded.is_keyframe);

    // 拆分续传不得跳过或重复宏块: 整帧平均重建误差有界
    let sum_err: u64 = frame.data[0]
        .iter()
        .zip(&decoded.data[0])
        .map(|(&a, &b)| a.abs_diff(b) as u64)
        .sum();
    let mean_err = sum_err as f64 / frame.data[0].len() as f64;
    assert!(mean_err <= 10.0, "平均重建误差 {mean_err:.2} 超出容限");
}

#[test]
fn test_marker之前不出帧() {
    let mut enc = H261ASEncoder::new();
    enc.open(&video_params(352, 288)).unwrap();
    enc.send_frame(Some(&make_noise_frame(352, 288))).unwrap();
    let packets = drain(&mut enc);
    assert!(packets.len() > 1);

    let mut dec = H261ASDecoder::new();
    for p in &packets[..packets.len() - 1] {
        dec.send_packet(p).unwrap();
        assert!(matches!(dec.receive_frame(), Err(ZhuError::NeedMoreData)));
    }
    dec.send_packet(packets.last().unwrap()).unwrap();
    assert!(dec.receive_frame().is_ok());
}

#[test]
fn test_条件补充只传变化宏块() {
    init_logs();
    let mut enc = H261ASEncoder::new();
    enc.open(&video_params(96, 64)).unwrap();
    let frame_a = make_frame(96, 64, |_, _| 60);
    enc.send_frame(Some(&frame_a)).unwrap();
    let packets_a = drain(&mut enc);

    let mut dec = H261ASDecoder::new();
    for p in &packets_a {
        dec.send_packet(p).unwrap();
    }
    let decoded_a = dec.receive_frame().unwrap();

    // 只改动左上角一个宏块
    let frame_b = make_frame(96, 64, |x, y| if x < 16 && y < 16 { 200 } else { 60 });
    enc.send_frame(Some(&frame_b)).unwrap();
    let packets_b = drain(&mut enc);
    assert_eq!(packets_b.len(), 1);
    // 一个宏块的增量包远小于全量关键帧
    assert!(packets_b[0].size() < packets_a.iter().map(Packet::size).sum::<usize>());

    dec.send_packet(&packets_b[0]).unwrap();
    let decoded_b = dec.receive_frame().unwrap();

    for y in 0..64usize {
        for x in 0..96usize {
            let expected = if x < 16 && y < 16 { 200 } else { decoded_a.data[0][y * 96 + x] };
            assert_eq!(
                decoded_b.data[0][y * 96 + x],
                expected,
                "({x}, {y}) 处像素不符"
            );
        }
    }
}

#[test]
fn test_fill_frame丢包恢复() {
    let mut enc = H261ASEncoder::new();
    enc.open(&video_params(64, 48)).unwrap();
    let frame = make_frame(64, 48, |x, _| x as u8);
    enc.send_frame(Some(&frame)).unwrap();
    let packets = drain(&mut enc);

    let mut dec = H261ASDecoder::new();
    for p in &packets {
        dec.send_packet(p).unwrap();
    }
    dec.receive_frame().unwrap();

    // 上层拿到一帧已知参考后覆盖解码器状态
    let reference = make_frame(64, 48, |_, _| 77);
    dec.fill_frame(&reference).unwrap();

    // 下一帧没有宏块更新 (条件补充空包), 输出应为预置的参考内容
    enc.send_frame(Some(&frame)).unwrap();
    let empty = drain(&mut enc);
    assert_eq!(empty[0].size(), 4);
    dec.send_packet(&empty[0]).unwrap();
    let decoded = dec.receive_frame().unwrap();
    assert!(decoded.data[0].iter().all(|&p| p == 77));
}

#[test]
fn test_损坏包报错但不崩溃() {
    let mut enc = H261ASEncoder::new();
    enc.open(&video_params(64, 48)).unwrap();
    enc.send_frame(Some(&make_noise_frame(64, 48))).unwrap();
    let packets = drain(&mut enc);

    // 把载荷中段翻转为非法码字
    let mut bytes = packets[0].data.to_vec();
    let mid = bytes.len() / 2;
    for b in &mut bytes[mid..mid + 4] {
        *b = 0x00;
    }
    let mut corrupt = Packet::from_data(bytes);
    corrupt.sequence = packets[0].sequence;

    let mut dec = H261ASDecoder::new();
    assert!(dec.send_packet(&corrupt).is_err());
    // 解码器仍可接受后续完整数据
    for p in &packets {
        let _ = dec.send_packet(p);
    }
    assert!(dec.receive_frame().is_ok());
}

#[test]
fn test_过短包拒绝() {
    let mut dec = H261ASDecoder::new();
    let packet = Packet::from_data(vec![0x00, 0x01]);
    assert!(matches!(
        dec.send_packet(&packet),
        Err(ZhuError::InvalidData(_))
    ));
}

#[test]
fn test_分辨率自描述与中途切换() {
    let mut dec = H261ASDecoder::new();

    for (w, h) in [(64u32, 48u32), (128, 96)] {
        let mut enc = H261ASEncoder::new();
        enc.open(&video_params(w, h)).unwrap();
        let frame = make_frame(w, h, |_, _| 90);
        enc.send_frame(Some(&frame)).unwrap();
        for p in drain(&mut enc) {
            dec.send_packet(&p).unwrap();
        }
        let decoded = dec.receive_frame().unwrap();
        assert_eq!((decoded.width, decoded.height), (w, h));
        assert!(decoded.data[0].iter().all(|&p| p == 90));
    }
}
