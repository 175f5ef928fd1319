//! 经典 H.261 (CIF) 解码管线集成测试.
//!
//! 没有对应的编码器实现, 码流按规范手工构造: 图像层头部,
//! GOB 续传上下文, Intra 宏块与 CBP 门控的 Inter 残差更新.

use zhu::codec::{CodecId, Decoder, Packet};
use zhu::core::{BitWriter, ZhuError};

fn create_decoder() -> Box<dyn Decoder> {
    zhu::default_codec_registry()
        .create_decoder(CodecId::H261)
        .unwrap()
}

/// 写 RTP H.261 包头并拼上载荷
fn wrap_packet(payload: Vec<u8>, end_bits: u32, gobn: u32, mbap: u32, quant: u32) -> Packet {
    let mut bw = BitWriter::new();
    bw.write_bits(0, 3); // SBIT
    bw.write_bits(end_bits, 3); // EBIT
    bw.write_bits(0, 1); // I
    bw.write_bits(0, 1); // V
    bw.write_bits(gobn, 4);
    bw.write_bits(mbap, 5);
    bw.write_bits(quant, 5);
    bw.write_bits(0, 5); // HMVD
    bw.write_bits(0, 5); // VMVD
    bw.write_bytes(&payload);
    Packet::from_data(bw.finish())
}

fn write_gob_header(bw: &mut BitWriter, gn: u32, gquant: u32) {
    bw.write_bits(0x0001, 16);
    bw.write_bits(gn, 4);
    bw.write_bits(gquant, 5);
}

/// 仅 DC 的 Intra 宏块: MBA + MTYPE + 6 个 (DC + EOB)
fn write_intra_mb(bw: &mut BitWriter, mba_code: (u32, u32), dc: u32) {
    bw.write_bits(mba_code.0, mba_code.1);
    bw.write_bits(0b0001, 4); // MTYPE Intra
    for _ in 0..6 {
        bw.write_bits(dc, 8);
        bw.write_bits(0b10, 2); // EOB
    }
}

#[test]
fn test_跨包续传与图像层头部() {
    let mut dec = create_decoder();

    // 包 1: 图像层头部 + GOB 1 的前两个宏块
    let mut bw = BitWriter::new();
    bw.write_bits(0x0001, 16); // 起始码
    bw.write_bits(0, 4); // GN 0: 图像层
    bw.write_bits(0, 5); // TR
    bw.write_bits(0, 6); // PTYPE
    bw.write_bits(0, 1); // PEI 结束
    write_gob_header(&mut bw, 1, 4);
    write_intra_mb(&mut bw, (0b1, 1), 90); // MBA 1
    write_intra_mb(&mut bw, (0b1, 1), 150); // MBA 1
    let e1 = bw.align_to_byte();
    let p1 = wrap_packet(bw.finish(), e1, 0, 0, 0);
    dec.send_packet(&p1).unwrap();
    assert!(matches!(dec.receive_frame(), Err(ZhuError::NeedMoreData)));

    // 包 2: GOB 1 中途续传 (MBAP = 2), 第三个宏块
    let mut bw = BitWriter::new();
    write_intra_mb(&mut bw, (0b1, 1), 210);
    let e2 = bw.align_to_byte();
    let mut p2 = wrap_packet(bw.finish(), e2, 1, 2, 4);
    p2.marker = true;
    p2.sequence = 1;
    dec.send_packet(&p2).unwrap();

    let frame = dec.receive_frame().unwrap();
    assert_eq!((frame.width, frame.height), (352, 288));
    assert_eq!(frame.data[0][0], 90);
    assert_eq!(frame.data[0][16], 150);
    assert_eq!(frame.data[0][32], 210);
    assert_eq!(frame.data[0][48], 0);
}

#[test]
fn test_inter宏块残差更新() {
    let mut dec = create_decoder();

    // 帧 1: GOB 1 的首宏块, 平坦 90
    let mut bw = BitWriter::new();
    write_gob_header(&mut bw, 1, 4);
    write_intra_mb(&mut bw, (0b1, 1), 90);
    let e1 = bw.align_to_byte();
    let mut p1 = wrap_packet(bw.finish(), e1, 0, 0, 0);
    p1.marker = true;
    dec.send_packet(&p1).unwrap();
    let frame1 = dec.receive_frame().unwrap();
    assert_eq!(frame1.data[0][0], 90);

    // 帧 2: 同一宏块的 Inter 更新, CBP 只含 Y0, 首系数 +1
    let mut bw = BitWriter::new();
    write_gob_header(&mut bw, 1, 4);
    bw.write_bits(0b1, 1); // MBA 1
    bw.write_bits(0b1, 1); // MTYPE Inter + CBP
    bw.write_bits(0b1010, 4); // CBP 32: 仅 Y0
    bw.write_bits(0b10, 2); // 首系数缩短写法: +1
    bw.write_bits(0b10, 2); // EOB
    let e2 = bw.align_to_byte();
    let mut p2 = wrap_packet(bw.finish(), e2, 0, 0, 0);
    p2.marker = true;
    p2.sequence = 1;
    dec.send_packet(&p2).unwrap();

    let frame2 = dec.receive_frame().unwrap();
    // 级别 +1 在步长 4 下反量化为 11, IDCT 后残差 +1
    assert_eq!(frame2.data[0][0], 91);
    // Y0 之外的子块未被 CBP 标记, 保持原值
    assert_eq!(frame2.data[0][8], 90);
    assert_eq!(frame2.data[0][16], 0);
}

#[test]
fn test_右半幅gob与多gob帧() {
    let mut dec = create_decoder();

    let mut bw = BitWriter::new();
    write_gob_header(&mut bw, 1, 4);
    write_intra_mb(&mut bw, (0b1, 1), 80);
    write_gob_header(&mut bw, 2, 4);
    write_intra_mb(&mut bw, (0b1, 1), 160);
    write_gob_header(&mut bw, 12, 4);
    // MBA 33: GOB 12 的最后一个宏块
    write_intra_mb(&mut bw, (0b00000011000, 11), 240);
    let e = bw.align_to_byte();
    let mut p = wrap_packet(bw.finish(), e, 0, 0, 0);
    p.marker = true;
    dec.send_packet(&p).unwrap();

    let frame = dec.receive_frame().unwrap();
    assert_eq!(frame.data[0][0], 80);
    assert_eq!(frame.data[0][176], 160);
    // GOB 12 末宏块位于画面右下角 (336, 272)
    assert_eq!(frame.data[0][287 * 352 + 351], 240);
}

#[test]
fn test_运动矢量宏块拒绝() {
    let mut dec = create_decoder();

    let mut bw = BitWriter::new();
    write_gob_header(&mut bw, 1, 4);
    bw.write_bits(0b1, 1); // MBA 1
    bw.write_bits(0b001, 3); // MTYPE Inter+MC+FIL (带 MVD)
    bw.write_bits(0, 8);
    let e = bw.align_to_byte();
    let p = wrap_packet(bw.finish(), e, 0, 0, 0);
    assert!(matches!(
        dec.send_packet(&p),
        Err(ZhuError::Unsupported(_))
    ));
}

#[test]
fn test_填充码忽略() {
    let mut dec = create_decoder();

    let mut bw = BitWriter::new();
    write_gob_header(&mut bw, 1, 4);
    bw.write_bits(0b00000001111, 11); // MBA stuffing
    write_intra_mb(&mut bw, (0b1, 1), 120);
    let e = bw.align_to_byte();
    let mut p = wrap_packet(bw.finish(), e, 0, 0, 0);
    p.marker = true;
    dec.send_packet(&p).unwrap();
    let frame = dec.receive_frame().unwrap();
    assert_eq!(frame.data[0][0], 120);
}
