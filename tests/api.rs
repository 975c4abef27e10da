use std::io::Cursor;

use crsd::{
    AddedValue, CrsdMetadata, CrsdReader, CrsdWriter, Error, IntFrac, IoConfig, Ppp, PppBlock,
    PppSet, ProductType, Pvp, PvpBlock, PvpSet, Result, SignalArrayFormat, VecWriter, Vector2,
    Vector3,
};

fn labelled(product_type: ProductType, xml: &str) -> CrsdMetadata {
    let mut meta = CrsdMetadata::new(product_type);
    meta.classification = "UNCLASSIFIED".into();
    meta.release_info = "Unrestricted".into();
    meta.xml = xml.into();
    meta
}

fn full_pvp(t: f64) -> PvpSet {
    PvpSet {
        rcv_start: Some(IntFrac::new(t as i64, t.fract())),
        rcv_pos: Some(Vector3::new(t, 2.0 * t, 3.0 * t)),
        rcv_vel: Some(Vector3::new(7.5e3, -1.0, 0.0)),
        frcv1: Some(9.0e9),
        frcv2: Some(1.0e10),
        ref_phi0: Some(IntFrac::new(0, 0.5)),
        ref_freq: Some(9.5e9),
        dfic0: Some(0.0),
        fic_rate: Some(-2.0),
        rcv_acx: Some(Vector3::new(1.0, 0.0, 0.0)),
        rcv_acy: Some(Vector3::new(0.0, 1.0, 0.0)),
        rcv_eb: Some(Vector2::new(0.0, 0.0)),
        signal: Some(1),
        amp_sf: Some(1.0),
        dgrgc: Some(t),
        ..PvpSet::default()
    }
}

fn full_ppp(t: f64) -> PppSet {
    PppSet {
        tx_time: Some(IntFrac::new(t as i64, 0.25)),
        tx_pos: Some(Vector3::new(-t, t, 0.0)),
        tx_vel: Some(Vector3::new(0.0, 7.6e3, 0.0)),
        fx1: Some(9.0e9),
        fx2: Some(1.0e10),
        tx_mt: Some(1.0e-5),
        phi_x0: Some(IntFrac::new(0, 0.0)),
        fx_freq0: Some(9.0e9),
        fx_rate: Some(1.0e14),
        tx_rad_int: Some(1.0),
        tx_acx: Some(Vector3::new(1.0, 0.0, 0.0)),
        tx_acy: Some(Vector3::new(0.0, 1.0, 0.0)),
        tx_eb: Some(Vector2::new(0.1, -0.1)),
        fx_response_index: Some(0),
        ..PppSet::default()
    }
}

fn fill_pvp(block: &mut PvpBlock) -> Result<()> {
    for ch in 0..block.num_groups() {
        for v in 0..block.num_records(ch) {
            *block.record_mut(ch, v)? = full_pvp((ch * 100 + v) as f64 + 0.5);
        }
    }
    Ok(())
}

fn fill_ppp(block: &mut PppBlock) -> Result<()> {
    for seq in 0..block.num_groups() {
        for p in 0..block.num_records(seq) {
            *block.record_mut(seq, p)? = full_ppp((seq * 100 + p) as f64);
        }
    }
    Ok(())
}

fn ci4_samples(n: usize, seed: i16) -> Vec<u8> {
    (0..n as i16 * 2)
        .flat_map(|i| (i.wrapping_mul(seed)).to_ne_bytes())
        .collect()
}

#[test]
fn sar_product_roundtrip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sar.crsd");

    let mut meta = labelled(ProductType::Sar, "<CRSDsar><Data/></CRSDsar>");
    let mut pvp_layout = Pvp::with_default_layout(true);
    pvp_layout.append_custom_parameter(1, "U2", "Gain")?;
    pvp_layout.append_custom_parameter(2, "CF16", "Offset")?;
    meta.pvp = Some(pvp_layout);
    meta.ppp = Some(Ppp::with_default_layout(false));
    meta.data.signal_format = Some(SignalArrayFormat::CI4);
    meta.data.add_channel("CH1", 3, 5);
    meta.data.add_channel("CH2", 2, 5);
    meta.data.add_tx_sequence("SEQ1", 4);
    meta.data.add_support_array("GainPhase", 2, 3, 8);
    meta.data.add_support_array("Mask", 1, 3, 2);

    let mut pvp = meta.new_pvp_block()?;
    fill_pvp(&mut pvp)?;
    for ch in 0..2 {
        for v in 0..pvp.num_records(ch) {
            pvp.set_tx_pulse_index(ch, v, v as i64)?;
            pvp.set_added(ch, v, "Gain", AddedValue::U2(100 + v as u16))?;
            pvp.set_added(ch, v, "Offset", AddedValue::CF16(0.5, -0.5))?;
        }
    }
    let mut ppp = meta.new_ppp_block()?;
    fill_ppp(&mut ppp)?;

    let ch1 = ci4_samples(15, 3);
    let ch2 = ci4_samples(10, -7);
    let gain_phase: Vec<u8> = (0..6).flat_map(|i| (i as f64 * 0.5).to_ne_bytes()).collect();
    let mask: Vec<u8> = [1u16, 0, 1].iter().flat_map(|m| m.to_ne_bytes()).collect();

    let mut writer = CrsdWriter::with_config(&path, meta.clone(), IoConfig::new().with_num_threads(2))?;
    writer.write(
        Some(&pvp),
        Some(&ppp),
        &[ch1.as_slice(), ch2.as_slice()],
        &[gain_phase.as_slice(), mask.as_slice()],
    )?;
    let written = writer.header().clone();

    let mut reader = CrsdReader::open(&path, meta)?;
    assert_eq!(reader.header(), &written);
    assert_eq!(reader.read_xml()?, "<CRSDsar><Data/></CRSDsar>");

    let header = reader.header();
    assert_eq!(header.pvp_block_byte_offset() % 8, 0);
    assert_eq!(header.ppp_block_byte_offset(), header.pvp_block_byte_offset() + 5 * 240);
    assert_eq!(header.signal_block_byte_offset(), header.ppp_block_byte_offset() + 4 * 200);

    assert_eq!(reader.read_pvp_block()?, pvp);
    assert_eq!(reader.read_ppp_block()?, ppp);
    assert_eq!(reader.read_support_array("GainPhase")?, gain_phase);
    assert_eq!(reader.read_support_array("Mask")?, mask);
    assert_eq!(reader.read_support_block()?, [gain_phase.clone(), mask.clone()].concat());
    assert!(matches!(
        reader.read_support_array("Antenna"),
        Err(Error::UndeclaredField(_))
    ));

    let mut wideband = reader.wideband();
    assert_eq!(wideband.read_channel(0)?, ch1);
    assert_eq!(wideband.read_channel(1)?, ch2);
    // vector 1, samples 2..4 of channel 2
    assert_eq!(wideband.read(1, 1..2, 2..4)?, ch2[5 * 4 + 2 * 4..5 * 4 + 4 * 4].to_vec());
    assert!(matches!(
        wideband.read(0, 0..4, 0..5),
        Err(Error::IndexOutOfRange { what: "vector", .. })
    ));
    Ok(())
}

#[test]
fn receive_only_product_roundtrip() -> Result<()> {
    let mut meta = labelled(ProductType::Rcv, "<CRSDrcv/>");
    meta.pvp = Some(Pvp::with_default_layout(false));
    meta.data.signal_format = Some(SignalArrayFormat::CF8);
    meta.data.add_channel("CH1", 2, 4);
    meta.data.add_compressed_channel("CH2", 2, 4, 13);

    let mut pvp = meta.new_pvp_block()?;
    fill_pvp(&mut pvp)?;
    let samples: Vec<u8> = (0..16).flat_map(|i| (i as f32).to_ne_bytes()).collect();
    let compressed: Vec<u8> = (0..13).collect();

    let mut writer =
        CrsdWriter::from_writer(VecWriter::new(), meta.clone(), IoConfig::single_threaded())?;
    writer.write(
        Some(&pvp),
        None,
        &[samples.as_slice(), compressed.as_slice()],
        &[],
    )?;
    let bytes = writer.into_inner().into_inner();
    assert!(bytes.starts_with(b"CRSDrcv/1.0.0\n"));

    let mut reader = CrsdReader::from_reader(Cursor::new(bytes), meta, IoConfig::single_threaded())?;
    assert_eq!(reader.header().ppp_block_size(), 0);
    assert_eq!(
        reader.header().signal_block_byte_offset(),
        reader.header().pvp_block_byte_offset() + 4 * 208
    );
    assert_eq!(reader.read_pvp_block()?, pvp);
    assert!(matches!(reader.read_ppp_block(), Err(Error::ProductMismatch(_))));

    let mut wideband = reader.wideband();
    assert_eq!(wideband.read_channel(0)?, samples);
    assert_eq!(wideband.read_compressed(1)?, compressed);
    assert!(wideband.read_channel(1).is_err());
    assert!(wideband.read_compressed(0).is_err());
    Ok(())
}

#[test]
fn transmit_only_product_roundtrip() -> Result<()> {
    let mut meta = labelled(ProductType::Tx, "<CRSDtx/>");
    let mut layout = Ppp::with_default_layout(true);
    layout.append_custom_parameter(1, "I4", "Mode")?;
    meta.ppp = Some(layout);
    meta.data.num_bytes_ppp = Some(224);
    meta.data.add_tx_sequence("A", 3);
    meta.data.add_tx_sequence("B", 1);

    let mut ppp = meta.new_ppp_block()?;
    fill_ppp(&mut ppp)?;
    for (seq, pulse) in [(0, 0), (0, 1), (0, 2), (1, 0)] {
        ppp.set_xm_index(seq, pulse, 3)?;
        ppp.set_added(seq, pulse, "Mode", AddedValue::I4(-(pulse as i32)))?;
    }

    let mut writer =
        CrsdWriter::from_writer(VecWriter::new(), meta.clone(), IoConfig::single_threaded())?;
    writer.write(None, Some(&ppp), &[], &[])?;
    let bytes = writer.into_inner().into_inner();

    let mut reader = CrsdReader::from_reader(Cursor::new(bytes), meta, IoConfig::single_threaded())?;
    assert_eq!(reader.header().ppp_block_size(), 4 * 224);
    assert_eq!(reader.header().signal_block_size(), 0);
    let loaded = reader.read_ppp_block()?;
    assert_eq!(loaded, ppp);
    assert_eq!(loaded.added(0, 2, "Mode")?, &AddedValue::I4(-2));
    Ok(())
}

#[test]
fn reader_rejects_mismatched_metadata() -> Result<()> {
    let mut meta = labelled(ProductType::Rcv, "<CRSDrcv/>");
    meta.pvp = Some(Pvp::with_default_layout(false));
    meta.data.signal_format = Some(SignalArrayFormat::CI2);
    meta.data.add_channel("CH1", 2, 8);
    let mut pvp = meta.new_pvp_block()?;
    fill_pvp(&mut pvp)?;

    let mut writer =
        CrsdWriter::from_writer(VecWriter::new(), meta.clone(), IoConfig::single_threaded())?;
    writer.write(Some(&pvp), None, &[&[0u8; 32][..]], &[])?;
    let bytes = writer.into_inner().into_inner();

    let mut wrong_count = meta.clone();
    wrong_count.data.channels[0].num_vectors = 3;
    assert!(matches!(
        CrsdReader::from_reader(Cursor::new(bytes.clone()), wrong_count, IoConfig::single_threaded()),
        Err(Error::SizeMismatch { .. })
    ));

    let mut wrong_type = meta.clone();
    wrong_type.product_type = ProductType::Sar;
    assert!(matches!(
        CrsdReader::from_reader(Cursor::new(bytes.clone()), wrong_type, IoConfig::single_threaded()),
        Err(Error::ProductMismatch(_))
    ));

    let truncated = bytes[..bytes.len() - 40].to_vec();
    let mut reader = CrsdReader::from_reader(Cursor::new(truncated), meta, IoConfig::single_threaded())?;
    assert!(matches!(
        reader.wideband().read_channel(0),
        Err(Error::EndOfStream { .. })
    ));
    Ok(())
}

#[test]
fn writer_requires_classification() -> Result<()> {
    let mut meta = labelled(ProductType::Tx, "<CRSDtx/>");
    meta.classification.clear();
    meta.ppp = Some(Ppp::with_default_layout(false));
    meta.data.add_tx_sequence("A", 1);
    let ppp = meta.new_ppp_block()?;

    let mut writer = CrsdWriter::from_writer(VecWriter::new(), meta, IoConfig::single_threaded())?;
    assert!(matches!(
        writer.write(None, Some(&ppp), &[], &[]),
        Err(Error::ClassificationRequired)
    ));
    assert!(writer.into_inner().is_empty());
    Ok(())
}
