// blocks/pvp_block.rs
//! The PVP block: one group of per-vector records for each channel.

use super::block::{ParamBlock, param_accessors};
use super::pvp::{PvpParam, PvpSet};
use crate::{IntFrac, Vector2, Vector3};

/// PVP records indexed `[channel][vector]`.
pub type PvpBlock = ParamBlock<PvpSet>;

param_accessors!(PvpSet {
    rcv_start, set_rcv_start: IntFrac => PvpParam::RcvStart;
    rcv_pos, set_rcv_pos: Vector3 => PvpParam::RcvPos;
    rcv_vel, set_rcv_vel: Vector3 => PvpParam::RcvVel;
    frcv1, set_frcv1: f64 => PvpParam::Frcv1;
    frcv2, set_frcv2: f64 => PvpParam::Frcv2;
    ref_phi0, set_ref_phi0: IntFrac => PvpParam::RefPhi0;
    ref_freq, set_ref_freq: f64 => PvpParam::RefFreq;
    dfic0, set_dfic0: f64 => PvpParam::Dfic0;
    fic_rate, set_fic_rate: f64 => PvpParam::FicRate;
    rcv_acx, set_rcv_acx: Vector3 => PvpParam::RcvAcx;
    rcv_acy, set_rcv_acy: Vector3 => PvpParam::RcvAcy;
    rcv_eb, set_rcv_eb: Vector2 => PvpParam::RcvEb;
    signal, set_signal: i64 => PvpParam::Signal;
    amp_sf, set_amp_sf: f64 => PvpParam::AmpSf;
    dgrgc, set_dgrgc: f64 => PvpParam::Dgrgc;
    tx_pulse_index, set_tx_pulse_index: i64 => PvpParam::TxPulseIndex;
});

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::blocks::Pvp;
    use crate::byte_swap::convert_big_endian;
    use crate::{AddedValue, Error};

    fn three_channels() -> PvpBlock {
        PvpBlock::new(Pvp::with_default_layout(false), &[2, 3, 1], None).unwrap()
    }

    fn filled() -> PvpBlock {
        let mut layout = Pvp::with_default_layout(false);
        layout.append_custom_parameter(1, "U2", "Gain").unwrap();
        let mut block = PvpBlock::new(layout, &[2, 3, 1], None).unwrap();
        for ch in 0..block.num_groups() {
            for v in 0..block.num_records(ch) {
                let t = (ch * 10 + v) as f64;
                *block.record_mut(ch, v).unwrap() = PvpSet {
                    rcv_start: Some(IntFrac::new(ch as i64, t / 100.0)),
                    rcv_pos: Some(Vector3::new(t, t + 1.0, t + 2.0)),
                    rcv_vel: Some(Vector3::new(-t, 0.5, 0.25)),
                    frcv1: Some(9.0e9),
                    frcv2: Some(9.6e9),
                    ref_phi0: Some(IntFrac::new(0, 0.125)),
                    ref_freq: Some(9.3e9),
                    dfic0: Some(0.0),
                    fic_rate: Some(1.0e-3),
                    rcv_acx: Some(Vector3::new(1.0, 0.0, 0.0)),
                    rcv_acy: Some(Vector3::new(0.0, 1.0, 0.0)),
                    rcv_eb: Some(Vector2::new(0.01, -0.01)),
                    signal: Some(1),
                    amp_sf: Some(1.0),
                    dgrgc: Some(t),
                    ..PvpSet::default()
                };
                block
                    .set_added(ch, v, "Gain", AddedValue::U2(v as u16 + 7))
                    .unwrap();
            }
        }
        block
    }

    #[test]
    fn test_bounds_checks_channel_and_vector() {
        let mut block = three_channels();
        assert_eq!(block.num_groups(), 3);
        assert_eq!(block.num_records(1), 3);

        let pos = Vector3::new(1.0, 2.0, 3.0);
        block.set_rcv_pos(1, 2, pos).unwrap();
        assert_eq!(block.rcv_pos(1, 2).unwrap(), pos);

        assert!(matches!(
            block.rcv_pos(1, 3),
            Err(Error::IndexOutOfRange { what: "vector", index: 3, len: 3 })
        ));
        assert!(matches!(
            block.set_rcv_pos(3, 0, pos),
            Err(Error::IndexOutOfRange { what: "channel", index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_unset_value_is_reported() {
        let block = three_channels();
        assert!(matches!(block.rcv_vel(0, 0), Err(Error::NotSet(name)) if name == "RcvVel"));
    }

    #[test]
    fn test_optional_field_needs_placement() {
        let mut block = three_channels();
        assert!(matches!(
            block.set_tx_pulse_index(0, 0, 4),
            Err(Error::UndeclaredField(_))
        ));

        let mut block = PvpBlock::new(Pvp::with_default_layout(true), &[1], None).unwrap();
        block.set_tx_pulse_index(0, 0, 4).unwrap();
        assert_eq!(block.tx_pulse_index(0, 0).unwrap(), 4);
    }

    #[test]
    fn test_declared_width_is_authoritative() {
        let layout = Pvp::with_default_layout(false);
        assert!(matches!(
            PvpBlock::new(layout.clone(), &[1], Some(200)),
            Err(Error::SizeMismatch { expected: 208, actual: 200, .. })
        ));
        assert!(PvpBlock::new(layout.clone(), &[1], Some(212)).is_err());

        let mut block = PvpBlock::new(layout, &[2], Some(224)).unwrap();
        assert_eq!(block.num_bytes_per_record(), 224);
        assert_eq!(block.total_bytes(), 448);
        block.set_dgrgc(0, 1, 2.5).unwrap();
        let data = block.get_data(0).unwrap();
        assert_eq!(data.len(), 448);
        assert!(data[208..224].iter().all(|&b| b == 0));
        assert!(data[224 + 208..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_unplaced_layout_is_rejected() {
        let mut layout = Pvp::new();
        layout.append(PvpParam::RcvStart).unwrap();
        assert!(matches!(
            PvpBlock::new(layout, &[1], None),
            Err(Error::UnplacedField("RcvPos"))
        ));
    }

    #[test]
    fn test_added_value_rules() {
        let mut block = filled();
        assert_eq!(block.added(2, 0, "Gain").unwrap(), &AddedValue::U2(7));
        assert!(matches!(
            block.set_added(0, 0, "Gain", AddedValue::U2(1)),
            Err(Error::DuplicateAssignment(_))
        ));
        assert!(matches!(
            block.set_added(0, 0, "Other", AddedValue::U2(1)),
            Err(Error::UndeclaredField(_))
        ));

        let mut fresh = PvpBlock::new(block.layout().clone(), &[1], None).unwrap();
        assert!(matches!(fresh.added(0, 0, "Gain"), Err(Error::NotSet(_))));
        assert!(matches!(
            fresh.set_added(0, 0, "Gain", AddedValue::F8(1.0)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_buffers_roundtrip() {
        let block = filled();
        let groups: Vec<Vec<u8>> = (0..3).map(|g| block.get_data(g).unwrap()).collect();
        let slices: Vec<&[u8]> = groups.iter().map(Vec::as_slice).collect();
        let decoded =
            PvpBlock::from_buffers(block.layout().clone(), &[2, 3, 1], None, &slices).unwrap();
        assert_eq!(decoded, block);

        let short = &groups[1][..groups[1].len() - 8];
        assert!(matches!(
            PvpBlock::from_buffers(
                block.layout().clone(),
                &[2, 3, 1],
                None,
                &[groups[0].as_slice(), short, groups[2].as_slice()]
            ),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_load_from_stream() {
        let block = filled();
        let mut file = vec![0xAAu8; 16];
        for g in 0..block.num_groups() {
            let mut data = block.get_data(g).unwrap();
            convert_big_endian(&mut data, 8, 1).unwrap();
            file.extend_from_slice(&data);
        }

        let mut loaded = PvpBlock::new(block.layout().clone(), &[2, 3, 1], None).unwrap();
        let size = block.total_bytes();
        let read = loaded.load(&mut Cursor::new(file.as_slice()), 16, size, 2).unwrap();
        assert_eq!(read, size);
        assert_eq!(loaded, block);
        assert_eq!(loaded.rcv_pos(1, 2).unwrap(), Vector3::new(12.0, 13.0, 14.0));

        // big-endian on disk: SIGNAL == 1 ends its word with 0x01
        let signal_at = 16 + block.layout().field(PvpParam::Signal).byte_offset().unwrap();
        assert_eq!(&file[signal_at..signal_at + 8], &1i64.to_be_bytes());
    }

    #[test]
    fn test_load_errors() {
        let block = filled();
        let mut loaded = PvpBlock::new(block.layout().clone(), &[2, 3, 1], None).unwrap();
        let size = block.total_bytes();
        assert!(matches!(
            loaded.load(&mut Cursor::new(vec![0u8; 4096]), 0, size - 8, 1),
            Err(Error::SizeMismatch { .. })
        ));
        assert!(matches!(
            loaded.load(&mut Cursor::new(vec![0u8; 100]), 0, size, 1),
            Err(Error::EndOfStream { actual: 100, .. })
        ));
    }
}
