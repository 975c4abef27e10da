// blocks/ppp_block.rs
//! The PPP block: one group of per-pulse records for each transmit sequence.

use super::block::{ParamBlock, param_accessors};
use super::ppp::{PppParam, PppSet};
use crate::{IntFrac, Vector2, Vector3};

/// PPP records indexed `[tx sequence][pulse]`.
pub type PppBlock = ParamBlock<PppSet>;

param_accessors!(PppSet {
    tx_time, set_tx_time: IntFrac => PppParam::TxTime;
    tx_pos, set_tx_pos: Vector3 => PppParam::TxPos;
    tx_vel, set_tx_vel: Vector3 => PppParam::TxVel;
    fx1, set_fx1: f64 => PppParam::Fx1;
    fx2, set_fx2: f64 => PppParam::Fx2;
    tx_mt, set_tx_mt: f64 => PppParam::TxMt;
    phi_x0, set_phi_x0: IntFrac => PppParam::PhiX0;
    fx_freq0, set_fx_freq0: f64 => PppParam::FxFreq0;
    fx_rate, set_fx_rate: f64 => PppParam::FxRate;
    tx_rad_int, set_tx_rad_int: f64 => PppParam::TxRadInt;
    tx_acx, set_tx_acx: Vector3 => PppParam::TxAcx;
    tx_acy, set_tx_acy: Vector3 => PppParam::TxAcy;
    tx_eb, set_tx_eb: Vector2 => PppParam::TxEb;
    fx_response_index, set_fx_response_index: i64 => PppParam::FxResponseIndex;
    xm_index, set_xm_index: i64 => PppParam::XmIndex;
});
