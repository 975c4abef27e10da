// blocks/pvp.rs
//! Per-vector parameters: the receive-side record layout and record type.

use std::collections::HashMap;

use super::layout::{FieldLayout, ParamKind, RequiredParam};
use super::record::{ParamValue, RecordSet};
use crate::{AddedValue, IntFrac, Vector2, Vector3};

/// Required PVP fields, in default layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PvpParam {
    RcvStart,
    RcvPos,
    RcvVel,
    Frcv1,
    Frcv2,
    RefPhi0,
    RefFreq,
    Dfic0,
    FicRate,
    RcvAcx,
    RcvAcy,
    RcvEb,
    Signal,
    AmpSf,
    Dgrgc,
    /// Optional; only counted once placed.
    TxPulseIndex,
}

impl RequiredParam for PvpParam {
    const ALL: &'static [Self] = &[
        PvpParam::RcvStart,
        PvpParam::RcvPos,
        PvpParam::RcvVel,
        PvpParam::Frcv1,
        PvpParam::Frcv2,
        PvpParam::RefPhi0,
        PvpParam::RefFreq,
        PvpParam::Dfic0,
        PvpParam::FicRate,
        PvpParam::RcvAcx,
        PvpParam::RcvAcy,
        PvpParam::RcvEb,
        PvpParam::Signal,
        PvpParam::AmpSf,
        PvpParam::Dgrgc,
        PvpParam::TxPulseIndex,
    ];
    const OPTIONAL: Self = PvpParam::TxPulseIndex;
    const BLOCK_NAME: &'static str = "PVP";
    const GROUP_NAME: &'static str = "channel";
    const RECORD_NAME: &'static str = "vector";

    fn name(self) -> &'static str {
        match self {
            PvpParam::RcvStart => "RcvStart",
            PvpParam::RcvPos => "RcvPos",
            PvpParam::RcvVel => "RcvVel",
            PvpParam::Frcv1 => "FRCV1",
            PvpParam::Frcv2 => "FRCV2",
            PvpParam::RefPhi0 => "RefPhi0",
            PvpParam::RefFreq => "RefFreq",
            PvpParam::Dfic0 => "DFIC0",
            PvpParam::FicRate => "FICRate",
            PvpParam::RcvAcx => "RcvACX",
            PvpParam::RcvAcy => "RcvACY",
            PvpParam::RcvEb => "RcvEB",
            PvpParam::Signal => "SIGNAL",
            PvpParam::AmpSf => "AmpSF",
            PvpParam::Dgrgc => "DGRGC",
            PvpParam::TxPulseIndex => "TxPulseIndex",
        }
    }

    fn kind(self) -> ParamKind {
        match self {
            PvpParam::RcvStart | PvpParam::RefPhi0 => ParamKind::IntFrac,
            PvpParam::RcvPos | PvpParam::RcvVel | PvpParam::RcvAcx | PvpParam::RcvAcy => {
                ParamKind::Vec3
            }
            PvpParam::RcvEb => ParamKind::Vec2,
            PvpParam::Signal | PvpParam::TxPulseIndex => ParamKind::Int,
            PvpParam::Frcv1
            | PvpParam::Frcv2
            | PvpParam::RefFreq
            | PvpParam::Dfic0
            | PvpParam::FicRate
            | PvpParam::AmpSf
            | PvpParam::Dgrgc => ParamKind::Float,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// PVP record layout.
pub type Pvp = FieldLayout<PvpParam>;

/// One decoded PVP record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PvpSet {
    pub rcv_start: Option<IntFrac>,
    pub rcv_pos: Option<Vector3>,
    pub rcv_vel: Option<Vector3>,
    pub frcv1: Option<f64>,
    pub frcv2: Option<f64>,
    pub ref_phi0: Option<IntFrac>,
    pub ref_freq: Option<f64>,
    pub dfic0: Option<f64>,
    pub fic_rate: Option<f64>,
    pub rcv_acx: Option<Vector3>,
    pub rcv_acy: Option<Vector3>,
    pub rcv_eb: Option<Vector2>,
    pub signal: Option<i64>,
    pub amp_sf: Option<f64>,
    pub dgrgc: Option<f64>,
    pub tx_pulse_index: Option<i64>,
    pub added: HashMap<String, AddedValue>,
}

impl RecordSet for PvpSet {
    type Param = PvpParam;

    fn value(&self, param: PvpParam) -> Option<ParamValue> {
        match param {
            PvpParam::RcvStart => self.rcv_start.map(ParamValue::IntFrac),
            PvpParam::RcvPos => self.rcv_pos.map(ParamValue::Vec3),
            PvpParam::RcvVel => self.rcv_vel.map(ParamValue::Vec3),
            PvpParam::Frcv1 => self.frcv1.map(ParamValue::Float),
            PvpParam::Frcv2 => self.frcv2.map(ParamValue::Float),
            PvpParam::RefPhi0 => self.ref_phi0.map(ParamValue::IntFrac),
            PvpParam::RefFreq => self.ref_freq.map(ParamValue::Float),
            PvpParam::Dfic0 => self.dfic0.map(ParamValue::Float),
            PvpParam::FicRate => self.fic_rate.map(ParamValue::Float),
            PvpParam::RcvAcx => self.rcv_acx.map(ParamValue::Vec3),
            PvpParam::RcvAcy => self.rcv_acy.map(ParamValue::Vec3),
            PvpParam::RcvEb => self.rcv_eb.map(ParamValue::Vec2),
            PvpParam::Signal => self.signal.map(ParamValue::Int),
            PvpParam::AmpSf => self.amp_sf.map(ParamValue::Float),
            PvpParam::Dgrgc => self.dgrgc.map(ParamValue::Float),
            PvpParam::TxPulseIndex => self.tx_pulse_index.map(ParamValue::Int),
        }
    }

    fn set_value(&mut self, param: PvpParam, value: ParamValue) -> bool {
        match (param, value) {
            (PvpParam::RcvStart, ParamValue::IntFrac(v)) => self.rcv_start = Some(v),
            (PvpParam::RcvPos, ParamValue::Vec3(v)) => self.rcv_pos = Some(v),
            (PvpParam::RcvVel, ParamValue::Vec3(v)) => self.rcv_vel = Some(v),
            (PvpParam::Frcv1, ParamValue::Float(v)) => self.frcv1 = Some(v),
            (PvpParam::Frcv2, ParamValue::Float(v)) => self.frcv2 = Some(v),
            (PvpParam::RefPhi0, ParamValue::IntFrac(v)) => self.ref_phi0 = Some(v),
            (PvpParam::RefFreq, ParamValue::Float(v)) => self.ref_freq = Some(v),
            (PvpParam::Dfic0, ParamValue::Float(v)) => self.dfic0 = Some(v),
            (PvpParam::FicRate, ParamValue::Float(v)) => self.fic_rate = Some(v),
            (PvpParam::RcvAcx, ParamValue::Vec3(v)) => self.rcv_acx = Some(v),
            (PvpParam::RcvAcy, ParamValue::Vec3(v)) => self.rcv_acy = Some(v),
            (PvpParam::RcvEb, ParamValue::Vec2(v)) => self.rcv_eb = Some(v),
            (PvpParam::Signal, ParamValue::Int(v)) => self.signal = Some(v),
            (PvpParam::AmpSf, ParamValue::Float(v)) => self.amp_sf = Some(v),
            (PvpParam::Dgrgc, ParamValue::Float(v)) => self.dgrgc = Some(v),
            (PvpParam::TxPulseIndex, ParamValue::Int(v)) => self.tx_pulse_index = Some(v),
            _ => return false,
        }
        true
    }

    fn added(&self) -> &HashMap<String, AddedValue> {
        &self.added
    }

    fn added_mut(&mut self) -> &mut HashMap<String, AddedValue> {
        &mut self.added
    }
}
