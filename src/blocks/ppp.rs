// blocks/ppp.rs
//! Per-pulse parameters: the transmit-side record layout and record type.

use std::collections::HashMap;

use super::layout::{FieldLayout, ParamKind, RequiredParam};
use super::record::{ParamValue, RecordSet};
use crate::{AddedValue, IntFrac, Vector2, Vector3};

/// Required PPP fields, in default layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PppParam {
    TxTime,
    TxPos,
    TxVel,
    Fx1,
    Fx2,
    TxMt,
    PhiX0,
    FxFreq0,
    FxRate,
    TxRadInt,
    TxAcx,
    TxAcy,
    TxEb,
    FxResponseIndex,
    /// Optional; only counted once placed.
    XmIndex,
}

impl RequiredParam for PppParam {
    const ALL: &'static [Self] = &[
        PppParam::TxTime,
        PppParam::TxPos,
        PppParam::TxVel,
        PppParam::Fx1,
        PppParam::Fx2,
        PppParam::TxMt,
        PppParam::PhiX0,
        PppParam::FxFreq0,
        PppParam::FxRate,
        PppParam::TxRadInt,
        PppParam::TxAcx,
        PppParam::TxAcy,
        PppParam::TxEb,
        PppParam::FxResponseIndex,
        PppParam::XmIndex,
    ];
    const OPTIONAL: Self = PppParam::XmIndex;
    const BLOCK_NAME: &'static str = "PPP";
    const GROUP_NAME: &'static str = "tx sequence";
    const RECORD_NAME: &'static str = "pulse";

    fn name(self) -> &'static str {
        match self {
            PppParam::TxTime => "TxTime",
            PppParam::TxPos => "TxPos",
            PppParam::TxVel => "TxVel",
            PppParam::Fx1 => "FX1",
            PppParam::Fx2 => "FX2",
            PppParam::TxMt => "TXmt",
            PppParam::PhiX0 => "PhiX0",
            PppParam::FxFreq0 => "FxFreq0",
            PppParam::FxRate => "FxRate",
            PppParam::TxRadInt => "TxRadInt",
            PppParam::TxAcx => "TxACX",
            PppParam::TxAcy => "TxACY",
            PppParam::TxEb => "TxEB",
            PppParam::FxResponseIndex => "FxResponseIndex",
            PppParam::XmIndex => "XMIndex",
        }
    }

    fn kind(self) -> ParamKind {
        match self {
            PppParam::TxTime | PppParam::PhiX0 => ParamKind::IntFrac,
            PppParam::TxPos | PppParam::TxVel | PppParam::TxAcx | PppParam::TxAcy => {
                ParamKind::Vec3
            }
            PppParam::TxEb => ParamKind::Vec2,
            PppParam::FxResponseIndex | PppParam::XmIndex => ParamKind::Int,
            PppParam::Fx1
            | PppParam::Fx2
            | PppParam::TxMt
            | PppParam::FxFreq0
            | PppParam::FxRate
            | PppParam::TxRadInt => ParamKind::Float,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// PPP record layout.
pub type Ppp = FieldLayout<PppParam>;

/// One decoded PPP record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PppSet {
    pub tx_time: Option<IntFrac>,
    pub tx_pos: Option<Vector3>,
    pub tx_vel: Option<Vector3>,
    pub fx1: Option<f64>,
    pub fx2: Option<f64>,
    pub tx_mt: Option<f64>,
    pub phi_x0: Option<IntFrac>,
    pub fx_freq0: Option<f64>,
    pub fx_rate: Option<f64>,
    pub tx_rad_int: Option<f64>,
    pub tx_acx: Option<Vector3>,
    pub tx_acy: Option<Vector3>,
    pub tx_eb: Option<Vector2>,
    pub fx_response_index: Option<i64>,
    pub xm_index: Option<i64>,
    pub added: HashMap<String, AddedValue>,
}

impl RecordSet for PppSet {
    type Param = PppParam;

    fn value(&self, param: PppParam) -> Option<ParamValue> {
        match param {
            PppParam::TxTime => self.tx_time.map(ParamValue::IntFrac),
            PppParam::TxPos => self.tx_pos.map(ParamValue::Vec3),
            PppParam::TxVel => self.tx_vel.map(ParamValue::Vec3),
            PppParam::Fx1 => self.fx1.map(ParamValue::Float),
            PppParam::Fx2 => self.fx2.map(ParamValue::Float),
            PppParam::TxMt => self.tx_mt.map(ParamValue::Float),
            PppParam::PhiX0 => self.phi_x0.map(ParamValue::IntFrac),
            PppParam::FxFreq0 => self.fx_freq0.map(ParamValue::Float),
            PppParam::FxRate => self.fx_rate.map(ParamValue::Float),
            PppParam::TxRadInt => self.tx_rad_int.map(ParamValue::Float),
            PppParam::TxAcx => self.tx_acx.map(ParamValue::Vec3),
            PppParam::TxAcy => self.tx_acy.map(ParamValue::Vec3),
            PppParam::TxEb => self.tx_eb.map(ParamValue::Vec2),
            PppParam::FxResponseIndex => self.fx_response_index.map(ParamValue::Int),
            PppParam::XmIndex => self.xm_index.map(ParamValue::Int),
        }
    }

    fn set_value(&mut self, param: PppParam, value: ParamValue) -> bool {
        match (param, value) {
            (PppParam::TxTime, ParamValue::IntFrac(v)) => self.tx_time = Some(v),
            (PppParam::TxPos, ParamValue::Vec3(v)) => self.tx_pos = Some(v),
            (PppParam::TxVel, ParamValue::Vec3(v)) => self.tx_vel = Some(v),
            (PppParam::Fx1, ParamValue::Float(v)) => self.fx1 = Some(v),
            (PppParam::Fx2, ParamValue::Float(v)) => self.fx2 = Some(v),
            (PppParam::TxMt, ParamValue::Float(v)) => self.tx_mt = Some(v),
            (PppParam::PhiX0, ParamValue::IntFrac(v)) => self.phi_x0 = Some(v),
            (PppParam::FxFreq0, ParamValue::Float(v)) => self.fx_freq0 = Some(v),
            (PppParam::FxRate, ParamValue::Float(v)) => self.fx_rate = Some(v),
            (PppParam::TxRadInt, ParamValue::Float(v)) => self.tx_rad_int = Some(v),
            (PppParam::TxAcx, ParamValue::Vec3(v)) => self.tx_acx = Some(v),
            (PppParam::TxAcy, ParamValue::Vec3(v)) => self.tx_acy = Some(v),
            (PppParam::TxEb, ParamValue::Vec2(v)) => self.tx_eb = Some(v),
            (PppParam::FxResponseIndex, ParamValue::Int(v)) => self.fx_response_index = Some(v),
            (PppParam::XmIndex, ParamValue::Int(v)) => self.xm_index = Some(v),
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
