//! Length units.
//!
//! Every length in the board model is an integer count of nanometres
//! ([`Biu`], "board internal units").

/// Board internal unit: one nanometre.
pub type Biu = i64;

pub const IU_PER_MM: f64 = 1_000_000.0;
pub const IU_PER_MILS: f64 = 25_400.0;

/// Largest magnitude a coordinate may take, `i32::MAX / sqrt(2)`, so that
/// any rotation of a valid point still fits in 32 bits.
pub const MAX_BIU: Biu = 1_518_500_249;

/// Scale used by legacy files to store lengths on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyUnits {
    /// 1/10000 inch, the legacy default.
    DeciMils,
    /// Floating point millimetres, after a `Units mm` line.
    Millimetres,
}

impl LegacyUnits {
    /// Multiplier from the on-disk value to [`Biu`].
    pub fn scale(self) -> f64 {
        match self {
            LegacyUnits::DeciMils => IU_PER_MILS / 10.0,
            LegacyUnits::Millimetres => IU_PER_MM,
        }
    }
}

/// Round to the nearest unit and clamp into `[-MAX_BIU, MAX_BIU]`.
pub fn clamp_biu(value: f64) -> Biu {
    if value.is_nan() {
        return 0;
    }
    let limit = MAX_BIU as f64;
    value.clamp(-limit, limit).round() as Biu
}

pub fn mm_to_biu(mm: f64) -> Biu {
    clamp_biu(mm * IU_PER_MM)
}

pub fn biu_to_mm(value: Biu) -> f64 {
    value as f64 / IU_PER_MM
}

pub fn mils_to_biu(mils: f64) -> Biu {
    clamp_biu(mils * IU_PER_MILS)
}

/// Exact decimal rendering of `value` in millimetres, without trailing zeros.
pub fn format_mm(value: Biu) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    let whole = magnitude / 1_000_000;
    let frac = magnitude % 1_000_000;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let digits = format!("{frac:06}");
    format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
}
