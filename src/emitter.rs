//! Emitter types and position snapshots
//!
//! Every radio technology the cache knows about maps to one `EmitterType`,
//! stored on disk as its canonical upper-case string:
//! - `WLAN`: Wi-Fi access point
//! - `MOBILE`: cell tower of unspecified technology
//! - `GSM`, `CDMA`, `WCDMA`, `TDSCDMA`, `LTE`, `NR`: cell towers
//! - `BT`: Bluetooth beacon

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Radio technology of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmitterType {
    /// Wi-Fi access point
    Wlan,
    /// Cell tower, technology unknown
    Mobile,
    Gsm,
    Cdma,
    Wcdma,
    #[serde(rename = "TDSCDMA")]
    TdScdma,
    Lte,
    Nr,
    /// Bluetooth beacon
    #[serde(rename = "BT")]
    Bluetooth,
}

impl EmitterType {
    /// Canonical string stored in the `rfType` column
    pub fn as_str(&self) -> &'static str {
        match self {
            EmitterType::Wlan => "WLAN",
            EmitterType::Mobile => "MOBILE",
            EmitterType::Gsm => "GSM",
            EmitterType::Cdma => "CDMA",
            EmitterType::Wcdma => "WCDMA",
            EmitterType::TdScdma => "TDSCDMA",
            EmitterType::Lte => "LTE",
            EmitterType::Nr => "NR",
            EmitterType::Bluetooth => "BT",
        }
    }

    /// Get all emitter types
    pub fn all() -> &'static [EmitterType] {
        &[
            EmitterType::Wlan,
            EmitterType::Mobile,
            EmitterType::Gsm,
            EmitterType::Cdma,
            EmitterType::Wcdma,
            EmitterType::TdScdma,
            EmitterType::Lte,
            EmitterType::Nr,
            EmitterType::Bluetooth,
        ]
    }
}

impl FromStr for EmitterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "wlan" | "wifi" | "wi-fi" | "ap" => Ok(EmitterType::Wlan),
            "mobile" | "cell" => Ok(EmitterType::Mobile),
            "gsm" => Ok(EmitterType::Gsm),
            "cdma" => Ok(EmitterType::Cdma),
            "wcdma" | "umts" => Ok(EmitterType::Wcdma),
            "tdscdma" | "td-scdma" => Ok(EmitterType::TdScdma),
            "lte" | "4g" => Ok(EmitterType::Lte),
            "nr" | "5g" => Ok(EmitterType::Nr),
            "bt" | "bluetooth" | "ble" => Ok(EmitterType::Bluetooth),
            _ => Err(Error::InvalidIdentity(format!("Unknown emitter type: {}", s))),
        }
    }
}

impl std::fmt::Display for EmitterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the cache knows about one emitter.
///
/// The two radii are independent axis-aligned uncertainties, in whatever
/// unit the position estimator works in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterInfo {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// North-south uncertainty radius
    pub radius_ns: f32,
    /// East-west uncertainty radius
    pub radius_ew: f32,
    /// Confidence counter, adjusted by the estimator
    pub trust: i64,
    /// Free-form annotation, empty when absent
    pub note: String,
}

impl EmitterInfo {
    /// Create a snapshot with an empty note
    pub fn new(latitude: f64, longitude: f64, radius_ns: f32, radius_ew: f32, trust: i64) -> Self {
        Self {
            latitude,
            longitude,
            radius_ns,
            radius_ew,
            trust,
            note: String::new(),
        }
    }

    /// Set the note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Reject values SQLite cannot hold as non-null REALs.
    ///
    /// NaN binds as NULL, so it must never reach the table.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(Error::InvalidEmitterInfo(format!(
                "non-finite position ({}, {})",
                self.latitude, self.longitude
            )));
        }
        if !self.radius_ns.is_finite() || !self.radius_ew.is_finite() {
            return Err(Error::InvalidEmitterInfo(format!(
                "non-finite radius (ns={}, ew={})",
                self.radius_ns, self.radius_ew
            )));
        }
        Ok(())
    }
}
