//! Hazard and community feature records.
//!
//! Features are immutable once ingested. The wire shapes (`HazardRecord`,
//! `CommunityRecord`) mirror the JSON collections supplied by the host and keep
//! every field optional so a single malformed record can be rejected without
//! failing the whole dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environmental hazard category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardType {
    /// Extreme heat
    Heat,
    /// Flooding
    Flood,
    /// Bushfire / wildfire
    Fire,
    /// Poor air quality
    Air,
}

impl HazardType {
    /// All hazard types in layer order.
    pub const ALL: [HazardType; 4] = [
        HazardType::Heat,
        HazardType::Flood,
        HazardType::Fire,
        HazardType::Air,
    ];

    /// Parse a hazard type name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "heat" => Some(Self::Heat),
            "flood" => Some(Self::Flood),
            "fire" => Some(Self::Fire),
            "air" => Some(Self::Air),
            _ => None,
        }
    }

    /// Lowercase name, as used on the wire and for layer toggles.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Flood => "flood",
            Self::Fire => "fire",
            Self::Air => "air",
        }
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point-like environmental risk record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardFeature {
    pub id: String,
    pub hazard_type: HazardType,
    pub name: String,
    /// Severity score in `[0, 1]`
    pub severity: f32,
    pub observed_at: DateTime<Utc>,
}

/// A point-like population record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityFeature {
    pub id: String,
    pub name: String,
    pub population: u32,
    /// Vulnerability score in `[0, 1]`
    pub vulnerability_index: f32,
}

/// Raw hazard record as supplied by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardRecord {
    pub id: Option<String>,
    pub hazard_type: Option<String>,
    pub name: Option<String>,
    pub severity: Option<f32>,
    pub observed_at: Option<String>,
}

/// Raw community record as supplied by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub population: Option<u32>,
    pub vulnerability_index: Option<f32>,
}

/// Reason a raw record was rejected on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingId,
    UnknownHazardType,
    MissingSeverity,
    MissingTimestamp,
    MissingPopulation,
    MissingVulnerability,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MissingId => "missing id",
            Self::UnknownHazardType => "unknown or missing hazard type",
            Self::MissingSeverity => "missing or non-finite severity",
            Self::MissingTimestamp => "missing or unparsable observedAt",
            Self::MissingPopulation => "missing population",
            Self::MissingVulnerability => "missing or non-finite vulnerability index",
        };
        f.write_str(msg)
    }
}

/// Validate a finite score and clamp it into `[0, 1]`.
fn unit_score(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 1.0))
}

impl HazardRecord {
    /// Validate into an immutable feature.
    ///
    /// Every accepted hazard carries an RFC 3339 timestamp, so no later stage
    /// has to special-case undated records.
    pub fn validate(self) -> Result<HazardFeature, RejectReason> {
        let id = self.id.filter(|s| !s.is_empty()).ok_or(RejectReason::MissingId)?;
        let hazard_type = self
            .hazard_type
            .as_deref()
            .and_then(HazardType::from_name)
            .ok_or(RejectReason::UnknownHazardType)?;
        let severity = unit_score(self.severity).ok_or(RejectReason::MissingSeverity)?;
        let observed_at = self
            .observed_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or(RejectReason::MissingTimestamp)?;

        Ok(HazardFeature {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            hazard_type,
            severity,
            observed_at,
        })
    }
}

impl CommunityRecord {
    /// Validate into an immutable feature.
    pub fn validate(self) -> Result<CommunityFeature, RejectReason> {
        let id = self.id.filter(|s| !s.is_empty()).ok_or(RejectReason::MissingId)?;
        let population = self.population.ok_or(RejectReason::MissingPopulation)?;
        let vulnerability_index =
            unit_score(self.vulnerability_index).ok_or(RejectReason::MissingVulnerability)?;

        Ok(CommunityFeature {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            population,
            vulnerability_index,
        })
    }
}
