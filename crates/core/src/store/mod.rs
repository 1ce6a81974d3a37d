//! Feature store: immutable hazard and community records plus time filtering.
//!
//! The store is populated once at startup (or replaced wholesale on an external
//! data refresh) and is read-only while frames are being produced.

mod time_filter;

pub use time_filter::{filter_by_time, filter_indices, TimePeriod};

use crate::core_types::{
    CommunityFeature, CommunityRecord, HazardFeature, HazardRecord, RejectReason,
};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Failure to load a dataset as a whole.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wire shape of a dataset: the two feature collections side by side.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub hazards: Vec<HazardRecord>,
    #[serde(default)]
    pub communities: Vec<CommunityRecord>,
}

/// Summary of an ingest pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub hazards_accepted: usize,
    pub communities_accepted: usize,
    pub rejected: Vec<(String, RejectReason)>,
}

impl IngestReport {
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Immutable store of validated features.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    hazards: Vec<HazardFeature>,
    communities: Vec<CommunityFeature>,
}

impl FeatureStore {
    /// Build a store from already-validated features.
    #[must_use]
    pub fn new(hazards: Vec<HazardFeature>, communities: Vec<CommunityFeature>) -> Self {
        Self {
            hazards,
            communities,
        }
    }

    /// Validate raw records, skipping malformed ones.
    pub fn from_dataset(dataset: Dataset) -> (Self, IngestReport) {
        let mut report = IngestReport::default();
        let mut hazards = Vec::with_capacity(dataset.hazards.len());
        let mut communities = Vec::with_capacity(dataset.communities.len());

        for (i, record) in dataset.hazards.into_iter().enumerate() {
            let label = record.id.clone().unwrap_or_else(|| format!("hazards[{i}]"));
            match record.validate() {
                Ok(feature) => hazards.push(feature),
                Err(reason) => {
                    warn!("Skipping hazard record {}: {}", label, reason);
                    report.rejected.push((label, reason));
                }
            }
        }

        for (i, record) in dataset.communities.into_iter().enumerate() {
            let label = record
                .id
                .clone()
                .unwrap_or_else(|| format!("communities[{i}]"));
            match record.validate() {
                Ok(feature) => communities.push(feature),
                Err(reason) => {
                    warn!("Skipping community record {}: {}", label, reason);
                    report.rejected.push((label, reason));
                }
            }
        }

        report.hazards_accepted = hazards.len();
        report.communities_accepted = communities.len();
        info!(
            "Feature store loaded: {} hazards, {} communities, {} rejected",
            report.hazards_accepted,
            report.communities_accepted,
            report.rejected_count()
        );

        (Self::new(hazards, communities), report)
    }

    /// Parse and validate a JSON dataset.
    pub fn from_json_str(json: &str) -> Result<(Self, IngestReport), LoadError> {
        let dataset: Dataset = serde_json::from_str(json)?;
        Ok(Self::from_dataset(dataset))
    }

    /// Read, parse and validate a JSON dataset file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<(Self, IngestReport), LoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn hazards(&self) -> &[HazardFeature] {
        &self.hazards
    }

    #[must_use]
    pub fn communities(&self) -> &[CommunityFeature] {
        &self.communities
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty() && self.communities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "hazards": [
            { "id": "h1", "hazardType": "heat", "name": "Heatwave", "severity": 0.9,
              "observedAt": "2024-07-01T00:00:00Z" },
            { "id": "h2", "hazardType": "volcano", "severity": 0.2 },
            { "id": "h3", "hazardType": "fire", "name": "Ridge fire" },
            { "id": "h4", "hazardType": "air", "severity": 0.5 }
        ],
        "communities": [
            { "id": "c1", "name": "Northside", "population": 42000, "vulnerabilityIndex": 0.7 },
            { "name": "Nameless", "population": 10, "vulnerabilityIndex": 0.1 }
        ]
    }"#;

    #[test]
    fn test_malformed_records_are_skipped() {
        let (store, report) = FeatureStore::from_json_str(DATASET).unwrap();
        assert_eq!(store.hazards().len(), 1);
        assert_eq!(store.communities().len(), 1);
        assert_eq!(report.rejected_count(), 4);
        assert!(report
            .rejected
            .contains(&("h2".to_string(), RejectReason::UnknownHazardType)));
        assert!(report
            .rejected
            .contains(&("h4".to_string(), RejectReason::MissingTimestamp)));
        assert!(report
            .rejected
            .contains(&("communities[1]".to_string(), RejectReason::MissingId)));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = FeatureStore::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let (store, report) = FeatureStore::from_json_str("{}").unwrap();
        assert!(store.is_empty());
        assert_eq!(report, IngestReport::default());
    }
}
