//! Dashboard encoding
//!
//! This module wraps a window aggregate in the envelope the dashboard expects:
//! producer metadata, the view, source availability and the reference time.

use crate::error::ComputeError;
use crate::types::{DashboardPayload, DashboardProducer, WindowAggregate};
use crate::{PRODUCER_NAME, TRENDS_VERSION};
use chrono::NaiveDateTime;
use uuid::Uuid;

/// Dashboard encoder for producing JSON payloads
pub struct DashboardEncoder {
    instance_id: String,
}

impl Default for DashboardEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode an aggregate computed at `now`
    pub fn encode(
        &self,
        stats: WindowAggregate,
        data_available: bool,
        now: NaiveDateTime,
    ) -> DashboardPayload {
        DashboardPayload {
            producer: DashboardProducer {
                name: PRODUCER_NAME.to_string(),
                version: TRENDS_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            view: stats.view(),
            data_available,
            computed_at: now,
            stats,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        stats: WindowAggregate,
        data_available: bool,
        now: NaiveDateTime,
    ) -> Result<String, ComputeError> {
        let payload = self.encode(stats, data_available, now);
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MonthlyStats, View, WeeklyStats};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 12)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_encode_dashboard_payload() {
        let encoder = DashboardEncoder::with_instance_id("test-instance".to_string());
        let stats = WeeklyStats {
            total_headaches: 3,
            ..Default::default()
        };
        let payload = encoder.encode(WindowAggregate::Weekly(stats), true, now());

        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.version, TRENDS_VERSION);
        assert_eq!(payload.producer.instance_id, "test-instance");
        assert_eq!(payload.view, View::Weekly);
        assert!(payload.data_available);
        assert_eq!(payload.computed_at, now());
        assert_eq!(payload.stats.total_headaches(), 3);
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = DashboardEncoder::new();
        let json = encoder
            .encode_to_json(
                WindowAggregate::Monthly(MonthlyStats::default()),
                false,
                now(),
            )
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["view"], "monthly");
        assert_eq!(parsed["dataAvailable"], false);
        assert_eq!(parsed["computedAt"], "2025-11-12T22:00:00");
        assert!(parsed["producer"]["instanceId"].is_string());
        assert!(parsed["stats"].get("weeklyData").is_some());
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(
            DashboardEncoder::new().instance_id(),
            DashboardEncoder::new().instance_id()
        );
    }
}
