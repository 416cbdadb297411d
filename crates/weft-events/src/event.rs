use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A published event: a named topic, a free-form source label, and an
/// arbitrary JSON payload. `timestamp` is filled in by the bus at publish
/// time if it was left at the zero/default value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub payload: serde_json::Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Construct an event with a zero timestamp, to be filled in by the bus
    /// on publish.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            payload: serde_json::Map::new(),
            timestamp: zero_timestamp(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn is_timestamp_zero(&self) -> bool {
        self.timestamp == zero_timestamp()
    }
}

fn zero_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Reserved topic names from the design's canonical event list.
pub mod topics {
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    pub const PIPELINE_FAILED: &str = "pipeline.failed";
    pub const ONTOLOGY_CREATED: &str = "ontology.created";
    pub const ONTOLOGY_UPDATED: &str = "ontology.updated";
    pub const EXTRACTION_STARTED: &str = "extraction.started";
    pub const EXTRACTION_COMPLETED: &str = "extraction.completed";
    pub const ENTITIES_EXTRACTED: &str = "entities.extracted";
    pub const MODEL_TRAINING_STARTED: &str = "model.training.started";
    pub const MODEL_TRAINING_COMPLETED: &str = "model.training.completed";
    pub const MODEL_TRAINING_FAILED: &str = "model.training.failed";
    pub const PREDICTION_MADE: &str = "prediction.made";
    pub const TWIN_CREATED: &str = "twin.created";
    pub const TWIN_UPDATED: &str = "twin.updated";
    pub const SIMULATION_STARTED: &str = "simulation.started";
    pub const SIMULATION_COMPLETED: &str = "simulation.completed";
    pub const ANOMALY_DETECTED: &str = "anomaly.detected";
    pub const ALERT_CREATED: &str = "alert.created";
    pub const THRESHOLD_EXCEEDED: &str = "threshold.exceeded";
    pub const MONITORING_JOB_RUN: &str = "monitoring.job.run";
    pub const JOB_SCHEDULED: &str = "job.scheduled";
    pub const JOB_STARTED: &str = "job.started";
    pub const JOB_COMPLETED: &str = "job.completed";
    pub const JOB_FAILED: &str = "job.failed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_events_have_zero_timestamp() {
        let event = Event::new(topics::PIPELINE_STARTED, "runtime");
        assert!(event.is_timestamp_zero());
    }
}
