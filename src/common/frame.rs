use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Encoded image bytes as handed over by a capture source.
#[derive(Clone, Debug)]
pub struct Frame {
    bytes: Arc<[u8]>,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
    source: &'static str,
}

impl Frame {
    pub fn new(bytes: Vec<u8>, source: &'static str) -> Self {
        Self {
            bytes: Arc::from(bytes),
            captured_at: Utc::now(),
            frame_id: Uuid::new_v4(),
            source,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn source(&self) -> &'static str {
        self.source
    }
}
