use serde::{Deserialize, Serialize};

/// A marker accepted during a scan, still carrying its pixel origin.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerCandidate {
    pub x: u32,
    pub y: u32,
    pub lat: f64,
    pub lon: f64,
    pub color: String,
}

impl MarkerCandidate {
    pub fn distance_sq(&self, x: u32, y: u32) -> u64 {
        let dx = i64::from(self.x) - i64::from(x);
        let dy = i64::from(self.y) - i64::from(y);
        (dx * dx + dy * dy) as u64
    }

    pub fn to_marker(&self) -> Marker {
        Marker {
            lat: self.lat,
            lon: self.lon,
            color: self.color.clone(),
        }
    }
}

/// Public form of a marker, as written to the shared report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub color: String,
}

/// All markers from one extraction pass, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerReport {
    markers: Vec<Marker>,
}

impl MarkerReport {
    pub fn new(markers: Vec<Marker>) -> Self {
        Self { markers }
    }

    pub fn from_candidates(candidates: &[MarkerCandidate]) -> Self {
        Self::new(candidates.iter().map(MarkerCandidate::to_marker).collect())
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
