use serde::Deserialize;

/// A marker color: target RGB and a per-channel tolerance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColorTarget {
    pub label: String,
    pub rgb: [u8; 3],
    pub tolerance: u16,
}

impl ColorTarget {
    pub fn new(label: impl Into<String>, rgb: [u8; 3], tolerance: u16) -> Self {
        Self {
            label: label.into(),
            rgb,
            tolerance,
        }
    }

    /// Every channel must differ from the target by strictly less than the tolerance.
    pub fn matches(&self, pixel: [u8; 3]) -> bool {
        pixel
            .iter()
            .zip(self.rgb.iter())
            .all(|(&p, &t)| u16::from(p.abs_diff(t)) < self.tolerance)
    }
}

/// Ordered list of marker colors. Order decides which label wins when a
/// pixel matches more than one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorProfile {
    targets: Vec<ColorTarget>,
}

impl ColorProfile {
    pub fn new(targets: Vec<ColorTarget>) -> Self {
        Self { targets }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn into_targets(self) -> Vec<ColorTarget> {
        self.targets
    }
}

impl Default for ColorProfile {
    /// Marker colors of the forest fire status map.
    fn default() -> Self {
        Self::new(vec![
            ColorTarget::new("red", [12, 88, 191], 20),
            ColorTarget::new("green", [16, 140, 0], 5),
            ColorTarget::new("gray", [195, 195, 195], 5),
        ])
    }
}
