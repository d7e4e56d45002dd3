use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::grid::{AxisOrder, GridSpec};
use crate::pipeline::services::extraction::{ColorProfile, ColorTarget, GeoBounds, ScanTunables};

const CONFIG_FILE_ENV: &str = "FIRE_MARKERS_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "fire_markers";
const ENV_PREFIX: &str = "FIRE_MARKERS";

/// Top level settings, layered from defaults, an optional config file and
/// `FIRE_MARKERS__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub schedule: ScheduleSettings,
    pub capture: CaptureSettings,
    pub report: ReportSettings,
    pub extraction: ExtractionSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub interval_minutes: u64,
    pub run_immediately: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureMethod {
    /// Read a PNG written by some other process.
    File { path: PathBuf },
    /// Run a program that produces a PNG, either into `output` or on stdout.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub source: CaptureMethod,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub shared_data_dir: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub colors: Vec<ColorTarget>,
    pub bounds: GeoBounds,
    pub stride: u32,
    pub neighborhood: u32,
    pub cluster_threshold: u32,
    pub min_distance_px: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            schedule: ScheduleSettings::default(),
            capture: CaptureSettings::default(),
            report: ReportSettings::default(),
            extraction: ExtractionSettings::default(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
            run_immediately: true,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            source: CaptureMethod::File {
                path: PathBuf::from("crawl_map/map_canvas.png"),
            },
            timeout_secs: Some(60),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            shared_data_dir: PathBuf::from("shared_data"),
            file_name: "fire_markers.json".to_string(),
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        let tunables = ScanTunables::default();
        Self {
            colors: ColorProfile::default().into_targets(),
            bounds: GeoBounds::default(),
            stride: tunables.stride,
            neighborhood: tunables.neighborhood,
            cluster_threshold: tunables.cluster_threshold,
            min_distance_px: 50,
        }
    }
}

impl ScheduleSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

impl CaptureSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl ReportSettings {
    pub fn report_path(&self) -> PathBuf {
        self.shared_data_dir.join(&self.file_name)
    }
}

impl ExtractionSettings {
    pub fn profile(&self) -> ColorProfile {
        ColorProfile::new(self.colors.clone())
    }

    pub fn tunables(&self) -> ScanTunables {
        ScanTunables {
            stride: self.stride,
            neighborhood: self.neighborhood,
            cluster_threshold: self.cluster_threshold,
            min_distance_sq: u64::from(self.min_distance_px).pow(2),
        }
    }
}

impl Settings {
    /// Loads settings from the default sources.
    pub fn load() -> Result<Self, ConfigError> {
        let file =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file)
    }

    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.schedule.interval_minutes == 0 {
            return invalid("Schedule interval must be greater than 0");
        }

        if self.capture.timeout_secs == Some(0) {
            return invalid("Capture timeout must be greater than 0 when set");
        }

        if self.report.file_name.is_empty() {
            return invalid("Report file name must not be empty");
        }

        let extraction = &self.extraction;
        if extraction.stride == 0 {
            return invalid("Scan stride must be greater than 0");
        }

        if extraction.neighborhood == 0 || extraction.neighborhood % 2 == 0 {
            return invalid("Neighborhood size must be a positive odd number");
        }

        if extraction.colors.is_empty() {
            return invalid("At least one marker color must be configured");
        }

        if let Some(target) = extraction.colors.iter().find(|t| t.tolerance == 0) {
            return Err(ConfigError::Invalid(format!(
                "Tolerance for color '{}' must be greater than 0",
                target.label
            )));
        }

        let bounds = &extraction.bounds;
        let corners = [
            bounds.top_left.lat,
            bounds.top_left.lon,
            bounds.bottom_right.lat,
            bounds.bottom_right.lon,
        ];
        if corners.iter().any(|v| !v.is_finite()) {
            return invalid("Map bounds must be finite coordinates");
        }

        if bounds.top_left.lat <= bounds.bottom_right.lat {
            return invalid("Top-left latitude must be north of bottom-right latitude");
        }

        if bounds.top_left.lon >= bounds.bottom_right.lon {
            return invalid("Top-left longitude must be west of bottom-right longitude");
        }

        Ok(())
    }
}

/// Settings for the grid seeding script, from an optional `seed_grid` file
/// and `SEED_GRID__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub table: String,
    pub axis_order: AxisOrder,
    pub batch_size: usize,
    pub spec: GridSpec,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            table: "korea_grid".to_string(),
            axis_order: AxisOrder::default(),
            batch_size: 1000,
            spec: GridSpec::default(),
        }
    }
}

impl GridSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings: GridSettings = config::Config::builder()
            .add_source(config::File::with_name("seed_grid").required(false))
            .add_source(
                config::Environment::with_prefix("SEED_GRID")
                    .try_parsing(true)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        settings.spec.validate().map_err(ConfigError::Invalid)?;
        if settings.table.is_empty() {
            return Err(ConfigError::Invalid("Grid table name must not be empty".to_string()));
        }
        Ok(settings)
    }
}
