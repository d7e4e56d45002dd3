//! Fixed-resolution latitude/longitude grid for the spatial lookup table.
//!
//! The grid is rendered as a SQL script (table definition plus batched
//! inserts) so it can be loaded with any MySQL client.
use std::io::{self, Write};

use serde::Deserialize;

use crate::pipeline::services::extraction::geo::round_coordinate;

/// WKT coordinate order used for the `POINT` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// `POINT(lon lat)`, the usual x/y order.
    #[default]
    LonLat,
    /// `POINT(lat lon)`, which MySQL 8 expects for SRID 4326 geometries.
    LatLon,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub lat_start: f64,
    pub lat_end: f64,
    pub lon_start: f64,
    pub lon_end: f64,
    pub step: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            lat_start: 33.0,
            lat_end: 39.0,
            lon_start: 124.0,
            lon_end: 132.0,
            step: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GridPoint {
    pub fn wkt(&self, order: AxisOrder) -> String {
        match order {
            AxisOrder::LonLat => format!("POINT({} {})", self.lon, self.lat),
            AxisOrder::LatLon => format!("POINT({} {})", self.lat, self.lon),
        }
    }
}

// Tolerates float error when the step lands exactly on the end value.
const STEP_EPSILON: f64 = 1e-9;

/// Upper bound on points per grid, far above the default 481,401.
pub const MAX_POINTS: u64 = 100_000_000;

fn steps(start: f64, end: f64, step: f64) -> u64 {
    ((end - start) / step + STEP_EPSILON).floor() as u64 + 1
}

impl GridSpec {
    pub fn validate(&self) -> Result<(), String> {
        let values = [self.lat_start, self.lat_end, self.lon_start, self.lon_end, self.step];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("Grid bounds and step must be finite numbers".to_string());
        }

        if self.step <= 0.0 {
            return Err("Grid step must be greater than 0".to_string());
        }

        if self.lat_end < self.lat_start || self.lon_end < self.lon_start {
            return Err("Grid end must not be before grid start".to_string());
        }

        let lat_steps = (self.lat_end - self.lat_start) / self.step + 1.0;
        let lon_steps = (self.lon_end - self.lon_start) / self.step + 1.0;
        if lat_steps > MAX_POINTS as f64 || lon_steps > MAX_POINTS as f64 {
            return Err(format!("Grid would exceed {} points", MAX_POINTS));
        }

        match self.lat_steps().checked_mul(self.lon_steps()) {
            Some(points) if points <= MAX_POINTS => Ok(()),
            _ => Err(format!("Grid would exceed {} points", MAX_POINTS)),
        }
    }

    pub fn lat_steps(&self) -> u64 {
        steps(self.lat_start, self.lat_end, self.step)
    }

    pub fn lon_steps(&self) -> u64 {
        steps(self.lon_start, self.lon_end, self.step)
    }

    /// Number of points, saturating for specs that fail `validate`.
    pub fn len(&self) -> u64 {
        self.lat_steps().saturating_mul(self.lon_steps())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Points in latitude-major order, ends inclusive.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        let lon_steps = self.lon_steps();
        (0..self.lat_steps()).flat_map(move |i| {
            let lat = round_coordinate(self.lat_start + i as f64 * self.step);
            (0..lon_steps).map(move |j| GridPoint {
                lat,
                lon: round_coordinate(self.lon_start + j as f64 * self.step),
            })
        })
    }
}

/// Writes the SQL that creates and fills the grid table.
pub struct GridSeeder {
    table: String,
    axis_order: AxisOrder,
    batch_size: usize,
}

impl GridSeeder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            axis_order: AxisOrder::default(),
            batch_size: 1000,
        }
    }

    pub fn with_axis_order(mut self, axis_order: AxisOrder) -> Self {
        self.axis_order = axis_order;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn write_schema<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "DROP TABLE IF EXISTS {};", self.table)?;
        writeln!(out, "CREATE TABLE {} (", self.table)?;
        writeln!(out, "    id INT AUTO_INCREMENT PRIMARY KEY,")?;
        writeln!(out, "    lat DOUBLE,")?;
        writeln!(out, "    lng DOUBLE,")?;
        writeln!(out, "    location POINT NOT NULL SRID 4326,")?;
        writeln!(out, "    SPATIAL INDEX(location)")?;
        writeln!(out, ") ENGINE=InnoDB;")
    }

    /// Writes batched inserts and returns the number of points written.
    pub fn write_inserts<W: Write>(&self, spec: &GridSpec, out: &mut W) -> io::Result<u64> {
        let mut count = 0u64;
        let mut in_batch = 0usize;

        for point in spec.points() {
            if in_batch == 0 {
                writeln!(out, "INSERT INTO {} (lat, lng, location) VALUES", self.table)?;
            } else {
                writeln!(out, ",")?;
            }
            write!(
                out,
                "    ({}, {}, ST_GeomFromText('{}', 4326))",
                point.lat,
                point.lon,
                point.wkt(self.axis_order)
            )?;
            count += 1;
            in_batch += 1;

            if in_batch == self.batch_size {
                writeln!(out, ";")?;
                in_batch = 0;
            }
        }

        if in_batch > 0 {
            writeln!(out, ";")?;
        }
        Ok(count)
    }

    pub fn write_script<W: Write>(&self, spec: &GridSpec, out: &mut W) -> io::Result<u64> {
        // DDL commits implicitly in MySQL, so only the inserts are transactional.
        self.write_schema(out)?;
        writeln!(out, "START TRANSACTION;")?;
        let count = self.write_inserts(spec, out)?;
        writeln!(out, "COMMIT;")?;
        tracing::info!("Wrote {} grid points for table {}", count, self.table);
        Ok(count)
    }
}
