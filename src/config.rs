//! Settings for a runmap run.
//!
//! Everything has a default, a JSON file may override any subset of fields, and command-line
//! flags override the file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path as FsPath;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cleanup::DEFAULT_COMBINE_RADIUS;
use crate::error::{Error, Result};
use crate::types::Style;

pub const DEFAULT_HEATMAP_SIZE: usize = 1024;
pub const DEFAULT_HEATMAP_SATURATION: u32 = 5;
pub const MAX_HEATMAP_SIZE: usize = 16384;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stroke style for plotted lines.
    pub style: Style,
    /// Merge radius for path cleanup, in degrees.
    pub combine_radius: f64,
    /// Longer side of the heatmap image, in pixels.
    pub heatmap_size: usize,
    /// Path count at which a heatmap pixel turns white.
    pub heatmap_saturation: u32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            style: Style::default(),
            combine_radius: DEFAULT_COMBINE_RADIUS,
            heatmap_size: DEFAULT_HEATMAP_SIZE,
            heatmap_saturation: DEFAULT_HEATMAP_SATURATION,
        }
    }
}

impl Config {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load<P: AsRef<FsPath>>(p: P) -> Result<Config> {
        let p = p.as_ref();
        debug!("loading config from {:?}", p);
        let cfg: Config = serde_json::from_reader(BufReader::new(File::open(p)?))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check fields that can be set individually after loading.
    pub fn validate(&self) -> Result<()> {
        Style::new(self.style.color(), self.style.opacity())?;
        if !self.combine_radius.is_finite() || self.combine_radius <= 0.0 {
            return Err(Error::InvalidConfig(format!("combine radius {} must be positive",
                                                    self.combine_radius)));
        }
        if self.heatmap_size == 0 || self.heatmap_size > MAX_HEATMAP_SIZE {
            return Err(Error::InvalidConfig(format!("heatmap size {} not in 1..={}",
                                                    self.heatmap_size,
                                                    MAX_HEATMAP_SIZE)));
        }
        Ok(())
    }
}
