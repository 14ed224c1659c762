use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{crate_version, Parser};
use eyre::{Result, WrapErr};
use log::info;
use stopwatch::Stopwatch;

use runmap::config::Config;
use runmap::track_parse::read_track_dir;
use runmap::util::paths_to_data_js;
use runmap::view::paths_to_geojson;
use runmap::{clean_paths, path_bounds, HeatGrid, Style};

/// Collect GPS tracks from GPX/TCX/GeoJSON files and export them for plotting.
#[derive(Debug, Parser)]
#[command(name = "runmap", version = crate_version!())]
struct Opts {
    /// Directory holding .gpx / .tcx / .geojson files
    input: PathBuf,
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Path data script for the map page
    #[arg(short, long, default_value = "data.js")]
    output: PathBuf,
    /// Also write the styled tracks as GeoJSON
    #[arg(long)]
    geojson: Option<PathBuf>,
    /// Also write a heatmap image (format from extension, e.g. .png)
    #[arg(long)]
    heatmap: Option<PathBuf>,
    /// Longer side of the heatmap in pixels
    #[arg(long)]
    heatmap_size: Option<usize>,
    /// Line color, as #RRGGBB or a color name
    #[arg(long)]
    color: Option<String>,
    /// Line opacity, 0 to 1
    #[arg(long)]
    opacity: Option<f64>,
    /// Merge radius in degrees
    #[arg(long)]
    radius: Option<f64>,
    /// Skip smoothing and merging
    #[arg(long)]
    no_clean: bool,
}

fn load_config(opts: &Opts) -> Result<Config> {
    let mut cfg = match opts.config {
        Some(ref p) => Config::load(p).wrap_err_with(|| format!("loading {:?}", p))?,
        None => Config::default(),
    };
    if opts.color.is_some() || opts.opacity.is_some() {
        let color = opts.color.clone().unwrap_or_else(|| cfg.style.color().to_string());
        cfg.style = Style::new(color, opts.opacity.unwrap_or(cfg.style.opacity()))?;
    }
    if let Some(r) = opts.radius {
        cfg.combine_radius = r;
    }
    if let Some(s) = opts.heatmap_size {
        cfg.heatmap_size = s;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();
    let cfg = load_config(&opts)?;

    let mut s = Stopwatch::start_new();
    let paths = read_track_dir(&opts.input).wrap_err_with(|| format!("reading {:?}", opts.input))?;
    info!("Track parse took {} ms, found {} paths", s.elapsed_ms(), paths.len());
    let bounds = path_bounds(&paths)?;
    info!("Tracks span {} .. {}", bounds.south_west, bounds.north_east);

    let paths = if opts.no_clean {
        paths
    } else {
        s.restart();
        let cleaned = clean_paths(&paths, cfg.combine_radius);
        info!("Smoothing and merging took {} ms", s.elapsed_ms());
        cleaned
    };

    fs::write(&opts.output, paths_to_data_js(&paths)?)
        .wrap_err_with(|| format!("writing {:?}", opts.output))?;
    info!("Wrote {:?}", opts.output);

    if let Some(ref out) = opts.geojson {
        s.restart();
        let view = paths_to_geojson(&paths, &cfg.style)?;
        view.write_to(BufWriter::new(File::create(out)?))?;
        info!("GeoJSON export of {} lines took {} ms", view.len(), s.elapsed_ms());
    }

    if let Some(ref out) = opts.heatmap {
        s.restart();
        let dim = HeatGrid::sized_for(&bounds, cfg.heatmap_size);
        let grid = HeatGrid::from_paths(&paths, dim)?;
        grid.write_image(out, Some(cfg.heatmap_saturation))?;
        info!("{:?} heatmap took {} ms, busiest cell has {} paths",
              grid.size(),
              s.elapsed_ms(),
              grid.max_count());
    }
    Ok(())
}
