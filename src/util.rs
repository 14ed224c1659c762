use std::cmp;
use std::io::Read;
use std::path::Path as FsPath;

use geojson::GeoJson;
use imagefmt::{ColFmt, ColType};
use log::debug;
use num::{Num, ToPrimitive};

use crate::error::{Error, Result};
use crate::types::{Bounds, Path, Point};

/// Find the bounds over an iterator of points. Fails with `EmptyInput` if there are none.
pub fn point_bounds<I: IntoIterator<Item = Point>>(iter: I) -> Result<Bounds> {
    let mut iter = iter.into_iter();
    let first = iter.next().ok_or(Error::EmptyInput)?;
    Ok(iter.fold(Bounds::point(first), Bounds::extend))
}

/// Find the smallest bounds covering every point of every path. Path order and point order do
/// not matter. Empty paths are allowed as long as at least one point exists overall.
pub fn path_bounds<PMatrix: AsRef<[PRow]>, PRow: AsRef<[Point]>>(paths: PMatrix) -> Result<Bounds> {
    point_bounds(paths.as_ref().iter().flat_map(|p| p.as_ref().iter().copied()))
}

/// Render paths as the `data.js` script the map page loads: `var paths = [[[lat,lon],...],...];`
pub fn paths_to_data_js(paths: &[Path]) -> Result<String> {
    Ok(format!("var paths = {};", serde_json::to_string(paths)?))
}

/// Read a JSON array of paths, each an array of `[lat, lon]` pairs.
pub fn paths_from_json<R: Read>(reader: R) -> Result<Vec<Path>> {
    Ok(serde_json::from_reader(reader)?)
}

fn positions_to_path(positions: &[Vec<f64>]) -> Path {
    // GeoJSON positions are [lon, lat, (alt)]
    positions.iter().filter(|pos| pos.len() >= 2).map(|pos| Point::new(pos[1], pos[0])).collect()
}

/// Return one path per LineString (and per MultiLineString member) in a GeoJSON document.
/// Other geometry types are ignored.
pub fn paths_from_geojson<R: Read>(reader: R) -> Result<Vec<Path>> {
    let json: GeoJson = serde_json::from_reader(reader)?;
    let geometries = match json {
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().filter_map(|f| f.geometry).collect(),
        GeoJson::Feature(f) => f.geometry.into_iter().collect(),
        GeoJson::Geometry(g) => vec![g],
    };
    let mut paths = Vec::new();
    for geometry in geometries {
        match geometry.value {
            geojson::Value::LineString(ref positions) => paths.push(positions_to_path(positions)),
            geojson::Value::MultiLineString(ref lines) => {
                paths.extend(lines.iter().map(|l| positions_to_path(l)))
            }
            _ => (),
        }
    }
    debug!("read {} paths from geojson", paths.len());
    Ok(paths)
}

/// Write given 2D numerical matrix to a scaled grayscale image at requested path.
/// Clip specifies lower, upper bounds of values that will be clipped to black/white.
/// The image format follows the file extension.
pub fn mat_to_img<T: Copy + Ord + Num + ToPrimitive, P: AsRef<FsPath>>(t: &[T],
                                                                       dim: (usize, usize),
                                                                       p: P,
                                                                       clip: Option<(T, T)>)
                                                                       -> Result<()> {
    let (m, n) = dim;
    if m == 0 || n == 0 || t.len() != m * n {
        return Err(Error::InvalidResolution(m, n));
    }
    // Normalize to range 0, 255.
    let (min, max) = {
        // non-empty, checked above
        let min = t.iter().copied().min().unwrap_or_else(T::zero);
        let max = t.iter().copied().max().unwrap_or_else(T::zero);
        let (lo, hi) = match clip {
            Some((lo, hi)) => (cmp::max(min, lo), cmp::min(max, hi)),
            None => (min, max),
        };
        (lo.to_f64().unwrap_or(0.0), hi.to_f64().unwrap_or(0.0))
    };
    // make sure range is positive to avoid divide by zero later.
    let range = if max > min { max - min } else { 1.0 };
    let bytes = t.iter()
        .map(|v| v.to_f64().unwrap_or(min))
        .map(|v| v.clamp(min, f64::max(min, max)))
        .map(|v| (255.0 * (v - min) / range).round() as u8)
        .collect::<Vec<u8>>();
    imagefmt::write(p, n, m, ColFmt::Y, &bytes, ColType::Auto).map_err(|e| Error::Image(format!("{:?}", e)))
}
