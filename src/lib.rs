use std::path::Path as FsPath;

use rayon::prelude::*;

mod types;
pub use types::*;
mod error;
pub use error::{Error, Result};
mod cleanup;
pub use cleanup::{clean_paths, PointIndex, DEFAULT_COMBINE_RADIUS};
pub mod config;
pub mod track_parse;
pub mod util;
pub mod view;
pub use util::{path_bounds, point_bounds};
pub use view::{fit_bounds, plot, MapView, RenderedLineSet};


/// Largest number of cells a `HeatGrid` may hold (one GiB of counts).
pub const MAX_GRID_CELLS: usize = 1 << 28;

/// `HeatGrid` rasterizes a set of paths onto a grid spanning exactly their bounds. Each cell
/// counts how many distinct paths pass through it. Rows run north to south and columns west to
/// east, linearly in degrees.
#[derive(Clone, Debug)]
pub struct HeatGrid {
    bounds: Bounds,
    grid_height: usize,
    grid_width: usize,
    grid: Vec<u32>,
}

#[inline]
fn cell_index(row: f64, col: f64, dim: (usize, usize)) -> usize {
    let (height, width) = dim;
    let row = (row.round() as usize).min(height - 1);
    let col = (col.round() as usize).min(width - 1);
    row * width + col
}

/// Fractional (row, col) of a point. A zero-width axis maps everything onto its first cell.
#[inline]
fn grid_position(bounds: &Bounds, dim: (usize, usize), p: Point) -> (f64, f64) {
    let (height, width) = dim;
    let row = if bounds.range_lat() > 0.0 {
        (bounds.north() - p.lat) / bounds.range_lat() * ((height - 1) as f64)
    } else {
        0.0
    };
    let col = if bounds.range_lon() > 0.0 {
        (p.lon - bounds.west()) / bounds.range_lon() * ((width - 1) as f64)
    } else {
        0.0
    };
    (row, col)
}

/// Cells touched by one path, sorted and without repeats.
fn trace_path(bounds: &Bounds, dim: (usize, usize), path: &[Point]) -> Vec<usize> {
    let mut cells = Vec::with_capacity(path.len() * 2);
    for (&a, &b) in path.iter().zip(path.iter().skip(1)) {
        let (a_row, a_col) = grid_position(bounds, dim, a);
        let (b_row, b_col) = grid_position(bounds, dim, b);
        let max_abs_diff = f64::max((b_row - a_row).abs(), (b_col - a_col).abs());
        // Step point a toward point b at most one cell at a time so no cell is skipped.
        // Point b itself is covered by the next segment or the final mark below.
        let steps = max_abs_diff.ceil() as usize;
        for s in 0..steps {
            let t = s as f64 / steps as f64;
            cells.push(cell_index(a_row + (b_row - a_row) * t, a_col + (b_col - a_col) * t, dim));
        }
    }
    // Now mark the final point in the path, which is skipped in the zip iteration above.
    if let Some(&last) = path.last() {
        let (row, col) = grid_position(bounds, dim, last);
        cells.push(cell_index(row, col, dim));
    }
    cells.sort_unstable();
    cells.dedup();
    cells
}

impl HeatGrid {
    /// Construct a HeatGrid from a slice of paths, where each path is a slice of points. The
    /// grid's bounds will be exactly large enough to contain every given point. Resolution is
    /// given as (height, width) in cells. Paths are traced in parallel.
    pub fn from_paths<PMatrix, PRow>(paths: PMatrix, resolution: (usize, usize)) -> Result<HeatGrid>
        where PMatrix: AsRef<[PRow]>,
              PRow: AsRef<[Point]> + Sync
    {
        let (grid_height, grid_width) = resolution;
        let cells = grid_height.checked_mul(grid_width).unwrap_or(usize::MAX);
        if cells == 0 || cells > MAX_GRID_CELLS {
            return Err(Error::InvalidResolution(grid_height, grid_width));
        }
        let paths = paths.as_ref();
        let bounds = path_bounds(paths)?;

        let traced: Vec<Vec<usize>> = paths.par_iter()
            .map(|p| trace_path(&bounds, resolution, p.as_ref()))
            .collect();
        let mut grid = vec![0u32; cells];
        for idx in traced.into_iter().flatten() {
            grid[idx] = grid[idx].saturating_add(1);
        }
        Ok(HeatGrid {
            bounds,
            grid_height,
            grid_width,
            grid,
        })
    }

    /// Pick a (height, width) whose longer side is `longest_side` cells and whose shape follows
    /// the degree extent of `bounds`.
    pub fn sized_for(bounds: &Bounds, longest_side: usize) -> (usize, usize) {
        let longest_side = longest_side.max(1);
        let (lat, lon) = (bounds.range_lat(), bounds.range_lon());
        if lat <= 0.0 && lon <= 0.0 {
            (1, 1)
        } else if lon >= lat {
            (((longest_side as f64 * lat / lon).round() as usize).max(1), longest_side)
        } else {
            (longest_side, ((longest_side as f64 * lon / lat).round() as usize).max(1))
        }
    }

    /// Grid resolution, in degrees latitude per row and degrees longitude per column.
    pub fn degree_resolution(&self) -> (f64, f64) {
        (self.bounds.range_lat() / (self.grid_height.max(2) - 1) as f64,
         self.bounds.range_lon() / (self.grid_width.max(2) - 1) as f64)
    }

    /// Return the lat/lon boundaries of the grid.
    pub fn bbox(&self) -> Bounds {
        self.bounds
    }

    /// Grid dimensions.
    pub fn size(&self) -> (usize, usize) {
        (self.grid_height, self.grid_width)
    }

    /// Grid length, product of width and height.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Immutable access to the underlying grid.
    pub fn grid(&self) -> &[u32] {
        &self.grid[..]
    }

    /// Highest number of paths through any one cell.
    pub fn max_count(&self) -> u32 {
        self.grid.iter().copied().max().unwrap_or(0)
    }

    /// Return the point at the center of the cell at given index.
    pub fn to_lat_lon(&self, idx: usize) -> Point {
        let (ra, ri) = self.degree_resolution();
        let row = (idx / self.grid_width) as f64;
        let col = (idx % self.grid_width) as f64;
        Point::new(self.bounds.north() - row * ra, self.bounds.west() + col * ri)
    }

    /// Return the index of the cell nearest to given point, or None if it lies off the grid.
    pub fn near_lat_lon(&self, p: Point) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        let (row, col) = grid_position(&self.bounds, self.size(), p);
        Some(cell_index(row, col, self.size()))
    }

    /// Write the grid as a grayscale image. Counts at or above `saturate_at` are drawn white.
    pub fn write_image<P: AsRef<FsPath>>(&self, p: P, saturate_at: Option<u32>) -> Result<()> {
        util::mat_to_img(&self.grid, self.size(), p, saturate_at.map(|hi| (0, hi)))
    }
}
