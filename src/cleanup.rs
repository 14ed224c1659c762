use std::collections::HashMap;

use log::debug;
use rayon::prelude::*;

use crate::types::{Path, Point};

/// Default merge radius, in degrees (roughly 35 meters of latitude).
pub const DEFAULT_COMBINE_RADIUS: f64 = 0.00035;

/// Spatial hash of points on a square grid whose cell side equals the search radius, so every
/// neighbour within the radius sits in the 3x3 block of cells around a query.
pub struct PointIndex {
    radius: f64,
    buckets: HashMap<(i64, i64), Vec<Point>>,
}

impl PointIndex {
    pub fn new<I: IntoIterator<Item = Point>>(points: I, radius: f64) -> PointIndex {
        let mut buckets = HashMap::new();
        for p in points {
            if let Some(addr) = Self::address(p, radius) {
                buckets.entry(addr).or_insert_with(Vec::new).push(p);
            }
        }
        PointIndex { radius, buckets }
    }

    /// Grid cell of a point. None for coordinates that are not finite or too large to address;
    /// those points are never indexed and have no neighbours.
    #[inline]
    fn address(p: Point, radius: f64) -> Option<(i64, i64)> {
        let cell = |v: f64| {
            let c = (v / radius).floor();
            if c.is_finite() && c.abs() < i64::MAX as f64 {
                Some(c as i64)
            } else {
                None
            }
        };
        Some((cell(p.lat)?, cell(p.lon)?))
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Every indexed point within `radius` of `p`, including `p` itself if it was indexed.
    pub fn get_close(&self, p: Point) -> Vec<Point> {
        let (row, col) = match Self::address(p, self.radius) {
            Some(addr) => addr,
            None => return Vec::new(),
        };
        (-1..=1)
            .flat_map(|dr| (-1..=1).map(move |dc| (row.checked_add(dr), col.checked_add(dc))))
            .filter_map(|addr| match addr {
                (Some(r), Some(c)) => self.buckets.get(&(r, c)),
                _ => None,
            })
            .flat_map(|bucket| bucket.iter().copied())
            .filter(|q| q.distance(p) <= self.radius)
            .collect()
    }
}

impl Path {
    /// Three-point moving average. Endpoints are kept as they are.
    pub fn smooth(&self) -> Path {
        let pts = &self.points;
        if pts.len() < 3 {
            return self.clone();
        }
        let mut smoothed = Vec::with_capacity(pts.len());
        smoothed.push(pts[0]);
        smoothed.extend(pts.windows(3).map(|w| (w[0] + w[1] + w[2]) / 3.0));
        smoothed.push(pts[pts.len() - 1]);
        Path::new(smoothed)
    }

    /// Pull each point to the centroid of the indexed points around it, so tracks that run over
    /// the same ground collapse onto one line.
    pub fn combine(&self, index: &PointIndex) -> Path {
        self.points
            .iter()
            .map(|&p| {
                let close = index.get_close(p);
                if close.is_empty() {
                    p
                } else {
                    close.iter().fold(Point::new(0.0, 0.0), |sum, &q| sum + q) / close.len() as f64
                }
            })
            .collect()
    }
}

/// Smooth every path, then merge each original path against the pool of all smoothed points.
pub fn clean_paths(paths: &[Path], radius: f64) -> Vec<Path> {
    let smoothed: Vec<Path> = paths.par_iter().map(Path::smooth).collect();
    let index = PointIndex::new(smoothed.iter().flat_map(|p| p.points.iter().copied()), radius);
    debug!("indexed {} smoothed points with radius {}", index.len(), radius);
    paths.par_iter().map(|p| p.combine(&index)).collect()
}
