use std::fmt;
use std::ops::{Add, Div, Sub};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Represent some map coordinate, in degrees. Serialized as a `[lat, lon]` pair.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Point {
        Point { lat, lon }
    }

    /// Straight-line distance in degree space.
    pub fn distance(&self, other: Point) -> f64 {
        ((self.lat - other.lat).powi(2) + (self.lon - other.lon).powi(2)).sqrt()
    }
}

impl From<[f64; 2]> for Point {
    fn from(pair: [f64; 2]) -> Point {
        Point::new(pair[0], pair[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> [f64; 2] {
        [p.lat, p.lon]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lat, self.lon)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.lat + rhs.lat, self.lon + rhs.lon)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.lat - rhs.lat, self.lon - rhs.lon)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.lat / rhs, self.lon / rhs)
    }
}

/// One recorded track: an ordered run of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    pub points: Vec<Point>,
}

impl Path {
    pub fn new(points: Vec<Point>) -> Path {
        Path { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl AsRef<[Point]> for Path {
    fn as_ref(&self) -> &[Point] {
        &self.points
    }
}

impl From<Vec<Point>> for Path {
    fn from(points: Vec<Point>) -> Path {
        Path::new(points)
    }
}

impl FromIterator<Point> for Path {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Path {
        Path::new(iter.into_iter().collect())
    }
}

/// Represent some map bounds, in degrees, by its south-west and north-east corners.
/// Longitudes are not wrapped around the antimeridian.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: Point,
    pub north_east: Point,
}

impl Bounds {
    /// Zero-area bounds sitting on a single point.
    pub fn point(p: Point) -> Bounds {
        Bounds {
            south_west: p,
            north_east: p,
        }
    }

    /// Grow the bounds just enough to include `p`.
    pub fn extend(self, p: Point) -> Bounds {
        Bounds {
            south_west: Point::new(f64::min(self.south(), p.lat), f64::min(self.west(), p.lon)),
            north_east: Point::new(f64::max(self.north(), p.lat), f64::max(self.east(), p.lon)),
        }
    }

    pub fn north(&self) -> f64 {
        self.north_east.lat
    }
    pub fn south(&self) -> f64 {
        self.south_west.lat
    }
    pub fn east(&self) -> f64 {
        self.north_east.lon
    }
    pub fn west(&self) -> f64 {
        self.south_west.lon
    }

    pub fn range_lat(&self) -> f64 {
        self.north() - self.south()
    }
    pub fn range_lon(&self) -> f64 {
        self.east() - self.west()
    }

    pub fn center(&self) -> Point {
        (self.south_west + self.north_east) / 2.0
    }

    /// True if `p` lies inside or on the edge of the bounds.
    pub fn contains(&self, p: Point) -> bool {
        self.south() <= p.lat && p.lat <= self.north() && self.west() <= p.lon && p.lon <= self.east()
    }

    /// GeoJSON bbox ordering: `[west, south, east, north]`.
    pub fn to_bbox(&self) -> Vec<f64> {
        vec![self.west(), self.south(), self.east(), self.north()]
    }
}

pub const DEFAULT_COLOR: &str = "#FF0000";
pub const DEFAULT_OPACITY: f64 = 0.3;

/// Stroke style applied to every line of one plot call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StyleFields")]
pub struct Style {
    color: String,
    opacity: f64,
}

#[derive(Deserialize)]
#[serde(default)]
struct StyleFields {
    color: String,
    opacity: f64,
}

impl Default for StyleFields {
    fn default() -> StyleFields {
        StyleFields {
            color: DEFAULT_COLOR.to_string(),
            opacity: DEFAULT_OPACITY,
        }
    }
}

impl TryFrom<StyleFields> for Style {
    type Error = Error;

    fn try_from(f: StyleFields) -> Result<Style, Error> {
        Style::new(f.color, f.opacity)
    }
}

impl Default for Style {
    fn default() -> Style {
        Style {
            color: DEFAULT_COLOR.to_string(),
            opacity: DEFAULT_OPACITY,
        }
    }
}

fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !color.is_empty() && color.chars().all(|c| c.is_ascii_alphabetic()),
    }
}

impl Style {
    /// Build a style, rejecting colors that are neither `#RGB`/`#RRGGBB` nor a plain color name
    /// and opacities outside `[0, 1]`.
    pub fn new<S: Into<String>>(color: S, opacity: f64) -> Result<Style, Error> {
        let color = color.into();
        if !is_valid_color(&color) {
            return Err(Error::InvalidStyle(format!("bad color {:?}", color)));
        }
        if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
            return Err(Error::InvalidStyle(format!("opacity {} not in [0, 1]", opacity)));
        }
        Ok(Style { color, opacity })
    }

    /// Build a style from raw form inputs: a color string and an opacity in percent.
    /// Blank inputs take the defaults.
    pub fn from_inputs(color: &str, opacity_percent: &str) -> Result<Style, Error> {
        let color = match color.trim() {
            "" => DEFAULT_COLOR,
            c => c,
        };
        let opacity = match opacity_percent.trim() {
            "" => DEFAULT_OPACITY,
            pct => {
                let pct: f64 = pct
                    .parse()
                    .map_err(|_| Error::InvalidStyle(format!("opacity {:?} is not a number", pct)))?;
                pct / 100.0
            }
        };
        Style::new(color, opacity)
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_style_default() {
        let s = Style::default();
        assert_eq!(s.color(), "#FF0000");
        assert_eq!(s.opacity(), 0.3);
    }

    #[rstest]
    #[case("#FF0000", 0.3)]
    #[case("#abc", 0.0)]
    #[case("navy", 1.0)]
    fn test_style_new_ok(#[case] color: &str, #[case] opacity: f64) {
        let s = Style::new(color, opacity).unwrap();
        assert_eq!(s.color(), color);
        assert_eq!(s.opacity(), opacity);
    }

    #[rstest]
    #[case("", 0.3)]
    #[case("#12345", 0.3)]
    #[case("#GGGGGG", 0.3)]
    #[case("rgb(1,2,3)", 0.3)]
    #[case("red", 1.5)]
    #[case("red", -0.1)]
    #[case("red", f64::NAN)]
    fn test_style_new_invalid(#[case] color: &str, #[case] opacity: f64) {
        assert!(matches!(Style::new(color, opacity), Err(Error::InvalidStyle(_))));
    }

    #[rstest]
    #[case("", "", "#FF0000", 0.3)]
    #[case("blue", "50", "blue", 0.5)]
    #[case(" #00ff00 ", "100", "#00ff00", 1.0)]
    #[case("", "0", "#FF0000", 0.0)]
    fn test_style_from_inputs(
        #[case] color: &str,
        #[case] pct: &str,
        #[case] want_color: &str,
        #[case] want_opacity: f64,
    ) {
        let s = Style::from_inputs(color, pct).unwrap();
        assert_eq!(s.color(), want_color);
        assert_eq!(s.opacity(), want_opacity);
    }

    #[test]
    fn test_style_from_inputs_rejects_garbage() {
        assert!(Style::from_inputs("red", "lots").is_err());
        assert!(Style::from_inputs("red", "250").is_err());
    }

    #[test]
    fn test_style_deserialize_defaults_and_validates() {
        let s: Style = serde_json::from_str(r#"{"opacity": 0.8}"#).unwrap();
        assert_eq!(s, Style::new("#FF0000", 0.8).unwrap());
        assert!(serde_json::from_str::<Style>(r#"{"opacity": 3}"#).is_err());
    }

    #[test]
    fn test_point_serde_pair() {
        let p: Point = serde_json::from_str("[1.5, -2]").unwrap();
        assert_eq!(p, Point::new(1.5, -2.0));
        assert_eq!(serde_json::to_string(&p).unwrap(), "[1.5,-2.0]");
    }

    #[test]
    fn test_bounds_extend_and_contains() {
        let b = Bounds::point(Point::new(1.0, 1.0)).extend(Point::new(-1.0, 3.0));
        assert_eq!(b.south_west, Point::new(-1.0, 1.0));
        assert_eq!(b.north_east, Point::new(1.0, 3.0));
        assert_eq!(b.range_lat(), 2.0);
        assert_eq!(b.range_lon(), 2.0);
        assert_eq!(b.center(), Point::new(0.0, 2.0));
        assert!(b.contains(Point::new(0.0, 2.0)));
        assert!(b.contains(Point::new(1.0, 3.0)));
        assert!(!b.contains(Point::new(1.1, 2.0)));
        assert_eq!(b.to_bbox(), vec![1.0, -1.0, 3.0, 1.0]);
    }
}
