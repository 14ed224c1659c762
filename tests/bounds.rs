use proptest::prelude::*;

use runmap::{fit_bounds, path_bounds, Bounds, Error, MapView, Path, Point, Style};

fn arb_point() -> impl Strategy<Value = Point> {
    (-90.0f64..90.0, -180.0f64..180.0).prop_map(|(lat, lon)| Point::new(lat, lon))
}

fn arb_paths() -> impl Strategy<Value = Vec<Path>> {
    prop::collection::vec(prop::collection::vec(arb_point(), 0..20).prop_map(Path::new), 0..8)
}

/// Brute force min / max over every coordinate.
fn reference(paths: &[Path]) -> Option<(f64, f64, f64, f64)> {
    let pts: Vec<Point> = paths.iter().flat_map(|p| p.points.iter().copied()).collect();
    if pts.is_empty() {
        return None;
    }
    let min_lat = pts.iter().map(|p| p.lat).fold(f64::INFINITY, f64::min);
    let max_lat = pts.iter().map(|p| p.lat).fold(f64::NEG_INFINITY, f64::max);
    let min_lon = pts.iter().map(|p| p.lon).fold(f64::INFINITY, f64::min);
    let max_lon = pts.iter().map(|p| p.lon).fold(f64::NEG_INFINITY, f64::max);
    Some((min_lat, min_lon, max_lat, max_lon))
}

proptest! {
    #[test]
    fn test_bounds_match_reference(paths in arb_paths()) {
        match (path_bounds(&paths), reference(&paths)) {
            (Ok(b), Some((min_lat, min_lon, max_lat, max_lon))) => {
                prop_assert_eq!(b.south_west, Point::new(min_lat, min_lon));
                prop_assert_eq!(b.north_east, Point::new(max_lat, max_lon));
            }
            (Err(Error::EmptyInput), None) => (),
            (got, want) => prop_assert!(false, "got {:?}, want {:?}", got, want),
        }
    }

    #[test]
    fn test_bounds_contain_every_point(paths in arb_paths()) {
        if let Ok(b) = path_bounds(&paths) {
            for p in paths.iter().flat_map(|p| p.points.iter()) {
                prop_assert!(b.contains(*p));
            }
        }
    }

    #[test]
    fn test_bounds_ignore_order(mut paths in arb_paths()) {
        let before = path_bounds(&paths).ok();
        paths.reverse();
        for p in paths.iter_mut() {
            p.points.reverse();
        }
        prop_assert_eq!(before, path_bounds(&paths).ok());
    }

    #[test]
    fn test_single_point_is_degenerate(p in arb_point(), empties in 0usize..4) {
        let mut paths = vec![Path::default(); empties];
        paths.push(Path::new(vec![p]));
        let b = path_bounds(&paths).unwrap();
        prop_assert_eq!(b, Bounds::point(p));
        prop_assert_eq!(b.south_west, b.north_east);
    }
}

#[derive(Default)]
struct FitOnly {
    fitted: Vec<Bounds>,
}

impl MapView for FitOnly {
    type Handle = ();

    fn draw_path(&mut self, _: &Path, _: &Style) {}

    fn remove(&mut self, _: ()) {}

    fn fit_viewport(&mut self, region: &Bounds) {
        self.fitted.push(*region);
    }
}

#[test]
fn test_fit_bounds_scenarios() {
    let mut view = FitOnly::default();

    let paths: Vec<Path> = serde_json::from_str("[[[10,10],[20,20]], [[5,30]]]").unwrap();
    let b = fit_bounds(&mut view, &paths).unwrap();
    assert_eq!(b.south_west, Point::new(5.0, 10.0));
    assert_eq!(b.north_east, Point::new(20.0, 30.0));

    let paths: Vec<Path> = serde_json::from_str("[[[1,1]]]").unwrap();
    let b = fit_bounds(&mut view, &paths).unwrap();
    assert_eq!(b, Bounds::point(Point::new(1.0, 1.0)));

    let paths: Vec<Path> = serde_json::from_str("[]").unwrap();
    assert!(matches!(fit_bounds(&mut view, &paths), Err(Error::EmptyInput)));

    assert_eq!(view.fitted.len(), 2);
}
