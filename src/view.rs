//! The map surface tracks are drawn on, and the plot / fit operations that drive it.
//!
//! A [`MapView`] only knows how to draw one styled line, remove it again and move its viewport.
//! Everything above that (replacing the previous set of lines, reporting progress, fitting the
//! view to the data) lives here so it can run against any surface, including test doubles.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use geojson::{feature, Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use log::{debug, info};

use crate::error::Result;
use crate::types::{Bounds, Path, Point, Style};
use crate::util::path_bounds;

/// A rendering surface that can show styled paths.
pub trait MapView {
    /// Token for a drawn line, handed back to remove it.
    type Handle;

    fn draw_path(&mut self, path: &Path, style: &Style) -> Self::Handle;

    fn remove(&mut self, handle: Self::Handle);

    /// Move and zoom the visible area so that all of `region` is shown. Padding and zoom
    /// snapping are up to the view.
    fn fit_viewport(&mut self, region: &Bounds);
}

/// The lines currently drawn on a view, in the order their paths were given.
#[derive(Debug)]
pub struct RenderedLineSet<H> {
    handles: Vec<H>,
}

impl<H> Default for RenderedLineSet<H> {
    fn default() -> Self {
        RenderedLineSet { handles: Vec::new() }
    }
}

impl<H> RenderedLineSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, H> {
        self.handles.iter()
    }

    /// Remove every line from `view`, leaving the set empty.
    pub fn clear<V: MapView<Handle = H>>(&mut self, view: &mut V) {
        for h in self.handles.drain(..) {
            view.remove(h);
        }
    }
}

/// Progress messages shown to the user while plotting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Loading,
    Plotted(usize),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Status::Loading => write!(f, "Loading..."),
            Status::Plotted(n) => write!(f, "Plotted {} runs!", n),
        }
    }
}

/// Somewhere to put status text.
pub trait StatusSink {
    fn set_status(&mut self, status: Status);
}

impl StatusSink for Vec<String> {
    fn set_status(&mut self, status: Status) {
        self.push(status.to_string());
    }
}

/// Sends status text to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn set_status(&mut self, status: Status) {
        info!("{}", status);
    }
}

/// Replace whatever `lines` holds with one freshly drawn line per path, all in `style`.
/// The returned set always has exactly `paths.len()` lines.
pub fn plot<V, S>(view: &mut V,
                  lines: RenderedLineSet<V::Handle>,
                  paths: &[Path],
                  style: &Style,
                  status: &mut S)
                  -> RenderedLineSet<V::Handle>
    where V: MapView,
          S: StatusSink + ?Sized
{
    status.set_status(Status::Loading);
    let mut lines = lines;
    lines.clear(view);
    lines.handles.extend(paths.iter().map(|p| view.draw_path(p, style)));
    status.set_status(Status::Plotted(lines.len()));
    lines
}

/// Fit `view` to the bounds of all points in `paths`. Nothing is sent to the view when there
/// are no points.
pub fn fit_bounds<V, PMatrix, PRow>(view: &mut V, paths: PMatrix) -> Result<Bounds>
    where V: MapView + ?Sized,
          PMatrix: AsRef<[PRow]>,
          PRow: AsRef<[Point]>
{
    let region = path_bounds(paths)?;
    debug!("fitting view to {} .. {}", region.south_west, region.north_east);
    view.fit_viewport(&region);
    Ok(region)
}

/// Identifier of a line drawn on a [`GeoJsonView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(u64);

/// A map view that renders into a GeoJSON FeatureCollection, one LineString feature per line
/// with simplestyle `stroke` / `stroke-opacity` properties. The fitted region becomes the
/// collection's `bbox`.
#[derive(Debug, Default, Clone)]
pub struct GeoJsonView {
    next_id: u64,
    lines: BTreeMap<LineId, Feature>,
    bbox: Option<Bounds>,
}

impl GeoJsonView {
    pub fn new() -> GeoJsonView {
        GeoJsonView::default()
    }

    /// Number of lines currently drawn.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn viewport(&self) -> Option<Bounds> {
        self.bbox
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: self.bbox.map(|b| b.to_bbox()),
            features: self.lines.values().cloned().collect(),
            foreign_members: None,
        }
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &GeoJson::FeatureCollection(self.to_feature_collection()))?;
        Ok(())
    }
}

impl MapView for GeoJsonView {
    type Handle = LineId;

    fn draw_path(&mut self, path: &Path, style: &Style) -> LineId {
        let id = LineId(self.next_id);
        self.next_id += 1;

        let mut properties = JsonObject::new();
        properties.insert("stroke".to_string(), JsonValue::from(style.color()));
        properties.insert("stroke-opacity".to_string(), JsonValue::from(style.opacity()));
        let coords = path.points.iter().map(|p| vec![p.lon, p.lat]).collect();
        let feature = Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::LineString(coords))),
            id: Some(feature::Id::Number(id.0.into())),
            properties: Some(properties),
            foreign_members: None,
        };
        self.lines.insert(id, feature);
        id
    }

    fn remove(&mut self, handle: LineId) {
        self.lines.remove(&handle);
    }

    fn fit_viewport(&mut self, region: &Bounds) {
        self.bbox = Some(*region);
    }
}

/// Draw `paths` in `style` on a fresh [`GeoJsonView`] fitted to their bounds.
pub fn paths_to_geojson(paths: &[Path], style: &Style) -> Result<GeoJsonView> {
    let mut view = GeoJsonView::new();
    let lines = plot(&mut view, RenderedLineSet::new(), paths, style, &mut LogStatus);
    fit_bounds(&mut view, paths)?;
    debug!("rendered {} lines to geojson", lines.len());
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Draw(usize, String, f64),
        Remove(usize),
        Fit(Bounds),
    }

    /// Records every call and tracks which handles are still live.
    #[derive(Default)]
    struct RecordingView {
        next: usize,
        live: Vec<usize>,
        calls: Vec<Call>,
    }

    impl MapView for RecordingView {
        type Handle = usize;

        fn draw_path(&mut self, path: &Path, style: &Style) -> usize {
            let h = self.next;
            self.next += 1;
            self.live.push(h);
            self.calls.push(Call::Draw(path.len(), style.color().to_string(), style.opacity()));
            h
        }

        fn remove(&mut self, handle: usize) {
            self.live.retain(|&h| h != handle);
            self.calls.push(Call::Remove(handle));
        }

        fn fit_viewport(&mut self, region: &Bounds) {
            self.calls.push(Call::Fit(*region));
        }
    }

    fn sample() -> Vec<Path> {
        vec![
            Path::new(vec![Point::new(10.0, 10.0), Point::new(20.0, 20.0)]),
            Path::new(vec![Point::new(5.0, 30.0)]),
        ]
    }

    #[test]
    fn test_plot_draws_every_path() {
        let mut view = RecordingView::default();
        let mut status: Vec<String> = Vec::new();
        let style = Style::new("blue", 0.5).unwrap();
        let lines = plot(&mut view, RenderedLineSet::new(), &sample(), &style, &mut status);
        assert_eq!(lines.len(), 2);
        assert_eq!(view.calls,
                   vec![Call::Draw(2, "blue".to_string(), 0.5), Call::Draw(1, "blue".to_string(), 0.5)]);
        assert_eq!(status, vec!["Loading...", "Plotted 2 runs!"]);
    }

    #[test]
    fn test_replot_removes_previous_lines() {
        let mut view = RecordingView::default();
        let mut status: Vec<String> = Vec::new();
        let style = Style::default();
        let paths = sample();
        let first = plot(&mut view, RenderedLineSet::new(), &paths, &style, &mut status);
        let first_handles: Vec<usize> = first.iter().copied().collect();
        let second = plot(&mut view, first, &paths, &style, &mut status);
        assert_eq!(second.len(), paths.len());
        assert_eq!(view.live.len(), paths.len());
        for h in first_handles {
            assert!(!view.live.contains(&h));
            assert!(view.calls.contains(&Call::Remove(h)));
        }
    }

    #[test]
    fn test_plot_empty_clears_everything() {
        let mut view = RecordingView::default();
        let mut status: Vec<String> = Vec::new();
        let lines = plot(&mut view, RenderedLineSet::new(), &sample(), &Style::default(), &mut status);
        let lines = plot(&mut view, lines, &[], &Style::default(), &mut status);
        assert!(lines.is_empty());
        assert!(view.live.is_empty());
        assert_eq!(status.last().map(String::as_str), Some("Plotted 0 runs!"));
    }

    #[test]
    fn test_fit_bounds_issues_one_call() {
        let mut view = RecordingView::default();
        let region = fit_bounds(&mut view, sample()).unwrap();
        assert_eq!(region.south_west, Point::new(5.0, 10.0));
        assert_eq!(region.north_east, Point::new(20.0, 30.0));
        assert_eq!(view.calls, vec![Call::Fit(region)]);
    }

    #[test]
    fn test_fit_bounds_empty_is_error_and_silent() {
        let mut view = RecordingView::default();
        let empty: Vec<Path> = vec![Path::default()];
        assert!(matches!(fit_bounds(&mut view, &empty), Err(Error::EmptyInput)));
        assert!(view.calls.is_empty());
    }

    #[test]
    fn test_geojson_view() {
        let style = Style::new("#00F", 0.7).unwrap();
        let view = paths_to_geojson(&sample(), &style).unwrap();
        assert_eq!(view.len(), 2);
        let fc = view.to_feature_collection();
        assert_eq!(fc.bbox, Some(vec![10.0, 5.0, 30.0, 20.0]));
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["stroke"], JsonValue::from("#00F"));
        assert_eq!(props["stroke-opacity"], JsonValue::from(0.7));
        match fc.features[1].geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(coords)) => assert_eq!(coords, &vec![vec![30.0, 5.0]]),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_geojson_view_remove_and_write() {
        let mut view = GeoJsonView::new();
        let a = view.draw_path(&sample()[0], &Style::default());
        let b = view.draw_path(&sample()[1], &Style::default());
        assert_ne!(a, b);
        view.remove(a);
        assert_eq!(view.len(), 1);
        let mut out = Vec::new();
        view.write_to(&mut out).unwrap();
        let back: GeoJson = serde_json::from_slice(&out).unwrap();
        match back {
            GeoJson::FeatureCollection(fc) => assert_eq!(fc.features.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }
}
