use std::fs;
use std::mem;
use std::path::Path as FsPath;
use std::str::from_utf8;

use log::{debug, info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{Error, Result};
use crate::types::{Path, Point};
use crate::util::paths_from_geojson;

/// Activity file formats we know how to read tracks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    Gpx,
    Tcx,
    /// LineStrings exported by other tools, or by our own `--geojson` output.
    GeoJson,
}

impl TrackFormat {
    /// Pick the format from the file extension, ignoring case.
    pub fn from_path<P: AsRef<FsPath>>(p: P) -> Result<TrackFormat> {
        let p = p.as_ref();
        let ext = p.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("gpx") => Ok(TrackFormat::Gpx),
            Some("tcx") => Ok(TrackFormat::Tcx),
            Some("geojson") => Ok(TrackFormat::GeoJson),
            _ => Err(Error::UnsupportedFormat(p.display().to_string())),
        }
    }

    pub fn parse(self, contents: &str) -> Result<Vec<Path>> {
        match self {
            TrackFormat::Gpx => parse_gpx(contents),
            TrackFormat::Tcx => parse_tcx(contents),
            TrackFormat::GeoJson => paths_from_geojson(contents.as_bytes()),
        }
    }
}

fn parse_attr(value: &[u8]) -> Option<f64> {
    from_utf8(value).ok().and_then(|s| s.trim().parse().ok())
}

fn trkpt_point(e: &BytesStart) -> Option<Point> {
    let mut o_lat = None;
    let mut o_lon = None;
    for a in e.attributes().flatten() {
        match a.key.as_ref() {
            b"lat" => o_lat = parse_attr(&a.value),
            b"lon" => o_lon = parse_attr(&a.value),
            _ => (),
        }
    }
    Some(Point::new(o_lat?, o_lon?))
}

/// Return one path per `<trkseg>` in a GPX document. Track points with a missing or unparsable
/// coordinate are dropped, and segments left with no points produce no path. Points after the
/// last closed segment (a truncated file) are dropped too.
pub fn parse_gpx(xml: &str) -> Result<Vec<Path>> {
    let mut r = Reader::from_str(xml);
    let mut paths = Vec::new();
    let mut current = Vec::new();
    let mut buf = Vec::with_capacity(2048);
    loop {
        match r.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"trkpt" => {
                if let Some(p) = trkpt_point(e) {
                    current.push(p);
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"trkseg" => {
                if !current.is_empty() {
                    paths.push(Path::new(mem::take(&mut current)));
                }
            }
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }
    Ok(paths)
}

#[derive(Clone, Copy)]
enum Degrees {
    Lat,
    Lon,
}

/// Return one path per `<Track>` in a TCX document. A `<Trackpoint>` needs both
/// `<LatitudeDegrees>` and `<LongitudeDegrees>` to count; the rest (pauses, indoor laps) are
/// skipped.
pub fn parse_tcx(xml: &str) -> Result<Vec<Path>> {
    let mut r = Reader::from_str(xml);
    let mut paths = Vec::new();
    let mut current = Vec::new();
    let mut buf = Vec::with_capacity(2048);
    let mut inside: Option<Degrees> = None;
    let mut o_lat: Option<f64> = None;
    let mut o_lon: Option<f64> = None;
    loop {
        match r.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                match e.local_name().as_ref() {
                    b"LatitudeDegrees" => inside = Some(Degrees::Lat),
                    b"LongitudeDegrees" => inside = Some(Degrees::Lon),
                    b"Trackpoint" => {
                        o_lat = None;
                        o_lon = None;
                    }
                    _ => (),
                }
            }
            Event::Text(ref e) => {
                if let Some(which) = inside {
                    let v = e.unescape()?.trim().parse().ok();
                    match which {
                        Degrees::Lat => o_lat = v,
                        Degrees::Lon => o_lon = v,
                    }
                }
            }
            Event::End(ref e) => {
                match e.local_name().as_ref() {
                    b"LatitudeDegrees" | b"LongitudeDegrees" => inside = None,
                    b"Trackpoint" => {
                        if let (Some(lat), Some(lon)) = (o_lat.take(), o_lon.take()) {
                            current.push(Point::new(lat, lon));
                        }
                    }
                    b"Track" => {
                        if !current.is_empty() {
                            paths.push(Path::new(mem::take(&mut current)));
                        }
                    }
                    _ => (),
                }
            }
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }
    Ok(paths)
}

/// Read every track in one GPX, TCX or GeoJSON file.
pub fn read_track_file<P: AsRef<FsPath>>(p: P) -> Result<Vec<Path>> {
    let p = p.as_ref();
    let format = TrackFormat::from_path(p)?;
    let contents = fs::read_to_string(p)?;
    format.parse(&contents)
}

/// Read the tracks of every supported file in `dir`, in file name order. Files that can't be
/// read or parsed are logged and skipped.
pub fn read_track_dir<P: AsRef<FsPath>>(dir: P) -> Result<Vec<Path>> {
    let mut files: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut all_paths = Vec::new();
    for f in files {
        match read_track_file(&f) {
            Ok(mut paths) => {
                debug!("added {:?} ({} paths)", f, paths.len());
                all_paths.append(&mut paths);
            }
            Err(e) => warn!("skipped {:?}: {}", f, e),
        }
    }
    info!("read {} paths", all_paths.len());
    Ok(all_paths)
}
