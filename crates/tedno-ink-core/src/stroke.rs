//! Stroke data model and the record shapes exchanged with persistence.

use crate::geometry::{parse_path, polygon_bounds, to_path_string};
use crate::tools::ToolKind;
use kurbo::{Point, Rect};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Thinnest allowed brush.
pub const MIN_WIDTH: f64 = 2.0;
/// Thickest allowed brush.
pub const MAX_WIDTH: f64 = 24.0;
/// Brush width for a fresh session.
pub const DEFAULT_WIDTH: f64 = 8.0;
/// Pressure assumed when the device reports none.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// A raw input sample in document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InkPoint {
    pub x: f64,
    pub y: f64,
    /// Normalized pressure in `[0, 1]`.
    pub pressure: f64,
}

impl InkPoint {
    pub fn new(x: f64, y: f64, pressure: f64) -> Self {
        Self {
            x,
            y,
            pressure: pressure.clamp(0.0, 1.0),
        }
    }

    /// Build a sample from an optional device pressure.
    ///
    /// Missing or zero pressure falls back to [`DEFAULT_PRESSURE`]; reported
    /// values go through a square-root curve so light touches still ink.
    pub fn from_device(position: Point, pressure: Option<f64>) -> Self {
        let pressure = match pressure {
            Some(p) if p > 0.0 => p.min(1.0).sqrt(),
            _ => DEFAULT_PRESSURE,
        };
        Self::new(position.x, position.y, pressure)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Error returned when a color string is not `#rgb` or `#rrggbb`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid color: {0:?}")]
pub struct ColorParseError(pub String);

/// An opaque RGB ink color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// The default ink color (`#37352f`).
    pub const INK: Rgb = Rgb::new(0x37, 0x35, 0x2f);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::INK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| err());
        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let short = |h: &str| channel(h).map(|v| v * 17);
                Ok(Rgb::new(short(&hex[0..1])?, short(&hex[1..2])?, short(&hex[2..3])?))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Unique identifier of a committed stroke.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeId(String);

impl StrokeId {
    /// A fresh random id that cannot collide with earlier ones in practice.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StrokeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StrokeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Color and width a stroke is committed with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgb,
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Rgb::INK,
            width: DEFAULT_WIDTH,
        }
    }
}

/// A committed ink mark: a filled outline plus its style.
///
/// The outline is kept both as a path descriptor (what gets persisted) and
/// as the parsed polygon used for hit testing, so the two never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    id: StrokeId,
    path: String,
    color: Rgb,
    width: f64,
    outline: Vec<Point>,
    bounds: Option<Rect>,
}

impl Stroke {
    /// Create a stroke from a freshly smoothed outline polygon.
    pub fn from_outline(id: StrokeId, outline: &[Point], style: StrokeStyle) -> Self {
        Self::from_path(id, to_path_string(outline), style)
    }

    /// Create a stroke from a path descriptor.
    pub fn from_path(id: StrokeId, path: String, style: StrokeStyle) -> Self {
        let outline = parse_path(&path);
        let bounds = polygon_bounds(&outline);
        Self {
            id,
            path,
            color: style.color,
            width: style.width.clamp(MIN_WIDTH, MAX_WIDTH),
            outline,
            bounds,
        }
    }

    /// Rebuild a stroke from a persisted record.
    ///
    /// Malformed fields degrade instead of failing: an unreadable path gives
    /// an empty outline, an unreadable color the default ink.
    pub fn from_record(record: StrokeRecord) -> Self {
        let color = match record.color.as_deref().map(str::parse::<Rgb>) {
            Some(Ok(color)) => color,
            Some(Err(e)) => {
                log::warn!("Stroke {}: {}, using default ink", record.id, e);
                Rgb::INK
            }
            None => Rgb::INK,
        };
        let width = match record.width {
            Some(w) if w.is_finite() => w,
            Some(w) => {
                log::warn!("Stroke {}: invalid width {}, using default", record.id, w);
                DEFAULT_WIDTH
            }
            None => DEFAULT_WIDTH,
        };
        let stroke = Self::from_path(record.id, record.path, StrokeStyle { color, width });
        if stroke.outline.is_empty() && !stroke.path.is_empty() {
            log::warn!("Stroke {}: unreadable path data, rendering nothing", stroke.id);
        }
        stroke
    }

    pub fn id(&self) -> &StrokeId {
        &self.id
    }

    /// The closed path descriptor.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Strokes are always laid down by the pen.
    pub fn tool(&self) -> ToolKind {
        ToolKind::Pen
    }

    /// Parsed outline polygon.
    pub fn outline(&self) -> &[Point] {
        &self.outline
    }

    /// Bounding box of the outline, `None` for an empty outline.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Whether a document-space point lies inside the filled outline.
    pub fn contains(&self, point: Point) -> bool {
        match self.bounds {
            Some(b) if b.contains(point) => crate::geometry::point_in_polygon(point, &self.outline),
            _ => false,
        }
    }

    /// Load-shaped record for this stroke.
    pub fn to_record(&self) -> StrokeRecord {
        StrokeRecord {
            id: self.id.clone(),
            path: self.path.clone(),
            color: Some(self.color.to_string()),
            width: Some(self.width),
        }
    }

    /// Save-shaped record for this stroke.
    pub fn to_saved(&self) -> SavedStroke {
        SavedStroke {
            id: self.id.clone(),
            stroke_data: StrokeData {
                path: self.path.clone(),
                color: self.color,
                width: self.width,
            },
        }
    }
}

/// A stroke as handed over by persistence on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeRecord {
    #[serde(deserialize_with = "deserialize_stroke_id")]
    pub id: StrokeId,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
}

/// Payload of a saved stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeData {
    pub path: String,
    pub color: Rgb,
    pub width: f64,
}

/// A stroke as emitted to persistence on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStroke {
    pub id: StrokeId,
    pub stroke_data: StrokeData,
}

impl From<SavedStroke> for StrokeRecord {
    fn from(saved: SavedStroke) -> Self {
        Self {
            id: saved.id,
            path: saved.stroke_data.path,
            color: Some(saved.stroke_data.color.to_string()),
            width: Some(saved.stroke_data.width),
        }
    }
}

/// Older documents stored numeric ids; accept both.
fn deserialize_stroke_id<'de, D>(deserializer: D) -> Result<StrokeId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => StrokeId(s),
        RawId::Integer(n) => StrokeId(n.to_string()),
        RawId::Float(n) => StrokeId(n.to_string()),
    })
}
