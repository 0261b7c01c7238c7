//! Geospatial value types with their JSON representation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Point in a two dimensional plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Point at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point [x={:.6}, y={:.6}]", self.x, self.y)
    }
}

/// Unit of a [`Distance`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    /// Kilometers on the earth's surface.
    Kilometers,
    /// Statute miles on the earth's surface.
    Miles,
    /// Plain units of the coordinate system.
    #[default]
    Neutral,
}

impl Metric {
    /// Earth radius in this unit; `1.0` for [`Metric::Neutral`].
    pub fn multiplier(self) -> f64 {
        match self {
            Metric::Kilometers => 6378.137,
            Metric::Miles => 3963.191,
            Metric::Neutral => 1.0,
        }
    }

    /// Abbreviation used when rendering distances.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Metric::Kilometers => "km",
            Metric::Miles => "mi",
            Metric::Neutral => "",
        }
    }
}

/// Distance with a unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    /// Amount in `metric`.
    pub value: f64,
    /// Unit.
    #[serde(default)]
    pub metric: Metric,
}

impl Distance {
    /// Distance of `value` in `metric`.
    pub fn new(value: f64, metric: Metric) -> Self {
        Self { value, metric }
    }

    /// Distance in radians.
    pub fn normalized_value(&self) -> f64 {
        self.value / self.metric.multiplier()
    }

    /// Same distance expressed in `metric`.
    pub fn in_metric(&self, metric: Metric) -> Self {
        if metric == self.metric {
            return *self;
        }
        Self::new(self.normalized_value() * metric.multiplier(), metric)
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        match self.metric {
            Metric::Neutral => Ok(()),
            metric => write!(f, "{}", metric.abbreviation()),
        }
    }
}

/// Circle given by center and radius.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center point.
    pub center: Point,
    /// Radius.
    pub radius: Distance,
}

impl Circle {
    /// Circle around `center`.
    pub fn new(center: Point, radius: Distance) -> Self {
        Self { center, radius }
    }
}

/// Axis-aligned box spanned by two corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    /// First corner.
    pub first: Point,
    /// Opposite corner.
    pub second: Point,
}

impl GeoBox {
    /// Box spanned by `first` and `second`.
    pub fn new(first: Point, second: Point) -> Self {
        Self { first, second }
    }
}

/// Closed polygon of at least three points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPolygon")]
pub struct Polygon {
    points: Vec<Point>,
}

#[derive(Deserialize)]
struct RawPolygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Polygon through `points`.
    pub fn new(points: Vec<Point>) -> Result<Self, QueryError> {
        if points.len() < 3 {
            return Err(QueryError::InvalidArgument(format!(
                "polygon needs at least 3 points, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Vertices in order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl TryFrom<RawPolygon> for Polygon {
    type Error = QueryError;

    fn try_from(raw: RawPolygon) -> Result<Self, Self::Error> {
        Polygon::new(raw.points)
    }
}
