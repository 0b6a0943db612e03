use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::geometry::{distance_point_to_segment, Point};

/// Pixel tolerance used when deleting a region near a point.
pub const DELETE_TOLERANCE_PX: f64 = 5.;

/// Counting category of a region. Display colours are resolved by
/// [`crate::render::Palette`] at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionColor {
    Green,
    Blue,
    Red,
    Orange,
    Purple,
}

impl RegionColor {
    pub const ALL: [RegionColor; 5] = [
        RegionColor::Green,
        RegionColor::Blue,
        RegionColor::Red,
        RegionColor::Orange,
        RegionColor::Purple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RegionColor::Green => "green",
            RegionColor::Blue => "blue",
            RegionColor::Red => "red",
            RegionColor::Orange => "orange",
            RegionColor::Purple => "purple",
        }
    }
}

impl fmt::Display for RegionColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RegionColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RegionColor::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownColor(s.to_string()))
    }
}

/// A committed region outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    vertices: Vec<Point>,
    color: RegionColor,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>, color: RegionColor) -> Self {
        Self { vertices, color }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn color(&self) -> RegionColor {
        self.color
    }

    /// Only outlines with more than two vertices take part in counting.
    pub fn is_countable(&self) -> bool {
        self.vertices.len() > 2
    }

    /// Consecutive vertex pairs. The closing edge is not included.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.vertices.windows(2).map(|w| (w[0], w[1]))
    }

    fn is_near(&self, point: Point, tolerance_px: f64) -> bool {
        self.edges()
            .any(|(a, b)| distance_point_to_segment(a, b, point) < tolerance_px)
    }
}

/// Regions drawn on a single stream, kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct RegionStore {
    polygons: Vec<Polygon>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }

    /// Removes the first region with an edge closer than `tolerance_px` to
    /// `point`. At most one region goes per call.
    pub fn remove_near(&mut self, point: Point, tolerance_px: f64) -> Option<Polygon> {
        let idx = self
            .polygons
            .iter()
            .position(|polygon| polygon.is_near(point, tolerance_px))?;
        Some(self.polygons.remove(idx))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Polygon> {
        self.polygons.iter()
    }

    pub fn countable(&self) -> impl Iterator<Item = &Polygon> {
        self.polygons.iter().filter(|p| p.is_countable())
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

impl<'a> IntoIterator for &'a RegionStore {
    type Item = &'a Polygon;
    type IntoIter = std::slice::Iter<'a, Polygon>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
