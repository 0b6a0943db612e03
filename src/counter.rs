use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::geometry::{point_in_polygon, Point};
use crate::region::{RegionColor, RegionStore};

/// One object reported by the detector for the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub top_left: Point,
    pub bottom_right: Point,
    pub centroid: Point,
    /// Caption drawn above the box, e.g. `CAR 87%`.
    pub label: Option<String>,
}

impl Detection {
    /// Builds a detection from box corners. Inverted boxes are rejected.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self> {
        if x2 < x1 || y2 < y1 {
            return Err(Error::MalformedDetection { x1, y1, x2, y2 });
        }
        let (w, h) = (x2 - x1, y2 - y1);
        Ok(Self {
            top_left: Point::new(x1, y1),
            bottom_right: Point::new(x2, y2),
            centroid: Point::new(x1 + w / 2, y1 + h / 2),
            label: None,
        })
    }

    /// Captions the box with the upper-cased class name and the score as a
    /// truncated percentage.
    pub fn with_label(mut self, class: &str, score: f32) -> Self {
        self.label = Some(format!("{} {}%", class.to_uppercase(), (score * 100.) as i32));
        self
    }

    pub fn from_rect(rect: crate::cv::Rect) -> Result<Self> {
        Self::from_corners(rect.x, rect.y, rect.x + rect.width, rect.y + rect.height)
    }

    pub fn width(&self) -> i32 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> i32 {
        self.bottom_right.y - self.top_left.y
    }
}

/// Hits per region colour for a single frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionCounts(BTreeMap<RegionColor, usize>);

impl RegionCounts {
    pub fn get(&self, color: RegionColor) -> usize {
        self.0.get(&color).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionColor, usize)> + '_ {
        self.0.iter().map(|(&c, &n)| (c, n))
    }

    fn bump(&mut self, color: RegionColor) {
        *self.0.entry(color).or_insert(0) += 1;
    }

    fn merge(mut self, other: RegionCounts) -> RegionCounts {
        for (color, n) in other.0 {
            *self.0.entry(color).or_insert(0) += n;
        }
        self
    }
}

impl FromIterator<(RegionColor, usize)> for RegionCounts {
    fn from_iter<I: IntoIterator<Item = (RegionColor, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Tests every detection centroid against every countable region.
///
/// A detection inside two overlapping regions counts for both.
pub fn count_regions(detections: &[Detection], store: &RegionStore) -> RegionCounts {
    detections
        .par_iter()
        .fold(RegionCounts::default, |mut counts, detection| {
            for polygon in store.countable() {
                if point_in_polygon(polygon.vertices(), detection.centroid) {
                    counts.bump(polygon.color());
                }
            }
            counts
        })
        .reduce(RegionCounts::default, RegionCounts::merge)
}

/// Keeps the detections that converted cleanly, dropping the malformed ones.
pub fn collect_detections<I>(boxes: I) -> Vec<Detection>
where
    I: IntoIterator<Item = Result<Detection>>,
{
    boxes
        .into_iter()
        .filter_map(|converted| match converted {
            Ok(d) => Some(d),
            Err(e) => {
                log::debug!("skipping detection: {e}");
                None
            }
        })
        .collect()
}
