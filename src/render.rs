//! Overlay drawing for a processed frame.
//!
//! The renderer only talks to a [`Canvas`]; the OpenCV `Mat` implementation
//! lives in [`crate::canvas`].

use colors_transform::{Color, Rgb};

use crate::counter::{Detection, RegionCounts};
use crate::error::{Error, Result};
use crate::geometry::{polygon_centroid, Point};
use crate::region::{RegionColor, RegionStore};
use crate::session::AnnotationSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl DisplayColor {
    pub const WHITE: DisplayColor = DisplayColor::new(255, 255, 255);
    pub const YELLOW: DisplayColor = DisplayColor::new(255, 255, 0);
    pub const MAGENTA: DisplayColor = DisplayColor::new(255, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (or `rrggbb`).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        let hex = if hex.starts_with('#') {
            hex.to_string()
        } else {
            format!("#{hex}")
        };
        let rgb = Rgb::from_hex_str(&hex).map_err(|_| Error::Palette(hex.clone()))?;
        Ok(Self::new(
            rgb.get_red().round() as u8,
            rgb.get_green().round() as u8,
            rgb.get_blue().round() as u8,
        ))
    }
}

/// Maps region categories to the colours they are drawn in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [DisplayColor; 5],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: [
                DisplayColor::new(0, 255, 0),
                DisplayColor::new(0, 0, 255),
                DisplayColor::new(255, 0, 0),
                DisplayColor::new(255, 165, 0),
                DisplayColor::new(128, 0, 128),
            ],
        }
    }
}

impl Palette {
    fn slot(color: RegionColor) -> usize {
        match color {
            RegionColor::Green => 0,
            RegionColor::Blue => 1,
            RegionColor::Red => 2,
            RegionColor::Orange => 3,
            RegionColor::Purple => 4,
        }
    }

    pub fn get(&self, color: RegionColor) -> DisplayColor {
        self.colors[Self::slot(color)]
    }

    pub fn set(&mut self, color: RegionColor, display: DisplayColor) {
        self.colors[Self::slot(color)] = display;
    }
}

/// Drawing primitives the overlay needs from a frame buffer.
pub trait Canvas {
    fn line(&mut self, from: Point, to: Point, color: DisplayColor, thickness: i32) -> Result<()>;
    fn filled_circle(&mut self, center: Point, radius: i32, color: DisplayColor) -> Result<()>;
    fn filled_rect(&mut self, top_left: Point, bottom_right: Point, color: DisplayColor)
        -> Result<()>;
    /// Width and height of `text` when drawn with [`Canvas::text`].
    fn text_size(&self, text: &str, scale: f64, thickness: i32) -> Result<(i32, i32)>;
    /// Draws `text` with its bottom-left corner at `origin`.
    fn text(
        &mut self,
        text: &str,
        origin: Point,
        scale: f64,
        color: DisplayColor,
        thickness: i32,
    ) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub dot_spacing: f64,
    pub dot_radius: i32,
    pub marker_radius: i32,
    pub corner_length: i32,
    pub corner_thickness: i32,
    pub outline_thickness: i32,
    pub pending_thickness: i32,
    pub label_scale: f64,
    pub label_thickness: i32,
    pub label_padding: i32,
    pub box_label_scale: f64,
    /// Gap between a detection's caption and the top of its box.
    pub box_label_offset: i32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            dot_spacing: 15.,
            dot_radius: 4,
            marker_radius: 6,
            corner_length: 10,
            corner_thickness: 3,
            outline_thickness: 1,
            pending_thickness: 2,
            label_scale: 1.,
            label_thickness: 2,
            label_padding: 5,
            box_label_scale: 0.6,
            box_label_offset: 10,
        }
    }
}

/// Dot centres for the cursor preview line.
///
/// `floor(distance / spacing)` dots are spread evenly from `start`, so the
/// last dot stops short of `end`.
pub fn dotted_line_points(start: Point, end: Point, spacing: f64) -> Vec<Point> {
    if spacing <= 0. {
        return Vec::new();
    }
    let n = (start.distance(end) / spacing).floor() as usize;
    let (dx, dy) = ((end.x - start.x) as f64, (end.y - start.y) as f64);
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            Point::new(
                (start.x as f64 + dx * t) as i32,
                (start.y as f64 + dy * t) as i32,
            )
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub style: RenderStyle,
    pub palette: Palette,
}

impl Renderer {
    pub fn new(style: RenderStyle, palette: Palette) -> Self {
        Self { style, palette }
    }

    /// Draws the full overlay. Later layers cover earlier ones.
    pub fn draw<C: Canvas>(
        &self,
        canvas: &mut C,
        detections: &[Detection],
        store: &RegionStore,
        session: &AnnotationSession,
        counts: &RegionCounts,
    ) -> Result<()> {
        for detection in detections {
            self.draw_detection(canvas, detection)?;
        }

        for polygon in store {
            let color = self.palette.get(polygon.color());
            for (a, b) in polygon.edges() {
                canvas.line(a, b, color, self.style.outline_thickness)?;
            }
            if polygon.is_countable() {
                let v = polygon.vertices();
                canvas.line(v[v.len() - 1], v[0], color, self.style.outline_thickness)?;
            }
        }

        for polygon in store.countable() {
            let centroid = match polygon_centroid(polygon.vertices()) {
                Ok(c) => c,
                Err(e) => {
                    log::debug!("no count label for {} region: {e}", polygon.color());
                    continue;
                }
            };
            let text = counts.get(polygon.color()).to_string();
            self.draw_label(canvas, &text, centroid, self.palette.get(polygon.color()))?;
        }

        let active = self.palette.get(session.active_color());
        for pair in session.pending_points().windows(2) {
            canvas.line(pair[0], pair[1], active, self.style.pending_thickness)?;
        }

        if let (Some(cursor), Some(&last)) =
            (session.cursor_position(), session.pending_points().last())
        {
            for dot in dotted_line_points(last, cursor, self.style.dot_spacing) {
                canvas.filled_circle(dot, self.style.dot_radius, active)?;
            }
        }
        Ok(())
    }

    fn draw_detection<C: Canvas>(&self, canvas: &mut C, d: &Detection) -> Result<()> {
        canvas.filled_circle(d.centroid, self.style.marker_radius, DisplayColor::YELLOW)?;

        let (x1, y1) = (d.top_left.x, d.top_left.y);
        let (x2, y2) = (d.bottom_right.x, d.bottom_right.y);
        let l = self.style.corner_length.min(d.width() / 2).min(d.height() / 2);
        let t = self.style.corner_thickness;
        let c = DisplayColor::MAGENTA;
        for (corner, dx, dy) in [
            (Point::new(x1, y1), l, l),
            (Point::new(x2, y1), -l, l),
            (Point::new(x1, y2), l, -l),
            (Point::new(x2, y2), -l, -l),
        ] {
            canvas.line(corner, Point::new(corner.x + dx, corner.y), c, t)?;
            canvas.line(corner, Point::new(corner.x, corner.y + dy), c, t)?;
        }

        if let Some(label) = &d.label {
            canvas.text(
                label,
                Point::new(x1, y1 - self.style.box_label_offset),
                self.style.box_label_scale,
                c,
                self.style.label_thickness,
            )?;
        }
        Ok(())
    }

    fn draw_label<C: Canvas>(
        &self,
        canvas: &mut C,
        text: &str,
        center: Point,
        color: DisplayColor,
    ) -> Result<()> {
        let (w, h) = canvas.text_size(text, self.style.label_scale, self.style.label_thickness)?;
        let pad = self.style.label_padding;
        canvas.filled_rect(
            Point::new(center.x - w / 2 - pad, center.y - h / 2 - pad),
            Point::new(center.x + w / 2 + pad, center.y + h / 2 + pad),
            DisplayColor::WHITE,
        )?;
        canvas.text(
            text,
            Point::new(center.x - w / 2, center.y + h / 2),
            self.style.label_scale,
            color,
            self.style.label_thickness,
        )
    }
}
