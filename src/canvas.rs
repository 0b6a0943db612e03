use crate::error::Result;
use crate::geometry::Point;
use crate::render::{Canvas, DisplayColor};
use crate::{cv, imgproc};

const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

/// OpenCV frames are BGR.
pub fn scalar(color: DisplayColor) -> cv::Scalar {
    cv::Scalar::new(color.b as f64, color.g as f64, color.r as f64, 0.)
}

impl Canvas for cv::Mat {
    fn line(&mut self, from: Point, to: Point, color: DisplayColor, thickness: i32) -> Result<()> {
        imgproc::line(
            self,
            from.into(),
            to.into(),
            scalar(color),
            thickness,
            imgproc::LINE_AA,
            0,
        )?;
        Ok(())
    }

    fn filled_circle(&mut self, center: Point, radius: i32, color: DisplayColor) -> Result<()> {
        imgproc::circle(
            self,
            center.into(),
            radius,
            scalar(color),
            imgproc::FILLED,
            imgproc::LINE_AA,
            0,
        )?;
        Ok(())
    }

    fn filled_rect(&mut self, top_left: Point, bottom_right: Point, color: DisplayColor) -> Result<()> {
        imgproc::rectangle_points(
            self,
            top_left.into(),
            bottom_right.into(),
            scalar(color),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;
        Ok(())
    }

    fn text_size(&self, text: &str, scale: f64, thickness: i32) -> Result<(i32, i32)> {
        let mut baseline = 0;
        let size = imgproc::get_text_size(text, FONT, scale, thickness, &mut baseline)?;
        Ok((size.width, size.height))
    }

    fn text(
        &mut self,
        text: &str,
        origin: Point,
        scale: f64,
        color: DisplayColor,
        thickness: i32,
    ) -> Result<()> {
        imgproc::put_text(
            self,
            text,
            origin.into(),
            FONT,
            scale,
            scalar(color),
            thickness,
            imgproc::LINE_AA,
            false,
        )?;
        Ok(())
    }
}
