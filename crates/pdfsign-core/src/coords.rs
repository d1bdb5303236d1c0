//! Coordinate transformation between screen and PDF coordinate systems
//!
//! Screen space has its origin at the top-left of the rendered page with Y
//! growing downward, measured in pixels. PDF space has its origin at the
//! bottom-left of the media box with Y growing upward, measured in points.

use serde::{Deserialize, Serialize};

/// A rectangle in screen space: top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Convert to PDF space, flipping the Y axis.
    ///
    /// At scale 1.0 with a media box anchored at the origin this is
    /// `y_pdf = page_height - height - y`.
    pub fn to_pdf(&self, frame: &PageFrame) -> PdfRect {
        let [mb_x, mb_y, _, _] = frame.media_box;
        let s = frame.scale;
        let width = self.width * s;
        let height = self.height * s;

        PdfRect {
            x: mb_x + self.x * s,
            y: mb_y + frame.page_height() - height - self.y * s,
            width,
            height,
        }
    }
}

/// A rectangle in PDF space: bottom-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    /// Convert back to screen space
    pub fn to_screen(&self, frame: &PageFrame) -> ScreenRect {
        let [mb_x, mb_y, _, _] = frame.media_box;
        let s = frame.scale;

        ScreenRect {
            x: (self.x - mb_x) / s,
            y: (frame.page_height() - (self.y - mb_y) - self.height) / s,
            width: self.width / s,
            height: self.height / s,
        }
    }
}

/// Geometry of one page as needed for the transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// [x1, y1, x2, y2] in points
    pub media_box: [f64; 4],
    /// Points per screen pixel
    pub scale: f64,
}

impl PageFrame {
    /// A frame where one screen pixel is one point
    pub fn unscaled(media_box: [f64; 4]) -> Self {
        Self {
            media_box,
            scale: 1.0,
        }
    }

    /// A frame for a page rendered `rendered_width` pixels wide.
    /// Falls back to scale 1.0 for a non-positive width.
    pub fn for_display_width(media_box: [f64; 4], rendered_width: f64) -> Self {
        let page_width = media_box[2] - media_box[0];
        let scale = if rendered_width.is_finite() && rendered_width > 0.0 && page_width > 0.0 {
            page_width / rendered_width
        } else {
            1.0
        };
        Self { media_box, scale }
    }

    pub fn page_width(&self) -> f64 {
        self.media_box[2] - self.media_box[0]
    }

    pub fn page_height(&self) -> f64 {
        self.media_box[3] - self.media_box[1]
    }
}
