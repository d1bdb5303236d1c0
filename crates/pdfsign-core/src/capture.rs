//! Freehand signature capture
//!
//! Records pointer strokes on a fixed-size surface and rasterizes them into
//! a transparent PNG, the same artefact a browser canvas hands back.

use crate::config::{PadConfig, MAX_PAD_DIMENSION};
use crate::error::SignPdfError;
use crate::signature::SignatureImage;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PadPoint {
    pub x: f64,
    pub y: f64,
}

/// Drawing surface for a handwritten signature
#[derive(Debug, Clone)]
pub struct SignaturePad {
    width: u32,
    height: u32,
    pen_width: f64,
    pen_color: [u8; 3],
    strokes: Vec<Vec<PadPoint>>,
    drawing: bool,
}

impl SignaturePad {
    pub fn new(config: &PadConfig) -> Self {
        Self {
            width: config.width.clamp(1, MAX_PAD_DIMENSION),
            height: config.height.clamp(1, MAX_PAD_DIMENSION),
            pen_width: config.pen_width,
            pen_color: parse_hex_color(&config.pen_color),
            strokes: Vec::new(),
            drawing: false,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pointer down
    pub fn begin_stroke(&mut self, x: f64, y: f64) {
        self.strokes.push(vec![PadPoint { x, y }]);
        self.drawing = true;
    }

    /// Pointer move; ignored unless a stroke is in progress
    pub fn extend_stroke(&mut self, x: f64, y: f64) {
        if !self.drawing {
            return;
        }
        if let Some(stroke) = self.strokes.last_mut() {
            stroke.push(PadPoint { x, y });
        }
    }

    /// Pointer up
    pub fn end_stroke(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn strokes(&self) -> &[Vec<PadPoint>] {
        &self.strokes
    }

    /// Replace the recorded strokes, e.g. with ones collected by a UI layer
    pub fn set_strokes(&mut self, strokes: Vec<Vec<PadPoint>>) {
        self.strokes = strokes.into_iter().filter(|s| !s.is_empty()).collect();
        self.drawing = false;
    }

    /// Rasterize onto a transparent canvas, straight alpha
    pub fn rasterize(&self) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        let radius = self.pen_width / 2.0;

        for stroke in &self.strokes {
            if stroke.len() == 1 {
                self.stamp_segment(&mut canvas, stroke[0], stroke[0], radius);
            }
            for pair in stroke.windows(2) {
                self.stamp_segment(&mut canvas, pair[0], pair[1], radius);
            }
        }

        canvas
    }

    /// Draw a round-capped segment, keeping the strongest coverage per pixel
    fn stamp_segment(&self, canvas: &mut RgbaImage, a: PadPoint, b: PadPoint, radius: f64) {
        let reach = radius + 1.0;
        let min_x = (a.x.min(b.x) - reach).floor().max(0.0) as u32;
        let min_y = (a.y.min(b.y) - reach).floor().max(0.0) as u32;
        let max_x = ((a.x.max(b.x) + reach).ceil().max(0.0) as u32).min(self.width);
        let max_y = ((a.y.max(b.y) + reach).ceil().max(0.0) as u32).min(self.height);

        for py in min_y..max_y {
            for px in min_x..max_x {
                let center = PadPoint {
                    x: px as f64 + 0.5,
                    y: py as f64 + 0.5,
                };
                let coverage = (radius + 0.5 - distance_to_segment(center, a, b)).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }

                let alpha = (coverage * 255.0).round() as u8;
                if alpha > canvas.get_pixel(px, py)[3] {
                    let [r, g, b] = self.pen_color;
                    canvas.put_pixel(px, py, Rgba([r, g, b, alpha]));
                }
            }
        }
    }

    /// Encode the drawing as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, SignPdfError> {
        if self.is_empty() {
            return Err(SignPdfError::EmptySignature);
        }

        let pixels = self.rasterize();
        let mut out = Vec::new();
        let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| SignPdfError::InvalidImage(format!("PNG encode: {}", e)))?;
        writer
            .write_image_data(pixels.as_raw())
            .map_err(|e| SignPdfError::InvalidImage(format!("PNG encode: {}", e)))?;
        writer
            .finish()
            .map_err(|e| SignPdfError::InvalidImage(format!("PNG encode: {}", e)))?;

        Ok(out)
    }

    pub fn to_signature_image(&self) -> Result<SignatureImage, SignPdfError> {
        SignatureImage::new("image/png", self.to_png()?)
    }

    pub fn to_data_url(&self) -> Result<String, SignPdfError> {
        Ok(self.to_signature_image()?.to_data_url())
    }
}

fn distance_to_segment(p: PadPoint, a: PadPoint, b: PadPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Parse hex color string (e.g., "#FF0000" or "FF0000") to RGB bytes
fn parse_hex_color(color: &str) -> [u8; 3] {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 && hex.is_ascii() {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        [r, g, b]
    } else {
        [0, 0, 0] // Default to black
    }
}
