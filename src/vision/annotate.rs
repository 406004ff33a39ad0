// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounding box and label rendering
//!
//! A fixed two-way color policy, not a general colormap: the configured
//! "safe" label renders green, every other label renders red.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::vision::detector::Detection;

const SAFE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ALERT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Rectangle stroke width in pixels
const BOX_THICKNESS: i32 = 2;

/// Vertical offset of the label above the box's top edge
const LABEL_OFFSET_Y: i32 = 10;

/// Label text height in pixels
const LABEL_SCALE: f32 = 16.0;

/// Draws detection results onto an image buffer.
pub struct Annotator {
    safe_label: String,
    font: Option<FontVec>,
}

impl Annotator {
    pub fn new(safe_label: impl Into<String>, font: Option<FontVec>) -> Self {
        Self {
            safe_label: safe_label.into(),
            font,
        }
    }

    /// Build an annotator, loading the label font from `font_path` if one is
    /// configured. Without a font the annotator still draws boxes; label text
    /// is skipped.
    pub fn from_font_path(
        safe_label: impl Into<String>,
        font_path: Option<&Path>,
    ) -> Result<Self> {
        let font = match font_path {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read font file {}", path.display()))?;
                let font = FontVec::try_from_vec(bytes)
                    .with_context(|| format!("Invalid font file {}", path.display()))?;
                Some(font)
            }
            None => None,
        };
        Ok(Self::new(safe_label, font))
    }

    /// Whether label text will be rendered.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn color_for(&self, label: &str) -> Rgb<u8> {
        if label == self.safe_label {
            SAFE_COLOR
        } else {
            ALERT_COLOR
        }
    }

    /// Draw a rectangle and `"{label} {confidence:.2}"` text for every
    /// detection, mutating the buffer in place. Boxes are clamped to the
    /// image bounds.
    pub fn draw(&self, img: &mut RgbImage, detections: &[Detection]) {
        let (w, h) = (img.width() as i32, img.height() as i32);

        for detection in detections {
            let x1 = detection.x1.round() as i32;
            let y1 = detection.y1.round() as i32;
            let x2 = detection.x2.round() as i32;
            let y2 = detection.y2.round() as i32;

            let x_min = x1.min(x2).clamp(0, w);
            let y_min = y1.min(y2).clamp(0, h);
            let x_max = x1.max(x2).clamp(0, w);
            let y_max = y1.max(y2).clamp(0, h);
            let rect_w = (x_max - x_min).max(1) as u32;
            let rect_h = (y_max - y_min).max(1) as u32;

            let color = self.color_for(&detection.class_name);

            // Thick hollow rectangle, growing outward; imageproc clips at the
            // image edges
            for t in 0..BOX_THICKNESS {
                let rect = Rect::at(x_min - t, y_min - t)
                    .of_size(rect_w + (t * 2) as u32, rect_h + (t * 2) as u32);
                draw_hollow_rect_mut(img, rect, color);
            }

            if let Some(font) = &self.font {
                let label = format!("{} {:.2}", detection.class_name, detection.confidence);
                draw_text_mut(
                    img,
                    color,
                    x_min,
                    y_min - LABEL_OFFSET_Y - LABEL_SCALE as i32,
                    PxScale::from(LABEL_SCALE),
                    font,
                    &label,
                );
            }
        }
    }
}
