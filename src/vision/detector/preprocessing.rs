// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Input tensor preparation for the YOLO detector

use anyhow::Result;
use image::DynamicImage;
use ndarray::Array;

/// Resize the image to the model's square input and convert it to a
/// normalized NCHW f32 tensor of shape `[1, 3, size, size]`.
///
/// A plain (non-letterboxed) resize is used so the coordinate scale-back in
/// postprocessing is exact for any aspect ratio.
pub fn preprocess_image(
    img: &DynamicImage,
    target_size: u32,
) -> Result<Array<f32, ndarray::IxDyn>> {
    let rgb_img = img.to_rgb8();

    let resized = image::imageops::resize(
        &rgb_img,
        target_size,
        target_size,
        image::imageops::FilterType::Triangle,
    );

    let mut input_data = Vec::with_capacity((3 * target_size * target_size) as usize);

    // Fill in NCHW order: batch, channel, height, width
    for c in 0..3 {
        for y in 0..target_size {
            for x in 0..target_size {
                let pixel = resized.get_pixel(x, y);
                input_data.push(pixel[c] as f32 / 255.0);
            }
        }
    }

    let input = Array::from_shape_vec(
        ndarray::IxDyn(&[1, 3, target_size as usize, target_size as usize]),
        input_data,
    )?;

    Ok(input)
}
