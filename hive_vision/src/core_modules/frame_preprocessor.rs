// THEORY:
// The `frame_preprocessor` turns a raw camera frame into the normalized,
// single-channel intensity field that the `MotionDetector` compares between
// frames. It is a stateless utility, like the rest of the per-frame helpers:
// identical input always yields an identical field.
//
// Steps, in order:
// 1.  **Intensity**: color frames are reduced to one channel with the Rec. 601
//     luma weights (0.299 R + 0.587 G + 0.114 B). Frames that are already
//     single-channel keep their intensity channel.
// 2.  **Blur**: a separable Gaussian with a fixed 21-tap kernel. At this size
//     single-pixel sensor noise, leg and wing flicker and leaf edges fall below
//     the motion threshold, while a bee-sized blob still produces a strong
//     difference.

pub mod frame_preprocessor {
    use crate::error::VisionError;
    use image::{DynamicImage, GrayImage, Luma};
    use imageproc::filter::separable_filter_equal;

    /// Side length of the blur kernel. Must be odd.
    pub const BLUR_KERNEL_SIZE: usize = 21;

    /// Converts a frame into a blurred intensity field of the same dimensions.
    pub fn preprocess(image: &DynamicImage) -> Result<GrayImage, VisionError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(VisionError::InvalidImage(format!(
                "frame has zero area ({}x{})",
                width, height
            )));
        }

        let intensity = to_intensity(image);
        Ok(separable_filter_equal(
            &intensity,
            &gaussian_kernel(BLUR_KERNEL_SIZE),
        ))
    }

    /// Reduces any supported frame layout to an 8-bit intensity image.
    pub fn to_intensity(image: &DynamicImage) -> GrayImage {
        match image {
            DynamicImage::ImageLuma8(gray) => gray.clone(),
            DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
            _ => {
                let rgb = image.to_rgb8();
                GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                    let [red, green, blue] = rgb.get_pixel(x, y).0;
                    Luma([luminance(red, green, blue)])
                })
            }
        }
    }

    /// Rec. 601 luma, rounded to the nearest 8-bit value.
    pub fn luminance(red: u8, green: u8, blue: u8) -> u8 {
        let luma = 0.299_f64 * red as f64 + 0.587_f64 * green as f64 + 0.114_f64 * blue as f64;
        luma.round().min(255.0) as u8
    }

    /// Normalized 1D Gaussian weights for a kernel of `size` taps.
    ///
    /// The standard deviation is derived from the size the same way common
    /// vision libraries do when asked for an automatic sigma:
    /// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
    pub fn gaussian_kernel(size: usize) -> Vec<f32> {
        let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
        let center = (size / 2) as f64;
        let weights: Vec<f64> = (0..size)
            .map(|i| {
                let offset = i as f64 - center;
                (-(offset * offset) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let total: f64 = weights.iter().sum();
        weights.iter().map(|w| (w / total) as f32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::frame_preprocessor::*;
    use crate::error::VisionError;
    use assert_approx_eq::assert_approx_eq;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn rejects_zero_area_frames() {
        let empty = DynamicImage::new_rgb8(0, 0);
        assert!(matches!(preprocess(&empty), Err(VisionError::InvalidImage(_))));

        let no_rows = DynamicImage::new_luma8(16, 0);
        assert!(matches!(preprocess(&no_rows), Err(VisionError::InvalidImage(_))));
    }

    #[test]
    fn keeps_frame_dimensions() {
        let frame = DynamicImage::new_rgb8(64, 48);
        let field = preprocess(&frame).unwrap();
        assert_eq!(field.dimensions(), (64, 48));

        let tiny = DynamicImage::new_luma8(1, 1);
        assert_eq!(preprocess(&tiny).unwrap().dimensions(), (1, 1));
    }

    #[test]
    fn uses_rec601_weights_for_color_frames() {
        assert_eq!(luminance(255, 0, 0), 76);
        assert_eq!(luminance(0, 255, 0), 150);
        assert_eq!(luminance(0, 0, 255), 29);
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);

        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 255, 0])));
        let gray = to_intensity(&frame);
        assert!(gray.pixels().all(|p| p.0[0] == 150));
    }

    #[test]
    fn single_channel_frames_pass_through() {
        let gray = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 8 + y) as u8]));
        let frame = DynamicImage::ImageLuma8(gray.clone());
        assert_eq!(to_intensity(&frame), gray);
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(BLUR_KERNEL_SIZE);
        assert_eq!(kernel.len(), 21);
        assert_approx_eq!(kernel.iter().sum::<f32>(), 1.0, 1e-5);
        for i in 0..kernel.len() / 2 {
            assert_approx_eq!(kernel[i], kernel[kernel.len() - 1 - i], 1e-7);
        }
        assert!(kernel[10] > kernel[9]);
    }

    #[test]
    fn blur_suppresses_single_pixel_noise() {
        let mut gray = GrayImage::new(50, 50);
        gray.put_pixel(25, 25, Luma([255]));
        let field = preprocess(&DynamicImage::ImageLuma8(gray)).unwrap();

        // Well below the default motion sensitivity of 25.
        assert!(field.get_pixel(25, 25).0[0] < 10);
    }

    #[test]
    fn uniform_frames_stay_uniform() {
        let frame = DynamicImage::ImageLuma8(GrayImage::from_pixel(30, 30, Luma([200])));
        let field = preprocess(&frame).unwrap();
        assert!(field.pixels().all(|p| p.0[0] >= 198 && p.0[0] <= 200));
    }

    #[test]
    fn is_deterministic() {
        let gray = GrayImage::from_fn(40, 30, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let frame = DynamicImage::ImageLuma8(gray);
        assert_eq!(preprocess(&frame).unwrap(), preprocess(&frame).unwrap());
    }
}
