//! Filter pipeline: brighten → contrast → blur → noise → rotate
//!
//! Every entry point works on a copy; inputs are never touched.

use crate::constants::BLUR_SIGMA_PER_RADIUS;
use crate::options::FilterSettings;
use crate::placement::SignatureOverlay;
use crate::raster::{PageImage, restack};
use crate::types::*;
use image::{Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

/// Run the full pipeline over a copy of `image`.
///
/// Rotation is applied last and grows the canvas to the rotated bounds.
pub fn apply_filters(image: &RgbaImage, settings: &FilterSettings) -> RgbaImage {
    let mut out = image.clone();
    brighten(&mut out, settings.brightness);
    contrast(&mut out, settings.contrast);
    let mut out = blur(out, settings.blur);
    noise(&mut out, settings.noise, settings.noise_seed);

    if settings.rotation.is_finite() && settings.rotation % 360.0 != 0.0 {
        rotate_expanded(&out, settings.rotation)
    } else {
        out
    }
}

/// Filter a copy of the signature. Pixel filters go into the raster; the
/// rotation becomes the overlay's orientation, pivoting on its top-left corner.
pub fn apply_filters_to_signature(
    overlay: &SignatureOverlay,
    settings: &FilterSettings,
) -> Result<SignatureOverlay> {
    settings.validate()?;

    let pixel_settings = FilterSettings {
        rotation: 0.0,
        ..*settings
    };
    Ok(SignatureOverlay {
        raster: apply_filters(&overlay.raster, &pixel_settings),
        rotation: settings.rotation,
        ..overlay.clone()
    })
}

/// Filter a copy of every page independently, then re-stack them since
/// rotation can change page heights.
pub fn apply_filters_to_pages(
    pages: &[PageImage],
    settings: &FilterSettings,
) -> Result<Vec<PageImage>> {
    settings.validate()?;

    let filtered = pages
        .iter()
        .map(|page| PageImage {
            raster: apply_filters(&page.raster, settings),
            ..page.clone()
        })
        .collect();
    Ok(restack(filtered))
}

// =============================================================================
// Pixel Filters
// =============================================================================

fn brighten(image: &mut RgbaImage, brightness: f32) {
    if brightness == 0.0 || !brightness.is_finite() {
        return;
    }
    let delta = brightness * 255.0;
    map_rgb(image, |c| c + delta);
}

fn contrast(image: &mut RgbaImage, contrast: f32) {
    if contrast == 0.0 || !contrast.is_finite() {
        return;
    }
    let adjust = ((contrast + 100.0) / 100.0).powi(2);
    map_rgb(image, |c| ((c / 255.0 - 0.5) * adjust + 0.5) * 255.0);
}

fn blur(image: RgbaImage, radius: f32) -> RgbaImage {
    if radius <= 0.0 || !radius.is_finite() {
        return image;
    }
    gaussian_blur_f32(&image, radius * BLUR_SIGMA_PER_RADIUS)
}

fn noise(image: &mut RgbaImage, amount: f32, seed: u64) {
    if amount <= 0.0 || !amount.is_finite() {
        return;
    }
    let half = amount * 255.0 / 2.0;
    let mut rng = SplitMix64::new(seed);
    map_rgb(image, |c| c + half - 2.0 * half * rng.next_f32());
}

/// Apply `f` to the colour channels of every pixel, leaving alpha alone
fn map_rgb(image: &mut RgbaImage, mut f: impl FnMut(f32) -> f32) {
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            *channel = f(*channel as f32).round().clamp(0.0, 255.0) as u8;
        }
    }
}

// =============================================================================
// Rotation
// =============================================================================

/// Rotate clockwise by `degrees` about the centre into a canvas just large
/// enough to hold the result. Uncovered pixels are transparent.
pub fn rotate_expanded(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let theta = degrees.to_radians();
    let (width, height) = (image.width() as f32, image.height() as f32);
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let out_width = (width * cos + height * sin).round().max(1.0) as u32;
    let out_height = (width * sin + height * cos).round().max(1.0) as u32;

    let projection = Projection::translate(-width / 2.0, -height / 2.0)
        .and_then(Projection::rotate(theta))
        .and_then(Projection::translate(
            out_width as f32 / 2.0,
            out_height as f32 / 2.0,
        ));

    let mut out = RgbaImage::new(out_width, out_height);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
        &mut out,
    );
    out
}

// =============================================================================
// Noise Source
// =============================================================================

/// SplitMix64, so a given seed always yields the same noise
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1)
    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}
