use crate::constants::{BRIGHTNESS_RANGE, CONTRAST_RANGE};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings for the filter pipeline.
///
/// The default value leaves images unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterSettings {
    /// Added to each colour channel as a fraction of full scale, -1.0..=1.0
    pub brightness: f32,
    /// -100.0..=100.0, 0 leaves contrast unchanged
    pub contrast: f32,
    /// Blur radius in pixels
    pub blur: f32,
    /// Noise amplitude as a fraction of full scale
    pub noise: f32,
    /// Clockwise rotation in degrees
    pub rotation: f32,
    /// Seed for the noise generator
    pub noise_seed: u64,
}

impl FilterSettings {
    /// Whether applying these settings would leave an image untouched
    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0
            && self.contrast == 0.0
            && self.blur <= 0.0
            && self.noise <= 0.0
            && self.rotation % 360.0 == 0.0
    }

    /// Load settings from a JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let settings: Self = serde_json::from_slice(&bytes)
            .map_err(|e| SignError::Config(format!("Failed to parse filter settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            SignError::Config(format!("Failed to serialize filter settings: {}", e))
        })?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("blur", self.blur),
            ("noise", self.noise),
            ("rotation", self.rotation),
        ];
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SignError::Config(format!("{} must be a finite number", name)));
        }

        if !(BRIGHTNESS_RANGE.0..=BRIGHTNESS_RANGE.1).contains(&self.brightness) {
            return Err(SignError::Config(format!(
                "Brightness {} outside {}..={}",
                self.brightness, BRIGHTNESS_RANGE.0, BRIGHTNESS_RANGE.1
            )));
        }

        if !(CONTRAST_RANGE.0..=CONTRAST_RANGE.1).contains(&self.contrast) {
            return Err(SignError::Config(format!(
                "Contrast {} outside {}..={}",
                self.contrast, CONTRAST_RANGE.0, CONTRAST_RANGE.1
            )));
        }

        if self.blur < 0.0 {
            return Err(SignError::Config("Blur radius cannot be negative".to_string()));
        }

        if self.noise < 0.0 {
            return Err(SignError::Config("Noise cannot be negative".to_string()));
        }

        Ok(())
    }
}
