//! Application configuration.
//!
//! Loaded via `confy` from the `netpulse` directory under the platform
//! config dir. The file is optional; a missing or unreadable config falls
//! back to defaults. Nothing is written back at runtime — the process
//! keeps no persistent state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppearanceConfig {
    /// Background alpha, 0-255. The default matches the original
    /// utility's 92% window opacity.
    #[serde(default = "default_background_alpha")]
    pub background_alpha: u8,

    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_background_alpha() -> u8 {
    235
}

fn default_font_size() -> f32 {
    13.0
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            background_alpha: default_background_alpha(),
            font_size: default_font_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Milliseconds between counter samples.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    #[serde(default)]
    pub appearance: AppearanceConfig,
}

fn default_sample_interval_ms() -> u64 {
    1000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            appearance: AppearanceConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        confy::load("netpulse", None).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sample_interval_ms, 1000);
        assert_eq!(config.appearance.background_alpha, 235);
        assert_eq!(config.appearance.font_size, 13.0);
    }
}
