use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    geometry::Rect, record::RecordingSettings, timeline::MAX_PULSE, Result, ZellijError,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seconds between timeline steps.
    pub pulse_seconds: f64,
    pub canvas: CanvasConfig,
    pub finale: FinaleConfig,
    pub recording: RecordingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pulse_seconds: 0.5,
            canvas: CanvasConfig::default(),
            finale: FinaleConfig::default(),
            recording: RecordingSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn pulse(&self) -> Result<Duration> {
        match Duration::try_from_secs_f64(self.pulse_seconds) {
            Ok(pulse) if !pulse.is_zero() && pulse <= MAX_PULSE => Ok(pulse),
            Ok(pulse) => Err(ZellijError::InvalidPulse(pulse)),
            Err(_) => Err(ZellijError::InvalidConfig(format!(
                "pulse_seconds must be a positive number, got {}",
                self.pulse_seconds
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.pulse()?;
        self.canvas.rect()?;
        self.finale.validate()?;
        if self.recording.steps_per_pulse == 0 {
            return Err(ZellijError::InvalidConfig(
                "recording.steps_per_pulse must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Size of the rectangle a pattern is laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 400.0,
        }
    }
}

impl CanvasConfig {
    pub fn rect(&self) -> Result<Rect> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.width) || !valid(self.height) {
            return Err(ZellijError::InvalidConfig(format!(
                "canvas must have a positive size, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(Rect::from_size(self.width, self.height))
    }
}

/// Oscillating flourish played by the final drawing state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinaleConfig {
    pub repeat_count: u32,
    /// Length of one swing, in pulses.
    pub duration_pulses: f64,
    pub autoreverses: bool,
    /// Also swing the star lines, not just the outside ones.
    pub animate_star_lines: bool,
}

impl Default for FinaleConfig {
    fn default() -> Self {
        Self {
            repeat_count: 20,
            duration_pulses: 1.5,
            autoreverses: true,
            animate_star_lines: false,
        }
    }
}

impl FinaleConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.duration_pulses.is_finite() || self.duration_pulses <= 0.0 {
            return Err(ZellijError::InvalidConfig(format!(
                "finale.duration_pulses must be positive, got {}",
                self.duration_pulses
            )));
        }
        Ok(())
    }

    pub fn swing(&self, pulse: Duration) -> Duration {
        pulse.mul_f64(self.duration_pulses)
    }
}
