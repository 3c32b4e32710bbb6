//! TOML settings for timings, analytics cadence, and key bindings.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tilewalk_core::StepTiming;

/// Runtime settings loaded from a TOML file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Settings {
    /// Milliseconds a normal step takes to cross one cell.
    pub(crate) step_time_ms: u64,
    /// Milliseconds a sprinting step takes to cross one cell.
    pub(crate) sprint_step_time_ms: u64,
    /// Milliseconds of grace after a direction change before a step commits.
    pub(crate) pivot_buffer_ms: u64,
    /// Milliseconds of simulated time between analytics reports.
    pub(crate) report_interval_ms: u64,
    /// Key names for the logical input actions.
    pub(crate) bindings: BindingNames,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step_time_ms: 250,
            sprint_step_time_ms: 125,
            pivot_buffer_ms: 125,
            report_interval_ms: 5_000,
            bindings: BindingNames::default(),
        }
    }
}

/// Key names mapped to the logical input actions.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct BindingNames {
    pub(crate) up: String,
    pub(crate) down: String,
    pub(crate) left: String,
    pub(crate) right: String,
    pub(crate) sprint: String,
    pub(crate) interact: String,
}

impl Default for BindingNames {
    fn default() -> Self {
        Self {
            up: "Up".to_owned(),
            down: "Down".to_owned(),
            left: "Left".to_owned(),
            right: "Right".to_owned(),
            sprint: "LeftShift".to_owned(),
            interact: "Space".to_owned(),
        }
    }
}

impl Settings {
    /// Loads settings from the provided TOML file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    /// Step cadence derived from the configured milliseconds.
    pub(crate) fn step_timing(&self) -> StepTiming {
        StepTiming::new(
            Duration::from_millis(self.step_time_ms),
            Duration::from_millis(self.sprint_step_time_ms),
            Duration::from_millis(self.pivot_buffer_ms),
        )
    }

    /// Cadence at which analytics reports are published.
    pub(crate) fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_cadence() {
        let settings = Settings::default();
        let timing = settings.step_timing();
        assert_eq!(timing.step(), Duration::from_millis(250));
        assert_eq!(timing.sprint_step(), Duration::from_millis(125));
        assert_eq!(timing.pivot_buffer(), Duration::from_millis(125));
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            step_time_ms = 200

            [bindings]
            up = "W"
            down = "S"
            left = "A"
            right = "D"
            "#,
        )
        .expect("settings parse");

        assert_eq!(settings.step_time_ms, 200);
        assert_eq!(settings.sprint_step_time_ms, 125);
        assert_eq!(settings.bindings.up, "W");
        assert_eq!(settings.bindings.interact, "Space");
    }
}
