use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    render::{RenderCommand, RenderSink},
    timeline::SharedClock,
    Result,
};

/// Configuration options for the recording subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub output_path: String,
    /// Clock steps taken per pulse while simulating offline.
    pub steps_per_pulse: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_path: "zellij-transcript.json".to_string(),
            steps_per_pulse: 4,
        }
    }
}

/// A render command stamped with the clock time it was delivered at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedCommand {
    pub at: Duration,
    pub command: RenderCommand,
}

/// Render sink that keeps a transcript of every command it receives.
pub struct Recorder {
    settings: RecordingSettings,
    clock: SharedClock,
    commands: Vec<RecordedCommand>,
    is_recording: bool,
}

impl Recorder {
    pub fn new(settings: RecordingSettings, clock: SharedClock) -> Self {
        Self {
            settings,
            clock,
            commands: Vec::new(),
            is_recording: false,
        }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    pub fn start(&mut self) {
        self.commands.clear();
        self.is_recording = true;
    }

    pub fn stop(&mut self) {
        self.is_recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.commands)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(?path, commands = self.commands.len(), "transcript written");
        Ok(())
    }

    /// Writes to the configured output path.
    pub fn save(&self) -> Result<()> {
        self.write_to(&self.settings.output_path)
    }
}

impl RenderSink for Recorder {
    fn submit(&mut self, command: RenderCommand) {
        if !self.is_recording {
            return;
        }
        self.commands.push(RecordedCommand {
            at: self.clock.now(),
            command,
        });
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("settings", &self.settings)
            .field("commands", &self.commands.len())
            .field("is_recording", &self.is_recording)
            .finish()
    }
}
