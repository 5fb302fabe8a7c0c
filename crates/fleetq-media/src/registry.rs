//! Extension to command registry.

use std::collections::HashMap;

use crate::command::TransformCommand;
use crate::error::{MediaError, MediaResult};

/// Default voice-focus scripts shipped on the worker image.
const VOICE_FOCUS_WAV: &str = "bash /home/ec2-user/examples/scripts/vf-wav-s3.sh";
const VOICE_FOCUS_MP4: &str = "bash /home/ec2-user/examples/scripts/vf-mp4-s3.sh";

/// Maps an output extension to the command that produces it.
///
/// Extensions are matched case-insensitively and without the leading dot.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    commands: HashMap<String, TransformCommand>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock `wav` and `mp4` voice-focus transforms.
    pub fn voice_focus_defaults() -> Self {
        let mut registry = Self::new();
        for (ext, line) in [("wav", VOICE_FOCUS_WAV), ("mp4", VOICE_FOCUS_MP4)] {
            if let Ok(cmd) = TransformCommand::parse(line) {
                registry.register(ext, cmd);
            }
        }
        registry
    }

    /// Parse `ext=program args;ext=program args`.
    pub fn parse_spec(spec: &str) -> MediaResult<Self> {
        let mut registry = Self::new();

        for entry in spec.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (ext, line) = entry.split_once('=').ok_or_else(|| {
                MediaError::invalid_transform(format!("missing '=' in '{entry}'"))
            })?;

            let ext = ext.trim().trim_start_matches('.');
            if ext.is_empty() {
                return Err(MediaError::invalid_transform(format!(
                    "missing extension in '{entry}'"
                )));
            }

            registry.register(ext, TransformCommand::parse(line)?);
        }

        if registry.is_empty() {
            return Err(MediaError::invalid_transform("no transforms defined"));
        }
        Ok(registry)
    }

    /// Register (or replace) the command for an extension.
    pub fn register(&mut self, extension: &str, command: TransformCommand) -> &mut Self {
        self.commands.insert(normalize(extension), command);
        self
    }

    pub fn get(&self, extension: &str) -> Option<&TransformCommand> {
        self.commands.get(&normalize(extension))
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    pub fn commands(&self) -> impl Iterator<Item = (&str, &TransformCommand)> {
        self.commands.iter().map(|(ext, cmd)| (ext.as_str(), cmd))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}
