//! Caller side of the detection CLI.
//!
//! Processes that do not want to link the model runtime shell out to the
//! `yolo_detect` binary instead. `DetectionRunner` spawns it on one image,
//! waits, and parses the JSON it prints. Every failure mode (spawn error,
//! non-zero exit, empty or malformed output) surfaces as an error.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};

use crate::detect::Detection;

/// Label the stock model uses for people.
pub const PERSON_CLASS: &str = "person";

/// Spawns the detection CLI and parses its output.
#[derive(Clone, Debug)]
pub struct DetectionRunner {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl DetectionRunner {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Extra argument placed before the image path.
    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Extra environment variable for the child.
    pub fn env<K: Into<OsString>, V: Into<OsString>>(mut self, key: K, value: V) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run detection on one image file.
    pub fn run<P: AsRef<Path>>(&self, image_path: P) -> Result<Vec<Detection>> {
        let image_path = image_path.as_ref();
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .output()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            log::error!(
                "detection failed on {}: {}, output: {}{}",
                image_path.display(),
                output.status,
                stdout.trim(),
                stderr.trim()
            );
            return Err(anyhow!(
                "detection process exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            log::error!("detection process returned empty output");
            return Err(anyhow!("empty output from detection process"));
        }

        let detections: Vec<Detection> = serde_json::from_slice(&output.stdout)
            .context("failed to parse detection output")?;
        Ok(detections)
    }
}

/// True when any detection is a person above `min_confidence`.
pub fn person_detected(detections: &[Detection], min_confidence: f32) -> bool {
    detections
        .iter()
        .any(|det| det.is_class_above(PERSON_CLASS, min_confidence))
}
