//! Collaborators backed by external programs.
//!
//! These adapters let any detector or OCR tool that can read PNG files and
//! print JSON take part in an analysis run. Frames are written to a
//! temporary directory that is removed when the call returns, whether it
//! succeeds or fails.
//!
//! # Protocols
//!
//! - [`ProcessDetector`] runs `program [args..] frame1.png frame2.png ..`
//!   once per batch. Stdout must be a JSON array with one entry per frame,
//!   each an array of integer class ids: `[[0, 2], [], [0]]`.
//! - [`ProcessRecognizer`] runs `program [args..] frame.png` once per frame.
//!   Stdout is either an array of regions,
//!   `[{"text": "EXIT", "confidence": 91.5}]`, or a skip,
//!   `{"skipped": "frame too small"}`.
//!
//! A non-zero exit status, a spawn failure or malformed output is returned
//! as a collaborator error.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use image::RgbImage;
use serde::Deserialize;

use crate::{
    error::CollaboratorError,
    frame::Frame,
    objects::ObjectDetector,
    text::{TextRecognition, TextRecognizer, TextRegion},
};

/// An [`ObjectDetector`] that shells out to an external program per batch.
#[derive(Debug, Clone)]
pub struct ProcessDetector {
    program: OsString,
    args: Vec<OsString>,
}

impl ProcessDetector {
    /// Invoke `program` with `args` followed by the frame paths.
    pub fn new<S: Into<OsString>>(program: S, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl ObjectDetector for ProcessDetector {
    fn detect(&mut self, frames: &[Frame]) -> Result<Vec<Vec<u32>>, CollaboratorError> {
        let scratch = tempfile::tempdir()?;
        let mut paths = Vec::with_capacity(frames.len());
        for frame in frames {
            let path = scratch
                .path()
                .join(format!("frame_{:08}.png", frame.source_index()));
            frame.image().save(&path)?;
            paths.push(path);
        }

        let stdout = run_program(&self.program, &self.args, &paths)?;
        let detections: Vec<Vec<u32>> = serde_json::from_slice(&stdout)?;
        Ok(detections)
    }
}

/// A [`TextRecognizer`] that shells out to an external program per frame.
#[derive(Debug, Clone)]
pub struct ProcessRecognizer {
    program: OsString,
    args: Vec<OsString>,
}

impl ProcessRecognizer {
    /// Invoke `program` with `args` followed by the frame path.
    pub fn new<S: Into<OsString>>(program: S, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecognizerOutput {
    Regions(Vec<TextRegion>),
    Skipped { skipped: String },
}

impl TextRecognizer for ProcessRecognizer {
    fn recognize(&mut self, image: &RgbImage) -> Result<TextRecognition, CollaboratorError> {
        let scratch = tempfile::tempdir()?;
        let path = scratch.path().join("frame.png");
        image.save(&path)?;

        let stdout = run_program(&self.program, &self.args, &[path])?;
        Ok(parse_recognizer_output(&stdout)?)
    }
}

fn parse_recognizer_output(stdout: &[u8]) -> Result<TextRecognition, serde_json::Error> {
    Ok(match serde_json::from_slice(stdout)? {
        RecognizerOutput::Regions(regions) => TextRecognition::Regions(regions),
        RecognizerOutput::Skipped { skipped } => TextRecognition::Skipped { reason: skipped },
    })
}

fn run_program(
    program: &OsString,
    args: &[OsString],
    paths: &[PathBuf],
) -> Result<Vec<u8>, CollaboratorError> {
    log::debug!(
        "Running {} on {} frame(s)",
        Path::new(program).display(),
        paths.len()
    );

    let output = Command::new(program).args(args).args(paths).output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} exited with {}: {}",
            Path::new(program).display(),
            output.status,
            stderr.trim()
        )
        .into());
    }
    Ok(output.stdout)
}
