//! NDJSON replay source
//!
//! Plays back a recorded sample stream from a newline-delimited JSON file,
//! one `Sample` object per line. Blank lines are skipped; a malformed line
//! fails the open so a bad recording is rejected up front rather than
//! surfacing mid-stream.

use anyhow::{Context, Result};
use laptrace_core::model::Sample;
use laptrace_core::source::SampleSource;
use std::path::{Path, PathBuf};

pub struct ReplaySource {
    path: PathBuf,
    samples: Vec<Sample>,
    cursor: usize,
    active: bool,
}

impl ReplaySource {
    /// Load a recording. The whole file is parsed eagerly.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read recording {}", path.display()))?;

        let mut samples = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let sample: Sample = serde_json::from_str(line)
                .with_context(|| format!("bad sample on line {}", line_no + 1))?;
            samples.push(sample);
        }

        Ok(Self {
            path,
            samples,
            cursor: 0,
            active: false,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for ReplaySource {
    fn key(&self) -> &str {
        "replay"
    }

    fn name(&self) -> &str {
        "NDJSON Replay"
    }

    fn detect(&self) -> bool {
        self.path.exists() && !self.samples.is_empty()
    }

    fn start(&mut self) -> Result<()> {
        self.cursor = 0;
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.active = false;
        Ok(())
    }

    fn next_sample(&mut self) -> Result<Option<Sample>> {
        if !self.active {
            return Ok(None);
        }
        match self.samples.get(self.cursor) {
            Some(sample) => {
                self.cursor += 1;
                Ok(Some(*sample))
            }
            None => {
                // recording exhausted
                self.active = false;
                Ok(None)
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
