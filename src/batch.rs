use std::thread;
use std::time::Duration;

use lopdf::Document;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, StampError};
use crate::intake::{InputFile, validate};
use crate::process_pages::{embed_helvetica, stamp_all_pages};
use crate::progress::ProgressObserver;
use crate::sink::{Artifact, ArtifactSink};
use crate::stamp_params::{IntakeMode, StampParams};
use crate::state::{ProcessingGuard, ProcessingState};

pub const PROGRESS_READ: u8 = 20;
pub const PROGRESS_FONT_EMBEDDED: u8 = 50;
pub const PROGRESS_PAGES_SPAN: usize = 30;
pub const PROGRESS_SERIALIZED: u8 = 90;

#[derive(Debug, Clone)]
pub struct StampConfig {
    pub params: StampParams,
    pub mode: IntakeMode,
    /// How long a finished run stays at 100 before going idle.
    pub reset_delay: Duration,
    pub compress: bool,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            params: StampParams::default(),
            mode: IntakeMode::Batch,
            reset_delay: Duration::from_millis(1000),
            compress: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    /// Artifact names, in delivery order.
    pub delivered: Vec<String>,
    /// Rejected and failed files, in the order they were reported.
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, file: &str, err: &StampError) {
        self.failures.push(FileFailure {
            file: file.to_string(),
            message: err.to_string(),
        });
    }
}

pub struct BatchStamper {
    config: StampConfig,
    state: ProcessingState,
}

impl BatchStamper {
    pub fn new(config: StampConfig) -> Self {
        Self {
            config,
            state: ProcessingState::new(),
        }
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    /// Mutable access for the drop target's hover transitions.
    pub fn state_mut(&mut self) -> &mut ProcessingState {
        &mut self.state
    }

    /// Validate a selection and stamp whatever survives.
    ///
    /// Always returns with the state idle again.
    pub fn submit(
        &mut self,
        files: Vec<InputFile>,
        sink: &mut dyn ArtifactSink,
        observer: &mut dyn ProgressObserver,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let intake = validate(files, self.config.mode);
        for err in &intake.rejected {
            let name = match err {
                StampError::InvalidFileType { name, .. } => name.as_str(),
                _ => "",
            };
            observer.on_alert(err);
            report.fail(name, err);
        }
        if intake.accepted.is_empty() {
            return report;
        }

        self.run(intake.accepted, sink, observer, &mut report);
        report
    }

    fn run(
        &mut self,
        files: Vec<InputFile>,
        sink: &mut dyn ArtifactSink,
        observer: &mut dyn ProgressObserver,
        report: &mut BatchReport,
    ) {
        let config = &self.config;
        let mut state = ProcessingGuard::new(&mut self.state);
        state.start_batch(files.iter().map(|f| f.name().to_string()));
        observer.on_batch_start(files.len());
        info!(files = files.len(), mode = ?config.mode, "batch started");

        for file in &files {
            state.begin_file();
            observer.on_file_start(file.name(), state.remaining());

            let outcome = {
                let mut progress = |value: u8| {
                    state.advance_progress(value);
                    observer.on_progress(&state);
                };
                stamp_file(file, config, &mut progress)
                    .and_then(|artifact| sink.deliver(artifact))
            };

            match outcome {
                Ok(artifact_name) => {
                    state.complete_file();
                    observer.on_progress(&state);
                    observer.on_file_complete(file.name(), &artifact_name);
                    report.delivered.push(artifact_name);
                }
                Err(err) => {
                    warn!(file = file.name(), error = %err, "file failed");
                    state.abandon_file();
                    observer.on_progress(&state);
                    observer.on_alert(&err);
                    report.fail(file.name(), &err);
                }
            }
        }

        if !report.delivered.is_empty() && !config.reset_delay.is_zero() {
            thread::sleep(config.reset_delay);
        }
        state.reset_state();
        observer.on_reset();
        info!(
            delivered = report.delivered.len(),
            failed = report.failures.len(),
            "batch finished"
        );
    }
}

/// Read, stamp and name one file. Progress 20 after reading; the rest comes
/// from [`stamp_document_bytes`].
#[instrument(skip_all, fields(file = file.name()))]
pub fn stamp_file(
    file: &InputFile,
    config: &StampConfig,
    progress: &mut dyn FnMut(u8),
) -> Result<Artifact> {
    let bytes = file.read_bytes()?;
    progress(PROGRESS_READ);
    debug!(bytes = bytes.len(), "read");

    let bytes = stamp_document_bytes(file.name(), &bytes, config, progress)?;
    Ok(Artifact {
        file_name: file.processed_name(),
        bytes,
    })
}

/// Decode `input`, stamp every page and serialize the result.
pub fn stamp_document_bytes(
    name: &str,
    input: &[u8],
    config: &StampConfig,
    progress: &mut dyn FnMut(u8),
) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(input).map_err(|err| StampError::Decode {
        name: name.to_string(),
        detail: err.to_string(),
    })?;

    let font_id = embed_helvetica(&mut doc);
    progress(PROGRESS_FONT_EMBEDDED);

    let pages = stamp_all_pages(&mut doc, font_id, &config.params, |done, total| {
        progress(PROGRESS_FONT_EMBEDDED + page_progress(done, total));
    })
    .map_err(|err| StampError::Stamp {
        name: name.to_string(),
        detail: err.to_string(),
    })?;
    debug!(pages, "pages stamped");

    if config.compress {
        _ = doc.compress();
    }
    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|err| StampError::Serialization {
        name: name.to_string(),
        detail: err.to_string(),
    })?;
    progress(PROGRESS_SERIALIZED);
    Ok(out)
}

/// floor(done / total * 30)
fn page_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (done.min(total) * PROGRESS_PAGES_SPAN / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_progress_floors() {
        assert_eq!(page_progress(1, 3), 10);
        assert_eq!(page_progress(1, 7), 4);
        assert_eq!(page_progress(7, 7), 30);
        assert_eq!(page_progress(0, 0), 0);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let mut seen = Vec::new();
        let err = stamp_document_bytes(
            "junk.pdf",
            b"definitely not a pdf",
            &StampConfig::default(),
            &mut |v| seen.push(v),
        )
        .unwrap_err();
        assert!(matches!(err, StampError::Decode { ref name, .. } if name == "junk.pdf"));
        assert!(seen.is_empty());
    }
}
