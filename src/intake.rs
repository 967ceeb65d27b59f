use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, StampError};
use crate::stamp_params::IntakeMode;
use crate::state::ProcessingState;

pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// A named blob with a declared mime type, as handed over by the host.
#[derive(Debug, Clone)]
pub struct InputFile {
    name: String,
    mime: String,
    source: FileSource,
}

impl InputFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            mime: mime_for_path(&path).to_string(),
            name,
            source: FileSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            source: FileSource::Memory(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn is_pdf(&self) -> bool {
        self.mime == PDF_MIME
    }

    /// Read the whole file into memory.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => fs::read(path).map_err(|source| StampError::Read {
                name: self.name.clone(),
                source,
            }),
            FileSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }

    /// `<name without trailing .pdf>-processed.pdf`
    pub fn processed_name(&self) -> String {
        processed_name(&self.name)
    }
}

pub fn processed_name(name: &str) -> String {
    let stem = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => {
            &name[..cut]
        }
        _ => name,
    };
    format!("{stem}-processed.pdf")
}

/// Declared type of a file, guessed from its extension the way a browser does.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        _ => "application/octet-stream",
    }
}

/// Outcome of validating a selection.
#[derive(Debug, Default)]
pub struct Intake {
    pub accepted: Vec<InputFile>,
    pub rejected: Vec<StampError>,
}

/// Filter a selection down to PDFs, keeping the order it came in.
///
/// In single mode only the first file counts, and a bad first file means an
/// empty `accepted` list. In batch mode every non-PDF is rejected on its own.
pub fn validate(files: Vec<InputFile>, mode: IntakeMode) -> Intake {
    let mut intake = Intake::default();
    let candidates: Vec<InputFile> = match mode {
        IntakeMode::Single => {
            let Some(first) = files.into_iter().next() else {
                intake.rejected.push(StampError::NoFile);
                return intake;
            };
            vec![first]
        }
        IntakeMode::Batch => files,
    };

    for file in candidates {
        if file.is_pdf() {
            debug!(file = file.name(), "accepted");
            intake.accepted.push(file);
        } else {
            warn!(file = file.name(), mime = file.mime(), "rejected, not a PDF");
            intake.rejected.push(StampError::InvalidFileType {
                name: file.name,
                mime: file.mime,
            });
        }
    }
    intake
}

/// The drop surface: idle or drag-hover, and closed while a run is active.
#[derive(Debug, Default)]
pub struct DropTarget;

impl DropTarget {
    pub fn drag_over(&self, state: &mut ProcessingState) {
        state.set_dragging(true);
    }

    pub fn drag_leave(&self, state: &mut ProcessingState) {
        state.set_dragging(false);
    }

    /// Files dropped while idle; a drop during processing yields nothing.
    pub fn drop_files(&self, state: &mut ProcessingState, files: Vec<InputFile>) -> Vec<InputFile> {
        state.set_dragging(false);
        if self.accepts_input(state) { files } else { Vec::new() }
    }

    /// The picker button is disabled while processing.
    pub fn accepts_input(&self, state: &ProcessingState) -> bool {
        !state.is_processing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> InputFile {
        InputFile::from_bytes(name, PDF_MIME, b"%PDF-1.5".to_vec())
    }

    fn png(name: &str) -> InputFile {
        InputFile::from_bytes(name, "image/png", Vec::new())
    }

    #[test]
    fn processed_name_strips_trailing_pdf_only() {
        assert_eq!(processed_name("label.pdf"), "label-processed.pdf");
        assert_eq!(processed_name("LABEL.PDF"), "LABEL-processed.pdf");
        assert_eq!(processed_name("a.pdf.pdf"), "a.pdf-processed.pdf");
        assert_eq!(processed_name("notes"), "notes-processed.pdf");
        assert_eq!(processed_name("é"), "é-processed.pdf");
    }

    #[test]
    fn mime_comes_from_extension() {
        assert_eq!(mime_for_path(Path::new("x/label.PDF")), PDF_MIME);
        assert_eq!(mime_for_path(Path::new("photo.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("README")), "application/octet-stream");
        assert_eq!(InputFile::from_path("dir/label.pdf").name(), "label.pdf");
    }

    #[test]
    fn batch_skips_invalid_and_keeps_order() {
        let intake = validate(vec![pdf("a.pdf"), png("b.png"), pdf("c.pdf")], IntakeMode::Batch);
        let names: Vec<_> = intake.accepted.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a.pdf", "c.pdf"]);
        assert_eq!(intake.rejected.len(), 1);
        assert!(intake.rejected[0].to_string().contains("b.png"));
    }

    #[test]
    fn single_takes_first_file_only() {
        let intake = validate(vec![pdf("a.pdf"), pdf("b.pdf")], IntakeMode::Single);
        assert_eq!(intake.accepted.len(), 1);
        assert_eq!(intake.accepted[0].name(), "a.pdf");
    }

    #[test]
    fn single_with_invalid_first_file_accepts_nothing() {
        let intake = validate(vec![png("a.png"), pdf("b.pdf")], IntakeMode::Single);
        assert!(intake.accepted.is_empty());
        assert!(matches!(intake.rejected[..], [StampError::InvalidFileType { .. }]));
    }

    #[test]
    fn single_with_empty_selection() {
        let intake = validate(Vec::new(), IntakeMode::Single);
        assert!(matches!(intake.rejected[..], [StampError::NoFile]));
    }

    #[test]
    fn drop_target_tracks_hover_and_blocks_during_processing() {
        let target = DropTarget;
        let mut state = ProcessingState::new();
        target.drag_over(&mut state);
        assert!(state.is_dragging());
        target.drag_leave(&mut state);
        assert!(!state.is_dragging());

        target.drag_over(&mut state);
        assert_eq!(target.drop_files(&mut state, vec![pdf("a.pdf")]).len(), 1);
        assert!(!state.is_dragging());

        state.start_batch(["x.pdf".to_string()]);
        assert!(!target.accepts_input(&state));
        assert!(target.drop_files(&mut state, vec![pdf("a.pdf")]).is_empty());
    }

    #[test]
    fn missing_file_reports_read_error() {
        let err = InputFile::from_path("/definitely/not/here.pdf").read_bytes().unwrap_err();
        assert!(matches!(err, StampError::Read { ref name, .. } if name == "here.pdf"));
    }
}
