//! Stamp "Made In China" centered at the bottom of every page of PDF files.

pub mod batch;
pub mod error;
pub mod intake;
pub mod process_pages;
pub mod progress;
pub mod sink;
pub mod stamp_params;
pub mod state;

pub use batch::{BatchReport, BatchStamper, StampConfig, stamp_document_bytes, stamp_file};
pub use error::{Result, StampError};
pub use intake::{DropTarget, InputFile, PDF_MIME};
pub use progress::{NoopObserver, ProgressObserver, RecordingObserver};
pub use sink::{Artifact, ArtifactSink, DirectorySink, MemorySink};
pub use stamp_params::{IntakeMode, STAMP_TEXT, StampParams};
pub use state::ProcessingState;
