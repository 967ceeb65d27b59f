use thiserror::Error;

/// Everything that can go wrong while stamping one file.
///
/// Every variant is recoverable at the file level: the batch loop reports it
/// and moves on to the next file.
#[derive(Debug, Error)]
pub enum StampError {
    #[error("'{name}' is not a PDF file (type: {mime})")]
    InvalidFileType { name: String, mime: String },

    #[error("no file was provided")]
    NoFile,

    #[error("failed to read '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode '{name}' as PDF: {detail}")]
    Decode { name: String, detail: String },

    #[error("failed to stamp '{name}': {detail}")]
    Stamp { name: String, detail: String },

    #[error("page {page} has no MediaBox")]
    MissingMediaBox { page: u32 },

    #[error("PDF structure error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to serialize '{name}': {detail}")]
    Serialization { name: String, detail: String },

    #[error("failed to deliver '{name}': {source}")]
    Deliver {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StampError>;
