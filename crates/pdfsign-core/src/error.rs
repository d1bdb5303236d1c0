use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignPdfError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("PDF has no pages")]
    NoPages,

    #[error("No PDF document loaded")]
    NoDocument,

    #[error("Invalid signature image: {0}")]
    InvalidImage(String),

    #[error("Unsupported image type {0}: please upload a valid image file (PNG or JPG)")]
    UnsupportedImage(String),

    #[error("Please provide a signature first!")]
    EmptySignature,

    #[error("Failed to edit and download PDF: {0}")]
    ExportFailed(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
