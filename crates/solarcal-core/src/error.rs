use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("FITS error: {0}")]
    Fits(#[from] fitsio::errors::Error),

    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    #[error("Invalid FITS header keyword: {0:?}")]
    InvalidHeaderKey(String),

    #[error("Refusing to overwrite existing calibration frame: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Master dark not found at path: {}", .0.display())]
    MissingDarkMaster(PathBuf),

    #[error("Profile of length {len} is too short for registration (minimum {min})")]
    ProfileTooShort { len: usize, min: usize },

    #[error("Degenerate correlation: {0}")]
    DegenerateCorrelation(String),

    #[error("Reference row {row} out of range (rows: {rows})")]
    InvalidReferenceRow { row: usize, rows: usize },

    #[error("Invalid column window {start}..{end} for image width {width}")]
    InvalidColumnWindow {
        start: usize,
        end: usize,
        width: usize,
    },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
