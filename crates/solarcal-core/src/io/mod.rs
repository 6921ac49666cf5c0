pub mod fits;
pub mod image_io;
pub mod paths;

pub use fits::{read_calibration_frame, write_calibration_frame};
pub use image_io::{file_creation_time, load_exposure, load_grayscale};
pub use paths::{ExposureFilter, OutputDirectory, RawDirectory};
