/// Scale applied to normalized [0, 1] exposures to match the historical
/// 8-bit calibration range.
pub const DEFAULT_BIT_FACTOR: f64 = 255.0;

/// Samples trimmed from each end of a profile before correlation.
pub const CORRELATION_MARGIN: usize = 4;

/// Number of integer candidate shifts scored (-4..=+4).
pub const CORRELATION_CANDIDATES: usize = 2 * CORRELATION_MARGIN + 1;

/// Shortest profile `estimate_shift` accepts.
pub const MIN_PROFILE_LEN: usize = 10;

/// Relative spread below which a correlation score vector counts as flat.
pub const DEGENERATE_SCORE_SPREAD: f64 = 1e-12;

/// A detrended profile keeping less than this fraction of the raw profile's
/// energy has no features to register (saturated, blank or pure ramp).
pub const FEATURELESS_ENERGY_RATIO: f64 = 1e-20;

/// Pivot magnitude below which a least-squares system counts as singular.
pub const SINGULAR_PIVOT: f64 = 1e-12;

/// Default spectral window (half-open column range) used for registration.
pub const DEFAULT_REFERENCE_COLUMNS: (usize, usize) = (500, 1100);

/// ITU-R BT.709 luminance weights, as used by scikit-image `rgb2gray`.
pub const LUMINANCE_R: f64 = 0.2125;
pub const LUMINANCE_G: f64 = 0.7154;
pub const LUMINANCE_B: f64 = 0.0721;

pub const DEFAULT_DARK_SEARCH: &str = "Dark";
pub const DEFAULT_FLAT_SEARCH: &str = "NaD";
pub const DEFAULT_DARK_FILENAME: &str = "MasterDark.fits";
pub const DEFAULT_FLAT_FILENAME: &str = "MasterFlat.fits";
pub const DEFAULT_RAW_EXTENSION: &str = "png";

/// Header keyword carrying the exposure timestamp of converted frames.
pub const OBSTIME_KEY: &str = "OBSTIME";
