use std::ffi::CStr;
use std::fs;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};

use fitsio::errors::check_status;
use fitsio::hdu::HduInfo;
use fitsio::images::{ImageDescription, ImageType};
use fitsio::FitsFile;
use ndarray::Array2;

use crate::error::{CalibrationError, Result};
use crate::frame::{FrameHeader, HeaderValue, IntensityArray};

/// Keywords owned by the codec; never exposed in or accepted from a `FrameHeader`.
const STRUCTURAL_KEYS: &[&str] = &[
    "SIMPLE", "BITPIX", "NAXIS", "EXTEND", "BSCALE", "BZERO", "PCOUNT", "GCOUNT", "END",
];

/// Commentary keywords carry free text, not values.
const COMMENTARY_KEYS: &[&str] = &["COMMENT", "HISTORY"];

// cfitsio buffer sizes for keyword names, values and comments.
const FLEN_KEYWORD: usize = 75;
const FLEN_VALUE: usize = 71;
const FLEN_COMMENT: usize = 73;

/// Write a calibration frame as a single-HDU FITS image (BITPIX = -64).
///
/// Data goes to a sibling `.partial` file first and is renamed into place
/// once complete, so a failed write never leaves a truncated frame at `path`.
pub fn write_calibration_frame(
    path: &Path,
    data: &IntensityArray,
    header: &FrameHeader,
    overwrite: bool,
) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(CalibrationError::AlreadyExists(path.to_path_buf()));
    }
    for (key, _) in header.iter() {
        validate_key(key)?;
    }

    let partial = partial_path(path);
    // cfitsio refuses to create over an existing file.
    if partial.exists() {
        fs::remove_file(&partial)?;
    }
    let result = write_hdu(&partial, data, header)
        .and_then(|()| fs::rename(&partial, path).map_err(CalibrationError::from));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

/// Read a single-HDU FITS image and its non-structural header keywords.
///
/// Integer images are returned in physical units (BSCALE/BZERO applied).
pub fn read_calibration_frame(path: &Path) -> Result<(IntensityArray, FrameHeader)> {
    let mut fptr = FitsFile::open(path)?;
    let hdu = fptr.primary_hdu()?;

    let shape = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } => shape.clone(),
        _ => {
            return Err(CalibrationError::InvalidFits(
                "primary HDU is not an image".into(),
            ))
        }
    };
    // Shape is reported slowest axis first: [NAXIS2, NAXIS1].
    let (rows, cols) = match shape.as_slice() {
        &[rows, cols] => (rows, cols),
        other => {
            return Err(CalibrationError::InvalidFits(format!(
                "expected a 2-D image, found {} axes",
                other.len()
            )))
        }
    };

    let samples: Vec<f64> = hdu.read_image(&mut fptr)?;
    let data = Array2::from_shape_vec((rows, cols), samples)
        .map_err(|e| CalibrationError::InvalidFits(e.to_string()))?;
    let header = read_user_keywords(&mut fptr)?;

    Ok((data, header))
}

fn write_hdu(path: &Path, data: &IntensityArray, header: &FrameHeader) -> Result<()> {
    let (rows, cols) = data.dim();
    let description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &[rows, cols],
    };
    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&description)
        .open()?;
    let hdu = fptr.primary_hdu()?;

    let samples: Vec<f64> = data.iter().copied().collect();
    hdu.write_image(&mut fptr, &samples)?;

    for (key, value) in header.iter() {
        match value {
            HeaderValue::Str(s) => {
                if !s.is_ascii() {
                    return Err(CalibrationError::InvalidFits(format!(
                        "non-ASCII value for {key}"
                    )));
                }
                hdu.write_key(&mut fptr, key, s.as_str())?
            }
            HeaderValue::Int(i) => hdu.write_key(&mut fptr, key, *i)?,
            HeaderValue::Float(f) => {
                if !f.is_finite() {
                    return Err(CalibrationError::InvalidFits(format!(
                        "non-finite value for {key}"
                    )));
                }
                hdu.write_key(&mut fptr, key, *f)?
            }
        }
    }
    Ok(())
}

/// Collect the value-bearing, non-structural keywords of the current HDU.
fn read_user_keywords(fptr: &mut FitsFile) -> Result<FrameHeader> {
    let mut status: c_int = 0;
    let mut count: c_int = 0;
    let mut more: c_int = 0;
    unsafe {
        fitsio_sys::ffghsp(fptr.as_raw(), &mut count, &mut more, &mut status);
    }
    check_status(status)?;

    let mut header = FrameHeader::new();
    for n in 1..=count {
        let mut name = [0 as c_char; FLEN_KEYWORD];
        let mut value = [0 as c_char; FLEN_VALUE];
        let mut comment = [0 as c_char; FLEN_COMMENT];
        unsafe {
            fitsio_sys::ffgkyn(
                fptr.as_raw(),
                n,
                name.as_mut_ptr(),
                value.as_mut_ptr(),
                comment.as_mut_ptr(),
                &mut status,
            );
        }
        check_status(status)?;

        // cfitsio NUL-terminates every buffer it fills.
        let name = unsafe { CStr::from_ptr(name.as_ptr()) }.to_string_lossy();
        let value = unsafe { CStr::from_ptr(value.as_ptr()) }.to_string_lossy();
        if name.is_empty()
            || value.trim().is_empty()
            || is_structural(&name)
            || COMMENTARY_KEYS.contains(&&*name)
        {
            continue;
        }
        header.insert(&name, parse_value(&value)?);
    }
    Ok(header)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn validate_key(key: &str) -> Result<()> {
    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if key.is_empty() || key.len() > 8 || !valid_chars || is_structural(key) {
        return Err(CalibrationError::InvalidHeaderKey(key.to_string()));
    }
    Ok(())
}

fn is_structural(key: &str) -> bool {
    STRUCTURAL_KEYS.contains(&key)
        || key
            .strip_prefix("NAXIS")
            .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
}

/// Classify a raw keyword value: quoted string, integer, or real.
/// Logical values are kept as their `T`/`F` text.
fn parse_value(field: &str) -> Result<HeaderValue> {
    let field = field.trim();
    if let Some(rest) = field.strip_prefix('\'') {
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    return Ok(HeaderValue::Str(out.trim_end().to_string()));
                }
            } else {
                out.push(c);
            }
        }
        return Err(CalibrationError::InvalidFits(
            "unterminated string value".into(),
        ));
    }

    match field {
        "T" | "F" => Ok(HeaderValue::Str(field.to_string())),
        _ => {
            if let Ok(i) = field.parse::<i64>() {
                Ok(HeaderValue::Int(i))
            } else {
                field
                    .replace(['D', 'd'], "E")
                    .parse::<f64>()
                    .map(HeaderValue::Float)
                    .map_err(|_| CalibrationError::InvalidFits(format!("bad value {field:?}")))
            }
        }
    }
}
