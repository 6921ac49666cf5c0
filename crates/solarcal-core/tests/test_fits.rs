use std::path::Path;

use ndarray::Array2;

use solarcal_core::error::CalibrationError;
use solarcal_core::frame::{FrameHeader, HeaderValue};
use solarcal_core::io::{read_calibration_frame, write_calibration_frame};

fn sample_data() -> Array2<f64> {
    Array2::from_shape_fn((5, 7), |(r, c)| (r as f64 - 2.0) * 10.5 + c as f64 * 0.125)
}

/// Write a FITS file from raw header cards and big-endian data bytes.
fn write_raw_fits(path: &Path, cards: &[&str], data: &[u8]) {
    let mut bytes = Vec::new();
    for card in cards {
        bytes.extend_from_slice(format!("{card:<80}").as_bytes());
    }
    bytes.extend_from_slice(format!("{:<80}", "END").as_bytes());
    bytes.resize(bytes.len().div_ceil(2880) * 2880, b' ');
    bytes.extend_from_slice(data);
    bytes.resize(bytes.len().div_ceil(2880) * 2880, 0);
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn test_roundtrip_data_and_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MasterDark.fits");
    let data = sample_data();

    let mut header = FrameHeader::new();
    header.insert("obstime", "2024-06-01T08:15:30.123456");
    header.insert("EXPOSURE", 0.025);
    header.insert("NFRAMES", 12i64);

    write_calibration_frame(&path, &data, &header, false).unwrap();
    let (loaded, loaded_header) = read_calibration_frame(&path).unwrap();

    assert_eq!(loaded, data);
    assert_eq!(loaded_header, header);
    assert_eq!(
        loaded_header.get("OBSTIME").and_then(HeaderValue::as_str),
        Some("2024-06-01T08:15:30.123456")
    );
}

#[test]
fn test_empty_header_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.fits");
    write_calibration_frame(&path, &sample_data(), &FrameHeader::new(), true).unwrap();
    let (_, header) = read_calibration_frame(&path).unwrap();
    assert!(header.is_empty());
}

#[test]
fn test_file_is_block_aligned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.fits");
    write_calibration_frame(&path, &sample_data(), &FrameHeader::new(), true).unwrap();
    let len = std::fs::metadata(&path).unwrap().len() as usize;
    assert!(len > 0);
    assert_eq!(len % 2880, 0);
    assert!(!dir.path().join("frame.fits.partial").exists());
}

#[test]
fn test_overwrite_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.fits");
    let header = FrameHeader::new();

    write_calibration_frame(&path, &sample_data(), &header, false).unwrap();
    assert!(matches!(
        write_calibration_frame(&path, &sample_data(), &header, false),
        Err(CalibrationError::AlreadyExists(_))
    ));

    let replacement = Array2::from_elem((2, 3), -1.5);
    write_calibration_frame(&path, &replacement, &header, true).unwrap();
    let (loaded, _) = read_calibration_frame(&path).unwrap();
    assert_eq!(loaded, replacement);
}

#[test]
fn test_invalid_key_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.fits");
    let mut header = FrameHeader::new();
    header.insert("WAYTOOLONGKEY", 1i64);

    assert!(matches!(
        write_calibration_frame(&path, &sample_data(), &header, true),
        Err(CalibrationError::InvalidHeaderKey(_))
    ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_structural_key_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut header = FrameHeader::new();
    header.insert("NAXIS1", 3i64);
    assert!(write_calibration_frame(
        &dir.path().join("x.fits"),
        &sample_data(),
        &header,
        true
    )
    .is_err());
}

#[test]
fn test_not_fits_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bogus.fits");
    std::fs::write(&path, vec![b'x'; 2880]).unwrap();
    assert!(read_calibration_frame(&path).is_err());
}

#[test]
fn test_truncated_data_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated.fits");
    write_raw_fits(
        &path,
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                  -64",
            "NAXIS   =                    2",
            "NAXIS1  =                  100",
            "NAXIS2  =                  100",
        ],
        &[0u8; 16],
    );
    assert!(read_calibration_frame(&path).is_err());
}

#[test]
fn test_integer_data_with_scaling() {
    let mut data = Vec::new();
    for v in [-2i16, 0, 3, 100] {
        data.extend_from_slice(&v.to_be_bytes());
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scaled.fits");
    write_raw_fits(
        &path,
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                    2",
            "NAXIS2  =                    2",
            "BSCALE  =                  0.5",
            "BZERO   =              32768.0",
            "OBSERVER= 'solar lab'          / who",
            "COMMENT free text is ignored",
        ],
        &data,
    );

    let (array, header) = read_calibration_frame(&path).unwrap();
    assert_eq!(array.dim(), (2, 2));
    assert_eq!(array[[0, 0]], 32767.0);
    assert_eq!(array[[0, 1]], 32768.0);
    assert_eq!(array[[1, 0]], 32769.5);
    assert_eq!(array[[1, 1]], 32818.0);
    assert_eq!(header.len(), 1);
    assert_eq!(
        header.get("OBSERVER").and_then(HeaderValue::as_str),
        Some("solar lab")
    );
}

#[test]
fn test_three_dimensional_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.fits");
    write_raw_fits(
        &path,
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    3",
            "NAXIS1  =                    1",
            "NAXIS2  =                    1",
            "NAXIS3  =                    1",
        ],
        &[0u8],
    );
    assert!(matches!(
        read_calibration_frame(&path),
        Err(CalibrationError::InvalidFits(_))
    ));
}

#[test]
fn test_logical_keyword_read_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logical.fits");
    write_raw_fits(
        &path,
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                  -64",
            "NAXIS   =                    2",
            "NAXIS1  =                    1",
            "NAXIS2  =                    1",
            "STRAIGHT=                    T",
        ],
        &1.5f64.to_be_bytes(),
    );
    let (array, header) = read_calibration_frame(&path).unwrap();
    assert_eq!(array[[0, 0]], 1.5);
    assert_eq!(
        header.get("STRAIGHT").and_then(HeaderValue::as_str),
        Some("T")
    );
}

#[test]
fn test_stale_partial_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MasterFlat.fits");
    std::fs::write(dir.path().join("MasterFlat.fits.partial"), b"leftover").unwrap();

    write_calibration_frame(&path, &sample_data(), &FrameHeader::new(), false).unwrap();
    let (loaded, _) = read_calibration_frame(&path).unwrap();
    assert_eq!(loaded, sample_data());
    assert!(!dir.path().join("MasterFlat.fits.partial").exists());
}
