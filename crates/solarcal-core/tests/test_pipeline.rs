mod common;

use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;

use solarcal_core::consts::OBSTIME_KEY;
use solarcal_core::error::CalibrationError;
use solarcal_core::io::{read_calibration_frame, OutputDirectory, RawDirectory};
use solarcal_core::pipeline::config::CalibrationConfig;
use solarcal_core::pipeline::{
    convert_exposures, generate_master_dark, generate_master_flat, write_shift_profile,
    NoOpReporter,
};

use common::{spectral_profile, write_constant_png, write_row_pattern_png};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 16;

fn test_config() -> CalibrationConfig {
    let mut config = CalibrationConfig::default();
    config.straighten.reference_columns = Some((8, 56));
    config
}

fn flat_pattern() -> Vec<f64> {
    spectral_profile(WIDTH as usize, 0.0)
        .into_iter()
        .map(|v| 0.5 * v)
        .collect()
}

/// Raw directory with three dark frames (one nested), an undecodable dark,
/// two flats, and an unrelated file.
fn populate_raw(raw: &Path) {
    fs::create_dir_all(raw.join("night2")).unwrap();
    write_constant_png(&raw.join("Dark_001.png"), WIDTH, HEIGHT, 102);
    write_constant_png(&raw.join("dark_002.PNG"), WIDTH, HEIGHT, 102);
    write_constant_png(&raw.join("night2").join("Dark_003.png"), WIDTH, HEIGHT, 102);
    fs::write(raw.join("Dark_bad.png"), b"not an image").unwrap();

    let pattern = flat_pattern();
    write_row_pattern_png(&raw.join("NaD_001.png"), HEIGHT, &pattern);
    write_row_pattern_png(&raw.join("NaD_002.png"), HEIGHT, &pattern);
    fs::write(raw.join("notes.txt"), b"seeing 2 arcsec").unwrap();
}

#[test]
fn test_dark_master_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("raw");
    populate_raw(&raw_path);
    let raw = RawDirectory::open(&raw_path).unwrap();
    let out = OutputDirectory::ensure(dir.path().join("out")).unwrap();

    let report = generate_master_dark(&raw, &out, &test_config(), &NoOpReporter).unwrap();
    assert_eq!(report.exposures, 3);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].ends_with("Dark_bad.png"));
    assert_eq!(report.shape, (HEIGHT as usize, WIDTH as usize));
    assert!(report.registration.is_none());

    let (dark, header) = read_calibration_frame(&out.join("MasterDark.fits")).unwrap();
    assert!(header.is_empty());
    for &v in dark.iter() {
        assert_abs_diff_eq!(v, 102.0, epsilon = 1e-4);
    }
}

#[test]
fn test_flat_master_requires_dark() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("raw");
    populate_raw(&raw_path);
    let raw = RawDirectory::open(&raw_path).unwrap();
    let out = OutputDirectory::ensure(dir.path().join("out")).unwrap();

    let err = generate_master_flat(&raw, &out, &test_config(), &NoOpReporter).unwrap_err();
    assert!(matches!(err, CalibrationError::MissingDarkMaster(_)));
    assert!(!out.join("MasterFlat.fits").exists());
}

#[test]
fn test_flat_master_is_dark_subtracted_and_straight() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("raw");
    populate_raw(&raw_path);
    let raw = RawDirectory::open(&raw_path).unwrap();
    let out = OutputDirectory::ensure(dir.path().join("out")).unwrap();
    let config = test_config();

    generate_master_dark(&raw, &out, &config, &NoOpReporter).unwrap();
    let report = generate_master_flat(&raw, &out, &config, &NoOpReporter).unwrap();
    assert_eq!(report.exposures, 2);
    assert!(report.skipped.is_empty());

    let registration = report.registration.expect("flat carries registration");
    assert_eq!(registration.reference_row, HEIGHT as usize / 2);
    assert_eq!(registration.reference_columns, (8, 56));
    assert!(registration.fallback_rows.is_empty());
    for &shift in &registration.shifts {
        assert!(shift.abs() < 0.3, "shift {shift}");
    }

    let (flat, _) = read_calibration_frame(&out.join("MasterFlat.fits")).unwrap();
    assert_eq!(flat.dim(), (HEIGHT as usize, WIDTH as usize));

    // Straightening identical rows changes little; compare to mean(e * 255) - 102.
    let expected: Vec<f64> = flat_pattern()
        .iter()
        .map(|v| (v * 255.0).round() - 102.0)
        .collect();
    for row in flat.rows() {
        for (c, (&got, &want)) in row.iter().zip(&expected).enumerate().skip(8).take(48) {
            assert!((got - want).abs() < 8.0, "column {c}: {got} vs {want}");
        }
    }
}

#[test]
fn test_shift_profile_file() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("raw");
    populate_raw(&raw_path);
    let raw = RawDirectory::open(&raw_path).unwrap();
    let out = OutputDirectory::ensure(dir.path().join("out")).unwrap();
    let config = test_config();

    generate_master_dark(&raw, &out, &config, &NoOpReporter).unwrap();
    let report = generate_master_flat(&raw, &out, &config, &NoOpReporter).unwrap();
    let registration = report.registration.unwrap();

    let profile_path = dir.path().join("shifts.txt");
    write_shift_profile(&profile_path, &registration).unwrap();
    let text = fs::read_to_string(&profile_path).unwrap();

    let comments = text.lines().filter(|l| l.starts_with('#')).count();
    let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(comments, 4);
    assert_eq!(rows.len(), HEIGHT as usize);
    assert!(text.starts_with("# reference_row 8\n"));

    let fields: Vec<&str> = rows[3].split_whitespace().collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], "3");
    assert_eq!(fields[2], "0");
}

#[test]
fn test_convert_writes_obstime() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("raw");
    populate_raw(&raw_path);
    let raw = RawDirectory::open(&raw_path).unwrap();
    let out = OutputDirectory::ensure(dir.path().join("converted")).unwrap();

    let report = convert_exposures(&raw, &out, &test_config(), &NoOpReporter).unwrap();
    assert_eq!(report.written.len(), 5);
    assert_eq!(report.skipped.len(), 1);

    let (data, header) = read_calibration_frame(&out.join("Dark_001.png.fits")).unwrap();
    assert_abs_diff_eq!(data[[0, 0]], 102.0, epsilon = 1e-4);
    let obstime = header
        .get(OBSTIME_KEY)
        .and_then(|v| v.as_str())
        .expect("OBSTIME present");
    assert_eq!(&obstime[4..5], "-");
    assert_eq!(&obstime[10..11], "T");

    assert!(out.join("Dark_003.png.fits").exists());
    assert!(!out.join("notes.txt.fits").exists());
}

#[test]
fn test_missing_raw_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        RawDirectory::open(dir.path().join("absent")),
        Err(CalibrationError::NotADirectory(_))
    ));
}
