use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::align::{straighten_with_progress, Straightened};
use crate::consts::OBSTIME_KEY;
use crate::error::{CalibrationError, Result};
use crate::frame::{FrameHeader, IntensityArray};
use crate::io::fits::{read_calibration_frame, write_calibration_frame};
use crate::io::image_io::{file_creation_time, iso_timestamp, load_grayscale};
use crate::io::{ExposureFilter, OutputDirectory, RawDirectory};
use crate::stack::{build_dark_master, build_flat_master};

use super::config::CalibrationConfig;
use super::types::{CalibrationStage, ConversionReport, MasterReport, ProgressReporter};

/// Average the dark exposures found under `raw` and write the dark master.
pub fn generate_master_dark(
    raw: &RawDirectory,
    out: &OutputDirectory,
    config: &CalibrationConfig,
    reporter: &dyn ProgressReporter,
) -> Result<MasterReport> {
    let files = raw.find(&config.dark_filter())?;
    info!(count = files.len(), dir = %raw.path().display(), "Dark exposures found");

    let (exposures, skipped) = load_all(&files, reporter);

    reporter.begin_stage(CalibrationStage::Averaging, None);
    let master = build_dark_master(&exposures, config.bit_factor)?;
    reporter.finish_stage();

    let path = out.join(&config.dark.filename);
    write_master(&path, &master, reporter)?;
    info!(path = %path.display(), exposures = exposures.len(), "Dark master saved");

    Ok(MasterReport {
        path,
        shape: master.dim(),
        exposures: exposures.len(),
        skipped,
        registration: None,
    })
}

/// Average dark-subtracted flat exposures, straighten the spectral lines, and
/// write the flat master.
///
/// The dark master must already exist in `out`; otherwise this fails with
/// `MissingDarkMaster` before any flat exposure is read.
pub fn generate_master_flat(
    raw: &RawDirectory,
    out: &OutputDirectory,
    config: &CalibrationConfig,
    reporter: &dyn ProgressReporter,
) -> Result<MasterReport> {
    let dark_path = out.join(&config.dark.filename);
    if !dark_path.is_file() {
        return Err(CalibrationError::MissingDarkMaster(dark_path));
    }
    let (dark_master, _) = read_calibration_frame(&dark_path)?;

    let files = raw.find(&config.flat_filter())?;
    info!(count = files.len(), dir = %raw.path().display(), "Flat exposures found");

    let (exposures, skipped) = load_all(&files, reporter);

    reporter.begin_stage(CalibrationStage::Averaging, None);
    let raw_flat = build_flat_master(&exposures, &dark_master, config.bit_factor)?;
    reporter.finish_stage();

    reporter.begin_stage(CalibrationStage::Registration, Some(raw_flat.nrows()));
    let straightened = straighten_with_progress(&raw_flat, &config.straighten, |done, _| {
        reporter.advance(done)
    })?;
    reporter.finish_stage();

    let path = out.join(&config.flat.filename);
    write_master(&path, &straightened.corrected, reporter)?;
    info!(path = %path.display(), exposures = exposures.len(), "Flat master saved");

    Ok(MasterReport {
        path,
        shape: raw_flat.dim(),
        exposures: exposures.len(),
        skipped,
        registration: Some(straightened),
    })
}

/// Transcode every raw exposure under `raw` into a calibration frame named
/// `<original name>.fits`, tagged with the file's creation time.
///
/// Files that cannot be decoded are logged and skipped.
pub fn convert_exposures(
    raw: &RawDirectory,
    out: &OutputDirectory,
    config: &CalibrationConfig,
    reporter: &dyn ProgressReporter,
) -> Result<ConversionReport> {
    let files = raw.find(&ExposureFilter::any(&config.extensions))?;
    let mut report = ConversionReport::default();

    reporter.begin_stage(CalibrationStage::Converting, Some(files.len()));
    for (i, file) in files.iter().enumerate() {
        let data = match load_grayscale(file) {
            Ok(data) => data * config.bit_factor,
            Err(e) => {
                warn!(path = %file.display(), error = %e, "Invalid image file, skipping");
                report.skipped.push(file.clone());
                reporter.advance(i + 1);
                continue;
            }
        };

        let mut header = FrameHeader::new();
        header.insert(OBSTIME_KEY, iso_timestamp(&file_creation_time(file)?));

        let path = out.join(&converted_name(file));
        write_calibration_frame(&path, &data, &header, true)?;
        report.written.push(path);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        "Conversion complete"
    );
    Ok(report)
}

/// Write the per-row shift profile as whitespace-separated `row shift fallback`
/// lines, preceded by `#` comment lines describing the registration.
pub fn write_shift_profile(path: &Path, registration: &Straightened) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let (start, end) = registration.reference_columns;
    writeln!(w, "# reference_row {}", registration.reference_row)?;
    writeln!(w, "# reference_columns {start} {end}")?;
    writeln!(
        w,
        "# trend slope {:.9} intercept {:.9}",
        registration.trend.slope, registration.trend.intercept
    )?;
    writeln!(w, "# row shift fallback")?;
    for (row, shift) in registration.shifts.iter().enumerate() {
        let fallback = registration.fallback_rows.binary_search(&row).is_ok();
        writeln!(w, "{row} {shift:.6} {}", u8::from(fallback))?;
    }
    w.flush()?;
    Ok(())
}

fn load_all(
    files: &[PathBuf],
    reporter: &dyn ProgressReporter,
) -> (Vec<IntensityArray>, Vec<PathBuf>) {
    let mut exposures = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    reporter.begin_stage(CalibrationStage::Reading, Some(files.len()));
    for (i, file) in files.iter().enumerate() {
        match load_grayscale(file) {
            Ok(data) => exposures.push(data),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "Invalid image file, skipping");
                skipped.push(file.clone());
            }
        }
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    (exposures, skipped)
}

fn write_master(
    path: &Path,
    data: &IntensityArray,
    reporter: &dyn ProgressReporter,
) -> Result<()> {
    reporter.begin_stage(CalibrationStage::Writing, None);
    write_calibration_frame(path, data, &FrameHeader::new(), true)?;
    reporter.finish_stage();
    Ok(())
}

fn converted_name(file: &Path) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{name}.fits")
}
