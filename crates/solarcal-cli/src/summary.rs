use std::path::Path;

use console::Style;
use solarcal_core::pipeline::config::CalibrationConfig;
use solarcal_core::pipeline::MasterReport;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    warning: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            warning: Style::new().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_header(raw: &Path, out: &Path, config: &CalibrationConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Solar Calibration"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(17)));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Raw"), s.path.apply_to(raw.display()));
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(out.display()));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Bit factor"),
        s.value.apply_to(config.bit_factor)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Correction"),
        s.method.apply_to(config.straighten.correction)
    );
    println!();
}

pub fn print_master_summary(title: &str, report: &MasterReport) {
    let s = Styles::new();
    let (rows, cols) = report.shape;

    println!("  {}", s.header.apply_to(title));
    println!("    {:<12}{}", s.label.apply_to("File"), s.path.apply_to(report.path.display()));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Exposures"),
        s.value.apply_to(report.exposures)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{cols}x{rows}"))
    );
    if !report.skipped.is_empty() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Skipped"),
            s.warning.apply_to(report.skipped.len())
        );
    }

    if let Some(ref reg) = report.registration {
        let (start, end) = reg.reference_columns;
        println!(
            "    {:<12}{}",
            s.label.apply_to("Reference"),
            s.value.apply_to(format!("row {}, columns {start}..{end}", reg.reference_row))
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Trend"),
            s.value.apply_to(format!(
                "{:+.5} px/row, {:+.3} px at row 0",
                reg.trend.slope, reg.trend.intercept
            ))
        );
        if !reg.fallback_rows.is_empty() {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Fallback"),
                s.warning.apply_to(format!("{} rows used the trend", reg.fallback_rows.len()))
            );
        }
    }
    println!();
}
