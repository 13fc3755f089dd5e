//! # Trimsheet CLI
//!
//! Interactive weight & balance sheet for the terminal. Loads a built-in
//! aircraft template, prompts for station weights, and prints the envelope,
//! the limit check, an optional fuel-burn trajectory and the JSON export.
//!
//! Log output goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use wb_core::calculations::{fuel_tanks_from_stations, simulate_fuel_sequence, FuelSequence, WeightBalanceReport};
use wb_core::cargo::{add_cargo_station, CargoItem};
use wb_core::errors::CalcResult;
use wb_core::export::ExportDocument;
use wb_core::file_io::{load_library, save_library, write_export, FileLock};
use wb_core::profile::{AircraftProfile, Calculation, LibrarySettings, ProfileLibrary};
use wb_core::station::{validate_stations, validate_weight};
use wb_core::templates::AircraftTemplate;
use wb_core::units::{format_length, format_moment, format_weight};

fn prompt_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input).ok()?;
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn prompt_f64(prompt: &str, default: f64) -> f64 {
    prompt_line(prompt)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn prompt_yes(prompt: &str) -> bool {
    prompt_line(prompt).is_some_and(|s| s.eq_ignore_ascii_case("y") || s.eq_ignore_ascii_case("yes"))
}

fn status_icon(pass: bool) -> &'static str {
    if pass { "[OK]" } else { "[FAIL]" }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> CalcResult<()> {
    println!("Trimsheet - Weight & Balance Calculator");
    println!("=======================================");
    println!();
    for template in AircraftTemplate::ALL {
        println!("  {:<10} {}", template.key(), template.name());
    }
    let key = prompt_line("Aircraft template [cessna172]: ").unwrap_or_else(|| "cessna172".to_string());
    let mut profile = AircraftTemplate::from_key(&key)?.to_profile();
    let settings = LibrarySettings::default();

    println!();
    println!("{} - {}", profile.name, profile.description);
    println!("Enter station weights ({}), blank keeps the shown value:", profile.unit.weight_label());
    load_stations(&mut profile, settings.max_station_weight);
    load_cargo(&mut profile);

    let station_check = validate_stations(&profile.stations);
    for error in &station_check.errors {
        eprintln!("  warning: {}", error);
    }

    let report = profile.report();
    print_report(&profile, &report);

    if prompt_yes("\nSimulate fuel burn? [y/N]: ") {
        let flight_time = prompt_f64(
            &format!("  Flight time (h) [{}]: ", settings.default_flight_time_hours),
            settings.default_flight_time_hours,
        );
        let burn_rate = prompt_f64(
            &format!("  Burn rate ({}/h) [{}]: ", profile.unit.weight_label(), settings.default_burn_rate_per_hour),
            settings.default_burn_rate_per_hour,
        );
        let tanks = fuel_tanks_from_stations(&profile.stations);
        match simulate_fuel_sequence(&profile.stations, &tanks, flight_time, burn_rate, &profile.mac_config, profile.unit) {
            Ok(sequence) => print_fuel_sequence(&profile, &sequence),
            Err(e) => eprintln!("  Fuel sequence unavailable: {}", e),
        }
    }

    let document = ExportDocument::new(Some(&profile.name), &profile.stations, &profile.mac_config, profile.unit, &report);
    println!();
    println!("JSON Output:");
    println!("{}", document.to_json_pretty()?);

    if let Some(dir) = prompt_line("\nWrite export to directory (blank to skip): ") {
        let path = write_export(&document, Path::new(&dir))?;
        println!("Wrote {}", path.display());
    }

    if let Some(file) = prompt_line("Save to profile library (.wbl, blank to skip): ") {
        save_to_library(&profile, Path::new(&file))?;
    }

    Ok(())
}

fn load_stations(profile: &mut AircraftProfile, max_weight: f64) {
    let unit = profile.unit;
    for station in profile.stations.iter_mut() {
        let prompt = format!(
            "  {:<22} {:>12} @ {:>12} [{}]: ",
            station.description,
            station.station_type.to_string(),
            format_length(station.arm, unit),
            station.weight
        );
        let weight = prompt_f64(&prompt, station.weight);
        match validate_weight(weight, max_weight) {
            Ok(()) => station.weight = weight,
            Err(e) => eprintln!("    {} (keeping {})", e, station.weight),
        }
    }
}

fn load_cargo(profile: &mut AircraftProfile) {
    while let Some(description) = prompt_line("  Extra cargo description (blank when done): ") {
        let weight = prompt_f64("    Weight: ", 0.0);
        let arm = prompt_f64("    Arm: ", 0.0);
        match add_cargo_station(&profile.stations, &CargoItem::new(description, weight, arm)) {
            Ok(stations) => profile.stations = stations,
            Err(e) => eprintln!("    {}", e),
        }
    }
}

fn print_report(profile: &AircraftProfile, report: &WeightBalanceReport) {
    let unit = profile.unit;
    println!();
    println!("═══════════════════════════════════════════════════════════");
    println!("  WEIGHT & BALANCE - {}", profile.name);
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("  {:<5} {:>14} {:>14} {:>10} {:>8}", "", "Weight", "CG", "Moment/100", "%MAC");
    for (configuration, point) in report.envelope_data.points() {
        println!(
            "  {:<5} {:>14} {:>14} {:>10} {:>7.2}% {}",
            configuration.label(),
            format_weight(point.weight, unit),
            format_length(point.cg, unit),
            format_moment(report.summaries.get(configuration).moment),
            point.mac,
            status_icon(report.validation.get(configuration))
        );
    }
    println!();
    println!(
        "  Limits: {:.1}% - {:.1}% MAC ({})",
        profile.mac_config.mac_min, profile.mac_config.mac_max, profile.mac_config.formula
    );
    println!("═══════════════════════════════════════════════════════════");
    println!(
        "  RESULT: {}",
        if report.validation.all_in_limits { "WITHIN LIMITS" } else { "OUT OF LIMITS" }
    );
    println!("═══════════════════════════════════════════════════════════");
}

fn print_fuel_sequence(profile: &AircraftProfile, sequence: &FuelSequence) {
    let unit = profile.unit;
    println!();
    println!("  {:>6} {:>14} {:>14} {:>8}", "Time", "Weight", "CG", "%MAC");
    for step in &sequence.steps {
        println!(
            "  {:>5.2}h {:>14} {:>14} {:>7.2}% {}",
            step.time,
            format_weight(step.total_weight, unit),
            format_length(step.cg, unit),
            step.mac,
            status_icon(profile.mac_config.contains(step.mac))
        );
    }
    if sequence.has_shortfall() {
        println!(
            "  Tanks ran dry: {} of the requested {} not available",
            format_weight(sequence.unburned_fuel, unit),
            format_weight(sequence.requested_burn, unit)
        );
    }
}

fn save_to_library(profile: &AircraftProfile, path: &Path) -> CalcResult<()> {
    let user = std::env::var("USER").unwrap_or_else(|_| "trimsheet".to_string());
    let _lock = FileLock::acquire(path, user)?;

    let mut library = if path.exists() { load_library(path)? } else { ProfileLibrary::new() };
    let name = prompt_line("  Calculation name [Untitled]: ").unwrap_or_else(|| "Untitled".to_string());

    let profile_id = library.add_profile(profile.clone());
    let calculation = Calculation::from_profile(name, profile_id, profile);
    library.add_calculation(calculation)?;
    save_library(&library, path)?;
    tracing::info!(path = %path.display(), %profile_id, "calculation saved");

    let stats = library.stats();
    println!("Saved to {} ({} profiles, {} calculations)", path.display(), stats.profiles, stats.calculations);
    Ok(())
}
