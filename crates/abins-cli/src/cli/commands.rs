use super::CliError;
use abins_core::common::parameters::{AbinsParameters, load_parameters};
use abins_core::domain::{AbinsError, ExecutionMode, SampleForm, Temperature};
use abins_core::modules::calculator::{SCalculator, load_structure_factor, store_path_for};
use abins_core::modules::export::write_spectra;
use abins_core::modules::input::load_abins_input;
use abins_core::modules::structure_factor::StructureFactorResult;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(clap::Args)]
pub(super) struct CalculateArgs {
    /// Input document with atoms, k-points and powder data
    #[arg(long)]
    input: PathBuf,

    /// Sample temperature in Kelvin
    #[arg(long)]
    temperature: String,

    /// Sample form (Powder or SingleCrystal)
    #[arg(long, default_value = "Powder")]
    sample_form: String,

    /// Instrument resolution (TOSCA or None)
    #[arg(long, default_value = "TOSCA")]
    instrument: String,

    /// JSON file overriding the default parameters
    #[arg(long)]
    parameters: Option<PathBuf>,

    /// Number of overtones to accumulate
    #[arg(long)]
    overtones: Option<usize>,

    /// Sample points per resolution peak
    #[arg(long)]
    points_per_peak: Option<usize>,

    /// Spread atoms over the rayon thread pool
    #[arg(long)]
    parallel: bool,
}

#[derive(clap::Args)]
pub(super) struct LoadArgs {
    /// Input document whose saved result should be read
    #[arg(long)]
    input: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ExportArgs {
    /// Input document whose saved result should be exported
    #[arg(long)]
    input: PathBuf,

    /// Directory receiving one table per atom
    #[arg(long)]
    output_dir: PathBuf,
}

pub(super) fn run_calculate_command(args: CalculateArgs) -> Result<i32, CliError> {
    let temperature = Temperature::parse(&args.temperature)?;
    let sample_form = args.sample_form.parse::<SampleForm>()?;

    let mut parameters = match &args.parameters {
        Some(path) => load_parameters(path).map_err(AbinsError::from)?,
        None => AbinsParameters::default(),
    };
    if let Some(overtones) = args.overtones {
        parameters.overtone_count = overtones;
    }
    if let Some(points_per_peak) = args.points_per_peak {
        parameters.points_per_peak = points_per_peak;
    }

    let input = load_abins_input(&args.input)?;
    info!(input = %args.input.display(), atoms = input.data.num_atoms(), "loaded input");

    let mut calculator = SCalculator::new(
        &args.input,
        temperature,
        sample_form,
        input.data,
        input.powder,
        &args.instrument,
        parameters,
    )?;
    if let Some(q) = input.q {
        calculator = calculator.with_q_values(q);
    }
    if args.parallel {
        calculator = calculator.with_execution_mode(ExecutionMode::Parallel);
    }

    let result = calculator.get_s()?;
    println!("{}", summary_line("Computed", &result, &calculator.store_path()));
    Ok(0)
}

pub(super) fn run_load_command(args: LoadArgs) -> Result<i32, CliError> {
    let result = load_structure_factor(&args.input)?;
    println!(
        "{}",
        summary_line("Loaded", &result, &store_path_for(&args.input))
    );
    for (index, atom) in result.atoms().iter().enumerate() {
        let peak = atom.total().into_iter().fold(0.0_f64, f64::max);
        println!(
            "  atom {} {} (sort {}): max total S {:.6e}",
            index,
            atom.symbol(),
            atom.sort(),
            peak
        );
    }
    Ok(0)
}

pub(super) fn run_export_command(args: ExportArgs) -> Result<i32, CliError> {
    let result = load_structure_factor(&args.input)?;
    let written = write_spectra(&result, &args.output_dir)?;
    for path in &written {
        println!("{}", path.display());
    }
    println!("Exported {} spectra to {}", written.len(), args.output_dir.display());
    Ok(0)
}

fn summary_line(verb: &str, result: &StructureFactorResult, store: &Path) -> String {
    let overtones = result
        .atoms()
        .first()
        .map(|atom| atom.overtone_count())
        .unwrap_or_default();
    format!(
        "{} S for {} atoms: {} points, {} overtones, T = {}, {} -> {}",
        verb,
        result.num_atoms(),
        result.frequencies().len(),
        overtones,
        result.temperature(),
        result.sample_form(),
        store.display()
    )
}
