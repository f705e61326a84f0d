use clap::Parser;
use fire_spread_core::oracle::OracleError;
use fire_spread_core::simulation::InputError;
use fire_spread_core::weather::{CachedWeatherProvider, ObservationFile, PresetError};
use fire_spread_core::{
    ConstantOracle, Ensemble, OracleSlot, SeasonalPreset, SeasonalWeather, SeedPoint,
    SimulationError, SimulationRequest, SpreadEngine,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Hourly wildfire spread prediction from active fire detections
#[derive(Parser, Debug)]
#[command(name = "fire-spread")]
#[command(about = "Cellular automaton wildfire spread forecast", long_about = None)]
struct Args {
    /// GeoJSON FeatureCollection of active fire points (built-in demo fires if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Hours to predict (overrides the request's hours_to_predict)
    #[arg(long)]
    hours: Option<u32>,

    /// RNG seed; identical seeds reproduce identical forecasts
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Logistic ignition model (JSON weights)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Use a constant ignition probability instead of a model
    #[arg(long, default_value_t = 0.5, conflicts_with = "model")]
    constant_probability: f64,

    /// Seed the fires with observed weather instead of the mock snapshot
    #[arg(long)]
    real_weather: bool,

    /// Observation file consulted for real weather
    #[arg(long, requires = "real_weather")]
    weather_file: Option<PathBuf>,

    /// Seasonal weather preset (JSON); the Uttarakhand preset if omitted
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Run an ensemble of N members and print burn frequencies
    #[arg(short, long)]
    ensemble: Option<usize>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("cannot parse preset: {0}")]
    PresetFormat(serde_json::Error),
    #[error("invalid preset: {0}")]
    Preset(#[from] PresetError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("cannot write result: {0}")]
    Output(#[from] std::io::Error),
    #[error("cannot encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Simulation(e) => match e.status_code() {
                400 => ExitCode::from(2),
                503 => ExitCode::from(3),
                _ => ExitCode::FAILURE,
            },
            Self::Read { .. }
            | Self::Input(_)
            | Self::PresetFormat(_)
            | Self::Preset(_)
            | Self::Oracle(_) => ExitCode::from(2),
            Self::Output(_) | Self::Encode(_) => ExitCode::FAILURE,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fire-spread failed");
            e.exit_code()
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let mut request = match &args.input {
        Some(path) => SimulationRequest::from_geojson(&read(path)?)?,
        None => demo_request(),
    };
    if let Some(hours) = args.hours {
        request = request.with_hours(hours);
    }
    if args.real_weather {
        request = request.with_real_weather(true);
    }

    let engine = build_engine(args)?;
    info!(
        seeds = request.seeds.len(),
        hours = request.hours_to_predict,
        real_weather = request.use_real_weather,
        "Request prepared"
    );

    let json = if let Some(members) = args.ensemble {
        let summary = Ensemble::new(&engine)
            .members(members)
            .base_seed(args.seed)
            .run(&request)?;
        serde_json::to_string_pretty(&summary)?
    } else {
        let mut rng = StdRng::seed_from_u64(args.seed);
        let outcome = engine.run(&request, &mut rng)?;
        for line in outcome.logs() {
            info!("{line}");
        }
        serde_json::to_string_pretty(&outcome.to_response())?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!(path = %path.display(), "Result written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn build_engine(args: &Args) -> Result<SpreadEngine, CliError> {
    let oracle = match &args.model {
        Some(path) => OracleSlot::load_logistic(path),
        None => OracleSlot::ready(ConstantOracle::new(args.constant_probability)?),
    };

    let preset = match &args.preset {
        Some(path) => {
            serde_json::from_str::<SeasonalPreset>(&read(path)?).map_err(CliError::PresetFormat)?
        }
        None => SeasonalPreset::uttarakhand(),
    };

    let mut engine = SpreadEngine::new(oracle).with_weather_source(SeasonalWeather::new(preset)?);
    if let Some(path) = &args.weather_file {
        engine = engine.with_weather_provider(CachedWeatherProvider::new(ObservationFile::new(
            path,
        )));
    }
    Ok(engine)
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Two detections in the Nainital forest belt
fn demo_request() -> SimulationRequest {
    SimulationRequest::new(vec![
        SeedPoint::new(79.4512, 29.3803, 145.0, 18.0),
        SeedPoint::new(79.4655, 29.3719, 92.0, 11.5),
    ])
}
