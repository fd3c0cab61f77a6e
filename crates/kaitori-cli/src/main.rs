use clap::{Args, Parser, Subcommand};
use kaitori_core::{calculate_market_power, municipality::MUNICIPALITIES, MarketPowerInput};
use kaitori_resolver::DemographicsService;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kaitori-cli")]
#[command(about = "Buyback event site scoring from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score a site from explicit inputs and print the result as JSON
    Score(ScoreArgs),
    /// Resolve demographics for a region using the configured sources
    Region {
        /// Municipality name, e.g. 横浜市 or 東京都渋谷区
        name: String,
    },
    /// List the built-in municipality table
    Municipalities,
}

#[derive(Debug, Args)]
struct ScoreArgs {
    /// station_front, shopping_mall, roadside, suburban or residential
    #[arg(long)]
    archetype: Option<String>,
    /// large, medium, small or none
    #[arg(long)]
    parking_size: Option<String>,
    #[arg(long)]
    parking_capacity: Option<u32>,
    #[arg(long = "population-1km")]
    population_1km: Option<f64>,
    #[arg(long = "population-2km")]
    population_2km: Option<f64>,
    #[arg(long)]
    senior_female: Option<f64>,
    /// Average annual income in man-yen
    #[arg(long)]
    income: Option<f64>,
}

impl From<ScoreArgs> for MarketPowerInput {
    fn from(args: ScoreArgs) -> Self {
        Self {
            archetype: args.archetype,
            parking_size: args.parking_size,
            parking_capacity: args.parking_capacity,
            population_1km: args.population_1km,
            population_2km: args.population_2km,
            senior_female_population: args.senior_female,
            average_income: args.income,
        }
    }
}

#[derive(Debug, Serialize)]
struct ScoreOutput {
    #[serde(flatten)]
    result: kaitori_core::MarketPowerResult,
    rank: kaitori_core::Rank,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Score(args) => {
            let result = calculate_market_power(&args.into());
            let rank = result.rank();
            println!(
                "{}",
                serde_json::to_string_pretty(&ScoreOutput { result, rank })?
            );
        }
        Commands::Region { name } => {
            let config = kaitori_core::load_app_config()?;
            let service = DemographicsService::from_config(&config)?;
            let record = service.resolve(&name).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Municipalities => {
            for m in MUNICIPALITIES {
                println!("{}\t{}\t{:.2} km²", m.code, m.full_name(), m.area_km2);
            }
        }
    }

    Ok(())
}
