use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tow_predictor::{
    config, load_csv_file, predict_tow, submit_solution, train_tow_model, EngineeredFrames,
    FeatureBuilder, ProcessRunner, SubmitConfig, TrainerConfig, TrainingMode, TrainingReport,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

// Steps
// 1. Load challenge and submission flight lists
// 2. Join aircraft reference data, encode categories, derive time features
// 3. Train the regressor and save it
// 4. Predict the submission set and write flight_id,tow
// 5. Upload the submission file

#[derive(Parser)]
#[command(name = "tow-predictor")]
#[command(about = "Train and apply a take-off weight regressor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build features and train the model
    Train {
        #[command(flatten)]
        data: DataArgs,

        /// Hold out 20% of the rows and report test metrics
        #[arg(long)]
        evaluate: bool,
    },

    /// Build features and predict the submission set with a saved model
    Predict {
        #[command(flatten)]
        data: DataArgs,

        /// Output csv with flight_id,tow
        #[arg(short, long, default_value = config::SUBMISSION_PATH)]
        output: PathBuf,
    },

    /// Train on the full challenge set, then predict the submission set
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Output csv with flight_id,tow
        #[arg(short, long, default_value = config::SUBMISSION_PATH)]
        output: PathBuf,
    },

    /// Upload the submission file with the MinIO client
    Submit {
        /// Version number appended to the remote file name
        #[arg(short, long, default_value = "0")]
        version: u32,

        /// JSON file with team_id and team_name
        #[arg(long, default_value = tow_predictor::submit::DEFAULT_TEAM_FILE)]
        team_file: PathBuf,

        /// Local submission csv
        #[arg(long, default_value = config::SUBMISSION_PATH)]
        file: PathBuf,

        /// mc alias for the bucket host
        #[arg(long, default_value = tow_predictor::submit::DEFAULT_ALIAS)]
        alias: String,

        /// Object store endpoint
        #[arg(long, default_value = tow_predictor::submit::DEFAULT_ENDPOINT)]
        endpoint: String,

        #[arg(long, env = "MC_ACCESS_KEY", hide_env_values = true)]
        access_key: String,

        #[arg(long, env = "MC_SECRET_KEY", hide_env_values = true)]
        secret_key: String,
    },
}

#[derive(Args)]
struct DataArgs {
    /// Labeled flight list
    #[arg(long, default_value = config::CHALLENGE_SET_PATH)]
    challenge: PathBuf,

    /// Unlabeled flight list
    #[arg(long, default_value = config::SUBMISSION_SET_PATH)]
    submission: PathBuf,

    /// Aircraft type to MTOW table
    #[arg(long, default_value = config::REFERENCE_PATH)]
    reference: PathBuf,

    /// Model file
    #[arg(short, long, default_value = config::MODEL_PATH)]
    model: PathBuf,

    /// Comma separated feature columns, in model order
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<String>>,
}

impl DataArgs {
    fn feature_columns(&self) -> Vec<String> {
        self.features
            .clone()
            .unwrap_or_else(config::default_feature_columns)
    }

    fn build_features(&self) -> Result<EngineeredFrames> {
        let challenge = load_csv_file(&self.challenge)
            .with_context(|| format!("reading {}", self.challenge.display()))?;
        let submission = load_csv_file(&self.submission)
            .with_context(|| format!("reading {}", self.submission.display()))?;

        let builder = FeatureBuilder::from_reference_file(&self.reference)
            .with_context(|| format!("reading {}", self.reference.display()))?;
        Ok(builder.build(&challenge, &submission)?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = Level::from_str(&cli.log_level)
        .with_context(|| format!("invalid log level `{}`", cli.log_level))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Train { data, evaluate } => {
            let frames = data.build_features()?;
            let mode = if evaluate {
                TrainingMode::Evaluation
            } else {
                TrainingMode::Production
            };
            let (_, report) = train_tow_model(
                &frames.challenge,
                &data.feature_columns(),
                &data.model,
                mode,
                &TrainerConfig::default(),
            )?;
            print_report(&report);
        }
        Commands::Predict { data, output } => {
            let frames = data.build_features()?;
            predict_tow(
                &frames.submission,
                &data.feature_columns(),
                &data.model,
                &output,
            )?;
            info!(path = %output.display(), "submission written");
        }
        Commands::Run { data, output } => {
            let frames = data.build_features()?;
            let features = data.feature_columns();
            let (_, report) = train_tow_model(
                &frames.challenge,
                &features,
                &data.model,
                TrainingMode::Production,
                &TrainerConfig::default(),
            )?;
            print_report(&report);
            predict_tow(&frames.submission, &features, &data.model, &output)?;
            info!(path = %output.display(), "submission written");
        }
        Commands::Submit {
            version,
            team_file,
            file,
            alias,
            endpoint,
            access_key,
            secret_key,
        } => {
            let config = SubmitConfig {
                team_file,
                submission_path: file,
                alias,
                endpoint,
                ..SubmitConfig::new(access_key, secret_key)
            };
            let remote = submit_solution(&config, version, &mut ProcessRunner)?;
            println!("Uploaded {remote}");
        }
    }

    Ok(())
}

fn print_report(report: &TrainingReport) {
    match &report.test {
        Some(test) => {
            println!("Train RMSE: {}", report.train.rmse);
            println!("Train R^2: {}", report.train.r2);
            println!("Test RMSE: {}", test.rmse);
            println!("Test R^2: {}", test.r2);
        }
        None => println!("The RMSE of the trained model is {}", report.train.rmse),
    }
}
