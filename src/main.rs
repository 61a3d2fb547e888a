use anyhow::Result;
use clap::Parser;
use gemini_bg_remover::app::App;
use gemini_bg_remover::image::to_data_url;
use gemini_bg_remover::models::Config;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-bg-remover")]
#[command(about = "Remove image backgrounds with Gemini")]
struct CliArgs {
    /// Image file to process, or a `data:image/...;base64,...` URL.
    #[arg(value_name = "INPUT")]
    input: String,

    /// Where to save the result. Defaults to `<input stem>-sem-fundo.png`
    /// for files; data URL input is printed back as a data URL.
    #[arg(short, long, value_name = "OUTPUT", conflicts_with = "data_url")]
    output: Option<PathBuf>,

    /// Load configuration from this env file instead of `./.env`.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Print a `data:image/png;base64,...` URL instead of writing a file.
    #[arg(long)]
    data_url: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_bg_remover=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match &args.env_file {
        Some(path) => Config::from_env_file(path),
        None => Config::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = App::new(&config);

    match execute(&app, &args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Background removal failed: {}", e);
            eprintln!("An error occurred while removing the background. Please try again.");
            std::process::exit(1);
        }
    }
}

async fn execute(app: &App, args: &CliArgs) -> gemini_bg_remover::Result<()> {
    let from_data_url = args.input.starts_with("data:");

    if !from_data_url && !args.data_url {
        let path = app
            .run(Path::new(&args.input), args.output.as_deref())
            .await?;
        info!("Done: {}", path.display());
        return Ok(());
    }

    let processed = if from_data_url {
        app.remove_background_data_url(&args.input).await?
    } else {
        app.remove_background_file(Path::new(&args.input)).await?
    };

    match &args.output {
        Some(path) => {
            App::save(&processed, path).await?;
            info!("Done: {}", path.display());
        }
        None => println!("{}", to_data_url(&processed)),
    }
    Ok(())
}
