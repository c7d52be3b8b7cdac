use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use swipedeck_core::SwipeConfig;
use tracing_subscriber::EnvFilter;

mod replay;

use replay::ReplayScript;

#[derive(Parser)]
#[command(name = "swipedeck-cli", version, about = "Headless tools for swipe decks")]
struct Cli {
    /// TOML file with deck tunables.
    #[arg(long, global = true, env = "SWIPEDECK_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scripted pointer trace against a deck and report the exits.
    Replay {
        /// Script path, or `-` for stdin.
        script: PathBuf,
        /// Seed the deck with this many generated cards before the script's own.
        #[arg(long, default_value_t = 0)]
        generate: usize,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration.
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay {
            script,
            generate,
            json,
        } => {
            let source = read_script(&script)?;
            let mut script = ReplayScript::parse(&source)?;
            if generate > 0 {
                let mut cards = replay::generate_cards(generate);
                cards.append(&mut script.cards);
                script.cards = cards;
            }
            let report = replay::run(script, config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render_text());
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml_string().context("failed to serialize config")?);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SwipeConfig> {
    let Some(path) = path else {
        return Ok(SwipeConfig::default());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = SwipeConfig::from_toml_str(&source)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read script from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read script {}", path.display()))
}
