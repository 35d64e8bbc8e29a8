use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bcflow::config::Config;
use bcflow::logging::init_tracing;
use bcflow::model::ScreenMeta;
use bcflow::store::{Action, FetchRequest};
use bcflow::Engine;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bcflow", version, about = "Drive business-component workflows against a backend")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `[api].base_url`
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a view of a screen descriptor and print the loaded data
    View {
        screen: PathBuf,
        #[arg(long)]
        view: Option<String>,
    },
    /// Fetch one BC of a screen descriptor and print its records
    Fetch {
        screen: PathBuf,
        #[arg(long)]
        bc: String,
    },
}

fn read_screen(path: &Path) -> Result<ScreenMeta> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read screen descriptor {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid screen descriptor {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    init_tracing(&config.logging);

    let engine = Engine::builder(config).build()?;
    match cli.command {
        Command::View { screen, view } => {
            let screen = read_screen(&screen)?;
            let view = match view {
                Some(view) => view,
                None => screen
                    .default_view()
                    .map(|view| view.name.clone())
                    .context("Screen descriptor has no views")?,
            };
            engine.select_screen(screen);
            if !engine.select_view(&view) {
                bail!("Unknown view '{}'", view);
            }
            engine.wait_idle().await;
            println!("{}", serde_json::to_string_pretty(&engine.state().data)?);
        }
        Command::Fetch { screen, bc } => {
            engine.select_screen(read_screen(&screen)?);
            if engine.state().screen.bc(&bc).is_none() {
                bail!("Unknown BC '{}'", bc);
            }
            engine.dispatch(Action::BcFetchDataRequest(FetchRequest::new(bc.clone())));
            engine.wait_idle().await;
            println!(
                "{}",
                serde_json::to_string_pretty(engine.state().data.records(&bc))?
            );
        }
    }
    Ok(())
}
