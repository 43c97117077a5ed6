use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tweetcard::app::App;
use tweetcard::capture::{CardTheme, FileSink};
use tweetcard::config::{Config, MAX_SCALE};
use tweetcard::headless::{self, RenderRequest};
use tweetcard::lang::Language;
use tweetcard::logging;
use tweetcard::lookup::{build_client, HttpLookup};
use tweetcard::session::Session;
use tweetcard::state::PreviewState;
use tweetcard::worker::Worker;

/// Compose a mock tweet in the terminal and export it as tweet.png
#[derive(Parser, Debug)]
#[command(name = "tweetcard")]
#[command(version)]
struct Cli {
    /// Configuration file (default: <config dir>/tweetcard/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface and card language
    #[arg(short, long)]
    lang: Option<Language>,

    /// Log file (default: <cache dir>/tweetcard/tweetcard.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory that receives tweet.png
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Card colours for the exported image
    #[arg(long, value_enum)]
    theme: Option<CardTheme>,

    /// Pixel multiplier for the exported image
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_SCALE as i64))]
    scale: Option<u32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a card without opening the editor
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    handle: Option<String>,

    #[arg(long)]
    body: Option<String>,

    /// Local image used as the avatar
    #[arg(long)]
    avatar: Option<PathBuf>,

    #[arg(long)]
    retweets: Option<String>,

    #[arg(long)]
    quotes: Option<String>,

    #[arg(long)]
    likes: Option<String>,

    #[arg(long)]
    verified: bool,

    /// Seed the card from the lookup service using --handle
    #[arg(long)]
    fetch: bool,
}

impl Cli {
    /// Flags win over the config file.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(lang) = self.lang {
            config.language = lang;
        }
        if let Some(out) = &self.out {
            config.export.directory = Some(out.clone());
        }
        if let Some(theme) = self.theme {
            config.export.theme = theme;
        }
        if let Some(scale) = self.scale {
            config.export.scale = scale;
        }
    }
}

impl RenderArgs {
    fn into_request(self, language: Language) -> RenderRequest {
        RenderRequest {
            name: self.name,
            handle: self.handle,
            body: self.body,
            avatar: self.avatar,
            retweets: self.retweets,
            quotes: self.quotes,
            likes: self.likes,
            verified: self.verified,
            fetch: self.fetch,
            language,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_path);
    let _guard = logging::init(&log_path, &config.log_level)?;
    tracing::info!(language = %config.language, "starting tweetcard");

    let client =
        build_client(config.lookup_timeout()).context("Failed to build HTTP client")?;
    let lookup = Arc::new(HttpLookup::new(config.lookup.endpoint.clone(), client.clone()));
    let sink = Box::new(FileSink::new(
        config.export_dir(),
        config.export.open_after_export,
    ));

    match cli.command {
        Some(Command::Render(args)) => {
            let request = args.into_request(config.language);
            let path = headless::render(
                request,
                lookup.as_ref(),
                &client,
                config.render_options(),
                sink,
            )
            .await?;
            println!("{}", path.display());
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            let worker = Worker::new(tx, lookup, client, config.render_options());
            let state = PreviewState {
                language: config.language,
                ..PreviewState::default()
            };
            let app = App::new(Session::new(state, sink), worker, rx);

            let mut terminal = ratatui::init();
            let result = app.run(&mut terminal).await;
            ratatui::restore();
            result.context("editor stopped with an error")?;
        }
    }

    Ok(())
}
