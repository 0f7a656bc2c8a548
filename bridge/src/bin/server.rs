//! `vox-mcp` - VOICEVOX speech tools for MCP clients
//!
//! Usage:
//!   vox-mcp stdio                       # MCP over stdin/stdout
//!   vox-mcp server --port 8080          # WebSocket tool server
//!   vox-mcp stdio -s 8 --enable-playback

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vox_bridge::{serve, serve_stdio, SocketState};
use vox_core::{Config, ConfigOverrides, Dispatcher, FileNaming, VoicevoxClient};

#[derive(Parser, Debug)]
#[command(name = "vox-mcp", version, about = "VOICEVOX text-to-speech over the Model Context Protocol")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP (JSON-RPC 2.0) over stdin/stdout
    Stdio {
        #[command(flatten)]
        shared: SharedArgs,
    },
    /// Serve the WebSocket tool server
    Server {
        /// Listening port
        #[arg(short, long)]
        port: Option<u16>,

        #[command(flatten)]
        shared: SharedArgs,
    },
}

#[derive(Args, Debug)]
struct SharedArgs {
    /// VOICEVOX engine base URL
    #[arg(short = 'u', long)]
    voicevox_url: Option<String>,

    /// Directory for synthesized WAV files
    #[arg(short, long)]
    temp_dir: Option<PathBuf>,

    /// Speaker used when a request omits speaker_id
    #[arg(short = 's', long)]
    default_speaker: Option<i64>,

    #[arg(long)]
    default_speed_scale: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    default_pitch_scale: Option<f64>,

    #[arg(long)]
    default_intonation_scale: Option<f64>,

    #[arg(long)]
    default_volume_scale: Option<f64>,

    /// Play each synthesized file after saving it
    #[arg(long)]
    enable_playback: bool,

    /// Player binary to try before the platform defaults
    #[arg(long)]
    player: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    verbose: bool,
}

impl SharedArgs {
    fn overrides(&self, port: Option<u16>) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            port,
            engine_url: self.voicevox_url.clone(),
            temp_dir: self.temp_dir.clone(),
            default_speaker: self.default_speaker,
            speed_scale: self.default_speed_scale,
            pitch_scale: self.default_pitch_scale,
            intonation_scale: self.default_intonation_scale,
            volume_scale: self.default_volume_scale,
            enable_playback: self.enable_playback.then_some(true),
            player: self.player.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout belongs to the protocol in stdio mode
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build(shared: &SharedArgs, port: Option<u16>) -> Result<Config, Box<dyn std::error::Error>> {
    init_tracing(shared.verbose);
    let config = Config::load(&shared.overrides(port))?;
    config.prepare_temp_dir()?;
    info!(
        engine = %config.engine_url,
        temp_dir = %config.temp_dir.display(),
        default_speaker = config.default_speaker,
        playback = config.enable_playback,
        "Configuration loaded"
    );
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Stdio { shared } => {
            let config = build(&shared, None)?;
            let engine = Arc::new(VoicevoxClient::new(config.engine_url.clone()));
            let dispatcher = Dispatcher::from_config(&config, engine);
            serve_stdio(&dispatcher).await?;
        }
        Command::Server { port, shared } => {
            let config = build(&shared, port)?;
            let engine = Arc::new(VoicevoxClient::new(config.engine_url.clone()));
            let dispatcher = Dispatcher::with_naming(&config, engine, FileNaming::Legacy);

            let listener = vox_bridge::bind(config.port).await?;
            info!(port = config.port, "Starting WebSocket server");
            serve(listener, SocketState::new(dispatcher, config.port)).await?;
        }
    }

    Ok(())
}
