mod net;
mod script;

use std::io;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::io::BufReader;
use tokio::sync::mpsc;


const INPUT_QUEUE: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("websocket failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("timed out waiting for a server message")]
    Timeout,
    #[error("io failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input script line {line}: {source}")]
    Script {
        line: usize,
        #[source]
        source: script::ScriptError,
    },
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] protocol::ProtocolError),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

#[derive(Parser, Debug)]
#[command(name = "skirmish", about = "Headless client for the skirmish snapshot protocol")]
struct Cli {
    #[arg(long, env = "SKIRMISH_URL", default_value = "ws://127.0.0.1:3000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect, print every snapshot and forward an optional input script.
    Watch(WatchArgs),
    /// Decode one hex-encoded snapshot and print it as JSON.
    Decode { hex: String },
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long)]
    json: bool,

    #[arg(long)]
    max_snapshots: Option<u64>,

    #[arg(long, default_value_t = 10)]
    idle_timeout_secs: u64,

    /// Input script path, or `-` for stdin.
    #[arg(long)]
    input: Option<String>,
}

fn main() -> Result<(), ClientError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    run_detached(async move {
        match cli.command {
            Command::Watch(args) => run_watch(&cli.url, args).await,
            Command::Decode { hex } => run_decode(&hex),
        }
    })?
}

/// Drive `future` on a fresh runtime, then shut down without waiting for
/// blocking tasks. A script reading stdin sits in a blocking read that only
/// returns on a line or EOF; the process must still exit once the watch ends.
fn run_detached<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
}

async fn run_watch(url: &str, args: WatchArgs) -> Result<(), ClientError> {
    let options = net::WatchOptions {
        json: args.json,
        max_snapshots: args.max_snapshots,
        idle_timeout: Duration::from_secs(args.idle_timeout_secs),
    };

    let (tx, rx) = mpsc::channel(INPUT_QUEUE);
    if let Some(path) = args.input {
        spawn_script(path, tx);
    } else {
        drop(tx);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = net::watch(url, &options, rx, &mut out).await?;

    tracing::info!(
        snapshots = summary.snapshots,
        rejected = summary.rejected,
        sent = summary.sent,
        dropped = summary.dropped,
        "watch finished"
    );
    Ok(())
}

fn spawn_script(path: String, tx: mpsc::Sender<protocol::InputEvent>) {
    tokio::spawn(async move {
        let result = if path == "-" {
            script::play(BufReader::new(tokio::io::stdin()), tx).await
        } else {
            match tokio::fs::File::open(&path).await {
                Ok(file) => script::play(BufReader::new(file), tx).await,
                Err(error) => Err(ClientError::Io(error)),
            }
        };
        match result {
            Ok(queued) => tracing::info!(%path, queued, "input script finished"),
            Err(error) => tracing::error!(%path, %error, "input script failed"),
        }
    });
}

fn run_decode(hex: &str) -> Result<(), ClientError> {
    let bytes = parse_hex(hex)?;
    let snapshot = protocol::decode_snapshot(&bytes)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Parse hex digits, ignoring whitespace, commas and an optional `0x` prefix.
fn parse_hex(text: &str) -> Result<Vec<u8>, ClientError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = body
        .bytes()
        .filter(|byte| !byte.is_ascii_whitespace() && *byte != b',')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(ClientError::InvalidHex(format!("odd digit count {}", digits.len())));
    }

    digits
        .chunks_exact(2)
        .map(|pair| match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(ClientError::InvalidHex(String::from_utf8_lossy(pair).into_owned())),
        })
        .collect()
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
