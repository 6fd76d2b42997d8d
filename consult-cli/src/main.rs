use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use consult::RoomKey;
use consult::client::media::{MediaDevices, SyntheticDevices, UnavailableDevices, spawn_silence_feeder};
use consult::client::peer::RtcPeerFactory;
use consult::client::session_api::{HttpSessionApi, NoopSessionRegistry, SessionRegistry};
use consult::client::signaling::WsConnector;
use consult::client::{CallConfig, CallHandle, CallServices, CallSession, CallSnapshot, EchoPolicy};
use consult::model::IceServerConfig;
use consult::server::{BroadcastPolicy, RelayConfig};

/// How long to wait for local media before giving up on the silence feed.
const MEDIA_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "consult", version, about = "1:1 video consultations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay(RelayArgs),
    /// Join a consultation from the terminal.
    Call(CallArgs),
}

#[derive(Args)]
struct RelayArgs {
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Do not echo chat messages back to their sender.
    #[arg(long)]
    exclude_sender: bool,
}

#[derive(Args)]
struct CallArgs {
    #[arg(long, env = "CONSULT_RELAY_URL", default_value = "ws://127.0.0.1:5000/ws")]
    relay: String,

    /// Appointment id; both participants must use the same one.
    #[arg(long)]
    appointment: String,

    /// Name shown next to your chat messages.
    #[arg(long)]
    name: String,

    /// Base URL of the session-record API.
    #[arg(long, env = "CONSULT_API_URL")]
    api: Option<String>,

    #[arg(long, env = "CONSULT_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Join without camera or microphone.
    #[arg(long)]
    no_media: bool,

    /// STUN server URL, repeatable. Replaces the default list.
    #[arg(long = "ice")]
    ice: Vec<String>,

    /// The relay does not echo our own chat messages.
    #[arg(long)]
    relay_excludes_sender: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay(args) => run_relay(args).await,
        Commands::Call(args) => run_call(args).await,
    }
}

async fn run_relay(args: RelayArgs) -> Result<()> {
    let config = RelayConfig {
        bind_addr: args.bind,
        broadcast: if args.exclude_sender {
            BroadcastPolicy::ExcludeSender
        } else {
            BroadcastPolicy::IncludeSender
        },
    };

    println!(
        "{} ws://{}/ws",
        "📡 Relay starting on".green().bold(),
        config.bind_addr
    );
    consult::server::serve(config).await
}

async fn run_call(args: CallArgs) -> Result<()> {
    let room = RoomKey::new(args.appointment).context("Invalid appointment id")?;

    let mut config = CallConfig::new(room.clone(), args.name);
    if !args.ice.is_empty() {
        config.ice_servers = args.ice.into_iter().map(IceServerConfig::stun).collect();
    }
    if args.relay_excludes_sender {
        config.echo = EchoPolicy::RelayExcludesSender;
    }

    let devices: Arc<dyn MediaDevices> = if args.no_media {
        Arc::new(UnavailableDevices)
    } else {
        Arc::new(SyntheticDevices::default())
    };
    let sessions: Arc<dyn SessionRegistry> = match args.api {
        Some(url) => Arc::new(
            HttpSessionApi::new(url, args.token).context("Failed to build session API client")?,
        ),
        None => Arc::new(NoopSessionRegistry),
    };
    let services = CallServices {
        devices,
        signaling: Arc::new(WsConnector::new(args.relay)),
        peers: Arc::new(RtcPeerFactory::new()),
        sessions,
    };

    println!("{} {}", "📞 Joining appointment".green().bold(), room);
    println!(
        "{}",
        "   Type to chat. /mic and /cam toggle, /end hangs up.".dimmed()
    );

    let handle = CallSession::start(config, services);
    let printer = tokio::spawn(print_updates(handle.subscribe()));

    if !args.no_media {
        feed_silence(&handle).await;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    read_input(&handle, stdin, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    handle.end_call().await?;
    printer.abort();
    println!("{}", "👋 Call ended".green().bold());
    Ok(())
}

/// Feeds typed lines into the call until the user hangs up. Closed input
/// only stops reading; the call keeps running until `/end` or `hangup`.
async fn read_input<R>(
    handle: &CallHandle,
    input: R,
    hangup: impl Future<Output = ()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut input_open = true;
    tokio::pin!(hangup);

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    println!("{}", "   Input closed. Press ctrl-c to hang up.".dimmed());
                    continue;
                };
                match line.trim() {
                    "" => {}
                    "/mic" => handle.toggle_microphone().await?,
                    "/cam" => handle.toggle_camera().await?,
                    "/end" => {
                        if confirm_end().await? {
                            break;
                        }
                    }
                    text => handle.send_chat(text).await?,
                }
            }

            _ = &mut hangup => break,
        }
    }
    Ok(())
}

/// Keeps the outgoing audio track alive so the far side binds it.
async fn feed_silence(handle: &CallHandle) {
    let Ok(snapshot) = handle
        .wait_for(MEDIA_TIMEOUT, |s| s.local_media.is_some())
        .await
    else {
        return;
    };
    if let Some(stream) = &snapshot.local_media {
        spawn_silence_feeder(stream);
    }
}

async fn confirm_end() -> Result<bool> {
    let confirmed = tokio::task::spawn_blocking(|| {
        Confirm::new()
            .with_prompt("End the consultation?")
            .default(false)
            .interact()
    })
    .await??;
    Ok(confirmed)
}

async fn print_updates(mut rx: watch::Receiver<CallSnapshot>) {
    let mut last = rx.borrow_and_update().clone();
    let mut shown = 0;

    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();

        if snapshot.state != last.state {
            println!("{} {}", "● call".cyan().bold(), snapshot.state);
        }
        if snapshot.local_preview() && !last.local_preview() {
            println!("{}", "● local preview on".cyan());
        }
        if snapshot.remote_video_bound() && !last.remote_video_bound() {
            println!("{}", "● remote media bound".cyan());
        }
        if last.signaling_connected && !snapshot.signaling_connected && !snapshot.state.is_closed() {
            println!("{}", "● lost the relay; the call will not reconnect".red());
        }
        // Only report toggles, not the flags appearing with the stream.
        if last.local_preview() && snapshot.local_preview() {
            if snapshot.microphone_enabled != last.microphone_enabled {
                println!("● microphone {}", on_off(snapshot.microphone_enabled));
            }
            if snapshot.camera_enabled != last.camera_enabled {
                println!("● camera {}", on_off(snapshot.camera_enabled));
            }
        }

        for message in snapshot.messages.iter().skip(shown) {
            println!(
                "{} {} {}",
                message.timestamp.format("%H:%M").to_string().dimmed(),
                format!("{}:", message.sender_name).yellow().bold(),
                message.message
            );
        }
        shown = snapshot.messages.len();
        last = snapshot;
    }
}

fn on_off(enabled: bool) -> ColoredString {
    if enabled { "on".green() } else { "off".red() }
}
