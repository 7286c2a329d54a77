//! focusctl - command-line client for focusguardd

mod render;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use focusguard_api::{BlocklistItem, Command, ContentType, CustomContent};
use focusguard_ipc::IpcClient;
use focusguard_util::default_socket_path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// focusctl - Control focus sessions and blocklists
#[derive(Parser, Debug)]
#[command(name = "focusctl")]
#[command(about = "Command-line client for focusguardd", long_about = None)]
struct Args {
    /// Socket path for focusguardd connection (or set FOCUSGUARD_SOCKET env var)
    #[arg(short, long, env = "FOCUSGUARD_SOCKET")]
    socket: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Start a focus session
    Start {
        /// Session length in minutes
        #[arg(short, long, default_value_t = 25)]
        minutes: u32,

        /// Require a verification phrase to stop early
        #[arg(long)]
        hard: bool,
    },

    /// Stop the running session
    Stop {
        /// Verification phrase for a hard-mode session
        #[arg(short, long)]
        phrase: Option<String>,
    },

    /// Show the running session
    Status,

    /// Show the phrase needed to stop a hard-mode session
    Phrase,

    /// Show focus statistics
    Stats,

    /// Show or replace the blocklist
    Blocklist {
        #[command(subcommand)]
        action: BlocklistCmd,
    },

    /// Manage block groups
    Groups {
        #[command(subcommand)]
        action: GroupsCmd,
    },

    /// Show or set the content shown on blocked pages
    Content {
        #[command(subcommand)]
        action: ContentCmd,
    },

    /// Stream service events until interrupted
    Watch,

    /// Check service health
    Health,
}

#[derive(Subcommand, Debug)]
enum BlocklistCmd {
    Show,
    /// Replace the blocklist with the given domains or patterns
    Set { entries: Vec<String> },
}

#[derive(Subcommand, Debug)]
enum GroupsCmd {
    List,
    Create {
        name: String,
        #[arg(required = true)]
        websites: Vec<String>,
        /// Advisory time limit in minutes
        #[arg(short, long)]
        time_limit: Option<u32>,
    },
    Toggle { name: String },
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum ContentCmd {
    Show,
    Set {
        #[arg(short = 't', long = "type", value_enum, default_value_t = ContentKind::Message)]
        kind: ContentKind,
        content: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ContentKind {
    Message,
    Image,
    Video,
}

impl From<ContentKind> for ContentType {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Message => ContentType::Message,
            ContentKind::Image => ContentType::Image,
            ContentKind::Video => ContentType::Video,
        }
    }
}

impl Cmd {
    /// The request this subcommand sends; `None` for `watch`
    fn to_command(&self) -> Option<Command> {
        let command = match self {
            Cmd::Start { minutes, hard } => Command::StartSession {
                duration: *minutes,
                is_hard_mode: *hard,
            },
            Cmd::Stop { phrase } => Command::StopSession {
                verification_phrase: phrase.clone(),
            },
            Cmd::Status => Command::GetSessionStatus,
            Cmd::Phrase => Command::GetVerificationPhrase,
            Cmd::Stats => Command::GetStats,
            Cmd::Blocklist {
                action: BlocklistCmd::Show,
            } => Command::GetBlocklist,
            Cmd::Blocklist {
                action: BlocklistCmd::Set { entries },
            } => Command::UpdateBlocklist {
                blocklist: entries.iter().cloned().map(BlocklistItem::Pattern).collect(),
            },
            Cmd::Groups {
                action: GroupsCmd::List,
            } => Command::ListGroups,
            Cmd::Groups {
                action:
                    GroupsCmd::Create {
                        name,
                        websites,
                        time_limit,
                    },
            } => Command::CreateGroup {
                name: name.clone(),
                websites: websites.clone(),
                time_limit: *time_limit,
            },
            Cmd::Groups {
                action: GroupsCmd::Toggle { name },
            } => Command::ToggleGroup { name: name.clone() },
            Cmd::Groups {
                action: GroupsCmd::Delete { name },
            } => Command::DeleteGroup { name: name.clone() },
            Cmd::Content {
                action: ContentCmd::Show,
            } => Command::GetCustomContent,
            Cmd::Content {
                action: ContentCmd::Set { kind, content },
            } => Command::SetCustomContent {
                content: CustomContent {
                    content_type: (*kind).into(),
                    content: content.clone(),
                },
            },
            Cmd::Health => Command::GetHealth,
            Cmd::Watch => return None,
        };
        Some(command)
    }
}

async fn run(args: Args) -> Result<()> {
    let socket_path = args.socket.unwrap_or_else(default_socket_path);
    debug!(socket = %socket_path.display(), "Connecting");

    let mut client = IpcClient::connect(&socket_path)
        .await
        .with_context(|| format!("Cannot reach focusguardd at {}", socket_path.display()))?;

    let Some(command) = args.command.to_command() else {
        let mut events = client.subscribe().await?;
        loop {
            let event = events.next().await?;
            println!(
                "{}  {}",
                event.timestamp.format("%H:%M:%S"),
                render::event(&event.payload)
            );
        }
    };

    match client.send(command).await?.into_result() {
        Ok(payload) => {
            println!("{}", render::payload(&payload));
            Ok(())
        }
        Err(e) => bail!(e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
