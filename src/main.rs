use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use college_events::{
    AppState, Navigation, TokenStoreState,
    config::{AppConfig, Env},
    models::{Event, EventStatusFilter, RegisterRequest, Role},
    notify::{Notice, NoticeLevel},
    storage::{FileTokenStore, MemoryTokenStore},
    views::{
        dashboard::DashboardScreen, event_details::EventDetailsScreen, events::EventsScreen,
        my_events::MyEventsScreen,
    },
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "College events client")]
struct Args {
    /// Keep the session in memory only; nothing is read from or written to disk.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: Option<Role>,
    },
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List events, optionally filtered.
    Events {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        status: EventStatusFilter,
    },
    /// Show one event.
    Event { id: i64 },
    /// Register for an event.
    Join { id: i64 },
    /// Leave feedback on an event you registered for.
    Feedback { id: i64, text: String },
    /// Events you are registered for.
    MyEvents,
    Dashboard,
    /// Show where the navigator lands for a path.
    Open { path: String },
}

/// main
///
/// Loads configuration, installs logging, restores any persisted session
/// and runs one command against the backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let config = AppConfig::load();

    // Logs go to stderr so command output stays pipeable.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "college_events=debug,reqwest=info".into());
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    tracing::info!(env = ?config.env, api = %config.api_url, "client starting");

    let store: TokenStoreState = if args.ephemeral {
        Arc::new(MemoryTokenStore::new())
    } else {
        Arc::new(FileTokenStore::new(config.token_path.clone()))
    };
    let (state, mut notices) =
        AppState::build(config, store).context("failed to initialise client")?;

    state.auth.restore_session().await?;

    let result = run(&state, args.command).await;
    drain_notices(&mut notices);
    result
}

async fn run(state: &AppState, command: Command) -> anyhow::Result<()> {
    let ctx = state.view_context();
    match command {
        Command::Login { email, password } => {
            let session = state.auth.login(&email, &password).await?;
            if let Some(user) = session.user {
                println!("Signed in as {} ({})", user.full_name, user.role);
            }
        }
        Command::Register {
            name,
            email,
            password,
            role,
        } => {
            let req = RegisterRequest {
                full_name: name,
                email,
                password,
                role,
            };
            let session = state.auth.register(req).await?;
            if let Some(user) = session.user {
                println!("Welcome, {} ({})", user.full_name, user.role);
            }
        }
        Command::Logout => {
            state.auth.logout();
            println!("Signed out");
        }
        Command::Whoami => match state.session.user() {
            Some(user) => println!("{} <{}> {}", user.full_name, user.email, user.role),
            None => println!("Not signed in"),
        },
        Command::Events { search, status } => {
            require_session(state)?;
            let mut screen = EventsScreen::new(ctx);
            screen.filter.search = search;
            screen.filter.status = status;
            screen.load().await?;
            for event in screen.visible() {
                print_event_line(event);
            }
        }
        Command::Event { id } => {
            require_session(state)?;
            let mut screen = EventDetailsScreen::new(ctx, id);
            screen.load().await?;
            if let Some(event) = screen.event() {
                print_event_line(event);
                println!("  {}", event.description);
                println!("  {} - {} at {}", event.start_time, event.end_time, event.venue);
                println!("  organizer: {}, capacity: {}", event.organizer, event.capacity);
                if let Some(url) = screen.image_url() {
                    println!("  image: {}", url);
                }
                if screen.is_registered() {
                    println!("  you are registered");
                } else if screen.can_register() {
                    println!("  registration open");
                }
            }
        }
        Command::Join { id } => {
            require_session(state)?;
            let mut screen = EventDetailsScreen::new(ctx, id);
            screen.load().await?;
            screen.register().await?;
        }
        Command::Feedback { id, text } => {
            require_session(state)?;
            let mut screen = EventDetailsScreen::new(ctx, id);
            screen.load().await?;
            screen.submit_feedback(&text).await?;
        }
        Command::MyEvents => {
            require_session(state)?;
            let mut screen = MyEventsScreen::new(ctx);
            screen.load().await?;
            if screen.entries().is_empty() {
                println!("No registrations");
            }
            for entry in screen.entries() {
                print_event_line(&entry.event);
            }
        }
        Command::Dashboard => {
            require_session(state)?;
            let mut screen = DashboardScreen::new(ctx);
            screen.load().await?;
            if let Some(data) = screen.data() {
                let s = data.stats;
                println!(
                    "events: {} total, {} approved, {} pending",
                    s.total_events, s.approved_events, s.pending_events
                );
                if state.session.is_student() || state.session.is_faculty() {
                    println!("registered: {}", s.registered_events);
                }
                println!("recent:");
                for event in &data.recent {
                    print_event_line(event);
                }
            }
            if let Some(path) = screen.create_event_link() {
                println!("create an event: college-events open {}", path);
            }
        }
        Command::Open { path } => {
            let mut navigator = state.navigator();
            match navigator.navigate(&path)? {
                Navigation::Arrived(location) => {
                    println!("{} -> {} ({:?})", path, location.path, location.screen)
                }
                Navigation::Pending { requested } => println!("{} pending", requested),
            }
        }
    }
    Ok(())
}

fn require_session(state: &AppState) -> anyhow::Result<()> {
    if !state.session.is_authenticated() {
        bail!("not signed in; run `college-events login` first");
    }
    Ok(())
}

fn print_event_line(event: &Event) {
    let status = if event.approved { "approved" } else { "pending" };
    println!(
        "#{:<4} {:<32} {}  [{}]",
        event.id, event.name, event.start_time, status
    );
}

fn drain_notices(notices: &mut mpsc::UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{}] {}", tag, notice.message);
    }
}
