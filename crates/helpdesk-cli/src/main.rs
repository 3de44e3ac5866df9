mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    actor::ActorSubcommand, config::ConfigSubcommand, kb::KbSubcommand,
    report::ReportSubcommand, sector::SectorSubcommand, ticket::TicketSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "helpdesk",
    about = "Helpdesk: tickets with automatic triage, a governed knowledge base, sectors and reports",
    version,
    propagate_version = true
)]
struct Cli {
    /// Helpdesk root (default: auto-detect from .helpdesk/)
    #[arg(long, global = true, env = "HELPDESK_ROOT")]
    root: Option<PathBuf>,

    /// Actor id to act as
    #[arg(long = "as", global = true, env = "HELPDESK_ACTOR", value_name = "ID")]
    actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a helpdesk in the current directory
    Init {
        /// Organization name (default: directory name)
        #[arg(long)]
        org: Option<String>,
    },

    /// Show the acting actor
    Whoami,

    /// Request an account; an administrator must approve it
    Register {
        #[arg(long)]
        name: String,
        #[arg(long = "number")]
        registration_number: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Administer actors and registrations
    Actor {
        #[command(subcommand)]
        subcommand: ActorSubcommand,
    },

    /// Open, answer and move tickets
    Ticket {
        #[command(subcommand)]
        subcommand: TicketSubcommand,
    },

    /// Knowledge base articles
    Kb {
        #[command(subcommand)]
        subcommand: KbSubcommand,
    },

    /// Manage the sector registry
    Sector {
        #[command(subcommand)]
        subcommand: SectorSubcommand,
    },

    /// Ticket reports and report schedules
    Report {
        #[command(subcommand)]
        subcommand: ReportSubcommand,
    },

    /// Inspect the helpdesk configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "3180")]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let actor = cli.actor.as_deref();

    let result = match cli.command {
        Commands::Init { org } => cmd::init::run(&root, org.as_deref(), cli.json),
        Commands::Whoami => cmd::actor::whoami(&root, actor, cli.json),
        Commands::Register {
            name,
            registration_number,
            email,
        } => cmd::actor::register(&root, name, registration_number, email, cli.json),
        Commands::Actor { subcommand } => cmd::actor::run(&root, actor, subcommand, cli.json),
        Commands::Ticket { subcommand } => cmd::ticket::run(&root, actor, subcommand, cli.json),
        Commands::Kb { subcommand } => cmd::kb::run(&root, actor, subcommand, cli.json),
        Commands::Sector { subcommand } => cmd::sector::run(&root, actor, subcommand, cli.json),
        Commands::Report { subcommand } => cmd::report::run(&root, actor, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
