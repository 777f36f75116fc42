//! Synapse CLI - Command-line interface for governance ledgers, decisions and proof bundles.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod path;

use commands::{canonicalize, decide, enforce, health, list, proof, status, verify, AuthorityArgs};

#[derive(Parser)]
#[command(name = "synapse")]
#[command(about = "Synapse governance ledger, decision and proof bundle CLI")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entries in a ledger journal
    List {
        /// Path to journal file
        journal: String,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
        /// Stop after reading N entries (default: unlimited)
        #[arg(long)]
        max_entries: Option<u64>,
        /// Reject journals larger than SIZE bytes (default: unlimited)
        #[arg(long)]
        max_size: Option<u64>,
    },
    /// Verify the hash chain of a ledger journal
    Verify {
        /// Path to journal file
        journal: String,
        /// Exit with error code if the chain is broken
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Reject journals larger than SIZE bytes (default: unlimited)
        #[arg(long)]
        max_size: Option<u64>,
    },
    /// Show ledger status, or the redacted snapshot
    Status {
        /// Path to journal file
        journal: String,
        /// Print every entry without its payload instead
        #[arg(long)]
        snapshot: bool,
    },
    /// Report governance health
    Health {
        /// Path to journal file
        journal: String,
        /// Kernel freeze declaration (JSON)
        #[arg(long)]
        freeze: Option<String>,
        /// Exit with error code when degraded
        #[arg(long)]
        strict: bool,
    },
    /// Show canonical form of input JSON
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
        /// Also print the SHA-256 of the canonical form
        #[arg(long)]
        hash: bool,
    },
    /// Evaluate an intent, sign the decision and record it
    Decide {
        #[command(flatten)]
        authority: AuthorityArgs,
        /// Intent JSON, @file, or - for stdin
        #[arg(long)]
        intent: String,
        /// Security context JSON, @file, or - for stdin
        #[arg(long)]
        context: String,
    },
    /// Verify a decision record against a proposed intent
    Enforce {
        #[command(flatten)]
        authority: AuthorityArgs,
        /// Decision record JSON, @file, or - for stdin
        #[arg(long)]
        record: String,
        /// Proposed intent JSON, @file, or - for stdin
        #[arg(long)]
        intent: String,
        /// Exit with error code unless the verdict is ALLOW
        #[arg(long)]
        strict: bool,
    },
    /// Create or verify proof bundles
    Proof {
        #[command(subcommand)]
        command: ProofCommands,
    },
}

#[derive(Subcommand)]
enum ProofCommands {
    /// Issue a proof bundle for a recorded decision
    Create {
        #[command(flatten)]
        authority: AuthorityArgs,
        /// Decision record JSON, @file, or - for stdin
        #[arg(long)]
        record: String,
    },
    /// Verify a proof bundle
    Verify {
        /// Proof bundle JSON, @file, or - for stdin
        bundle: String,
        /// Ed25519 public key (hex) of the issuing authority
        #[arg(long)]
        public_key: Option<String>,
        /// Governance configuration file naming the signer kind
        #[arg(long)]
        config: Option<String>,
        /// Signer seed of the issuing authority
        #[arg(long, env = "SYNAPSE_SIGNER_SEED", hide_env_values = true)]
        seed: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::List {
            journal,
            json,
            max_entries,
            max_size,
        } => list::run(journal, json, max_entries, max_size),
        Commands::Verify {
            journal,
            strict,
            json,
            max_size,
        } => verify::run(journal, strict, json, max_size),
        Commands::Status { journal, snapshot } => status::run(journal, snapshot),
        Commands::Health {
            journal,
            freeze,
            strict,
        } => health::run(journal, freeze, strict),
        Commands::Canonicalize { input, hash } => canonicalize::run(input, hash),
        Commands::Decide {
            authority,
            intent,
            context,
        } => decide::run(authority, intent, context),
        Commands::Enforce {
            authority,
            record,
            intent,
            strict,
        } => enforce::run(authority, record, intent, strict),
        Commands::Proof { command } => match command {
            ProofCommands::Create { authority, record } => proof::create(authority, record),
            ProofCommands::Verify {
                bundle,
                public_key,
                config,
                seed,
            } => proof::verify(bundle, public_key, config, seed),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
