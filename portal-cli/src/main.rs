use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gif_portal::config::ConfigError;
use gif_portal::keypair::KeypairError;
use gif_portal::wallet::{Approve, WalletError};
use gif_portal::{
    Controller, KeypairWallet, Network, RpcNetwork, Settings, TrustStore,
};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Signature, Signer};


type Result<T = (), E = Error> = core::result::Result<T, E>;

type Portal = Controller<KeypairWallet<StdinApprover>, RpcNetwork>;


/// Shares GIF links through the GIF Portal Solana program.
#[derive(Parser)]
#[command(name = "gif-portal", version)]
struct Cli {
    /// Settings file.
    #[arg(long, short, default_value = "gif-portal.toml")]
    config: PathBuf,

    /// Cluster to connect to: devnet, testnet, mainnet-beta, localnet or an
    /// RPC URL.
    #[arg(long)]
    cluster: Option<String>,

    /// Commitment level: processed, confirmed or finalized.
    #[arg(long)]
    commitment: Option<String>,

    /// IDL of the GIF program.
    #[arg(long)]
    idl: Option<PathBuf>,

    /// Address of the GIF program.
    #[arg(long)]
    program_id: Option<String>,

    /// Keypair file of the shared GIF account.
    #[arg(long)]
    base_account: Option<PathBuf>,

    /// Keypair file of the wallet.
    #[arg(long)]
    wallet: Option<PathBuf>,

    /// File with wallets which approved the portal.
    #[arg(long)]
    trust_store: Option<PathBuf>,

    /// Print program log messages of sent transactions.
    #[arg(long)]
    show_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Shows the portal (default).
    Show,
    /// Connects the wallet, asking for approval if needed.
    Connect,
    /// Creates the shared GIF account.
    Init,
    /// Submits a GIF link.
    Add { link: String },
    /// Generates keypair for a new shared GIF account.
    Keygen {
        /// Where to write the keypair; defaults to the configured base
        /// account path.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Overwrite existing keypair file.
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn overrides(&self) -> Settings {
        Settings {
            cluster: self.cluster.clone(),
            commitment: self.commitment.clone(),
            idl: self.idl.clone(),
            program_id: self.program_id.clone(),
            base_account: self.base_account.clone(),
            wallet: self.wallet.clone(),
            trust_store: self.trust_store.clone(),
        }
    }
}


fn main() -> ExitCode {
    init_logging();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}


fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}


/// Executes the program.
fn run(cli: Cli) -> Result {
    let settings = Settings::load(&cli.config)?.merge(cli.overrides());

    if let Some(Command::Keygen { out, force }) = &cli.command {
        let path = out.as_deref().unwrap_or(settings.base_account_path());
        let keypair = gif_portal::keypair::provision(path, *force)?;
        println!("Base account: {}", keypair.pubkey());
        println!("Keypair written to {}", path.display());
        return Ok(());
    }

    let config = settings.resolve()?;
    let network = RpcNetwork::from_config(&config);
    eprintln!("Cluster: {} ({})", config.cluster, network.url());
    let wallet = open_wallet(&settings)?;
    let mut portal = Controller::new(config, wallet, network);

    // Whatever the outcome, the view reflects it.
    let _ = portal.detect_and_reconnect();
    if let Some(alert) = &portal.state().alert {
        eprintln!("{alert}");
    }

    match cli.command.unwrap_or(Command::Show) {
        Command::Show | Command::Keygen { .. } => {}
        Command::Connect => {
            portal.connect_wallet()?;
        }
        Command::Init => {
            let signature = portal.create_account()?;
            report(&portal, &signature, cli.show_logs);
        }
        Command::Add { link } => {
            portal.set_input(link);
            let signature = portal.send_entry()?;
            report(&portal, &signature, cli.show_logs);
        }
    }

    show(&portal);
    Ok(())
}


/// Opens the wallet if its keypair file exists.
fn open_wallet(
    settings: &Settings,
) -> Result<Option<KeypairWallet<StdinApprover>>> {
    let path = settings.wallet_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no wallet keypair");
        return Ok(None);
    }
    let keypair = gif_portal::keypair::read_keypair(&path)?;
    let trust = TrustStore::open(settings.trust_store_path()?)?;
    Ok(Some(KeypairWallet::new(keypair, trust, StdinApprover)))
}


/// Prints transaction signature and, if requested, the program’s logs.
fn report(portal: &Portal, signature: &Signature, show_logs: bool) {
    eprintln!("Signature: {signature}");
    if !show_logs {
        return;
    }
    let config = portal.config();
    let program = portal.network().connect(&config.idl, config.program_id);
    match program.transaction_logs(signature) {
        Ok(messages) => {
            for msg in messages {
                println!("{msg}");
            }
        }
        Err(err) => eprintln!("Fetching transaction logs: {err}"),
    }
}


fn show(portal: &Portal) {
    let state = portal.state();
    if let Some(pubkey) = state.wallet_address() {
        eprintln!("Wallet: {pubkey}");
        eprintln!("Base account: {}", portal.base_account());
        if let gif_portal::GifList::Loaded { total_gifs, .. } = &state.gif_list
        {
            eprintln!("Total GIFs: {total_gifs}");
        }
    }
    println!("{}", portal.view());
}


/// Asks on the terminal whether to approve the connection.
struct StdinApprover;

impl Approve for StdinApprover {
    fn approve(&mut self, pubkey: &Pubkey) -> bool {
        eprint!("Allow GIF Portal to use wallet {pubkey}? [y/N] ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes")
    }
}


#[derive(derive_more::From, derive_more::Display)]
enum Error {
    Config(ConfigError),
    Keypair(KeypairError),
    Wallet(WalletError),
    Portal(gif_portal::Error),
}
