use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use optin::{build_attributes, run_decode, run_sign, run_user_id, run_verify, CliConfig, CliError};
use optin_sign::TokenCodec;

/// optin: sign and verify user properties for opt-in flows
#[derive(Parser, Debug)]
#[command(name = "optin", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read the signing key from this environment variable instead of the
    /// configured source
    #[arg(long, global = true)]
    key_env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign an attribute map and print the token
    Sign {
        /// Attribute as key=value (repeatable, applied in order)
        #[arg(short, long = "attr", value_name = "KEY=VALUE")]
        attrs: Vec<String>,

        /// Flat JSON object of attributes, applied before --attr
        #[arg(long)]
        json: Option<String>,
    },

    /// Check a token; exits non-zero when it is not authentic
    Verify {
        token: String,
    },

    /// Verify a token and print its attributes as JSON
    Decode {
        token: String,
    },

    /// Print the user id carried by signed properties
    UserId {
        /// Signed user properties
        properties: Option<String>,

        /// Id to use when the properties carry none
        #[arg(long)]
        fallback: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("optin=debug,optin_sign=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("optin=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<CliConfig, CliError> {
    match path {
        Some(p) => CliConfig::load(p),
        None => CliConfig::load(&CliConfig::default_config_path()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but the answer was negative.
fn run(cli: Cli) -> Result<bool, CliError> {
    let codec = TokenCodec::new();

    match cli.command {
        Commands::Sign { attrs, json } => {
            let config = load_config(cli.config.as_ref())?;
            let key = config.resolve_key(cli.key_env.as_deref())?;
            let attributes = build_attributes(json.as_deref(), &attrs)?;
            println!("{}", run_sign(&codec, &attributes, &key)?);
            Ok(true)
        }
        Commands::Verify { token } => {
            let config = load_config(cli.config.as_ref())?;
            let key = config.resolve_key(cli.key_env.as_deref())?;
            let valid = run_verify(&codec, &token, &key);
            println!("{}", if valid { "valid" } else { "invalid" });
            Ok(valid)
        }
        Commands::Decode { token } => {
            let config = load_config(cli.config.as_ref())?;
            let key = config.resolve_key(cli.key_env.as_deref())?;
            println!("{}", run_decode(&codec, &token, &key)?);
            Ok(true)
        }
        Commands::UserId {
            properties,
            fallback,
        } => {
            println!("{}", run_user_id(properties.as_deref(), fallback.as_deref())?);
            Ok(true)
        }
    }
}
