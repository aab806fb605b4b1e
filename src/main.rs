use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use pyro::cli::{
    handle_config, handle_document_command, handle_init, handle_passwd, handle_serve,
    handle_status, open_unlocked, DocumentCommands,
};
use pyro::config::{PyroPaths, Settings};
use pyro::crypto::SecureString;

#[derive(Parser)]
#[command(
    name = "pyro",
    version,
    about = "Password-locked vault for named text documents",
    long_about = "Pyro keeps named text documents in a single file encrypted with \
                  a key derived from your password (Argon2id + AES-256-GCM). \
                  Nothing about the documents is readable while the vault is locked."
)]
struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = "PYRO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Vault password (prompted for when omitted)
    #[arg(long, global = true, env = "PYRO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up a new vault with a password
    Init,

    /// Show whether the vault exists and is locked
    Status,

    /// Show current configuration and paths
    Config,

    #[command(flatten)]
    Document(DocumentCommands),

    /// Re-encrypt the vault under a new password
    Passwd {
        /// New password (prompted for when omitted)
        #[arg(long, env = "PYRO_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },

    /// Serve JSON commands on stdin/stdout
    Serve,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = match cli.data_dir {
        Some(dir) => PyroPaths::with_base_dir(dir),
        None => PyroPaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;
    pyro::logging::init(&settings);

    let password = cli.password.map(SecureString::from);

    match cli.command {
        Some(Commands::Init) => handle_init(&paths, &settings, password.as_ref())?,
        Some(Commands::Status) => handle_status(&paths, &settings)?,
        Some(Commands::Config) => handle_config(&paths, &settings)?,
        Some(Commands::Document(cmd)) => {
            let (vault, password) = open_unlocked(&paths, &settings, password.as_ref())?;
            handle_document_command(&vault, &password, cmd)?;
        }
        Some(Commands::Passwd { new_password }) => {
            let new_password = new_password.map(SecureString::from);
            handle_passwd(&paths, &settings, password.as_ref(), new_password.as_ref())?;
        }
        Some(Commands::Serve) => handle_serve(&paths, &settings)?,
        None => {
            println!("Pyro - password-locked document vault");
            println!();
            println!("Run 'pyro --help' for usage information.");
            println!("Run 'pyro init' to create a vault.");
        }
    }

    Ok(())
}
