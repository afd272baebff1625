use clap::{Parser, Subcommand};
use tracing::info;

use shrmpl_conf::ConfigStore;

#[derive(Parser)]
#[command(name = "shrmpl-conf-cli", version, about = "Read and edit a key = value config file")]
struct Cli {
    /// Path to the config file
    file: String,

    /// DEBUG, INFO, WARN or ERROR
    #[arg(long, default_value = "WARN")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the value for KEY, or DEFAULT if it is not set
    Get {
        key: String,
        #[arg(default_value = "")]
        default: String,
    },
    /// Set KEY to VALUE and rewrite the file
    Set { key: String, value: String },
    /// Print the number of entries
    Count,
    /// Print every entry
    Dump,
}

// Client application reports config errors to the user and exits non-zero
// instead of panicking, so scripts can branch on the status code
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so values printed on stdout stay scriptable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(match cli.log_level.to_uppercase().as_str() {
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => tracing::Level::WARN,
        })
        .init();

    let store = ConfigStore::new(&cli.file);

    let result = match cli.command {
        Command::Get { key, default } => store.get(&key, &default).map(|value| println!("{}", value)),
        Command::Set { key, value } => {
            info!("Setting {} in {}", key, cli.file);
            store.set(key, value).map(|_| println!("OK"))
        }
        Command::Count => store.line_count().map(|count| println!("{}", count)),
        Command::Dump => {
            let stdout = std::io::stdout();
            store.dump_to(&mut stdout.lock())
        }
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
