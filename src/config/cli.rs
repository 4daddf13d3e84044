use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "contract-scanner")]
#[command(about = "Scans an explorer for new token pairs and screens their contracts with a language model")]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults to ./contract-scanner.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch the newest pairs and print a verdict for each
    Scan {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Keep scanning until interrupted
        #[arg(long)]
        watch: bool,

        /// Seconds between scans in watch mode (overrides scan.interval_seconds)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Analyze a single contract address
    Check { address: String },

    /// Show or update the stored API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum KeysAction {
    Show,
    Set {
        #[arg(long)]
        explorer_key: Option<String>,

        #[arg(long)]
        model_key: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}
