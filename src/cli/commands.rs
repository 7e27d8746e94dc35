use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "refurl", version = crate::VERSION, about = "Pick the best source and review URL for a cited work")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank, validate and select URLs for one reference
    Refine(RefineArgs),
    /// Validate URLs without ranking them
    Check(CheckArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct RefineArgs {
    /// JSON file with `reference` and `candidates`
    #[arg(short, long)]
    pub input: String,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// LLM provider: anthropic, openai, openai_compatible, local
    #[arg(long)]
    pub provider: Option<String>,

    /// LLM model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// LLM API key (or use env vars)
    #[arg(long)]
    pub api_key: Option<String>,

    /// OpenAI-compatible endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print the full outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write the outcome JSON to this file
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args, Clone)]
pub struct CheckArgs {
    /// URLs to validate
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Configuration file to validate
    pub config: String,
}
