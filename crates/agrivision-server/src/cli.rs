use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "agrivision-server")]
#[command(author, version, about = "Agrivision fertilizer recommendation API", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Model artifact (SafeTensors) path
    #[arg(short, long, env = "AGRIVISION_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Secret used to sign access tokens
    #[arg(long, env = "AGRIVISION_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}
