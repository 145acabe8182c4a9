use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "verinews-server")]
#[command(about = "Verinews fake news prediction server", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "server.yaml")]
    pub config: String,

    /// Model artifact directory
    #[arg(short, long, env = "VERINEWS_MODEL_DIR")]
    pub model_dir: Option<String>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
