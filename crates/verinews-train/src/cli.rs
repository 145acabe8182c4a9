use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "verinews-train")]
#[command(author, version, about = "Train and query Verinews fake news models")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train every classifier family and save the best model
    Train {
        /// CSV file of fake articles
        #[arg(long, default_value = "Fake.csv")]
        fake: PathBuf,

        /// CSV file of real articles
        #[arg(long, default_value = "True.csv")]
        real: PathBuf,

        /// Output directory for the model artifact
        #[arg(short, long, default_value = "model")]
        output: PathBuf,

        /// Training config file (defaults are used when it does not exist)
        #[arg(short, long, default_value = "./training.yaml")]
        config: PathBuf,

        /// Seed for shuffling, splitting and the random forest
        #[arg(short, long)]
        seed: Option<u64>,

        /// Worker threads for random forest training (0 = all cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Classify one article with a saved model
    Predict {
        /// Model artifact directory
        #[arg(short, long, default_value = "model")]
        model: PathBuf,

        /// Article headline
        #[arg(long)]
        headline: Option<String>,

        /// Article body
        #[arg(long)]
        content: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the metadata of a saved model
    Info {
        /// Model artifact directory
        #[arg(short, long, default_value = "model")]
        model: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["verinews-train", "train"]).unwrap();
        match cli.command {
            Commands::Train {
                fake,
                real,
                output,
                seed,
                jobs,
                verbose,
                ..
            } => {
                assert_eq!(fake, PathBuf::from("Fake.csv"));
                assert_eq!(real, PathBuf::from("True.csv"));
                assert_eq!(output, PathBuf::from("model"));
                assert_eq!(seed, None);
                assert_eq!(jobs, None);
                assert!(!verbose);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_predict_arguments() {
        let cli = Cli::try_parse_from([
            "verinews-train",
            "predict",
            "--model",
            "out",
            "--headline",
            "Senate passes budget",
        ])
        .unwrap();
        match cli.command {
            Commands::Predict {
                model,
                headline,
                content,
                ..
            } => {
                assert_eq!(model, PathBuf::from("out"));
                assert_eq!(headline.as_deref(), Some("Senate passes budget"));
                assert_eq!(content, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["verinews-train", "serve"]).is_err());
    }
}
