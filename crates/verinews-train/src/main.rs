use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verinews_train::cli::{Cli, Commands};
use verinews_train::commands::{run_info, run_predict, run_train, TrainOptions};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            fake,
            real,
            output,
            config,
            seed,
            jobs,
            verbose,
        } => {
            init_logging(verbose);

            let options = TrainOptions {
                fake,
                real,
                output,
                config,
                seed,
                jobs,
            };
            let run = run_train(&options)?;

            println!();
            println!("{}", run.artifact.summary());
            println!("Documents: {} ({} dropped)", run.n_documents, run.n_dropped);
        }

        Commands::Predict {
            model,
            headline,
            content,
            verbose,
        } => {
            init_logging(verbose);

            let response = run_predict(&model, headline.as_deref(), content.as_deref());
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Info { model } => {
            init_logging(false);

            let metadata = run_info(&model)?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "verinews=debug"
    } else {
        "verinews=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
