//! Command-line interface for the pipeline and the demo server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::identifiers;
use crate::labeler::{self, DEFAULT_BATCH_SIZE};
use crate::model::SequenceClassifier;
use crate::split;
use crate::tokenizer::TokenizerAdapter;
use crate::ui::routes::{run_server, AppState};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Natural-product SMILES labeling pipeline and demo", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Label candidate molecules as natural or synthetic.
    Label {
        /// NPAtlas reference TSV with a compound_inchikey column.
        #[clap(long, value_parser)]
        npatlas: PathBuf,
        /// ChEMBL candidate TSV with Smiles and Inchi Key columns.
        #[clap(long, value_parser)]
        chembl: PathBuf,
        /// Output TSV (Smiles, Is_Nature_Product).
        #[clap(long, value_parser)]
        output: PathBuf,
        /// Rows processed per batch.
        #[clap(long, value_parser, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Build a class-balanced train/test split from a labeled TSV.
    Split {
        #[clap(long, value_parser)]
        input: PathBuf,
        #[clap(long, value_parser)]
        train_output: PathBuf,
        #[clap(long, value_parser)]
        test_output: PathBuf,
        /// Fraction of the balanced pool that goes to the test set.
        #[clap(long, value_parser, default_value_t = 0.2)]
        test_size: f64,
        #[clap(long, value_parser, default_value_t = 42)]
        seed: u64,
    },
    /// Serve the inference demo.
    Serve {
        /// Directory holding model.safetensors, tokenizer.json and
        /// config.json.
        #[clap(long, value_parser)]
        model_dir: PathBuf,
        #[clap(long, value_parser, default_value = "127.0.0.1")]
        host: String,
        #[clap(long, value_parser, default_value_t = 8080)]
        port: u16,
    },
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Label { npatlas, chembl, output, batch_size } => {
            let keys = identifiers::load_natural_identifiers(&npatlas)?;
            let stats = labeler::mark_candidates(&chembl, &keys, &output, batch_size)?;
            info!(
                "wrote {} labeled rows to {} ({} natural, {} non-natural, {} dropped)",
                stats.written,
                output.display(),
                stats.natural,
                stats.non_natural,
                stats.dropped
            );
            Ok(())
        }
        Command::Split { input, train_output, test_output, test_size, seed } => {
            let stats =
                split::prepare_train_test(&input, &train_output, &test_output, test_size, seed)?;
            info!(
                "wrote {} train rows to {} and {} test rows to {}",
                stats.train,
                train_output.display(),
                stats.test,
                test_output.display()
            );
            Ok(())
        }
        Command::Serve { model_dir, host, port } => {
            let config = ClassifierConfig::load(&model_dir.join("config.json"))?;
            let classifier = SequenceClassifier::load(&model_dir.join("model.safetensors"))?;
            let tokenizer =
                TokenizerAdapter::from_file(&model_dir.join("tokenizer.json"), config.max_length)?;
            info!("model loaded from {}", model_dir.display());

            let state = AppState { classifier, tokenizer, config };
            actix_web::rt::System::new()
                .block_on(run_server(state, &host, port))
                .map_err(Into::into)
        }
    }
}
