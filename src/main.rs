use np_smiles_pipeline::cli;

fn main() {
    env_logger::init();

    if let Err(e) = cli::run_cli() {
        eprintln!("Application error: {}", e);
        let mut current_err: Option<&(dyn std::error::Error + 'static)> =
            std::error::Error::source(&e);
        while let Some(source) = current_err {
            eprintln!("Caused by: {}", source);
            current_err = source.source();
        }
        std::process::exit(1);
    }
}
