use crate::cli::SplitArgs;
use crate::error::{CliError, Result};
use autoreact::core::io::ensemble::EnsembleSplitter;
use tracing::info;

pub fn run(args: SplitArgs) -> Result<()> {
    if args.max_count == Some(0) {
        return Err(CliError::Argument("--max must be at least 1".to_string()));
    }
    std::fs::create_dir_all(&args.output_dir)?;

    let files = EnsembleSplitter::new()
        .prefix(args.prefix.as_str())
        .max_count(args.max_count)
        .split(&args.ensemble, &args.output_dir)
        .map_err(|e| CliError::FileParsing {
            path: args.ensemble.clone(),
            source: e.into(),
        })?;

    info!("Split {:?} into {} file(s).", args.ensemble, files.len());
    for file in &files {
        println!("{}", file.display());
    }
    Ok(())
}
