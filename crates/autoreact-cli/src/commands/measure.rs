use crate::cli::MeasureArgs;
use crate::error::{CliError, Result};
use autoreact::core::utils::geometry::{EndpointClass, distance_in_file};

pub fn run(args: MeasureArgs) -> Result<()> {
    if !(args.threshold.is_finite() && args.threshold > 0.0) {
        return Err(CliError::Argument(format!(
            "--threshold must be a positive distance, got {}",
            args.threshold
        )));
    }
    let distance = distance_in_file(&args.structure, args.first, args.second).map_err(|e| {
        CliError::FileParsing {
            path: args.structure.clone(),
            source: e.into(),
        }
    })?;
    let class = EndpointClass::classify(distance, args.threshold);
    println!(
        "{}: d({}, {}) = {:.4} Å -> {}",
        args.structure.display(),
        args.first,
        args.second,
        distance,
        class
    );
    Ok(())
}
