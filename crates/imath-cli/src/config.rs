#![forbid(unsafe_code)]

use std::path::Path;

use imath_text::MathOptions;
use tracing::debug;

use crate::error::Result;

/// Read options from a JSON file, or the defaults when no file is given.
///
/// Missing fields take their default values. Evaluation is always switched
/// on: the command line exists to show results.
pub fn load_options(path: Option<&Path>) -> Result<MathOptions> {
    let mut options = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            let options: MathOptions = serde_json::from_str(&content)?;
            debug!(message = "config.loaded", path = %path.display());
            options
        }
        None => MathOptions::default(),
    };
    options.evaluation = true;
    Ok(options)
}
