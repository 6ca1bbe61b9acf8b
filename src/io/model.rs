//! Read/write model JSON files.
//!
//! A model file is the portable form of a fitted mixture: the components plus
//! run metadata (sample count, log-likelihood, iterations, stop reason). The
//! schema is `domain::ModelFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{FitResult, MixtureParameters, ModelFile};
use crate::error::AppError;

const TOOL_NAME: &str = "gmm";

impl ModelFile {
    pub fn from_fit(fit: &FitResult, n_samples: usize) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            n_samples,
            log_likelihood: fit.log_likelihood,
            iterations: fit.iterations,
            stop: fit.stop,
            components: fit.params.components(),
        }
    }

    /// Validated mixture parameters stored in the file.
    pub fn parameters(&self) -> Result<MixtureParameters, AppError> {
        MixtureParameters::from_components(&self.components)
            .map_err(|e| AppError::new(2, format!("Invalid model file: {e}")))
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, model)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopReason;
    use approx::assert_abs_diff_eq;

    fn sample_fit() -> FitResult {
        FitResult {
            params: MixtureParameters::new(vec![1.0, 4.0], vec![1.0, 4.0], vec![0.3, 0.7]).unwrap(),
            log_likelihood: -1234.5,
            iterations: 12,
            stop: StopReason::Converged,
        }
    }

    #[test]
    fn model_file_survives_disk() {
        let path = std::env::temp_dir().join(format!("gmm-model-{}.json", std::process::id()));
        let model = ModelFile::from_fit(&sample_fit(), 500);
        write_model_json(&path, &model).unwrap();

        let back = read_model_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back.tool, "gmm");
        assert_eq!(back.n_samples, 500);
        assert_eq!(back.stop, StopReason::Converged);
        let params = back.parameters().unwrap();
        let expected = sample_fit().params;
        for k in 0..2 {
            assert_abs_diff_eq!(params.means()[k], expected.means()[k], epsilon = 1e-12);
            assert_abs_diff_eq!(params.variances()[k], expected.variances()[k], epsilon = 1e-12);
            assert_abs_diff_eq!(params.weights()[k], expected.weights()[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn invalid_components_are_rejected() {
        let mut model = ModelFile::from_fit(&sample_fit(), 10);
        model.components[1].variance = -1.0;
        let err = model.parameters().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_model_json(Path::new("/nonexistent/gmm/model.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
