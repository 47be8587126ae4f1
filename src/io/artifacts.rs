//! Loading of the fitted model and scalers.
//!
//! An artifact directory holds:
//!
//! - `x_scaler.json`, `y_scaler.json`: `StandardScaler` parameters
//! - `model.json`: `MixtureDensityModel` parameters
//! - `schema.json` (optional): parameter order; defaults to `ParamSchema::planetary()`
//!
//! Artifacts are loaded once and then shared read-only by every request.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::app::pipeline::Components;
use crate::domain::ParamSchema;
use crate::error::AppError;
use crate::models::MixtureDensityModel;
use crate::scaling::StandardScaler;

/// Environment variable consulted when no `--artifacts` flag is given.
pub const ARTIFACTS_ENV: &str = "EXO_ARTIFACTS_DIR";

pub const X_SCALER_FILE: &str = "x_scaler.json";
pub const Y_SCALER_FILE: &str = "y_scaler.json";
pub const MODEL_FILE: &str = "model.json";
pub const SCHEMA_FILE: &str = "schema.json";

#[derive(Debug, Clone)]
pub struct Artifacts {
    pub schema: ParamSchema,
    pub x_scaler: StandardScaler,
    pub y_scaler: StandardScaler,
    pub model: MixtureDensityModel,
}

impl Artifacts {
    /// Load and cross-check every artifact in `dir`.
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let schema_path = dir.join(SCHEMA_FILE);
        let schema = if schema_path.exists() {
            read_json::<ParamSchema>(&schema_path)?
        } else {
            ParamSchema::planetary()
        };

        let artifacts = Self {
            schema,
            x_scaler: read_json(&dir.join(X_SCALER_FILE))?,
            y_scaler: read_json(&dir.join(Y_SCALER_FILE))?,
            model: read_json(&dir.join(MODEL_FILE))?,
        };
        artifacts.validate()?;

        debug!(
            dir = %dir.display(),
            inputs = artifacts.schema.input_len(),
            outputs = artifacts.schema.output_len(),
            components = artifacts.model.n_components(),
            "artifacts loaded"
        );
        Ok(artifacts)
    }

    /// Check that schema, scalers and model agree on dimensions.
    pub fn validate(&self) -> Result<(), AppError> {
        let bad = |what: &str, e: crate::error::PipelineError| AppError::new(2, format!("Invalid {what}: {e}"));
        self.schema.validate().map_err(|e| bad(SCHEMA_FILE, e))?;
        self.x_scaler.validate().map_err(|e| bad(X_SCALER_FILE, e))?;
        self.y_scaler.validate().map_err(|e| bad(Y_SCALER_FILE, e))?;
        self.model.validate().map_err(|e| bad(MODEL_FILE, e))?;

        let inputs = self.schema.input_len();
        let outputs = self.schema.output_len();
        let checks = [
            (X_SCALER_FILE, self.x_scaler.n_features(), inputs, "input"),
            (Y_SCALER_FILE, self.y_scaler.n_features(), outputs, "output"),
            (MODEL_FILE, self.model.input_dim, inputs, "input"),
            (MODEL_FILE, self.model.output_dim, outputs, "output"),
        ];
        for (file, got, want, side) in checks {
            if got != want {
                return Err(AppError::new(
                    2,
                    format!("{file} covers {got} {side} parameters but the schema has {want}"),
                ));
            }
        }
        Ok(())
    }

    pub fn components(&self) -> Components<'_> {
        Components {
            schema: &self.schema,
            x_scaler: &self.x_scaler,
            y_scaler: &self.y_scaler,
            model: &self.model,
        }
    }
}

/// Resolve the artifact directory from the flag, then `EXO_ARTIFACTS_DIR` (`.env` aware).
pub fn resolve_artifacts_dir(flag: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    dotenvy::dotenv().ok();
    std::env::var(ARTIFACTS_ENV).map(PathBuf::from).map_err(|_| {
        AppError::new(
            2,
            format!("No artifact directory: pass --artifacts or set {ARTIFACTS_ENV} (.env)."),
        )
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid JSON in '{}': {e}", path.display())))
}
