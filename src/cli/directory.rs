//! File-backed component directory
//!
//! Reads a YAML or JSON export of the production database:
//!
//! ```yaml
//! components:
//!   - code: obj-1
//!     serialNumber: 20UPGM24220370
//!     currentStage: { code: MODULE/ASSEMBLY }
//!     componentType: { code: MODULE }
//!     currentLocation: { code: GL }
//!     tests:
//!       - code: MASS_MEASUREMENT
//!         testRuns: [{ id: run-1 }]
//! test_runs:
//!   - id: run-1
//!     results: [{ code: MASS, value: 1.92 }]
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::core::aggregate::{ComponentDirectory, LookupError};
use crate::entities::component::{ComponentRecord, TestRun};

/// Component directory loaded from a file
#[derive(Debug, Default, Deserialize)]
pub struct FileDirectory {
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    pub test_runs: Vec<TestRun>,
}

impl FileDirectory {
    /// Load a directory export; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let malformed = |reason: String| LookupError::Malformed {
            id: path.display().to_string(),
            reason,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&contents).map_err(|e| malformed(e.to_string()))
        } else {
            serde_yml::from_str(&contents).map_err(|e| malformed(e.to_string()))
        }
    }
}

impl ComponentDirectory for FileDirectory {
    fn component(&self, id: &str) -> Result<ComponentRecord, LookupError> {
        let matches: Vec<&ComponentRecord> = self
            .components
            .iter()
            .filter(|c| {
                c.serial_number.eq_ignore_ascii_case(id)
                    || c.alternative_identifier
                        .as_deref()
                        .is_some_and(|alt| alt.eq_ignore_ascii_case(id))
            })
            .collect();
        match matches.as_slice() {
            [] => Err(LookupError::NotFound(id.to_string())),
            [one] => Ok((*one).clone()),
            many => Err(LookupError::Ambiguous {
                id: id.to_string(),
                count: many.len(),
            }),
        }
    }

    fn test_run(&self, id: &str) -> Result<TestRun, LookupError> {
        self.test_runs
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(format!("test run {}", id)))
    }
}
