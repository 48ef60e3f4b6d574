//! Output filename composition.
//!
//! The six naming fields are concatenated in a fixed order with no
//! separators and a `.csv` suffix:
//!
//! ```
//! use endolog::naming::NamingFields;
//!
//! let fields = NamingFields::default();
//! assert_eq!(fields.compose(), "CRB1Y1E01S1T1.csv");
//! ```
//!
//! No escaping happens here. A field holding characters the filesystem
//! rejects surfaces later as an error when the file is created.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extension appended to every composed name.
pub const CSV_EXTENSION: &str = ".csv";

/// Default output folder, relative to the working directory.
pub const DEFAULT_OUTPUT_FOLDER: &str = "Endo_Data";

/// Identifies one of the six naming fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingField {
    ExperimentType,
    ModelType,
    Year,
    Experience,
    Subject,
    Trial,
}

impl NamingField {
    /// All fields in composition order.
    pub const ALL: [NamingField; 6] = [
        Self::ExperimentType,
        Self::ModelType,
        Self::Year,
        Self::Experience,
        Self::Subject,
        Self::Trial,
    ];

    /// Form label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ExperimentType => "Experiment Type",
            Self::ModelType => "Model Type",
            Self::Year => "Year",
            Self::Experience => "Experience",
            Self::Subject => "Subject",
            Self::Trial => "Trial",
        }
    }

    /// Example value shown next to the input.
    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            Self::ExperimentType => "e.g., CR",
            Self::ModelType => "e.g., B1",
            Self::Year => "e.g., Y1",
            Self::Experience => "e.g., E01",
            Self::Subject => "e.g., S1",
            Self::Trial => "e.g., T1",
        }
    }
}

impl fmt::Display for NamingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The six free-text values that make up an output filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingFields {
    pub experiment_type: String,
    pub model_type: String,
    pub year: String,
    pub experience: String,
    pub subject: String,
    pub trial: String,
}

impl Default for NamingFields {
    fn default() -> Self {
        Self {
            experiment_type: "CR".to_string(),
            model_type: "B1".to_string(),
            year: "Y1".to_string(),
            experience: "E01".to_string(),
            subject: "S1".to_string(),
            trial: "T1".to_string(),
        }
    }
}

impl NamingFields {
    #[must_use]
    pub fn get(&self, field: NamingField) -> &str {
        match field {
            NamingField::ExperimentType => &self.experiment_type,
            NamingField::ModelType => &self.model_type,
            NamingField::Year => &self.year,
            NamingField::Experience => &self.experience,
            NamingField::Subject => &self.subject,
            NamingField::Trial => &self.trial,
        }
    }

    pub fn get_mut(&mut self, field: NamingField) -> &mut String {
        match field {
            NamingField::ExperimentType => &mut self.experiment_type,
            NamingField::ModelType => &mut self.model_type,
            NamingField::Year => &mut self.year,
            NamingField::Experience => &mut self.experience,
            NamingField::Subject => &mut self.subject,
            NamingField::Trial => &mut self.trial,
        }
    }

    pub fn set(&mut self, field: NamingField, value: impl Into<String>) {
        *self.get_mut(field) = value.into();
    }

    /// Concatenate the fields in order and append `.csv`.
    #[must_use]
    pub fn compose(&self) -> String {
        let mut name: String = NamingField::ALL.iter().map(|f| self.get(*f)).collect();
        name.push_str(CSV_EXTENSION);
        name
    }
}

/// Join an output folder and a filename. No existence check.
#[must_use]
pub fn full_path(folder: &Path, filename: &str) -> PathBuf {
    folder.join(filename)
}
