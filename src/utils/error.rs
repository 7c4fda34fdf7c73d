use thiserror::Error;

#[derive(Error, Debug)]
pub enum EspacioError {
    #[error("Validation error on '{field}' (value: '{value}'): {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Referential integrity error: '{field}' references missing row '{value}'")]
    ReferentialIntegrityError { field: String, value: String },

    #[error("Unique constraint error: id '{id}' already exists")]
    UniqueConstraintError { id: String },

    #[error("Hierarchy cycle: '{superior_id}' cannot be the superior space of '{espacio_id}'")]
    HierarchyCycleError {
        espacio_id: String,
        superior_id: String,
    },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Integrity,
    Lookup,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EspacioError {
    pub fn validation(field: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        EspacioError::ValidationError {
            field: field.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        EspacioError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EspacioError::ValidationError { .. } => ErrorCategory::Validation,
            EspacioError::ReferentialIntegrityError { .. }
            | EspacioError::UniqueConstraintError { .. }
            | EspacioError::HierarchyCycleError { .. } => ErrorCategory::Integrity,
            EspacioError::NotFound { .. } => ErrorCategory::Lookup,
            EspacioError::ConfigError { .. } => ErrorCategory::Configuration,
            EspacioError::IoError(_)
            | EspacioError::SerializationError(_)
            | EspacioError::CsvError(_) => ErrorCategory::System,
        }
    }

    /// Every rejected write leaves the store untouched, so only system
    /// failures are critical.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Lookup => ErrorSeverity::Low,
            ErrorCategory::Validation | ErrorCategory::Integrity => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EspacioError::ValidationError { field, .. } if field == "tipo" => format!(
                "Use one of: {}",
                crate::domain::model::TipoEspacio::ALL
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            EspacioError::ValidationError { field, .. } if field == "estatus" => {
                "Use 'Activo' or 'Inactivo'".to_string()
            }
            EspacioError::ValidationError { field, .. } => {
                format!("Correct the value of '{}' and retry", field)
            }
            EspacioError::ReferentialIntegrityError { field, .. } => {
                format!("Create the referenced row first or clear '{}'", field)
            }
            EspacioError::UniqueConstraintError { .. } => {
                "Omit the id to let one be generated, or pick another".to_string()
            }
            EspacioError::HierarchyCycleError { .. } => {
                "Choose a superior space that is not the space itself or one of its descendants"
                    .to_string()
            }
            EspacioError::NotFound { .. } => "Check the id with the 'listar' command".to_string(),
            EspacioError::ConfigError { .. } => {
                "Review espacios.toml and the command-line overrides".to_string()
            }
            EspacioError::IoError(_) => {
                "Check that the data path exists and is writable".to_string()
            }
            EspacioError::SerializationError(_) => {
                "The snapshot file is corrupt; restore it from a backup".to_string()
            }
            EspacioError::CsvError(_) => "Check the export destination".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EspacioError::ValidationError { field, reason, .. } => {
                format!("Invalid value for '{}': {}", field, reason)
            }
            EspacioError::ReferentialIntegrityError { field, value } => {
                format!("'{}' points to '{}', which does not exist", field, value)
            }
            EspacioError::UniqueConstraintError { id } => {
                format!("A space with id '{}' already exists", id)
            }
            EspacioError::HierarchyCycleError {
                espacio_id,
                superior_id,
            } => format!(
                "Placing '{}' under '{}' would make it its own ancestor",
                espacio_id, superior_id
            ),
            EspacioError::NotFound { entity, id } => format!("{} '{}' does not exist", entity, id),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EspacioError>;
