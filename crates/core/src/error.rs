#![forbid(unsafe_code)]

/// Violation of a data-model invariant, detected before any mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainError {
    EmptyName,
    EmptyContent,
    UnknownComponentKind(String),
    UnknownRelationshipType(String),
    UnknownTaskStatus(String),
    UnknownPriority(String),
    UnknownOperation(String),
    UnknownEntityKind(String),
    InternalRelationshipType(String),
    ProgressOutOfRange(f64),
    ProbabilityOutOfRange(f64),
    TimeOrderNotPositive(i64),
    MetadataNotScalar { key: String },
    MissingField(&'static str),
    InvalidTimestamp(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyContent => write!(f, "content must not be empty"),
            Self::UnknownComponentKind(value) => write!(f, "unknown component kind: {value}"),
            Self::UnknownRelationshipType(value) => {
                write!(f, "unknown relationship type: {value}")
            }
            Self::UnknownTaskStatus(value) => write!(f, "unknown task status: {value}"),
            Self::UnknownPriority(value) => write!(f, "unknown priority: {value}"),
            Self::UnknownOperation(value) => write!(f, "unknown change operation: {value}"),
            Self::UnknownEntityKind(value) => write!(f, "unknown entity kind: {value}"),
            Self::InternalRelationshipType(value) => {
                write!(f, "relationship type {value} is reserved for internal use")
            }
            Self::ProgressOutOfRange(value) => {
                write!(f, "progress must be within [0, 1], got {value}")
            }
            Self::ProbabilityOutOfRange(value) => {
                write!(f, "probability must be within [0, 1], got {value}")
            }
            Self::TimeOrderNotPositive(value) => {
                write!(f, "timeOrder must be a positive integer, got {value}")
            }
            Self::MetadataNotScalar { key } => {
                write!(f, "metadata value for {key:?} must be a string, number, or boolean")
            }
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::InvalidTimestamp(value) => write!(f, "invalid timestamp: {value}"),
        }
    }
}

impl std::error::Error for DomainError {}
