use std::error;
use std::fmt;

/// Convenient result type for sync-engine operations using [`SyncError`] as the error type.
pub type SyncResult<T> = Result<T, SyncError>;

/// Main error type for sync-engine operations.
///
/// [`SyncError`] can represent a single error, an error with additional detail,
/// or multiple aggregated errors. Aggregation matters here: a fan-out write
/// applies many rows per source object and reports every row failure in one
/// error value.
#[derive(Debug, Clone)]
pub struct SyncError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
///
/// Users should not interact with this type directly but use [`SyncError`]
/// methods instead.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Error with kind and static description.
    WithDescription(ErrorKind, &'static str),
    /// Error with kind, static description, and dynamic detail.
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
    /// Multiple aggregated errors.
    Many(Vec<SyncError>),
}

/// Specific categories of errors that can occur while syncing cluster state.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Upstream errors.
    SourceConnectionFailed,
    SourceQueryFailed,
    SourceSyncTimeout,
    SourceLookupFailed,

    // Table and row errors.
    TableAlreadyExists,
    TableNotFound,
    RowNotFound,
    SchemaMismatch,

    // Data errors.
    InvalidData,
    ConversionError,
    DeserializationError,

    // Configuration & IO errors.
    ConfigError,
    IoError,

    // State & workflow errors.
    InvalidState,
    WorkerPanic,

    // Unknown / uncategorized.
    Unknown,
}

impl SyncError {
    /// Creates a [`SyncError`] containing multiple aggregated errors.
    pub fn many(errors: Vec<SyncError>) -> SyncError {
        SyncError {
            repr: ErrorRepr::Many(errors),
        }
    }

    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or
    /// [`ErrorKind::Unknown`] if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
            ErrorRepr::Many(ref errors) => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => vec![kind],
            ErrorRepr::Many(ref errors) => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For multiple errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::Many(ref errors) => errors.iter().find_map(|e| e.detail()),
            _ => None,
        }
    }
}

impl PartialEq for SyncError {
    fn eq(&self, other: &SyncError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::WithDescription(kind_a, _), ErrorRepr::WithDescription(kind_b, _)) => {
                kind_a == kind_b
            }
            (
                ErrorRepr::WithDescriptionAndDetail(kind_a, _, _),
                ErrorRepr::WithDescriptionAndDetail(kind_b, _, _),
            ) => kind_a == kind_b,
            (ErrorRepr::Many(errors_a), ErrorRepr::Many(errors_b)) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;

                Ok(())
            }
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;
                f.write_str(" -> ")?;
                detail.fmt(f)?;

                Ok(())
            }
            ErrorRepr::Many(ref errors) => {
                if errors.is_empty() {
                    write!(f, "Multiple errors occurred (empty)")?;
                } else if errors.len() == 1 {
                    errors[0].fmt(f)?;
                } else {
                    write!(f, "Multiple errors occurred ({} total):", errors.len())?;
                    for (i, error) in errors.iter().enumerate() {
                        write!(f, "\n  {}: {}", i + 1, error)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl error::Error for SyncError {}

/// Creates a [`SyncError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SyncError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

/// Creates a [`SyncError`] from an error kind, static description, and dynamic detail.
impl From<(ErrorKind, &'static str, String)> for SyncError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

/// Creates a [`SyncError`] from a vector of errors for aggregation.
impl<E> From<Vec<E>> for SyncError
where
    E: Into<SyncError>,
{
    fn from(errors: Vec<E>) -> SyncError {
        SyncError {
            repr: ErrorRepr::Many(errors.into_iter().map(Into::into).collect()),
        }
    }
}

/// Converts [`std::io::Error`] to [`SyncError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::IoError,
                "I/O error occurred",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`serde_json::Error`] to [`SyncError`] with appropriate error kind.
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> SyncError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            _ => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

/// Converts [`reqwest::Error`] to [`SyncError`] with appropriate error kind.
///
/// Connection-level failures map to [`ErrorKind::SourceConnectionFailed`],
/// body decoding failures to [`ErrorKind::DeserializationError`], everything
/// else to [`ErrorKind::SourceQueryFailed`].
impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> SyncError {
        let (kind, description) = if err.is_connect() || err.is_timeout() {
            (
                ErrorKind::SourceConnectionFailed,
                "metrics endpoint unreachable",
            )
        } else if err.is_decode() {
            (
                ErrorKind::DeserializationError,
                "metrics response decoding failed",
            )
        } else {
            (ErrorKind::SourceQueryFailed, "metrics query failed")
        };

        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}
