/// Creates a [`SyncError`](crate::error::SyncError) with the given kind and description,
/// optionally with a formatted detail string.
///
/// # Examples
///
/// ```
/// use kubesql::error::ErrorKind;
/// use kubesql::sync_error;
///
/// let err = sync_error!(ErrorKind::TableNotFound, "table lookup failed");
/// let detailed = sync_error!(
///     ErrorKind::TableNotFound,
///     "table lookup failed",
///     format!("no table named '{}'", "pod")
/// );
/// ```
#[macro_export]
macro_rules! sync_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::SyncError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::SyncError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Returns early from the enclosing function with a [`SyncError`](crate::error::SyncError).
///
/// Equivalent to `return Err(sync_error!(...))`.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::sync_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::sync_error!($kind, $desc, $detail))
    };
}
