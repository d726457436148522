//! Internal helper macros.

/// Returns early with an error when a condition does not hold.
///
/// Like `assert!`, but yields `Err($error)` from the enclosing function instead
/// of panicking.
///
/// ```ignore
/// ensure!(offset <= MAX_HEADER_BYTES, ParseError::too_large_header(offset, MAX_HEADER_BYTES));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
