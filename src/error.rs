/// Errors returned by the field's public API.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Constructor arguments that cannot describe a solvable grid.
    InvalidArgument(String),
    /// A cell or layer index outside its valid range.
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// An enum value the solver does not know how to dispatch.
    InvalidState(String),
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            FieldError::IndexOutOfRange { what, index, len } => {
                write!(f, "{} index {} out of range (len {})", what, index, len)
            }
            FieldError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for FieldError {}

/// Check `index < len`, naming the offending index kind in the error.
pub(crate) fn check_index(what: &'static str, index: usize, len: usize) -> Result<(), FieldError> {
    if index < len {
        Ok(())
    } else {
        Err(FieldError::IndexOutOfRange { what, index, len })
    }
}
