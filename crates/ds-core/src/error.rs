use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backing storage length does not match `width * height`.
    SizeMismatch { expected: usize, actual: usize },
    /// Two grids that must share a frame have different dimensions.
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    OutOfBounds,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::OutOfBounds => write!(f, "out of bounds"),
        }
    }
}

impl std::error::Error for Error {}
