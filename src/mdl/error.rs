use std::fmt;

use crate::error::MolError;

#[derive(Debug, Clone, PartialEq)]
pub enum MdlError {
    /// A MOL block needs at least the three header lines and a counts
    /// line.
    TruncatedBlock { lines: usize },
    /// Only the V2000 connection table format is supported.
    UnsupportedVersion { counts_line: String },
    InvalidCounts { counts_line: String },
    InvalidAtomLine { line_no: usize },
    UnknownElement { line_no: usize, symbol: String },
    InvalidBondLine { line_no: usize },
    InvalidProperty { line_no: usize },
    /// An atom or bond reference outside the declared counts.
    DanglingReference { line_no: usize, id: u32 },
    /// A molecule-level contract violation while building.
    Molecule(MolError),
}

impl fmt::Display for MdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedBlock { lines } => {
                write!(f, "MOL block has only {} lines", lines)
            }
            Self::UnsupportedVersion { counts_line } => {
                write!(f, "not a V2000 counts line: `{}'", counts_line)
            }
            Self::InvalidCounts { counts_line } => {
                write!(f, "unreadable atom/bond counts: `{}'", counts_line)
            }
            Self::InvalidAtomLine { line_no } => {
                write!(f, "unreadable atom line {}", line_no)
            }
            Self::UnknownElement { line_no, symbol } => {
                write!(f, "unknown element `{}' on line {}", symbol, line_no)
            }
            Self::InvalidBondLine { line_no } => {
                write!(f, "unreadable bond line {}", line_no)
            }
            Self::InvalidProperty { line_no } => {
                write!(f, "unreadable property line {}", line_no)
            }
            Self::DanglingReference { line_no, id } => {
                write!(f, "line {} references undeclared atom {}", line_no, id)
            }
            Self::Molecule(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MdlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Molecule(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MolError> for MdlError {
    fn from(e: MolError) -> Self {
        Self::Molecule(e)
    }
}
