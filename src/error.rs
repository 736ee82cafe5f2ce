use std::fmt;

use crate::bond::BondOrder;

/// Errors raised by the molecule container and the normalisation
/// pipeline.
///
/// Contract violations are loud: every variant carries the molecule id
/// and the ids and counts involved, so a batch driver can log the
/// offending molecule and move on.
#[derive(Debug, Clone, PartialEq)]
pub enum MolError {
    /// An atom id that does not name an atom of this molecule.
    UnknownAtom { molecule: u64, atom: u32 },
    /// A bond id that does not name a bond of this molecule.
    UnknownBond { molecule: u64, bond: u32 },
    /// A bond was requested between an atom and itself.
    SelfBond { molecule: u64, atom: u32 },
    /// Bond creation with an order that is input-only.
    InvalidBondOrder { order: BondOrder },
    /// Forming or promoting a bond would push an endpoint past its
    /// valence ceiling.
    ValenceViolation {
        molecule: u64,
        atom: u32,
        valence: u8,
        neighbours: usize,
        delta: usize,
    },
    /// Attribute names and values must be non-empty.
    EmptyAttribute,
    /// The attribute name is already present.
    DuplicateAttribute { name: String },
    /// No attribute with the given name.
    UnknownAttribute { name: String },
    /// No attribute with the given value.
    UnknownAttributeValue { value: String },
    /// Mutation of a ring after completion.
    RingCompleted { ring_size: usize },
    /// A ring was completed with fewer than three atoms.
    RingTooSmall { size: usize },
    /// Consecutive ring atoms with no bond between them.
    MissingRingBond { molecule: u64, a1: u32, a2: u32 },
    /// A ring was built against the wrong molecule, or from foreign
    /// atoms.
    ForeignRing { molecule: u64, ring_molecule: u64 },
    /// An uncharged atom whose neighbour expansion plus hydrogens does
    /// not reach its valence: bonds are missing or a charge is hidden.
    UnsaturationMismatch {
        molecule: u64,
        atom: u32,
        neighbours: usize,
        hydrogens: u8,
        valence: u8,
    },
    /// More than one ring tied for smallest in a smallest-ring query.
    AmbiguousSmallestRing { size: usize, count: usize },
    /// An atom pair outside every ring was asked for an in-ring
    /// distance.
    AtomNotInRing { ring: u32, atom: u32 },
}

impl fmt::Display for MolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAtom { molecule, atom } => {
                write!(f, "molecule {}: no atom with id {}", molecule, atom)
            }
            Self::UnknownBond { molecule, bond } => {
                write!(f, "molecule {}: no bond with id {}", molecule, bond)
            }
            Self::SelfBond { molecule, atom } => {
                write!(
                    f,
                    "molecule {}: cannot bond atom {} to itself",
                    molecule, atom
                )
            }
            Self::InvalidBondOrder { order } => {
                write!(
                    f,
                    "only single, double, triple and aromatic bonds may be created; given {:?}",
                    order
                )
            }
            Self::ValenceViolation {
                molecule,
                atom,
                valence,
                neighbours,
                delta,
            } => write!(
                f,
                "molecule {}: atom {} has valence {} but would get {} + {} neighbour units",
                molecule, atom, valence, neighbours, delta
            ),
            Self::EmptyAttribute => {
                write!(f, "attribute names and values must be non-empty")
            }
            Self::DuplicateAttribute { name } => {
                write!(f, "attribute `{}' already exists", name)
            }
            Self::UnknownAttribute { name } => {
                write!(f, "attribute `{}' does not exist", name)
            }
            Self::UnknownAttributeValue { value } => {
                write!(f, "no attribute has the value `{}'", value)
            }
            Self::RingCompleted { ring_size } => {
                write!(
                    f,
                    "ring of size {} is completed and cannot be modified",
                    ring_size
                )
            }
            Self::RingTooSmall { size } => {
                write!(f, "the smallest possible ring has 3 atoms; got {}", size)
            }
            Self::MissingRingBond { molecule, a1, a2 } => write!(
                f,
                "molecule {}: no bond between consecutive ring atoms {} and {}",
                molecule, a1, a2
            ),
            Self::ForeignRing {
                molecule,
                ring_molecule,
            } => write!(
                f,
                "ring belongs to molecule {}, not molecule {}",
                ring_molecule, molecule
            ),
            Self::UnsaturationMismatch {
                molecule,
                atom,
                neighbours,
                hydrogens,
                valence,
            } => write!(
                f,
                "molecule {}: atom {} has {} neighbour units + {} hydrogens against valence {}; \
                 bonds are missing or a charge is unset",
                molecule, atom, neighbours, hydrogens, valence
            ),
            Self::AmbiguousSmallestRing { size, count } => write!(
                f,
                "{} rings tie for the smallest size {}",
                count, size
            ),
            Self::AtomNotInRing { ring, atom } => {
                write!(f, "atom {} does not participate in ring {}", atom, ring)
            }
        }
    }
}

impl std::error::Error for MolError {}
