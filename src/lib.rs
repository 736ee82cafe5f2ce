//! Molecule graph core with exhaustive ring perception.
//!
//! A [`Molecule`] is built by adding atoms and bonds, then
//! [`normalise`](Molecule::normalise)d: shortest-path matrices are
//! computed, every chemically meaningful simple cycle is detected and
//! grouped into ring systems, rings and ring systems are classified for
//! aromaticity (Hückel 4n+2 with hetero- and semi-aromatic
//! refinements), and atoms receive their unsaturation tags, compact
//! hashes and benzylic/bridgehead/spiro flags.
//!
//! ```
//! use ringcraft::{BondOrder, Molecule, PeriodicTable};
//!
//! let carbon = PeriodicTable::element("C").unwrap();
//! let mut benzene = Molecule::new();
//! let atoms: Vec<u32> = (0..6).map(|_| benzene.add_atom(carbon)).collect();
//! for i in 0..6 {
//!     let order = if i % 2 == 0 { BondOrder::Double } else { BondOrder::Single };
//!     benzene.add_bond(atoms[i], atoms[(i + 1) % 6], order).unwrap();
//! }
//! benzene.assign_implicit_hydrogens();
//! benzene.normalise().unwrap();
//!
//! assert_eq!(benzene.ring_count(), 1);
//! assert!(benzene.rings()[0].is_aromatic());
//! ```
//!
//! Molecules are independent: distinct molecules may be processed on
//! distinct threads, but one molecule is single-threaded — `normalise`
//! borrows it exclusively.

pub mod aromaticity;
pub mod atom;
pub mod bitset;
pub mod bond;
pub mod distance;
pub mod element;
pub mod error;
pub mod mdl;
pub mod molecule;
pub mod ring;

mod detect;

pub use atom::{Atom, Chirality, Point3, Radical, Unsaturation};
pub use bitset::BitSet;
pub use bond::{Bond, BondOrder, BondStereo};
pub use distance::DistanceMatrix;
pub use element::{Element, PeriodicTable};
pub use error::MolError;
pub use mdl::{MdlError, MolReader, SdfBlocks};
pub use molecule::{Molecule, MAX_RINGS};
pub use ring::{Ring, RingSystem};
