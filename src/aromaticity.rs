//! Hückel aromaticity classification.
//!
//! Each atom contributes π electrons according to a case table keyed on
//! its double-bond count, single-bond count and charge; a ring whose
//! members sum to 4n+2 is aromatic. Ring systems get the same test over
//! their union of atoms, which recognises fused systems (azulene-like,
//! phenalenide-like) whose individual rings fail per-ring accounting.

use std::collections::BTreeSet;

use crate::atom::Atom;
use crate::bond::BondOrder;
use crate::molecule::Molecule;

/// π electrons the atom contributes to a ring containing it.
///
/// The table is keyed on `100·#double + 10·#single + charge` and covers
/// C, N, O and S; every other element contributes nothing. The
/// interesting rows: a carbanion or a hetero lone pair contributes two;
/// an sp² atom contributes one; a carbon whose only double bond points
/// out of every ring (exocyclic C=O and friends) contributes nothing.
pub fn pi_electrons(mol: &Molecule, atom: &Atom) -> u32 {
    let mut singles = 0i32;
    let mut doubles = 0i32;
    for &bond_id in atom.bond_ids() {
        match mol.bond_by_id(bond_id).map(|b| b.order()) {
            Some(BondOrder::Single) => singles += 1,
            Some(BondOrder::Double) => doubles += 1,
            _ => {}
        }
    }
    let key = 100 * doubles + 10 * singles + i32::from(atom.charge());

    match atom.element().number {
        6 => match key {
            19 => 2,
            110 => 1,
            120 => {
                let cyclic_double = atom.bond_ids().iter().any(|&b| {
                    mol.bond_by_id(b)
                        .is_some_and(|bond| bond.order() == BondOrder::Double && bond.is_cyclic())
                });
                u32::from(cyclic_double)
            }
            _ => 0,
        },
        7 => match key {
            20 | 30 => 2,
            110 | 121 => 1,
            _ => 0,
        },
        8 => match key {
            20 => 2,
            _ => 0,
        },
        16 => match key {
            20 => 2,
            111 => 1,
            120 => {
                // A thione-like S=O where the oxygen sits outside every
                // ring leaves the sulfur lone pair available.
                let exo_oxygen = mol.first_doubly_bonded_neighbour(atom.id()).is_some_and(|o| {
                    mol.atom(o)
                        .is_some_and(|p| p.element().number == 8 && !p.is_cyclic())
                });
                if exo_oxygen {
                    2
                } else {
                    0
                }
            }
            _ => 0,
        },
        _ => 0,
    }
}

/// The 4n+2 test.
pub fn is_huckel(pi: u32) -> bool {
    pi >= 2 && (pi - 2) % 4 == 0
}

/// Classifies every ring and ring system of a freshly detected
/// molecule, marking member atoms (AROMATIC unsaturation) and bonds of
/// aromatic rings, and the hetero-aromatic and system-level flags.
pub(crate) fn classify(mol: &mut Molecule) {
    let aromatic: Vec<u32> = mol
        .rings()
        .iter()
        .filter(|ring| is_huckel(ring.pi_electron_count(mol)))
        .map(|ring| ring.id())
        .collect();

    for ring_id in aromatic {
        let Some(ring) = mol.ring(ring_id) else {
            continue;
        };
        let atoms = ring.atoms().to_vec();
        let bonds = ring.bonds().to_vec();
        let hetero = atoms
            .iter()
            .any(|&a| mol.atom(a).is_some_and(|atom| atom.element().is_hetero()));

        if let Some(ring) = mol.ring_mut(ring_id) {
            ring.aromatic = true;
            ring.hetero_aromatic = hetero;
        }
        for norm_id in atoms {
            if let Some(atom) = mol.atom_mut(norm_id) {
                atom.set_aromatic(true);
            }
        }
        for bond_id in bonds {
            if let Some(bond) = mol.bond_by_id_mut(bond_id) {
                bond.aromatic = true;
            }
        }
    }

    let system_ids: Vec<u32> = mol.ring_systems().iter().map(|s| s.id()).collect();
    for system_id in system_ids {
        let members: BTreeSet<u32> = mol
            .ring_systems()
            .iter()
            .find(|s| s.id() == system_id)
            .map(|s| {
                s.ring_ids()
                    .iter()
                    .filter_map(|&r| mol.ring(r))
                    .flat_map(|r| r.atoms().iter().copied())
                    .collect()
            })
            .unwrap_or_default();

        let pi: u32 = members
            .iter()
            .filter_map(|&a| mol.atom(a))
            .map(|atom| pi_electrons(mol, atom))
            .sum();
        if is_huckel(pi) {
            if let Some(system) = mol.ring_system_mut(system_id) {
                system.aromatic = true;
            }
        }
    }
}
