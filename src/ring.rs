use crate::bitset::BitSet;
use crate::bond::BondOrder;
use crate::error::MolError;
use crate::molecule::Molecule;

/// A simple cycle in the molecule graph.
///
/// Rings are built one atom at a time by the detector; each added atom
/// must be bonded to the previous one. `complete` closes the wrap-around
/// edge, freezes the composition, and derives the atom and bond bit-sets
/// (atom bits are input ids, bond bits are bond ids). Two completed
/// rings of the same molecule are equal iff their bond bit-sets are
/// equal.
#[derive(Debug, Clone)]
pub struct Ring {
    pub(crate) id: u32,
    pub(crate) mol_id: u64,
    /// Member atoms in cycle order, as normalised ids.
    pub(crate) atoms: Vec<u32>,
    /// Input ids parallel to `atoms`.
    pub(crate) input_ids: Vec<u32>,
    /// Member bonds in cycle order, including the wrap-around edge.
    pub(crate) bonds: Vec<u32>,
    pub(crate) atom_bits: BitSet,
    pub(crate) bond_bits: BitSet,
    pub(crate) aromatic: bool,
    pub(crate) hetero_aromatic: bool,
    pub(crate) completed: bool,
    pub(crate) ring_system_id: u32,
}

impl Ring {
    /// A fresh, open ring bound to the given molecule.
    pub fn new(mol: &Molecule) -> Self {
        Self {
            id: 0,
            mol_id: mol.id(),
            atoms: Vec::new(),
            input_ids: Vec::new(),
            bonds: Vec::new(),
            atom_bits: BitSet::with_capacity(mol.peak_atom_id() as usize + 1),
            bond_bits: BitSet::with_capacity(mol.peak_bond_id() as usize + 1),
            aromatic: false,
            hetero_aromatic: false,
            completed: false,
            ring_system_id: 0,
        }
    }

    /// Builds and completes a ring from a cyclic atom path.
    pub fn from_path(mol: &Molecule, path: &[u32]) -> Result<Ring, MolError> {
        let mut ring = Ring::new(mol);
        for &a in path {
            ring.add_atom(mol, a)?;
        }
        ring.complete(mol)?;
        Ok(ring)
    }

    /// Appends an atom to the open ring. Atoms already present are
    /// ignored; the atom must continue from the most recently added one.
    pub fn add_atom(&mut self, mol: &Molecule, norm_id: u32) -> Result<(), MolError> {
        if self.completed {
            return Err(MolError::RingCompleted {
                ring_size: self.atoms.len(),
            });
        }
        if mol.id() != self.mol_id {
            return Err(MolError::ForeignRing {
                molecule: mol.id(),
                ring_molecule: self.mol_id,
            });
        }
        let atom = mol.atom(norm_id).ok_or(MolError::UnknownAtom {
            molecule: self.mol_id,
            atom: norm_id,
        })?;
        if self.atoms.contains(&norm_id) {
            return Ok(());
        }

        if let Some(&prev) = self.atoms.last() {
            let bond = mol
                .bond_between(prev, norm_id)
                .ok_or(MolError::MissingRingBond {
                    molecule: self.mol_id,
                    a1: prev,
                    a2: norm_id,
                })?;
            self.bonds.push(bond.id());
        }
        self.atoms.push(norm_id);
        self.input_ids.push(atom.input_id());
        Ok(())
    }

    /// Closes the cycle between the last atom and the first and freezes
    /// the ring. Completing an already-completed ring is a no-op.
    pub fn complete(&mut self, mol: &Molecule) -> Result<(), MolError> {
        if self.completed {
            return Ok(());
        }
        if self.atoms.len() < 3 {
            return Err(MolError::RingTooSmall {
                size: self.atoms.len(),
            });
        }

        let first = self.atoms[0];
        let last = *self.atoms.last().expect("ring has atoms");
        let closing = mol
            .bond_between(last, first)
            .ok_or(MolError::MissingRingBond {
                molecule: self.mol_id,
                a1: last,
                a2: first,
            })?;
        self.bonds.push(closing.id());

        for &input_id in &self.input_ids {
            self.atom_bits.set(input_id as usize);
        }
        for &bond_id in &self.bonds {
            self.bond_bits.set(bond_id as usize);
        }
        self.completed = true;
        Ok(())
    }

    /// Rotates the cycle so the atom with the lowest normalised id comes
    /// first. The bond list rotates with it so that `bonds[i]` joins
    /// `atoms[i]` to `atoms[i + 1]` (wrapping).
    pub(crate) fn normalise(&mut self) {
        let Some(idx) = self
            .atoms
            .iter()
            .enumerate()
            .min_by_key(|&(_, id)| id)
            .map(|(i, _)| i)
        else {
            return;
        };
        self.atoms.rotate_left(idx);
        self.input_ids.rotate_left(idx);
        self.bonds.rotate_left(idx);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of atoms (equivalently bonds) in the cycle.
    pub fn size(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_aromatic(&self) -> bool {
        self.aromatic
    }

    /// Aromatic with at least one non-carbon member.
    pub fn is_hetero_aromatic(&self) -> bool {
        self.hetero_aromatic
    }

    pub fn ring_system_id(&self) -> u32 {
        self.ring_system_id
    }

    /// Member atoms in cycle order (normalised ids).
    pub fn atoms(&self) -> &[u32] {
        &self.atoms
    }

    /// Member bonds in cycle order, including the wrap-around edge.
    pub fn bonds(&self) -> &[u32] {
        &self.bonds
    }

    /// Bit-set of member atom input ids.
    pub fn atom_bits(&self) -> &BitSet {
        &self.atom_bits
    }

    /// Bit-set of member bond ids.
    pub fn bond_bits(&self) -> &BitSet {
        &self.bond_bits
    }

    pub fn contains_atom(&self, norm_id: u32) -> bool {
        self.atoms.contains(&norm_id)
    }

    pub fn contains_bond(&self, bond_id: u32) -> bool {
        self.bond_bits.get(bond_id as usize)
    }

    /// Bits set for atoms common to both rings.
    pub fn common_atoms(&self, other: &Ring) -> BitSet {
        let mut t = self.atom_bits.clone();
        t.intersect_with(&other.atom_bits);
        t
    }

    /// Bits set for bonds common to both rings.
    pub fn common_bonds(&self, other: &Ring) -> BitSet {
        let mut t = self.bond_bits.clone();
        t.intersect_with(&other.bond_bits);
        t
    }

    /// The shorter in-ring distance between two member atoms, given by
    /// input id.
    pub fn distance_between(&self, input_id1: u32, input_id2: u32) -> Result<usize, MolError> {
        let pos1 = self.input_ids.iter().position(|&i| i == input_id1);
        let pos2 = self.input_ids.iter().position(|&i| i == input_id2);
        match (pos1, pos2) {
            (Some(p1), Some(p2)) => {
                let d = p1.abs_diff(p2);
                Ok(d.min(self.atoms.len() - d))
            }
            (None, _) => Err(MolError::AtomNotInRing {
                ring: self.id,
                atom: input_id1,
            }),
            (_, None) => Err(MolError::AtomNotInRing {
                ring: self.id,
                atom: input_id2,
            }),
        }
    }

    /// Total π electrons contributed by the member atoms.
    pub fn pi_electron_count(&self, mol: &Molecule) -> u32 {
        self.atoms
            .iter()
            .filter_map(|&a| mol.atom(a))
            .map(|a| crate::aromaticity::pi_electrons(mol, a))
            .sum()
    }

    /// Number of double bonds among the member bonds.
    pub fn double_bond_count(&self, mol: &Molecule) -> usize {
        self.bonds
            .iter()
            .filter_map(|&b| mol.bond_by_id(b))
            .filter(|b| b.order() == BondOrder::Double)
            .count()
    }

    /// Number of member atoms whose unsaturation is AROMATIC. A
    /// non-aromatic ring can still contain aromatic atoms contributed by
    /// a fused neighbour.
    pub fn aromatic_atom_count(&self, mol: &Molecule) -> usize {
        self.atoms
            .iter()
            .filter_map(|&a| mol.atom(a))
            .filter(|a| a.unsaturation() == crate::atom::Unsaturation::Aromatic)
            .count()
    }

    /// Six-membered and aromatic.
    pub fn is_aromatic_of_size6(&self) -> bool {
        self.atoms.len() == 6 && self.aromatic
    }

    /// A six-membered ring that misses aromaticity but satisfies
    /// `6 = aromatic_atoms + 2·double_bonds + N-H + exocyclic C=X`
    /// with the N-H and exocyclic C=X counts equal (the 2-pyridone
    /// pattern).
    pub fn is_semi_aromatic_of_size6(&self, mol: &Molecule) -> bool {
        if self.atoms.len() != 6 || self.aromatic {
            return false;
        }

        let n_aro = self.aromatic_atom_count(mol);
        let n_doubly = 2 * self.double_bond_count(mol);

        let mut n_nh = 0usize;
        let mut n_exo_cx = 0usize;
        for &id in &self.atoms {
            let Some(atom) = mol.atom(id) else {
                continue;
            };
            if atom.element().number == 7
                && atom.unsaturation() == crate::atom::Unsaturation::None
                && atom.hydrogen_count() == 1
            {
                n_nh += 1;
            } else if atom.element().number == 6 {
                if let Some(partner) = mol.first_doubly_bonded_neighbour(id) {
                    let hetero = mol
                        .atom(partner)
                        .is_some_and(|p| p.element().is_hetero());
                    if hetero && !self.contains_atom(partner) {
                        n_exo_cx += 1;
                    }
                }
            }
        }

        n_aro + n_doubly + n_nh + n_exo_cx == 6 && n_nh == n_exo_cx
    }
}

impl PartialEq for Ring {
    fn eq(&self, other: &Self) -> bool {
        self.completed
            && other.completed
            && self.mol_id == other.mol_id
            && self.bond_bits == other.bond_bits
    }
}

/// A maximal set of rings joined by shared bonds (fusion or bridge) or
/// shared atoms (spiro).
///
/// The aggregated bit-sets are the unions of the member rings' bit-sets
/// and are rebuilt when a member is removed. Equality is molecule
/// identity plus identical aggregates.
#[derive(Debug, Clone)]
pub struct RingSystem {
    pub(crate) id: u32,
    pub(crate) mol_id: u64,
    /// Ids of the member rings.
    pub(crate) rings: Vec<u32>,
    pub(crate) atom_bits: BitSet,
    pub(crate) bond_bits: BitSet,
    pub(crate) aromatic: bool,
}

impl RingSystem {
    pub(crate) fn new(id: u32, mol_id: u64) -> Self {
        Self {
            id,
            mol_id,
            rings: Vec::new(),
            atom_bits: BitSet::default(),
            bond_bits: BitSet::default(),
            aromatic: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of member rings.
    pub fn size(&self) -> usize {
        self.rings.len()
    }

    /// Ids of the member rings.
    pub fn ring_ids(&self) -> &[u32] {
        &self.rings
    }

    /// Union of the member rings' atom bit-sets (input ids).
    pub fn atom_bits(&self) -> &BitSet {
        &self.atom_bits
    }

    /// Union of the member rings' bond bit-sets.
    pub fn bond_bits(&self) -> &BitSet {
        &self.bond_bits
    }

    /// Whether the system as a whole satisfies the Hückel rule. Catches
    /// fused systems whose individual rings fail per-ring accounting.
    pub fn is_aromatic(&self) -> bool {
        self.aromatic
    }

    /// Admits a ring. Every member after the first must share a bond or
    /// an atom with the system.
    pub(crate) fn add_ring(&mut self, ring: &Ring) -> Result<(), MolError> {
        if ring.mol_id != self.mol_id {
            return Err(MolError::ForeignRing {
                molecule: self.mol_id,
                ring_molecule: ring.mol_id,
            });
        }
        self.rings.push(ring.id);
        self.atom_bits.union_with(&ring.atom_bits);
        self.bond_bits.union_with(&ring.bond_bits);
        Ok(())
    }

    /// Drops a member ring; aggregates are rebuilt from the remainder.
    pub(crate) fn remove_ring(&mut self, ring_id: u32, remaining: &[&Ring]) {
        self.rings.retain(|&r| r != ring_id);
        self.atom_bits.clear();
        self.bond_bits.clear();
        for ring in remaining {
            if self.rings.contains(&ring.id) {
                self.atom_bits.union_with(&ring.atom_bits);
                self.bond_bits.union_with(&ring.bond_bits);
            }
        }
    }
}

impl PartialEq for RingSystem {
    fn eq(&self, other: &Self) -> bool {
        self.mol_id == other.mol_id
            && self.atom_bits == other.atom_bits
            && self.bond_bits == other.bond_bits
    }
}
