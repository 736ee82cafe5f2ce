//! Exhaustive ring perception.
//!
//! The detector works on an internal copy of the atom list and adjacency:
//! terminal chains are stripped, candidate cycles are enumerated
//! breadth-first from a single seed path, validated, deduplicated by bond
//! bit-set, sorted ascending by size, grouped into ring systems, and
//! finally reduced by basis selection plus spurious-ring pruning.

use std::collections::VecDeque;

use log::debug;

use crate::bitset::BitSet;
use crate::error::MolError;
use crate::molecule::Molecule;
use crate::ring::Ring;

/// Detects all rings of a normalised molecule. Answers the retained
/// rings sorted ascending by size, plus the ring-system grouping as
/// index lists into that ring vector.
///
/// The caller is responsible for the Frèrejacque and connectivity
/// gates; a molecule that slips through degenerate simply yields no
/// rings.
pub(crate) fn detect_rings(mol: &Molecule) -> Result<(Vec<Ring>, Vec<Vec<usize>>), MolError> {
    let mut detector = Detector::new(mol);
    detector.run()?;
    Ok(detector.into_result())
}

struct Detector<'a> {
    mol: &'a Molecule,
    /// Surviving atoms, as normalised ids, in molecule list order.
    atoms: Vec<u32>,
    /// Pruned-graph adjacency parallel to `atoms` (normalised ids, in
    /// bond insertion order).
    nbrs: Vec<Vec<u32>>,
    candidates: VecDeque<Vec<u32>>,
    rings: Vec<Ring>,
    /// Ring-system membership as indices into `rings`.
    systems: Vec<Vec<usize>>,
    system_atoms: Vec<BitSet>,
    system_bonds: Vec<BitSet>,
    pruned: Vec<bool>,
}

impl<'a> Detector<'a> {
    fn new(mol: &'a Molecule) -> Self {
        let mut atoms = Vec::with_capacity(mol.atom_count());
        let mut nbrs = Vec::with_capacity(mol.atom_count());
        for atom in mol.atoms() {
            atoms.push(atom.id());
            let adjacent: Vec<u32> = atom
                .bond_ids()
                .iter()
                .filter_map(|&b| mol.bond_by_id(b).and_then(|bond| bond.other_atom(atom.id())))
                .collect();
            nbrs.push(adjacent);
        }
        Self {
            mol,
            atoms,
            nbrs,
            candidates: VecDeque::new(),
            rings: Vec::new(),
            systems: Vec::new(),
            system_atoms: Vec::new(),
            system_bonds: Vec::new(),
            pruned: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<(), MolError> {
        self.prune_terminal_chains();
        if self.atoms.is_empty() {
            return Ok(());
        }

        if self.no_junctions() {
            self.detect_the_only_ring()?;
        } else {
            self.enumerate_candidates()?;
            self.rings.sort_by_key(Ring::size);
        }
        debug!(
            "molecule {}: {} candidate rings after dedup",
            self.mol.id(),
            self.rings.len()
        );

        self.group_ring_systems();
        self.pruned = vec![false; self.rings.len()];
        self.prune_spurious_rings()?;
        Ok(())
    }

    fn into_result(self) -> (Vec<Ring>, Vec<Vec<usize>>) {
        // Compact away pruned rings, remapping the system index lists.
        let mut remap = vec![usize::MAX; self.rings.len()];
        let mut rings = Vec::with_capacity(self.rings.len());
        for (old, ring) in self.rings.into_iter().enumerate() {
            if !self.pruned[old] {
                remap[old] = rings.len();
                rings.push(ring);
            }
        }
        let systems: Vec<Vec<usize>> = self
            .systems
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .filter(|&old| remap[old] != usize::MAX)
                    .map(|old| remap[old])
                    .collect()
            })
            .filter(|group: &Vec<usize>| !group.is_empty())
            .collect();
        (rings, systems)
    }

    fn position_of(&self, norm_id: u32) -> Option<usize> {
        self.atoms.iter().position(|&a| a == norm_id)
    }

    /// Repeatedly deletes atoms with exactly one surviving neighbour,
    /// mirroring each deletion in the neighbour's adjacency, until every
    /// surviving atom has degree two or more.
    fn prune_terminal_chains(&mut self) {
        loop {
            let Some(i) = self.nbrs.iter().position(|n| n.len() == 1) else {
                return;
            };
            let atom = self.atoms[i];
            let nbr = self.nbrs[i][0];
            if let Some(j) = self.position_of(nbr) {
                self.nbrs[j].retain(|&a| a != atom);
            }
            self.atoms.remove(i);
            self.nbrs.remove(i);
        }
    }

    fn no_junctions(&self) -> bool {
        self.nbrs.iter().all(|n| n.len() <= 2)
    }

    /// Every surviving atom has degree two: the survivors form exactly
    /// one cycle, walked out directly.
    fn detect_the_only_ring(&mut self) -> Result<(), MolError> {
        let start = self.atoms[0];
        let mut path = vec![start];
        let mut prev = start;
        let mut curr = start;
        loop {
            let i = self.position_of(curr).expect("walk stays in survivors");
            let mut next = self.nbrs[i][0];
            if next == prev {
                next = self.nbrs[i][1];
            }
            if next == start {
                break;
            }
            path.push(next);
            prev = curr;
            curr = next;
        }
        self.make_ring(&path)
    }

    /// Seeds a single path and explores breadth-first. Each neighbour of
    /// a path head either closes a cycle back to the seed, closes a tail
    /// cycle against an interior atom, or extends the path.
    fn enumerate_candidates(&mut self) -> Result<(), MolError> {
        let seed = self
            .atoms
            .iter()
            .find(|&&a| self.mol.atom(a).is_some_and(|atom| !atom.is_junction()))
            .copied()
            .unwrap_or(self.atoms[0]);
        self.candidates.push_back(vec![seed]);

        while let Some(path) = self.candidates.pop_front() {
            self.try_path(&path)?;
        }
        Ok(())
    }

    fn try_path(&mut self, path: &[u32]) -> Result<(), MolError> {
        let start = path[0];
        let curr = *path.last().expect("paths are non-empty");
        let prev = if path.len() > 1 {
            path[path.len() - 2]
        } else {
            curr
        };

        let i = self.position_of(curr).expect("paths stay in survivors");
        let adjacent = self.nbrs[i].clone();
        for next in adjacent {
            if next == prev {
                continue;
            }
            if next == start {
                if self.validate(path) {
                    self.make_ring(path)?;
                }
                continue;
            }
            if let Some(pos) = path.iter().position(|&a| a == next) {
                // A previously visited atom: the tail from there closes
                // into a candidate cycle.
                let tail = &path[pos..];
                if self.validate(tail) {
                    self.make_ring(tail)?;
                }
                continue;
            }

            let mut extended = Vec::with_capacity(path.len() + 1);
            extended.extend_from_slice(path);
            extended.push(next);
            self.candidates.push_back(extended);
        }
        Ok(())
    }

    /// A candidate of size three is always a ring. A larger candidate
    /// is rejected when an atom on it has more than two of its
    /// pruned-graph neighbours also on it: a chord exists, so the path
    /// is a degenerate outer shell around smaller cycles, not a simple
    /// ring. Every bond on a cycle keeps at least one valid ring this
    /// way, since a chord always splits off a smaller cycle through the
    /// same bonds.
    fn validate(&self, path: &[u32]) -> bool {
        if path.len() == 3 {
            return true;
        }

        for &atom in path {
            let pos = self.position_of(atom).expect("path atoms survive pruning");
            let adjacent = &self.nbrs[pos];
            if adjacent.len() < 3 {
                continue;
            }
            let on_path = adjacent.iter().filter(|n| path.contains(n)).count();
            if on_path > 2 {
                return false;
            }
        }
        true
    }

    /// Completes a ring from a validated path, rejecting duplicates by
    /// bond bit-set.
    fn make_ring(&mut self, path: &[u32]) -> Result<(), MolError> {
        let ring = Ring::from_path(self.mol, path)?;
        if !self.rings.contains(&ring) {
            self.rings.push(ring);
        }
        Ok(())
    }

    /// Walks rings in ascending size order; a ring joins the first
    /// system whose aggregated bonds it overlaps (fusion or bridge),
    /// else the first whose aggregated atoms it overlaps (spiro), else
    /// it founds a new system.
    fn group_ring_systems(&mut self) {
        for (idx, ring) in self.rings.iter().enumerate() {
            let mut joined = false;
            for s in 0..self.systems.len() {
                if self.system_bonds[s].intersects(ring.bond_bits())
                    || self.system_atoms[s].intersects(ring.atom_bits())
                {
                    self.systems[s].push(idx);
                    self.system_atoms[s].union_with(ring.atom_bits());
                    self.system_bonds[s].union_with(ring.bond_bits());
                    joined = true;
                    break;
                }
            }
            if !joined {
                self.systems.push(vec![idx]);
                self.system_atoms.push(ring.atom_bits().clone());
                self.system_bonds.push(ring.bond_bits().clone());
            }
        }
    }

    fn prune_spurious_rings(&mut self) -> Result<(), MolError> {
        for s in 0..self.systems.len() {
            let basis_end = self.basis_end(&self.systems[s], &self.system_bonds[s]);
            let Some(mut last) = basis_end else {
                continue;
            };

            let mut j = last + 1;
            while j < self.systems[s].len() {
                let ridx = self.systems[s][j];
                if self.should_prune(&self.systems[s], ridx, last)? {
                    debug!(
                        "molecule {}: pruning spurious ring of size {}",
                        self.mol.id(),
                        self.rings[ridx].size()
                    );
                    self.pruned[ridx] = true;
                    self.systems[s].remove(j);
                } else {
                    // Retained: the ring is promoted into the basis.
                    last = j;
                    j += 1;
                }
            }
        }
        Ok(())
    }

    /// Index (within the system's ring list) of the last ring in the
    /// basis: walking rings in size order, the basis freezes at the
    /// first size increase where the running bond union already covers
    /// the whole system. `None` for an empty system.
    fn basis_end(&self, system: &[usize], system_bonds: &BitSet) -> Option<usize> {
        let mut running = BitSet::default();
        let mut prev_size = None;
        let mut last = None;
        for (j, &ridx) in system.iter().enumerate() {
            let size = self.rings[ridx].size();
            if prev_size != Some(size) && running == *system_bonds {
                return last;
            }
            running.union_with(self.rings[ridx].bond_bits());
            last = Some(j);
            prev_size = Some(size);
        }
        last
    }

    /// Decides whether a beyond-basis ring is spurious.
    ///
    /// Pairs of basis rings are scanned first, then triples: when the
    /// ring's bonds fit inside a combination's union, the atoms common
    /// to the whole combination are candidate bridgeheads and the
    /// remaining junction atoms on the ring are tested for a shorter
    /// path through the rest of the molecule. Pairs catch
    /// symmetric-difference envelopes (norbornane's bridge ring,
    /// adamantane's eight-rings); triples catch hub-and-spoke
    /// perimeters whose shortcut runs through an atom shared by three
    /// basis rings (phenalene's twelve-ring). A ring no combination
    /// decides survives iff it still owns a bond that fewer than two
    /// basis rings cover.
    fn should_prune(&self, system: &[usize], ridx: usize, last: usize) -> Result<bool, MolError> {
        let r = &self.rings[ridx];

        for i in 0..last {
            for j in (i + 1)..=last {
                let members = [&self.rings[system[i]], &self.rings[system[j]]];
                if let Some(verdict) = self.combination_verdict(r, &members)? {
                    return Ok(verdict);
                }
            }
        }

        for i in 0..last {
            for j in (i + 1)..last {
                for k in (j + 1)..=last {
                    let members = [
                        &self.rings[system[i]],
                        &self.rings[system[j]],
                        &self.rings[system[k]],
                    ];
                    if let Some(verdict) = self.combination_verdict(r, &members)? {
                        return Ok(verdict);
                    }
                }
            }
        }

        // Decided by no combination: genuine iff some bond of the ring
        // lies in fewer than two basis rings.
        for bond in r.bond_bits().ones() {
            let cover = system[..=last]
                .iter()
                .filter(|&&b| self.rings[b].bond_bits().get(bond))
                .count();
            if cover < 2 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Tests one basis-ring combination against a candidate.
    /// `Some(true)` prunes the candidate, `Some(false)` keeps it, and
    /// `None` leaves the decision to the remaining combinations and the
    /// covered-bond fallback.
    fn combination_verdict(
        &self,
        r: &Ring,
        members: &[&Ring],
    ) -> Result<Option<bool>, MolError> {
        let mut union = BitSet::default();
        for member in members {
            union.union_with(member.bond_bits());
        }
        if !r.bond_bits().is_subset_of(&union) {
            return Ok(None);
        }

        let mut common = members[0].atom_bits().clone();
        for member in &members[1..] {
            common.intersect_with(member.atom_bits());
        }
        common.intersect_with(r.atom_bits());
        if common.cardinality() > 2 {
            // Convoluted overlap; this combination proves nothing.
            return Ok(None);
        }

        let junctions: Vec<u32> = r
            .atom_bits()
            .ones()
            .map(|b| b as u32)
            .filter(|&input_id| !common.get(input_id as usize))
            .filter(|&input_id| self.is_pruned_graph_junction(input_id))
            .collect();

        match junctions.len() {
            // No alternative path can exist through zero or one
            // junction; the ring is genuine.
            0 | 1 => Ok(Some(false)),
            2 => {
                let dr = r.distance_between(junctions[0], junctions[1])?;
                let dm = self.mol.distance_between(junctions[0], junctions[1]);
                Ok(Some((dm as usize) < dr))
            }
            _ => {
                for (a, &j1) in junctions.iter().enumerate() {
                    for &j2 in &junctions[a + 1..] {
                        let dr = r.distance_between(j1, j2)?;
                        let dm = self.mol.distance_between(j1, j2);
                        if (dm as usize) < dr {
                            return Ok(Some(true));
                        }
                    }
                }
                Ok(None)
            }
        }
    }

    fn is_pruned_graph_junction(&self, input_id: u32) -> bool {
        let Some(atom) = self.mol.atom_by_input_id(input_id) else {
            return false;
        };
        self.position_of(atom.id())
            .is_some_and(|pos| self.nbrs[pos].len() >= 3)
    }
}
