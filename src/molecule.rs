use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::atom::{Atom, Unsaturation};
use crate::bond::{pair_hash, Bond, BondOrder};
use crate::distance::DistanceMatrix;
use crate::element::Element;
use crate::error::MolError;
use crate::ring::{Ring, RingSystem};
use crate::{aromaticity, detect};

static NEXT_MOLECULE_ID: AtomicU64 = AtomicU64::new(1);

/// Ring detection is skipped for molecules whose Frèrejacque number
/// exceeds this cap; exhaustive enumeration on denser graphs is not
/// worth the cost for the chemistry this crate serves.
pub const MAX_RINGS: i64 = 15;

/// A chemical molecule: an undirected multigraph of atoms and typed
/// bonds, plus everything `normalise` derives from it (distance
/// matrices, rings, ring systems, per-atom classifications).
///
/// The molecule owns all of its parts. Atoms, bonds, rings and ring
/// systems refer to each other through stable 1-based integer ids, never
/// through handles, so the cyclic references of the domain model cost
/// nothing. A molecule is expected to stay a single connected component;
/// a disconnected graph is tolerated but detects no rings.
///
/// Normalised atom ids are list-positional (`id == index + 1`) right
/// after `normalise`; input ids are assigned once at `add_atom` and
/// never reused.
pub struct Molecule {
    id: u64,
    graph: UnGraph<Atom, Bond>,
    rings: Vec<Ring>,
    ring_systems: Vec<RingSystem>,
    peak_atom_id: u32,
    peak_bond_id: u32,
    peak_ring_id: u32,
    attr_names: Vec<String>,
    attr_values: Vec<String>,
    distances: DistanceMatrix,
    /// Vendor-assigned id of this molecule, if any.
    pub vendor_molecule_id: Option<String>,
    /// Name of the vendor, if any.
    pub vendor_name: Option<String>,
}

impl Molecule {
    /// A fresh, empty molecule with a process-unique id.
    pub fn new() -> Self {
        Self {
            id: NEXT_MOLECULE_ID.fetch_add(1, Ordering::Relaxed),
            graph: UnGraph::default(),
            rings: Vec::new(),
            ring_systems: Vec::new(),
            peak_atom_id: 0,
            peak_bond_id: 0,
            peak_ring_id: 0,
            attr_names: Vec::new(),
            attr_values: Vec::new(),
            distances: DistanceMatrix::default(),
            vendor_molecule_id: None,
            vendor_name: None,
        }
    }

    /// The globally unique id of this molecule.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn peak_atom_id(&self) -> u32 {
        self.peak_atom_id
    }

    pub(crate) fn peak_bond_id(&self) -> u32 {
        self.peak_bond_id
    }

    // ---- atoms ----------------------------------------------------------

    /// Adds a fresh atom and answers its id.
    pub fn add_atom(&mut self, element: Element) -> u32 {
        self.peak_atom_id += 1;
        let mut atom = Atom::new(element);
        atom.input_id = self.peak_atom_id;
        atom.norm_id = self.peak_atom_id;
        self.graph.add_node(atom);
        self.peak_atom_id
    }

    fn node_of(&self, norm_id: u32) -> Option<NodeIndex> {
        if norm_id >= 1 {
            let idx = NodeIndex::new(norm_id as usize - 1);
            if let Some(atom) = self.graph.node_weight(idx) {
                if atom.norm_id == norm_id {
                    return Some(idx);
                }
            }
        }
        // Positional lookup misses between a removal and the next
        // normalise; fall back to a scan.
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].norm_id == norm_id)
    }

    /// The atom with the given normalised id. O(1) on a normalised
    /// molecule.
    pub fn atom(&self, norm_id: u32) -> Option<&Atom> {
        self.node_of(norm_id).map(|idx| &self.graph[idx])
    }

    /// Mutable access to the atom with the given normalised id.
    pub fn atom_mut(&mut self, norm_id: u32) -> Option<&mut Atom> {
        self.node_of(norm_id).map(|idx| &mut self.graph[idx])
    }

    /// The atom with the given input-order id, by linear scan.
    pub fn atom_by_input_id(&self, input_id: u32) -> Option<&Atom> {
        self.graph
            .node_weights()
            .find(|a| a.input_id == input_id)
    }

    /// All atoms in list order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.graph.node_weights()
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Removes an atom, breaking all of its bonds (and therefore every
    /// ring any of those bonds participated in).
    pub fn remove_atom(&mut self, norm_id: u32) -> Result<(), MolError> {
        let idx = self.node_of(norm_id).ok_or(MolError::UnknownAtom {
            molecule: self.id,
            atom: norm_id,
        })?;
        let bond_ids = self.graph[idx].bonds.clone();
        for bond_id in bond_ids {
            self.break_bond(bond_id)?;
        }
        self.graph.remove_node(idx);
        Ok(())
    }

    // ---- bonds ----------------------------------------------------------

    /// Adds a bond between two atoms of this molecule, if one does not
    /// already exist (the existing bond's id is answered in that case).
    /// Fails on unknown atoms, input-only bond orders, and valence
    /// ceiling violations at either endpoint.
    pub fn add_bond(&mut self, a1: u32, a2: u32, order: BondOrder) -> Result<u32, MolError> {
        if !order.is_creatable() {
            return Err(MolError::InvalidBondOrder { order });
        }
        let n1 = self.node_of(a1).ok_or(MolError::UnknownAtom {
            molecule: self.id,
            atom: a1,
        })?;
        let n2 = self.node_of(a2).ok_or(MolError::UnknownAtom {
            molecule: self.id,
            atom: a2,
        })?;
        if n1 == n2 {
            return Err(MolError::SelfBond {
                molecule: self.id,
                atom: a1,
            });
        }

        if let Some(edge) = self.graph.find_edge(n1, n2) {
            return Ok(self.graph[edge].id);
        }

        let delta = order.multiplicity();
        for (node, norm_id) in [(n1, a1), (n2, a2)] {
            let atom = &self.graph[node];
            if !atom.can_change_neighbours(delta) {
                return Err(MolError::ValenceViolation {
                    molecule: self.id,
                    atom: norm_id,
                    valence: atom.valence,
                    neighbours: atom.neighbours.len(),
                    delta,
                });
            }
        }

        self.peak_bond_id += 1;
        let bond_id = self.peak_bond_id;
        let bond = Bond::new(bond_id, self.graph[n1].norm_id, self.graph[n2].norm_id, order);
        self.graph.add_edge(n1, n2, bond);

        let (id1, id2) = (self.graph[n1].norm_id, self.graph[n2].norm_id);
        for (node, other) in [(n1, id2), (n2, id1)] {
            let atom = &mut self.graph[node];
            atom.bonds.push(bond_id);
            for _ in 0..delta {
                atom.neighbours.push(other);
            }
        }
        Ok(bond_id)
    }

    fn edge_of(&self, bond_id: u32) -> Option<petgraph::graph::EdgeIndex> {
        self.graph
            .edge_indices()
            .find(|&e| self.graph[e].id == bond_id)
    }

    /// The bond with the given id.
    pub fn bond_by_id(&self, bond_id: u32) -> Option<&Bond> {
        self.graph.edge_weights().find(|b| b.id == bond_id)
    }

    pub(crate) fn bond_by_id_mut(&mut self, bond_id: u32) -> Option<&mut Bond> {
        self.graph.edge_weights_mut().find(|b| b.id == bond_id)
    }

    /// The bond between two atoms, if any.
    pub fn bond_between(&self, a1: u32, a2: u32) -> Option<&Bond> {
        let n1 = self.node_of(a1)?;
        let n2 = self.node_of(a2)?;
        self.graph
            .find_edge(n1, n2)
            .map(|edge| &self.graph[edge])
    }

    /// All bonds, in insertion order of the underlying edges.
    pub fn bonds(&self) -> impl Iterator<Item = &Bond> {
        self.graph.edge_weights()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn double_bond_count(&self) -> usize {
        self.graph
            .edge_weights()
            .filter(|b| b.order == BondOrder::Double)
            .count()
    }

    pub fn triple_bond_count(&self) -> usize {
        self.graph
            .edge_weights()
            .filter(|b| b.order == BondOrder::Triple)
            .count()
    }

    /// Breaks a bond: both endpoints are adjusted and every ring the
    /// bond participated in is destroyed.
    pub fn break_bond(&mut self, bond_id: u32) -> Result<(), MolError> {
        let edge = self.edge_of(bond_id).ok_or(MolError::UnknownBond {
            molecule: self.id,
            bond: bond_id,
        })?;
        let bond = self.graph[edge].clone();

        for ring_id in bond.rings.clone() {
            self.remove_ring(ring_id);
        }

        for (norm_id, other) in [(bond.a1, bond.a2), (bond.a2, bond.a1)] {
            if let Some(atom) = self.atom_mut(norm_id) {
                atom.bonds.retain(|&b| b != bond_id);
                atom.neighbours.retain(|&n| n != other);
            }
        }

        self.graph.remove_edge(edge);
        Ok(())
    }

    /// Promotes or demotes a bond's order in place, checking both
    /// endpoints' valence ceilings.
    pub fn set_bond_order(&mut self, bond_id: u32, order: BondOrder) -> Result<(), MolError> {
        if !order.is_creatable() {
            return Err(MolError::InvalidBondOrder { order });
        }
        let bond = self.bond_by_id(bond_id).ok_or(MolError::UnknownBond {
            molecule: self.id,
            bond: bond_id,
        })?;
        let (a1, a2, old_order) = (bond.a1, bond.a2, bond.order);
        if order == old_order {
            return Ok(());
        }

        let old_mult = old_order.multiplicity();
        let new_mult = order.multiplicity();
        if new_mult > old_mult {
            let grow = new_mult - old_mult;
            for norm_id in [a1, a2] {
                let atom = self.atom(norm_id).ok_or(MolError::UnknownAtom {
                    molecule: self.id,
                    atom: norm_id,
                })?;
                if !atom.can_change_neighbours(grow) {
                    return Err(MolError::ValenceViolation {
                        molecule: self.id,
                        atom: norm_id,
                        valence: atom.valence,
                        neighbours: atom.neighbours.len(),
                        delta: grow,
                    });
                }
            }
        }

        for (norm_id, other) in [(a1, a2), (a2, a1)] {
            if let Some(atom) = self.atom_mut(norm_id) {
                atom.neighbours.retain(|&n| n != other);
                for _ in 0..new_mult {
                    atom.neighbours.push(other);
                }
            }
        }
        if let Some(bond) = self.bond_by_id_mut(bond_id) {
            bond.order = order;
        }
        Ok(())
    }

    // ---- rings ----------------------------------------------------------

    /// The ring with the given id.
    pub fn ring(&self, ring_id: u32) -> Option<&Ring> {
        self.rings.iter().find(|r| r.id == ring_id)
    }

    pub(crate) fn ring_mut(&mut self, ring_id: u32) -> Option<&mut Ring> {
        self.rings.iter_mut().find(|r| r.id == ring_id)
    }

    pub(crate) fn ring_system_mut(&mut self, system_id: u32) -> Option<&mut RingSystem> {
        self.ring_systems.iter_mut().find(|s| s.id == system_id)
    }

    /// All rings, in detection order (ascending size).
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Rings flagged aromatic by the last normalisation.
    pub fn aromatic_ring_count(&self) -> usize {
        self.rings.iter().filter(|r| r.aromatic).count()
    }

    /// All ring systems.
    pub fn ring_systems(&self) -> &[RingSystem] {
        &self.ring_systems
    }

    pub fn ring_system_count(&self) -> usize {
        self.ring_systems.len()
    }

    pub fn aromatic_ring_system_count(&self) -> usize {
        self.ring_systems.iter().filter(|s| s.aromatic).count()
    }

    /// Removes one ring, clearing the membership lists of its atoms and
    /// bonds and shrinking (or dropping) its ring system.
    pub(crate) fn remove_ring(&mut self, ring_id: u32) {
        let Some(pos) = self.rings.iter().position(|r| r.id == ring_id) else {
            return;
        };
        let ring = self.rings.remove(pos);

        for &norm_id in &ring.atoms {
            if let Some(atom) = self.atom_mut(norm_id) {
                atom.rings.retain(|&r| r != ring_id);
            }
        }
        for &bond_id in &ring.bonds {
            if let Some(bond) = self.bond_by_id_mut(bond_id) {
                bond.rings.retain(|&r| r != ring_id);
            }
        }

        if let Some(sys_pos) = self
            .ring_systems
            .iter()
            .position(|s| s.rings.contains(&ring_id))
        {
            let remaining: Vec<&Ring> = self.rings.iter().collect();
            self.ring_systems[sys_pos].remove_ring(ring_id, &remaining);
            if self.ring_systems[sys_pos].rings.is_empty() {
                self.ring_systems.remove(sys_pos);
            }
        }
    }

    /// The smallest ring this atom participates in; `None` outside any
    /// ring; an error when several rings tie for smallest.
    pub fn smallest_ring_of_atom(&self, norm_id: u32) -> Result<Option<&Ring>, MolError> {
        let atom = self.atom(norm_id).ok_or(MolError::UnknownAtom {
            molecule: self.id,
            atom: norm_id,
        })?;
        self.smallest_among(&atom.rings)
    }

    /// The smallest ring this bond participates in, with the same
    /// contract as [`Self::smallest_ring_of_atom`].
    pub fn smallest_ring_of_bond(&self, bond_id: u32) -> Result<Option<&Ring>, MolError> {
        let bond = self.bond_by_id(bond_id).ok_or(MolError::UnknownBond {
            molecule: self.id,
            bond: bond_id,
        })?;
        self.smallest_among(&bond.rings)
    }

    fn smallest_among(&self, ring_ids: &[u32]) -> Result<Option<&Ring>, MolError> {
        let rings: Vec<&Ring> = ring_ids.iter().filter_map(|&r| self.ring(r)).collect();
        let Some(min) = rings.iter().map(|r| r.size()).min() else {
            return Ok(None);
        };
        let mut smallest = rings.iter().filter(|r| r.size() == min);
        let first = smallest.next().expect("min size has a witness");
        let count = 1 + smallest.count();
        if count > 1 {
            return Err(MolError::AmbiguousSmallestRing { size: min, count });
        }
        Ok(Some(first))
    }

    // ---- neighbours -----------------------------------------------------

    /// The doubly-bonded neighbour with the lowest normalised id, if
    /// any. Assumes a normalised molecule (bond lists are sorted then).
    pub fn first_doubly_bonded_neighbour(&self, norm_id: u32) -> Option<u32> {
        self.first_partner_where(norm_id, |order| order == BondOrder::Double)
    }

    /// The multiply-bonded (double or triple) neighbour with the lowest
    /// normalised id, if any.
    pub fn first_multiply_bonded_neighbour(&self, norm_id: u32) -> Option<u32> {
        self.first_partner_where(norm_id, |order| {
            matches!(order, BondOrder::Double | BondOrder::Triple)
        })
    }

    fn first_partner_where(&self, norm_id: u32, pred: impl Fn(BondOrder) -> bool) -> Option<u32> {
        let atom = self.atom(norm_id)?;
        atom.bonds.iter().find_map(|&bond_id| {
            let bond = self.bond_by_id(bond_id)?;
            if pred(bond.order) {
                bond.other_atom(norm_id)
            } else {
                None
            }
        })
    }

    // ---- attributes -----------------------------------------------------

    /// Adds a named attribute; input order is preserved. Fails on empty
    /// names or values and on duplicate names.
    pub fn add_attribute(&mut self, name: &str, value: &str) -> Result<(), MolError> {
        if name.is_empty() || value.is_empty() {
            return Err(MolError::EmptyAttribute);
        }
        if self.attr_names.iter().any(|n| n == name) {
            return Err(MolError::DuplicateAttribute {
                name: name.to_string(),
            });
        }
        self.attr_names.push(name.to_string());
        self.attr_values.push(value.to_string());
        Ok(())
    }

    /// Replaces an existing attribute's value, answering the previous
    /// one.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<String, MolError> {
        if name.is_empty() || value.is_empty() {
            return Err(MolError::EmptyAttribute);
        }
        let idx = self
            .attr_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| MolError::UnknownAttribute {
                name: name.to_string(),
            })?;
        Ok(std::mem::replace(&mut self.attr_values[idx], value.to_string()))
    }

    /// Removes an attribute; answers whether one was removed.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        match self.attr_names.iter().position(|n| n == name) {
            Some(idx) => {
                self.attr_names.remove(idx);
                self.attr_values.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attr_names.iter().any(|n| n == name)
    }

    /// The value of a named attribute.
    pub fn attribute(&self, name: &str) -> Result<&str, MolError> {
        self.attr_names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.attr_values[idx].as_str())
            .ok_or_else(|| MolError::UnknownAttribute {
                name: name.to_string(),
            })
    }

    /// The name of the first attribute (in input order) carrying the
    /// given value. Values can repeat; names cannot.
    pub fn attribute_name_for(&self, value: &str) -> Result<&str, MolError> {
        self.attr_values
            .iter()
            .position(|v| v == value)
            .map(|idx| self.attr_names[idx].as_str())
            .ok_or_else(|| MolError::UnknownAttributeValue {
                value: value.to_string(),
            })
    }

    /// Attribute pairs in input order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attr_names
            .iter()
            .map(String::as_str)
            .zip(self.attr_values.iter().map(String::as_str))
    }

    // ---- derived state --------------------------------------------------

    /// `|bonds| − |atoms| + 1`: ≤ 0 for trees and forests, the cycle
    /// count oracle otherwise.
    pub fn frerejacque(&self) -> i64 {
        self.graph.edge_count() as i64 - self.graph.node_count() as i64 + 1
    }

    /// Shortest distance in bond hops between two input ids. Valid after
    /// `normalise`.
    pub fn distance_between(&self, input_id1: u32, input_id2: u32) -> u32 {
        self.distances.distance_between(input_id1, input_id2)
    }

    /// Intermediate input ids along one shortest path; `None` across
    /// components, empty when directly bonded. Valid after `normalise`.
    pub fn shortest_path_between(&self, input_id1: u32, input_id2: u32) -> Option<Vec<u32>> {
        self.distances.shortest_path_between(input_id1, input_id2)
    }

    /// π electrons the given atom contributes to a ring it is part of.
    pub fn pi_electrons_of(&self, norm_id: u32) -> Option<u32> {
        self.atom(norm_id).map(|a| aromaticity::pi_electrons(self, a))
    }

    /// Derives implicit hydrogen counts for uncharged atoms from their
    /// valence ceilings, replacing prior counts. Charged atoms are left
    /// as given, since their effective valence is not knowable here.
    pub fn assign_implicit_hydrogens(&mut self) {
        for atom in self.graph.node_weights_mut() {
            if atom.charge == 0 && atom.valence as usize >= atom.neighbours.len() {
                atom.num_h = atom.valence - atom.neighbours.len() as u8;
            }
        }
    }

    /// Converts the molecule into its normalised representation:
    /// positional normalised ids, distance matrices, rings, ring
    /// systems, aromaticity, unsaturation, hashes and the
    /// benzylic/bridgehead/spiro flags. Idempotent.
    pub fn normalise(&mut self) -> Result<(), MolError> {
        self.renumber();
        self.distances = DistanceMatrix::build(
            self.peak_atom_id,
            self.graph.edge_indices().map(|e| {
                let (n1, n2) = self.graph.edge_endpoints(e).expect("edge has endpoints");
                (self.graph[n1].input_id, self.graph[n2].input_id)
            }),
        );
        self.reset_ring_state();
        self.determine_unsaturation()?;

        let f = self.frerejacque();
        let connected =
            self.graph.node_count() > 0 && connected_components(&self.graph) == 1;
        if f > 0 && f <= MAX_RINGS && connected {
            let (rings, groups) = detect::detect_rings(self)?;
            self.install_rings(rings, groups);
            aromaticity::classify(self);
        } else {
            debug!(
                "molecule {}: skipping ring detection (frerejacque {}, connected {})",
                self.id, f, connected
            );
        }

        for atom in self.graph.node_weights_mut() {
            atom.compute_hash();
        }
        self.mark_benzylic();
        self.mark_spiro();
        self.mark_bridgeheads();
        Ok(())
    }

    /// Re-assigns normalised ids positionally and rewrites everything
    /// derived from them: bond endpoints and pair hashes, neighbour
    /// expansions, and the sort order of per-atom bond lists.
    fn renumber(&mut self) {
        let mut remap: HashMap<u32, u32> = HashMap::with_capacity(self.graph.node_count());
        for (pos, atom) in self.graph.node_weights_mut().enumerate() {
            remap.insert(atom.norm_id, pos as u32 + 1);
            atom.norm_id = pos as u32 + 1;
        }

        let mut bond_info: HashMap<u32, (u32, u32, usize)> =
            HashMap::with_capacity(self.graph.edge_count());
        for bond in self.graph.edge_weights_mut() {
            bond.a1 = remap[&bond.a1];
            bond.a2 = remap[&bond.a2];
            bond.pair_hash = pair_hash(bond.a1, bond.a2);
            bond_info.insert(bond.id, (bond.a1, bond.a2, bond.order.multiplicity()));
        }

        for atom in self.graph.node_weights_mut() {
            let me = atom.norm_id;
            let partner = |bond_id: u32| {
                let (a1, a2, _) = bond_info[&bond_id];
                if a1 == me {
                    a2
                } else {
                    a1
                }
            };
            atom.bonds.sort_by_key(|&b| partner(b));
            atom.neighbours.clear();
            for &bond_id in &atom.bonds {
                let (a1, a2, mult) = bond_info[&bond_id];
                let other = if a1 == me { a2 } else { a1 };
                for _ in 0..mult {
                    atom.neighbours.push(other);
                }
            }
        }
    }

    fn reset_ring_state(&mut self) {
        for atom in self.graph.node_weights_mut() {
            atom.reset_ring_state();
        }
        for bond in self.graph.edge_weights_mut() {
            bond.reset_ring_state();
        }
        self.rings.clear();
        self.ring_systems.clear();
        self.peak_ring_id = 0;
    }

    /// Classifies each atom's unsaturation from its incident bond
    /// orders. An uncharged atom whose expansion plus hydrogens misses
    /// its valence is a contract violation.
    fn determine_unsaturation(&mut self) -> Result<(), MolError> {
        let ids: Vec<u32> = self.graph.node_weights().map(|a| a.norm_id).collect();
        for norm_id in ids {
            let atom = self.atom(norm_id).expect("id just enumerated");
            if atom.charge != 0 {
                let atom = self.atom_mut(norm_id).expect("id just enumerated");
                atom.unsaturation = Unsaturation::Charged;
                continue;
            }
            if atom.neighbours.len() + usize::from(atom.num_h) != usize::from(atom.valence) {
                return Err(MolError::UnsaturationMismatch {
                    molecule: self.id,
                    atom: norm_id,
                    neighbours: atom.neighbours.len(),
                    hydrogens: atom.num_h,
                    valence: atom.valence,
                });
            }

            let mut doubles = 0usize;
            let mut hetero_doubles = 0usize;
            let mut triples = 0usize;
            let mut hetero_triples = 0usize;
            for &bond_id in &atom.bonds {
                let Some(bond) = self.bond_by_id(bond_id) else {
                    continue;
                };
                let hetero = bond
                    .other_atom(norm_id)
                    .and_then(|o| self.atom(o))
                    .is_some_and(|o| o.element().is_hetero());
                match bond.order {
                    BondOrder::Double => {
                        doubles += 1;
                        if hetero {
                            hetero_doubles += 1;
                        }
                    }
                    BondOrder::Triple => {
                        triples += 1;
                        if hetero {
                            hetero_triples += 1;
                        }
                    }
                    _ => {}
                }
            }

            let unsat = if triples > 0 {
                if hetero_triples == 0 {
                    Unsaturation::TbondC
                } else {
                    Unsaturation::TbondX
                }
            } else {
                match doubles {
                    0 => Unsaturation::None,
                    1 => {
                        if hetero_doubles == 0 {
                            Unsaturation::DbondC
                        } else {
                            Unsaturation::DbondX
                        }
                    }
                    _ => match hetero_doubles {
                        0 => Unsaturation::DbondCC,
                        1 => Unsaturation::DbondCX,
                        _ => Unsaturation::DbondXX,
                    },
                }
            };
            self.atom_mut(norm_id).expect("id just enumerated").unsaturation = unsat;
        }
        Ok(())
    }

    /// Attaches detected rings and their system grouping, assigning ids
    /// and wiring membership back-references.
    fn install_rings(&mut self, rings: Vec<Ring>, groups: Vec<Vec<usize>>) {
        let mut ids = Vec::with_capacity(rings.len());
        for mut ring in rings {
            self.peak_ring_id += 1;
            ring.id = self.peak_ring_id;
            ring.normalise();
            ids.push(ring.id);

            for &norm_id in &ring.atoms {
                if let Some(atom) = self.atom_mut(norm_id) {
                    atom.rings.push(ring.id);
                }
            }
            for &bond_id in &ring.bonds {
                if let Some(bond) = self.bond_by_id_mut(bond_id) {
                    bond.rings.push(ring.id);
                }
            }
            self.rings.push(ring);
        }

        for (pos, group) in groups.into_iter().enumerate() {
            let mut system = RingSystem::new(pos as u32 + 1, self.id);
            for ring_pos in group {
                let ring_id = ids[ring_pos];
                let ring = self
                    .rings
                    .iter()
                    .position(|r| r.id == ring_id)
                    .expect("installed above");
                self.rings[ring].ring_system_id = system.id;
                let ring = self.rings[ring].clone();
                system
                    .add_ring(&ring)
                    .expect("detector groups rings of this molecule");
            }
            self.ring_systems.push(system);
        }
    }

    /// An atom not in an aromatic ring, bonded to one, and carrying at
    /// least one hydrogen is benzylic.
    fn mark_benzylic(&mut self) {
        let mut benzylic = Vec::new();
        for atom in self.graph.node_weights() {
            if atom.in_aromatic_ring || atom.num_h == 0 {
                continue;
            }
            let next_to_aromatic = atom.bonds.iter().any(|&bond_id| {
                self.bond_by_id(bond_id)
                    .and_then(|b| b.other_atom(atom.norm_id))
                    .and_then(|o| self.atom(o))
                    .is_some_and(|o| o.in_aromatic_ring)
            });
            if next_to_aromatic {
                benzylic.push(atom.norm_id);
            }
        }
        for norm_id in benzylic {
            if let Some(atom) = self.atom_mut(norm_id) {
                atom.benzylic = true;
            }
        }
    }

    /// An atom in two or more rings whose atom sets intersect in
    /// exactly that atom is a spiro centre.
    fn mark_spiro(&mut self) {
        let mut spiro = Vec::new();
        for atom in self.graph.node_weights() {
            if atom.rings.len() < 2 {
                continue;
            }
            let mut common = self
                .ring(atom.rings[0])
                .map(|r| r.atom_bits().clone())
                .unwrap_or_default();
            for &ring_id in &atom.rings[1..] {
                if let Some(ring) = self.ring(ring_id) {
                    common.intersect_with(ring.atom_bits());
                }
            }
            if common.cardinality() == 1 {
                spiro.push(atom.norm_id);
            }
        }
        for norm_id in spiro {
            if let Some(atom) = self.atom_mut(norm_id) {
                atom.spiro = true;
            }
        }
    }

    /// Junction atoms common to two rings of one system that share two
    /// or more bonds (a bridged configuration) are bridgeheads.
    fn mark_bridgeheads(&mut self) {
        let mut heads: Vec<u32> = Vec::new();
        for system in &self.ring_systems {
            let member: Vec<&Ring> = system
                .rings
                .iter()
                .filter_map(|&id| self.ring(id))
                .collect();
            for (i, r1) in member.iter().enumerate() {
                for r2 in &member[i + 1..] {
                    if r1.common_bonds(r2).cardinality() < 2 {
                        continue;
                    }
                    for input_id in r1.common_atoms(r2).ones() {
                        let junction = self
                            .atom_by_input_id(input_id as u32)
                            .is_some_and(|a| a.is_junction());
                        if junction {
                            heads.push(input_id as u32);
                        }
                    }
                }
            }
        }
        for input_id in heads {
            if let Some(idx) = self
                .graph
                .node_indices()
                .find(|&i| self.graph[i].input_id == input_id)
            {
                self.graph[idx].bridgehead = true;
            }
        }
    }

    /// Bridgehead atoms of the last normalisation, by normalised id.
    pub fn bridgeheads(&self) -> Vec<u32> {
        self.graph
            .node_weights()
            .filter(|a| a.bridgehead)
            .map(|a| a.norm_id)
            .collect()
    }
}

impl Default for Molecule {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Molecule")
            .field("id", &self.id)
            .field("atoms", &self.graph.node_count())
            .field("bonds", &self.graph.edge_count())
            .field("rings", &self.rings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PeriodicTable;

    fn carbon() -> Element {
        PeriodicTable::element("C").unwrap()
    }

    fn oxygen() -> Element {
        PeriodicTable::element("O").unwrap()
    }

    #[test]
    fn unique_molecule_ids() {
        let a = Molecule::new();
        let b = Molecule::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn add_atoms_and_bonds() {
        let mut m = Molecule::new();
        let c1 = m.add_atom(carbon());
        let c2 = m.add_atom(carbon());
        let b = m.add_bond(c1, c2, BondOrder::Single).unwrap();
        assert_eq!(m.atom_count(), 2);
        assert_eq!(m.bond_count(), 1);
        assert_eq!(m.bond_between(c1, c2).unwrap().id(), b);
        assert_eq!(m.bond_between(c2, c1).unwrap().id(), b);
    }

    #[test]
    fn duplicate_bond_answers_existing() {
        let mut m = Molecule::new();
        let c1 = m.add_atom(carbon());
        let c2 = m.add_atom(carbon());
        let b1 = m.add_bond(c1, c2, BondOrder::Single).unwrap();
        let b2 = m.add_bond(c2, c1, BondOrder::Double).unwrap();
        assert_eq!(b1, b2);
        assert_eq!(m.bond_count(), 1);
        assert_eq!(m.bond_by_id(b1).unwrap().order(), BondOrder::Single);
    }

    #[test]
    fn valence_violation_is_loud() {
        let mut m = Molecule::new();
        let o = m.add_atom(oxygen());
        let c1 = m.add_atom(carbon());
        let c2 = m.add_atom(carbon());
        let c3 = m.add_atom(carbon());
        m.add_bond(o, c1, BondOrder::Single).unwrap();
        m.add_bond(o, c2, BondOrder::Single).unwrap();
        let err = m.add_bond(o, c3, BondOrder::Single).unwrap_err();
        assert!(matches!(err, MolError::ValenceViolation { atom, .. } if atom == o));
    }

    #[test]
    fn input_only_orders_are_rejected() {
        let mut m = Molecule::new();
        let c1 = m.add_atom(carbon());
        let c2 = m.add_atom(carbon());
        let err = m.add_bond(c1, c2, BondOrder::SingleOrDouble).unwrap_err();
        assert!(matches!(err, MolError::InvalidBondOrder { .. }));
    }

    #[test]
    fn self_bond_is_rejected() {
        let mut m = Molecule::new();
        let c = m.add_atom(carbon());
        assert!(matches!(
            m.add_bond(c, c, BondOrder::Single),
            Err(MolError::SelfBond { .. })
        ));
    }

    #[test]
    fn remove_atom_round_trip() {
        let mut m = Molecule::new();
        let c1 = m.add_atom(carbon());
        let c2 = m.add_atom(carbon());
        m.add_bond(c1, c2, BondOrder::Single).unwrap();
        let atoms = m.atom_count();
        let bonds = m.bond_count();

        let c3 = m.add_atom(carbon());
        m.add_bond(c2, c3, BondOrder::Single).unwrap();
        m.remove_atom(c3).unwrap();

        assert_eq!(m.atom_count(), atoms);
        assert_eq!(m.bond_count(), bonds);
    }

    #[test]
    fn attributes_preserve_order_and_reject_duplicates() {
        let mut m = Molecule::new();
        m.add_attribute("b", "2").unwrap();
        m.add_attribute("a", "1").unwrap();
        assert!(matches!(
            m.add_attribute("a", "9"),
            Err(MolError::DuplicateAttribute { .. })
        ));
        assert!(matches!(
            m.add_attribute("", "x"),
            Err(MolError::EmptyAttribute)
        ));
        let names: Vec<&str> = m.attributes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(m.attribute("a").unwrap(), "1");
        let old = m.set_attribute("a", "7").unwrap();
        assert_eq!(old, "1");
        assert_eq!(m.attribute_name_for("2").unwrap(), "b");
        assert!(m.remove_attribute("b"));
        assert!(!m.remove_attribute("b"));
        assert!(matches!(
            m.attribute("b"),
            Err(MolError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn frerejacque_values() {
        let mut m = Molecule::new();
        let a = m.add_atom(carbon());
        let b = m.add_atom(carbon());
        let c = m.add_atom(carbon());
        m.add_bond(a, b, BondOrder::Single).unwrap();
        m.add_bond(b, c, BondOrder::Single).unwrap();
        assert_eq!(m.frerejacque(), 0);
        m.add_bond(c, a, BondOrder::Single).unwrap();
        assert_eq!(m.frerejacque(), 1);
    }

    #[test]
    fn implicit_hydrogens_and_unsaturation() {
        let mut m = Molecule::new();
        let c1 = m.add_atom(carbon());
        let c2 = m.add_atom(carbon());
        m.add_bond(c1, c2, BondOrder::Double).unwrap();
        m.assign_implicit_hydrogens();
        m.normalise().unwrap();
        assert_eq!(m.atom(c1).unwrap().hydrogen_count(), 2);
        assert_eq!(m.atom(c1).unwrap().unsaturation(), Unsaturation::DbondC);
        assert_eq!(m.atom(c1).unwrap().hash_value(), 6022);
    }

    #[test]
    fn unsaturation_mismatch_is_loud() {
        let mut m = Molecule::new();
        let c1 = m.add_atom(carbon());
        let c2 = m.add_atom(carbon());
        m.add_bond(c1, c2, BondOrder::Single).unwrap();
        // No hydrogens assigned: carbon with one neighbour cannot reach
        // valence 4.
        let err = m.normalise().unwrap_err();
        assert!(matches!(err, MolError::UnsaturationMismatch { .. }));
    }

    #[test]
    fn charged_atom_short_circuits() {
        let mut m = Molecule::new();
        let c1 = m.add_atom(carbon());
        let c2 = m.add_atom(carbon());
        m.add_bond(c1, c2, BondOrder::Single).unwrap();
        m.atom_mut(c1).unwrap().set_charge(-1);
        m.assign_implicit_hydrogens();
        m.atom_mut(c2).unwrap().set_hydrogen_count(3);
        m.normalise().unwrap();
        assert_eq!(m.atom(c1).unwrap().unsaturation(), Unsaturation::Charged);
    }
}
