use crate::element::Element;

/// Chiral configuration tag, stored passively from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chirality {
    /// Atom is achiral.
    #[default]
    None,
    /// R configuration.
    Clock,
    /// S configuration.
    AntiClock,
    /// Part of a racemic mixture.
    Racemic,
    /// Chiral, exact configuration not known.
    Undefined,
}

/// Radical state tag, stored passively from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Radical {
    #[default]
    None,
    Singlet,
    Doublet,
    Triplet,
}

impl Radical {
    /// Maps the MOL-file radical value. Unknown values answer `None`.
    pub fn from_value(n: i32) -> Option<Radical> {
        match n {
            0 => Some(Radical::None),
            1 => Some(Radical::Singlet),
            2 => Some(Radical::Doublet),
            3 => Some(Radical::Triplet),
            _ => None,
        }
    }
}

/// Categorical description of the non-single bonds at an atom, and
/// whether the partners are carbon or hetero atoms.
///
/// Computed during normalisation from the incident bond orders;
/// aromaticity perception overrides it to `Aromatic` afterwards. The
/// numeric value participates in the compact atom hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unsaturation {
    /// All bonds are single.
    #[default]
    None,
    /// Atom is part of an aromatic ring.
    Aromatic,
    /// One double bond, to a carbon.
    DbondC,
    /// One double bond, to a hetero atom.
    DbondX,
    /// Two double bonds, both to carbons.
    DbondCC,
    /// Two double bonds, one to a hetero atom.
    DbondCX,
    /// Two double bonds, both to hetero atoms.
    DbondXX,
    /// A triple bond to a carbon.
    TbondC,
    /// A triple bond to a hetero atom.
    TbondX,
    /// Atom carries a net charge; bond-based classification is skipped.
    Charged,
}

impl Unsaturation {
    /// Numeric value used in the compact atom hash.
    pub fn value(self) -> u32 {
        match self {
            Unsaturation::None => 0,
            Unsaturation::Aromatic => 1,
            Unsaturation::DbondC => 2,
            Unsaturation::DbondX => 3,
            Unsaturation::DbondCC => 4,
            Unsaturation::DbondCX => 5,
            Unsaturation::DbondXX => 6,
            Unsaturation::TbondC => 7,
            Unsaturation::TbondX => 8,
            Unsaturation::Charged => 9,
        }
    }
}

/// A 3-D coordinate carried through from the input record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A node of the molecule graph.
///
/// An atom carries two 1-based identifiers: the input-order id, preserved
/// for tracing back to source records, and the normalised id used by all
/// graph queries. They coincide until atoms are removed; `normalise`
/// re-assigns normalised ids so that the atom at list position `i` has
/// normalised id `i + 1`.
///
/// Bonds, expanded neighbours and rings are held as id lists rather than
/// references; the owning [`Molecule`](crate::Molecule) resolves them.
#[derive(Debug, Clone)]
pub struct Atom {
    pub(crate) element: Element,
    pub(crate) input_id: u32,
    pub(crate) norm_id: u32,
    /// Input coordinates, if the source provided them.
    pub coordinates: Option<Point3>,
    pub(crate) num_h: u8,
    pub(crate) charge: i8,
    pub(crate) valence: u8,
    pub(crate) chirality: Chirality,
    pub(crate) radical: Radical,
    pub(crate) unsaturation: Unsaturation,
    pub(crate) hash: u32,
    /// Ids of the bonds this atom participates in.
    pub(crate) bonds: Vec<u32>,
    /// Normalised ids of neighbours, repeated once per bond-order unit.
    pub(crate) neighbours: Vec<u32>,
    /// Ids of the rings this atom participates in.
    pub(crate) rings: Vec<u32>,
    pub(crate) in_aromatic_ring: bool,
    pub(crate) benzylic: bool,
    pub(crate) bridgehead: bool,
    pub(crate) spiro: bool,
}

impl Atom {
    pub(crate) fn new(element: Element) -> Self {
        Self {
            element,
            input_id: 0,
            norm_id: 0,
            coordinates: None,
            num_h: 0,
            charge: 0,
            valence: element.valence,
            chirality: Chirality::default(),
            radical: Radical::default(),
            unsaturation: Unsaturation::default(),
            hash: 0,
            bonds: Vec::new(),
            neighbours: Vec::new(),
            rings: Vec::new(),
            in_aromatic_ring: false,
            benzylic: false,
            bridgehead: false,
            spiro: false,
        }
    }

    pub fn element(&self) -> Element {
        self.element
    }

    /// Input-order id, 1-based, unique for the molecule's lifetime.
    pub fn input_id(&self) -> u32 {
        self.input_id
    }

    /// Normalised id, 1-based; the id all graph queries use.
    pub fn id(&self) -> u32 {
        self.norm_id
    }

    pub fn charge(&self) -> i8 {
        self.charge
    }

    pub fn set_charge(&mut self, charge: i8) {
        self.charge = charge;
    }

    pub fn chirality(&self) -> Chirality {
        self.chirality
    }

    pub fn set_chirality(&mut self, c: Chirality) {
        self.chirality = c;
    }

    pub fn radical(&self) -> Radical {
        self.radical
    }

    pub fn set_radical(&mut self, r: Radical) {
        self.radical = r;
    }

    /// The valence ceiling currently in force for this atom.
    pub fn valence(&self) -> u8 {
        self.valence
    }

    /// Overrides the valence ceiling. Non-positive values are ignored.
    pub fn set_valence(&mut self, v: u8) {
        if v > 0 {
            self.valence = v;
        }
    }

    /// Total attached hydrogens, explicit plus implicit.
    pub fn hydrogen_count(&self) -> u8 {
        self.num_h
    }

    pub fn set_hydrogen_count(&mut self, n: u8) {
        self.num_h = n;
    }

    /// Increments the hydrogen count if the valence ceiling permits.
    pub fn add_hydrogen(&mut self) {
        if self.neighbours.len() + usize::from(self.num_h) + 1 <= usize::from(self.valence) {
            self.num_h += 1;
        }
    }

    /// Replaces the element with its isotope of the given mass number.
    pub fn set_isotope(&mut self, mass_number: u16) {
        if let Some(el) =
            crate::element::PeriodicTable::isotope(self.element.symbol, mass_number)
        {
            self.element = el;
        }
    }

    pub fn unsaturation(&self) -> Unsaturation {
        self.unsaturation
    }

    /// Whether the atom can form no further bonds.
    pub fn is_saturated(&self) -> bool {
        self.unsaturation == Unsaturation::None
    }

    /// Number of distinct bonds (equivalently, distinct neighbours).
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Number of neighbours counted once per bond-order unit.
    pub fn neighbour_count(&self) -> usize {
        self.neighbours.len()
    }

    /// Ids of the bonds this atom participates in.
    pub fn bond_ids(&self) -> &[u32] {
        &self.bonds
    }

    /// Ids of the rings this atom participates in.
    pub fn ring_ids(&self) -> &[u32] {
        &self.rings
    }

    /// A junction atom can branch an in-coming path: three or more bonds.
    pub fn is_junction(&self) -> bool {
        self.bonds.len() >= 3
    }

    /// Whether the atom has exactly one neighbour.
    pub fn is_terminal(&self) -> bool {
        self.bonds.len() == 1
    }

    pub fn is_cyclic(&self) -> bool {
        !self.rings.is_empty()
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn is_aromatic(&self) -> bool {
        self.in_aromatic_ring
    }

    /// Saturated atom directly bonded to an aromatic ring, carrying at
    /// least one hydrogen. Computed during normalisation.
    pub fn is_benzylic(&self) -> bool {
        self.benzylic
    }

    /// Junction shared by two rings of a bridged ring system. Computed
    /// during normalisation.
    pub fn is_bridgehead(&self) -> bool {
        self.bridgehead
    }

    /// Sole atom common to all rings it participates in. Computed during
    /// normalisation.
    pub fn is_spiro(&self) -> bool {
        self.spiro
    }

    /// Compact fingerprint `1000·atomic_number + 10·unsaturation + H`.
    /// Valid after normalisation.
    pub fn hash_value(&self) -> u32 {
        self.hash
    }

    pub(crate) fn set_aromatic(&mut self, aromatic: bool) {
        self.in_aromatic_ring = aromatic;
        if aromatic {
            self.unsaturation = Unsaturation::Aromatic;
        }
    }

    pub(crate) fn compute_hash(&mut self) {
        self.hash = 1000 * u32::from(self.element.number)
            + 10 * self.unsaturation.value()
            + u32::from(self.num_h);
    }

    /// Whether adding `delta` neighbour units stays within the ceiling.
    pub(crate) fn can_change_neighbours(&self, delta: usize) -> bool {
        self.neighbours.len() + delta <= usize::from(self.valence)
    }

    pub(crate) fn reset_ring_state(&mut self) {
        self.rings.clear();
        self.in_aromatic_ring = false;
        self.benzylic = false;
        self.bridgehead = false;
        self.spiro = false;
    }
}
