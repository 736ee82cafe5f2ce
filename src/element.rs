use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Chemical information for one natural element.
///
/// The precision of the data is what ring perception and valence checks
/// need, not a physics reference: atomic number, symbol, natural valence
/// and atomic weight. Elements with no single natural valence (transition
/// metals) get a valence ceiling of 0 and cannot form bonds here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Atomic number (1 = H, 6 = C, 7 = N, ...).
    pub number: u8,
    /// Element symbol as it appears in MOL files.
    pub symbol: &'static str,
    /// Atomic weight of the naturally most abundant variety, or the mass
    /// number for an isotope entry.
    pub weight: f64,
    /// Natural valence used as the default bonding ceiling.
    pub valence: u8,
}

impl Element {
    /// True for every element other than carbon. Hydrogen never appears
    /// as a graph node here, so "hetero" in practice means N, O, S, P,
    /// halogens and friends.
    pub fn is_hetero(&self) -> bool {
        self.number != 6
    }
}

// (number, symbol, weight, valence); valence 0 stands in for "no natural
// valence".
static ELEMENT_DATA: [(u8, &str, f64, u8); 54] = [
    (1, "H", 1.008, 1),
    (2, "He", 4.003, 0),
    (3, "Li", 6.941, 1),
    (4, "Be", 9.012, 2),
    (5, "B", 10.812, 3),
    (6, "C", 12.011, 4),
    (7, "N", 14.007, 3),
    (8, "O", 15.999, 2),
    (9, "F", 18.998, 1),
    (10, "Ne", 20.18, 0),
    (11, "Na", 22.99, 1),
    (12, "Mg", 24.305, 2),
    (13, "Al", 26.982, 6),
    (14, "Si", 28.086, 4),
    (15, "P", 30.974, 3),
    (16, "S", 32.067, 2),
    (17, "Cl", 35.453, 1),
    (18, "Ar", 39.948, 0),
    (19, "K", 39.098, 1),
    (20, "Ca", 40.078, 2),
    (21, "Sc", 44.956, 0),
    (22, "Ti", 47.867, 0),
    (23, "V", 50.942, 0),
    (24, "Cr", 51.996, 0),
    (25, "Mn", 54.938, 0),
    (26, "Fe", 55.845, 0),
    (27, "Co", 58.933, 0),
    (28, "Ni", 58.693, 0),
    (29, "Cu", 63.546, 0),
    (30, "Zn", 65.39, 0),
    (31, "Ga", 69.723, 3),
    (32, "Ge", 72.61, 4),
    (33, "As", 74.922, 3),
    (34, "Se", 78.96, 2),
    (35, "Br", 79.904, 1),
    (36, "Kr", 83.8, 0),
    (37, "Rb", 85.468, 1),
    (38, "Sr", 87.62, 2),
    (39, "Y", 88.906, 0),
    (40, "Zr", 91.224, 0),
    (41, "Nb", 92.906, 0),
    (42, "Mo", 95.94, 0),
    (43, "Tc", 98.0, 0),
    (44, "Ru", 101.07, 0),
    (45, "Rh", 102.906, 0),
    (46, "Pd", 106.42, 0),
    (47, "Ag", 107.868, 0),
    (48, "Cd", 112.412, 0),
    (49, "In", 114.818, 3),
    (50, "Sn", 118.711, 4),
    (51, "Sb", 121.76, 3),
    (52, "Te", 127.6, 2),
    (53, "I", 126.904, 1),
    (54, "Xe", 131.29, 0),
];

static BY_SYMBOL: Lazy<HashMap<&'static str, Element>> = Lazy::new(|| {
    ELEMENT_DATA
        .iter()
        .map(|&(number, symbol, weight, valence)| {
            (
                symbol,
                Element {
                    number,
                    symbol,
                    weight,
                    valence,
                },
            )
        })
        .collect()
});

/// Process-wide periodic table. Immutable after first use; safe for
/// concurrent reads from any thread.
pub struct PeriodicTable;

impl PeriodicTable {
    /// Looks up an element by symbol. A symbol of the form `C_13`
    /// denotes an isotope: the base element with its weight replaced by
    /// the given mass number.
    pub fn element(symbol: &str) -> Option<Element> {
        if let Some((base, mass)) = symbol.split_once('_') {
            let mass: u16 = mass.parse().ok()?;
            let mut el = *BY_SYMBOL.get(base)?;
            el.weight = f64::from(mass);
            return Some(el);
        }

        BY_SYMBOL.get(symbol).copied()
    }

    /// Looks up the isotope of `symbol` with the given mass number.
    pub fn isotope(symbol: &str, mass_number: u16) -> Option<Element> {
        let mut el = *BY_SYMBOL.get(symbol)?;
        el.weight = f64::from(mass_number);
        Some(el)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carbon() {
        let c = PeriodicTable::element("C").unwrap();
        assert_eq!(c.number, 6);
        assert_eq!(c.valence, 4);
        assert!(!c.is_hetero());
    }

    #[test]
    fn nitrogen_is_hetero() {
        let n = PeriodicTable::element("N").unwrap();
        assert_eq!(n.valence, 3);
        assert!(n.is_hetero());
    }

    #[test]
    fn isotope_suffix() {
        let c13 = PeriodicTable::element("C_13").unwrap();
        assert_eq!(c13.number, 6);
        assert_eq!(c13.weight, 13.0);
        assert_eq!(c13.symbol, "C");
    }

    #[test]
    fn isotope_direct() {
        let d = PeriodicTable::isotope("H", 2).unwrap();
        assert_eq!(d.number, 1);
        assert_eq!(d.weight, 2.0);
    }

    #[test]
    fn unknown_symbol() {
        assert!(PeriodicTable::element("Xx").is_none());
        assert!(PeriodicTable::element("C_x").is_none());
    }
}
