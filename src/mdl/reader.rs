use log::warn;

use super::{MdlError, MOL_DELIMITER};
use crate::atom::{Point3, Radical};
use crate::bond::{BondOrder, BondStereo};
use crate::element::PeriodicTable;
use crate::error::MolError;
use crate::molecule::Molecule;

/// A stateless callback applied to one section of a MOL block and the
/// partially built molecule.
pub type ReaderHook = Box<dyn Fn(&[String], &mut Molecule)>;

const M_END: &str = "M  END";
const M_CHG: &str = "M  CHG";
const M_ISO: &str = "M  ISO";
const M_RAD: &str = "M  RAD";

/// Parser for one MDL MOL V2000 block.
///
/// Three hooks may be registered: after the connection table, after the
/// `M  ...` properties, and after the `> <tag>` data items. Each hook
/// sees the raw lines of its section and may adjust the molecule.
///
/// The parser guarantees to the core that atoms are added in input
/// order, that bond orders are taken from the MOL wire values, and that
/// attribute names are unique (duplicates are logged and dropped, the
/// first value wins). Implicit hydrogens are derived for uncharged
/// atoms once charges are known.
#[derive(Default)]
pub struct MolReader {
    ctab_hook: Option<ReaderHook>,
    props_hook: Option<ReaderHook>,
    tags_hook: Option<ReaderHook>,
}

impl MolReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_ctab_hook(&mut self, hook: ReaderHook) {
        self.ctab_hook = Some(hook);
    }

    pub fn unregister_ctab_hook(&mut self) {
        self.ctab_hook = None;
    }

    pub fn register_properties_hook(&mut self, hook: ReaderHook) {
        self.props_hook = Some(hook);
    }

    pub fn unregister_properties_hook(&mut self) {
        self.props_hook = None;
    }

    pub fn register_tags_hook(&mut self, hook: ReaderHook) {
        self.tags_hook = Some(hook);
    }

    pub fn unregister_tags_hook(&mut self) {
        self.tags_hook = None;
    }

    /// Parses one MOL block given as lines (without the `$$$$`
    /// delimiter).
    pub fn parse(&self, lines: &[String]) -> Result<Molecule, MdlError> {
        if lines.len() < 4 {
            return Err(MdlError::TruncatedBlock { lines: lines.len() });
        }

        let mut mol = Molecule::new();
        let name = lines[0].trim();
        if !name.is_empty() {
            mol.vendor_molecule_id = Some(name.to_string());
        }

        let counts_line = &lines[3];
        if !counts_line.trim_end().ends_with("V2000") {
            return Err(MdlError::UnsupportedVersion {
                counts_line: counts_line.clone(),
            });
        }
        let num_atoms = parse_count(counts_line, 0)?;
        let num_bonds = parse_count(counts_line, 3)?;

        let atom_start = 4;
        let bond_start = atom_start + num_atoms;
        let props_start = bond_start + num_bonds;
        if lines.len() < props_start {
            return Err(MdlError::TruncatedBlock { lines: lines.len() });
        }

        for (i, line) in lines[atom_start..bond_start].iter().enumerate() {
            parse_atom(line, atom_start + i + 1, &mut mol)?;
        }
        for (i, line) in lines[bond_start..props_start].iter().enumerate() {
            parse_bond(line, bond_start + i + 1, num_atoms, &mut mol)?;
        }
        if let Some(hook) = &self.ctab_hook {
            hook(&lines[3..props_start], &mut mol);
        }

        let tags_start = self.parse_props(lines, props_start, &mut mol)?;
        self.parse_tags(lines, tags_start, &mut mol);

        mol.assign_implicit_hydrogens();
        Ok(mol)
    }

    /// Consumes `M  ...` property lines up to and including `M  END`,
    /// answering the index of the first line after it.
    fn parse_props(
        &self,
        lines: &[String],
        start: usize,
        mol: &mut Molecule,
    ) -> Result<usize, MdlError> {
        let mut idx = start;
        while idx < lines.len() {
            let line = &lines[idx];
            let prefix = field(line, 0, 6);
            idx += 1;
            match prefix.as_str() {
                M_END => break,
                M_CHG | M_ISO | M_RAD => {
                    parse_property(line, idx, &prefix, mol)?;
                }
                _ => {}
            }
        }

        if idx > start + 1 {
            if let Some(hook) = &self.props_hook {
                hook(&lines[start..idx - 1], &mut *mol);
            }
        }
        Ok(idx)
    }

    /// Consumes `> <tag>` data items until the block ends.
    fn parse_tags(&self, lines: &[String], start: usize, mol: &mut Molecule) {
        let mut tag: Option<String> = None;
        let mut idx = start;
        while idx < lines.len() {
            let line = lines[idx].trim();
            idx += 1;
            if line.is_empty() {
                continue;
            }
            if line.starts_with(MOL_DELIMITER) {
                break;
            }

            if let Some(name) = tag.take() {
                if let Err(MolError::DuplicateAttribute { name }) =
                    mol.add_attribute(&name, line)
                {
                    warn!("molecule {}: duplicate attribute `{}'", mol.id(), name);
                }
                continue;
            }
            if line.starts_with('>') {
                if let Some(open) = line.find('<') {
                    if let Some(close) = line[open + 1..].find('>') {
                        tag = Some(line[open + 1..open + 1 + close].to_string());
                    }
                }
            }
        }

        if idx > start {
            if let Some(hook) = &self.tags_hook {
                hook(&lines[start..idx.min(lines.len())], mol);
            }
        }
    }
}

/// Fixed-width field access; short lines read as blanks.
fn field(line: &str, from: usize, to: usize) -> String {
    line.chars()
        .chain(std::iter::repeat(' '))
        .skip(from)
        .take(to - from)
        .collect()
}

fn parse_count(line: &str, offset: usize) -> Result<usize, MdlError> {
    field(line, offset, offset + 3)
        .trim()
        .parse()
        .map_err(|_| MdlError::InvalidCounts {
            counts_line: line.to_string(),
        })
}

fn parse_atom(line: &str, line_no: usize, mol: &mut Molecule) -> Result<(), MdlError> {
    let x = parse_coord(line, 0, line_no)?;
    let y = parse_coord(line, 10, line_no)?;
    let z = parse_coord(line, 20, line_no)?;

    let symbol = field(line, 31, 34).trim().to_string();
    let mut element =
        PeriodicTable::element(&symbol).ok_or_else(|| MdlError::UnknownElement {
            line_no,
            symbol: symbol.clone(),
        })?;

    // Mass-difference field: non-zero shifts the weight off the natural
    // abundance.
    let mass_diff: i32 = field(line, 34, 36).trim().parse().unwrap_or(0);
    if mass_diff != 0 {
        let mass = (element.weight.round() as i32 + mass_diff).max(1) as u16;
        element = PeriodicTable::isotope(&symbol, mass).ok_or(MdlError::UnknownElement {
            line_no,
            symbol,
        })?;
    }

    let id = mol.add_atom(element);
    let atom = mol.atom_mut(id).expect("atom just added");
    atom.coordinates = Some(Point3 { x, y, z });

    // The old-style charge column: 1..3 are +3..+1, 4 is a doublet
    // radical, 5..7 are -1..-3.
    let charge_code: i32 = field(line, 36, 39).trim().parse().unwrap_or(0);
    match charge_code {
        1 => atom.set_charge(3),
        2 => atom.set_charge(2),
        3 => atom.set_charge(1),
        4 => atom.set_radical(Radical::Doublet),
        5 => atom.set_charge(-1),
        6 => atom.set_charge(-2),
        7 => atom.set_charge(-3),
        _ => {}
    }

    let valence: i32 = field(line, 48, 51).trim().parse().unwrap_or(0);
    if (1..15).contains(&valence) {
        atom.set_valence(valence as u8);
    }
    Ok(())
}

fn parse_coord(line: &str, offset: usize, line_no: usize) -> Result<f64, MdlError> {
    field(line, offset, offset + 10)
        .trim()
        .parse()
        .map_err(|_| MdlError::InvalidAtomLine { line_no })
}

fn parse_bond(
    line: &str,
    line_no: usize,
    num_atoms: usize,
    mol: &mut Molecule,
) -> Result<(), MdlError> {
    let a1: u32 = field(line, 0, 3)
        .trim()
        .parse()
        .map_err(|_| MdlError::InvalidBondLine { line_no })?;
    let a2: u32 = field(line, 3, 6)
        .trim()
        .parse()
        .map_err(|_| MdlError::InvalidBondLine { line_no })?;
    let order_value: i32 = field(line, 6, 9)
        .trim()
        .parse()
        .map_err(|_| MdlError::InvalidBondLine { line_no })?;
    let order =
        BondOrder::from_value(order_value).ok_or(MdlError::InvalidBondLine { line_no })?;

    for id in [a1, a2] {
        if id == 0 || id as usize > num_atoms {
            return Err(MdlError::DanglingReference { line_no, id });
        }
    }

    let bond_id = mol.add_bond(a1, a2, order)?;

    let stereo_value: i32 = field(line, 9, 12).trim().parse().unwrap_or(0);
    let stereo = match order {
        BondOrder::Single => match stereo_value {
            1 => BondStereo::Up,
            4 => BondStereo::UpOrDown,
            6 => BondStereo::Down,
            _ => BondStereo::None,
        },
        BondOrder::Double => match stereo_value {
            0 => BondStereo::Unspecified,
            3 => BondStereo::UpOrDown,
            _ => BondStereo::None,
        },
        _ => BondStereo::None,
    };
    if let Some(bond) = mol.bond_by_id_mut(bond_id) {
        bond.set_stereo(stereo);
    }
    Ok(())
}

/// One count-prefixed property line: the count sits at offset 6, then
/// (atom, value) pairs in 8-character strides from offset 10.
fn parse_property(
    line: &str,
    line_no: usize,
    prefix: &str,
    mol: &mut Molecule,
) -> Result<(), MdlError> {
    let n: usize = field(line, 6, 9)
        .trim()
        .parse()
        .map_err(|_| MdlError::InvalidProperty { line_no })?;

    let mut offset = 10;
    for _ in 0..n {
        let atom_id: u32 = field(line, offset, offset + 3)
            .trim()
            .parse()
            .map_err(|_| MdlError::InvalidProperty { line_no })?;
        let value: i32 = field(line, offset + 4, offset + 7)
            .trim()
            .parse()
            .map_err(|_| MdlError::InvalidProperty { line_no })?;

        let atom = mol
            .atom_mut(atom_id)
            .ok_or(MdlError::DanglingReference {
                line_no,
                id: atom_id,
            })?;
        match prefix {
            M_CHG => atom.set_charge(value as i8),
            M_ISO => {
                let mass = (atom.element().weight.round() as i32 + value).max(1) as u16;
                atom.set_isotope(mass);
            }
            M_RAD => {
                let radical =
                    Radical::from_value(value).ok_or(MdlError::InvalidProperty { line_no })?;
                atom.set_radical(radical);
            }
            _ => unreachable!("caller filters prefixes"),
        }
        offset += 8;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const ETHANOL: &str = "ethanol
  program
  comment
  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.2000    1.2000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
  2  3  1  0  0  0  0
M  END
> <source>
fermentation

> <batch>
42
";

    #[test]
    fn parses_ctab() {
        let mol = MolReader::new().parse(&lines(ETHANOL)).unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.vendor_molecule_id.as_deref(), Some("ethanol"));
        assert_eq!(mol.atom(3).unwrap().element().number, 8);
        // Implicit hydrogens derived: CH3, CH2, OH.
        assert_eq!(mol.atom(1).unwrap().hydrogen_count(), 3);
        assert_eq!(mol.atom(2).unwrap().hydrogen_count(), 2);
        assert_eq!(mol.atom(3).unwrap().hydrogen_count(), 1);
    }

    #[test]
    fn parses_tags_as_attributes() {
        let mol = MolReader::new().parse(&lines(ETHANOL)).unwrap();
        assert_eq!(mol.attribute("source").unwrap(), "fermentation");
        assert_eq!(mol.attribute("batch").unwrap(), "42");
    }

    #[test]
    fn charge_property_overrides_ctab() {
        let block = "anion
  p
  c
  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
M  CHG  1   1  -1
M  END
";
        let mol = MolReader::new().parse(&lines(block)).unwrap();
        assert_eq!(mol.atom(1).unwrap().charge(), -1);
        // Charged atoms keep their explicit hydrogen count.
        assert_eq!(mol.atom(1).unwrap().hydrogen_count(), 0);
    }

    #[test]
    fn old_style_charge_codes() {
        let block = "cation
  p
  c
  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  3  0  0  0  0  0  0  0  0  0  0
M  END
";
        let mol = MolReader::new().parse(&lines(block)).unwrap();
        assert_eq!(mol.atom(1).unwrap().charge(), 1);
    }

    #[test]
    fn isotope_property() {
        let block = "labelled
  p
  c
  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
M  ISO  1   1   1
M  END
";
        let mol = MolReader::new().parse(&lines(block)).unwrap();
        assert_eq!(mol.atom(1).unwrap().element().weight, 13.0);
    }

    #[test]
    fn rejects_v3000() {
        let block = "name
  p
  c
  0  0  0  0  0  0  0  0  0  0999 V3000
";
        let err = MolReader::new().parse(&lines(block)).unwrap_err();
        assert!(matches!(err, MdlError::UnsupportedVersion { .. }));
    }

    #[test]
    fn rejects_dangling_bond() {
        let block = "bad
  p
  c
  1  1  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
  1  9  1  0  0  0  0
M  END
";
        let err = MolReader::new().parse(&lines(block)).unwrap_err();
        assert!(matches!(err, MdlError::DanglingReference { id: 9, .. }));
    }

    #[test]
    fn hooks_see_their_sections() {
        let ctab_lines = Rc::new(Cell::new(0usize));
        let tag_lines = Rc::new(Cell::new(0usize));

        let mut reader = MolReader::new();
        let c = Rc::clone(&ctab_lines);
        reader.register_ctab_hook(Box::new(move |lines, _| c.set(lines.len())));
        let t = Rc::clone(&tag_lines);
        reader.register_tags_hook(Box::new(move |lines, _| t.set(lines.len())));

        reader.parse(&lines(ETHANOL)).unwrap();
        // Counts line + 3 atoms + 2 bonds.
        assert_eq!(ctab_lines.get(), 6);
        assert!(tag_lines.get() >= 4);
    }
}
