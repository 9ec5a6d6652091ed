//! Fixtures for Oligomyx tests: synthetic PDB files and identifier lists.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub use pretty_assertions::assert_eq as assert_eq_pretty;
pub use tempfile::{tempdir, TempDir};

/// Backbone atoms written for every residue.
pub const ATOMS_PER_RESIDUE: usize = 3;

fn three_letter(code: char) -> &'static str {
    match code.to_ascii_uppercase() {
        'A' => "ALA", 'C' => "CYS", 'D' => "ASP", 'E' => "GLU", 'F' => "PHE",
        'G' => "GLY", 'H' => "HIS", 'I' => "ILE", 'K' => "LYS", 'L' => "LEU",
        'M' => "MET", 'N' => "ASN", 'P' => "PRO", 'Q' => "GLN", 'R' => "ARG",
        'S' => "SER", 'T' => "THR", 'V' => "VAL", 'W' => "TRP", 'Y' => "TYR",
        _ => "UNK",
    }
}

#[derive(Debug, Clone)]
struct ChainSpec {
    id: char,
    sequence: String,
}

#[derive(Debug, Clone, Copy)]
struct Range {
    chain: char,
    start: i32,
    end: i32,
}

/// Builds fixed-width PDB text with backbone atoms laid out on a grid.
#[derive(Debug, Clone, Default)]
pub struct PdbBuilder {
    resolution: Option<f64>,
    chains: Vec<ChainSpec>,
    helices: Vec<Range>,
    sheets: Vec<Range>,
    waters: usize,
}

impl PdbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution(mut self, angstroms: f64) -> Self {
        self.resolution = Some(angstroms);
        self
    }

    /// Residues are numbered from 1.
    pub fn chain(mut self, id: char, sequence: &str) -> Self {
        self.chains.push(ChainSpec { id, sequence: sequence.to_string() });
        self
    }

    pub fn helix(mut self, chain: char, start: i32, end: i32) -> Self {
        self.helices.push(Range { chain, start, end });
        self
    }

    pub fn sheet(mut self, chain: char, start: i32, end: i32) -> Self {
        self.sheets.push(Range { chain, start, end });
        self
    }

    pub fn waters(mut self, count: usize) -> Self {
        self.waters = count;
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        out.push_str("HEADER    SYNTHETIC TEST STRUCTURE\n");
        if let Some(res) = self.resolution {
            let _ = writeln!(out, "REMARK   2 RESOLUTION.    {res:.2} ANGSTROMS.");
        }
        for (i, h) in self.helices.iter().enumerate() {
            let _ = writeln!(
                out,
                "HELIX  {:>3} {:>3} {:>3} {} {:>4}  {:>3} {} {:>4} {:>2}",
                i + 1, i + 1, "ALA", h.chain, h.start, "ALA", h.chain, h.end, 1
            );
        }
        for (i, s) in self.sheets.iter().enumerate() {
            let _ = writeln!(
                out,
                "SHEET  {:>3} {:>3}{:>2} {:>3} {}{:>4}  {:>3} {}{:>4} {:>2}",
                i + 1, "S1", self.sheets.len(), "VAL", s.chain, s.start, "VAL", s.chain, s.end, 0
            );
        }

        let mut serial = 1usize;
        for (ci, chain) in self.chains.iter().enumerate() {
            for (ri, code) in chain.sequence.chars().enumerate() {
                let res_name = three_letter(code);
                for (ai, (name, element)) in [(" N  ", "N"), (" CA ", "C"), (" C  ", "C")].iter().enumerate() {
                    let x = ci as f64 * 10.0 + ai as f64 * 1.2;
                    let y = ri as f64 * 3.8;
                    out.push_str(&atom_line("ATOM  ", serial, name, res_name, chain.id, ri as i32 + 1, x, y, 0.0, element));
                    serial += 1;
                }
            }
            let _ = writeln!(out, "TER   {serial:>5}");
            serial += 1;
        }
        for w in 0..self.waters {
            out.push_str(&atom_line("HETATM", serial, " O  ", "HOH", 'W', w as i32 + 1, -5.0, w as f64, 0.0, "O"));
            serial += 1;
        }
        out.push_str("END\n");
        out
    }

    /// Write as `<dir>/<id lower-case>.pdb` and return the path.
    pub fn write_to(&self, dir: &Path, id: &str) -> PathBuf {
        let path = dir.join(format!("{}.pdb", id.to_ascii_lowercase()));
        std::fs::write(&path, self.build()).expect("write synthetic pdb");
        path
    }
}

#[allow(clippy::too_many_arguments)]
fn atom_line(
    record: &str,
    serial: usize,
    name: &str,
    res_name: &str,
    chain: char,
    res_seq: i32,
    x: f64,
    y: f64,
    z: f64,
    element: &str,
) -> String {
    format!(
        "{record}{serial:>5} {name}{alt}{res_name:>3} {chain}{res_seq:>4}{icode}   {x:>8.3}{y:>8.3}{z:>8.3}{occ:>6.2}{b:>6.2}          {element:>2}\n",
        alt = ' ',
        icode = ' ',
        occ = 1.0,
        b = 20.0,
    )
}

/// `n` chains (A, B, C, ...) all carrying `sequence`.
pub fn homo_oligomer(n: usize, sequence: &str) -> PdbBuilder {
    (0..n).fold(PdbBuilder::new(), |b, i| b.chain(chain_letter(i), sequence))
}

pub fn chain_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Write one identifier per line.
pub fn write_id_list(dir: &Path, name: &str, ids: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = ids.join("\n");
    content.push('\n');
    std::fs::write(&path, content).expect("write id list");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_columns_are_fixed_width() {
        let pdb = PdbBuilder::new().chain('A', "MK").build();
        let atom = pdb.lines().find(|l| l.starts_with("ATOM")).unwrap();
        assert_eq!(&atom[17..20], "MET");
        assert_eq!(&atom[21..22], "A");
        assert_eq!(atom[22..26].trim(), "1");
        assert_eq!(atom.len(), 78);
    }

    #[test]
    fn test_helix_record_columns() {
        let pdb = PdbBuilder::new().chain('B', "AAAA").helix('B', 2, 4).build();
        let helix = pdb.lines().find(|l| l.starts_with("HELIX")).unwrap();
        assert_eq!(&helix[19..20], "B");
        assert_eq!(helix[21..25].trim(), "2");
        assert_eq!(helix[33..37].trim(), "4");
        assert_eq!(helix[38..40].trim(), "1");
    }

    #[test]
    fn test_sheet_record_columns() {
        let pdb = PdbBuilder::new().chain('C', "VVVV").sheet('C', 1, 3).build();
        let sheet = pdb.lines().find(|l| l.starts_with("SHEET")).unwrap();
        assert_eq!(&sheet[21..22], "C");
        assert_eq!(sheet[22..26].trim(), "1");
        assert_eq!(&sheet[32..33], "C");
        assert_eq!(sheet[33..37].trim(), "3");
    }
}
