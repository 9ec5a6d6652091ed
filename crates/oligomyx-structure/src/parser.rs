//! PDB file format parser.
//!
//! Reads the subset of the format the filters need: ATOM/HETATM records,
//! HELIX/SHEET ranges and the `REMARK   2` resolution.
//! Column layout: https://www.wwpdb.org/documentation/file-format-content/format33/v3.3.html

use oligomyx_common::entities::{ChainSequence, SecondaryStructureCounts, SizeMetrics};
use oligomyx_common::{OligomyxError, Result};

use crate::residues::{is_water, one_letter};

/// Which MODEL blocks to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelSelection {
    /// Stop at the first ENDMDL (asymmetric unit files).
    #[default]
    First,
    /// Keep every model as a separate copy (biological assembly files,
    /// where each symmetry mate is written as its own MODEL).
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub model: usize,
    pub is_hetatm: bool,
    pub name: String,
    pub res_name: String,
    pub chain_id: String,
    pub res_seq: i32,
    pub i_code: char,
    pub position: [f64; 3],
}

impl Atom {
    /// Chain label unique across models: `A` in model 1, `A/2` in model 2.
    pub fn chain_label(&self) -> String {
        if self.model <= 1 {
            self.chain_id.clone()
        } else {
            format!("{}/{}", self.chain_id, self.model)
        }
    }

    fn same_residue(&self, other: &Atom) -> bool {
        self.model == other.model
            && self.chain_id == other.chain_id
            && self.res_seq == other.res_seq
            && self.i_code == other.i_code
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub chain_label: String,
    pub chain_id: String,
    pub res_seq: i32,
    pub res_name: String,
    pub is_hetatm: bool,
}

impl Residue {
    /// Part of a polymer chain: any ATOM residue, plus modified amino acids
    /// deposited as HETATM.
    pub fn is_polymer(&self) -> bool {
        !self.is_hetatm || (self.res_name != "UNK" && one_letter(&self.res_name).is_some())
    }

    pub fn is_amino_acid(&self) -> bool {
        one_letter(&self.res_name).is_some()
    }
}

/// Inclusive residue-number range on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryRange {
    pub chain_id: String,
    pub start: i32,
    pub end: i32,
}

impl SecondaryRange {
    fn contains(&self, residue: &Residue) -> bool {
        residue.chain_id == self.chain_id && residue.res_seq >= self.start && residue.res_seq <= self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub atoms: Vec<Atom>,
    pub helices: Vec<SecondaryRange>,
    pub sheets: Vec<SecondaryRange>,
    /// Resolution in Å; absent for NMR models or missing remarks
    pub resolution: Option<f64>,
}

fn field(line: &str, start: usize, end: usize) -> &str {
    line.get(start..line.len().min(end)).unwrap_or("").trim()
}

fn parse_atom_line(line: &str, model: usize) -> Option<Atom> {
    if line.len() < 54 {
        return None;
    }
    let column = |i: usize| line.get(i..).and_then(|s| s.chars().next()).unwrap_or(' ');
    let alt_loc = column(16);
    if !matches!(alt_loc, ' ' | 'A' | '1') {
        return None;
    }

    let coord = |a, b| field(line, a, b).parse::<f64>().ok();

    Some(Atom {
        model,
        is_hetatm: line.starts_with("HETATM"),
        name: field(line, 12, 16).to_string(),
        res_name: field(line, 17, 20).to_string(),
        chain_id: field(line, 21, 22).to_string(),
        res_seq: field(line, 22, 26).parse().ok()?,
        i_code: column(26),
        position: [coord(30, 38)?, coord(38, 46)?, coord(46, 54)?],
    })
}

/// HELIX records; only right-handed alpha helices (class 1 or blank).
fn parse_helix_line(line: &str) -> Option<SecondaryRange> {
    let class = field(line, 38, 40);
    if !(class.is_empty() || class == "1") {
        return None;
    }
    Some(SecondaryRange {
        chain_id: field(line, 19, 20).to_string(),
        start: field(line, 21, 25).parse().ok()?,
        end: field(line, 33, 37).parse().ok()?,
    })
}

fn parse_sheet_line(line: &str) -> Option<SecondaryRange> {
    Some(SecondaryRange {
        chain_id: field(line, 21, 22).to_string(),
        start: field(line, 22, 26).parse().ok()?,
        end: field(line, 33, 37).parse().ok()?,
    })
}

fn parse_resolution(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once("RESOLUTION.")?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Parse PDB text. Fails only when no atom records are found.
pub fn parse_pdb_str(text: &str, models: ModelSelection) -> Result<Structure> {
    let mut structure = Structure::default();
    let mut model = 1usize;

    for line in text.lines() {
        match field(line, 0, 6) {
            "MODEL" => {
                model = field(line, 10, 14)
                    .parse()
                    .ok()
                    .or_else(|| line.split_whitespace().nth(1)?.parse().ok())
                    .unwrap_or(model + 1);
            }
            "ENDMDL" if models == ModelSelection::First => break,
            "ATOM" | "HETATM" => {
                if let Some(atom) = parse_atom_line(line, model) {
                    structure.atoms.push(atom);
                }
            }
            "HELIX" => structure.helices.extend(parse_helix_line(line)),
            "SHEET" => structure.sheets.extend(parse_sheet_line(line)),
            "REMARK" if field(line, 6, 10) == "2" && structure.resolution.is_none() => {
                structure.resolution = parse_resolution(line);
            }
            _ => {}
        }
    }

    if structure.atoms.is_empty() {
        return Err(OligomyxError::Parse("no atom records found".to_string()));
    }

    Ok(structure)
}

impl Structure {
    fn non_water_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(|a| !is_water(&a.res_name))
    }

    /// Residues in file order, waters excluded.
    pub fn residues(&self) -> Vec<Residue> {
        let mut residues = Vec::new();
        let mut previous: Option<&Atom> = None;

        for atom in self.non_water_atoms() {
            if previous.map_or(true, |p| !p.same_residue(atom)) {
                residues.push(Residue {
                    chain_label: atom.chain_label(),
                    chain_id: atom.chain_id.clone(),
                    res_seq: atom.res_seq,
                    res_name: atom.res_name.clone(),
                    is_hetatm: atom.is_hetatm,
                });
            }
            previous = Some(atom);
        }

        residues
    }

    /// Polymer chain labels in order of first appearance.
    pub fn chain_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for residue in self.residues().iter().filter(|r| r.is_polymer()) {
            if !labels.contains(&residue.chain_label) {
                labels.push(residue.chain_label.clone());
            }
        }
        labels
    }

    /// One-letter sequence per polymer chain; unknown residues become `X`.
    pub fn chain_sequences(&self) -> Vec<ChainSequence> {
        let residues = self.residues();
        self.chain_labels()
            .into_iter()
            .map(|label| {
                let sequence = residues
                    .iter()
                    .filter(|r| r.is_polymer() && r.chain_label == label)
                    .map(|r| one_letter(&r.res_name).unwrap_or('X'))
                    .collect();
                ChainSequence { chain_id: label, sequence }
            })
            .collect()
    }

    pub fn size_metrics(&self, file_bytes: u64) -> SizeMetrics {
        SizeMetrics {
            file_bytes,
            atoms: self.non_water_atoms().count() as u64,
            residues: self.residues().len() as u64,
            chains: self.chain_labels().len() as u64,
        }
    }

    /// Helix/strand residue counts over amino-acid polymer residues.
    pub fn secondary_structure_counts(&self) -> SecondaryStructureCounts {
        let mut counts = SecondaryStructureCounts::default();

        for residue in self.residues().iter().filter(|r| r.is_polymer() && r.is_amino_acid()) {
            counts.total += 1;
            if self.helices.iter().any(|h| h.contains(residue)) {
                counts.helix += 1;
            } else if self.sheets.iter().any(|s| s.contains(residue)) {
                counts.strand += 1;
            }
        }

        counts
    }

    /// Unweighted radius of gyration over non-water atoms.
    pub fn radius_of_gyration(&self) -> Option<f64> {
        let positions: Vec<[f64; 3]> = self.non_water_atoms().map(|a| a.position).collect();
        if positions.is_empty() {
            return None;
        }
        let n = positions.len() as f64;
        let mut centre = [0.0; 3];
        for p in &positions {
            for k in 0..3 {
                centre[k] += p[k] / n;
            }
        }
        let msd = positions
            .iter()
            .map(|p| (0..3).map(|k| (p[k] - centre[k]).powi(2)).sum::<f64>())
            .sum::<f64>()
            / n;
        Some(msd.sqrt())
    }
}
