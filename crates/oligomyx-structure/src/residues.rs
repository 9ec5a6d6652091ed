//! Residue name tables.

/// One-letter code for an amino-acid residue name, `None` for anything else.
pub fn one_letter(res_name: &str) -> Option<char> {
    let code = match res_name {
        "ALA" => 'A',
        "CYS" => 'C',
        "ASP" => 'D',
        "GLU" => 'E',
        "PHE" => 'F',
        "GLY" => 'G',
        "HIS" => 'H',
        "ILE" => 'I',
        "LYS" => 'K',
        "LEU" => 'L',
        "MET" => 'M',
        "ASN" => 'N',
        "PRO" => 'P',
        "GLN" => 'Q',
        "ARG" => 'R',
        "SER" => 'S',
        "THR" => 'T',
        "VAL" => 'V',
        "TRP" => 'W',
        "TYR" => 'Y',
        // Selenomethionine is deposited as HETATM inside protein chains
        "MSE" => 'M',
        "UNK" => 'X',
        _ => return None,
    };
    Some(code)
}

pub fn is_water(res_name: &str) -> bool {
    matches!(res_name, "HOH" | "WAT" | "DOD" | "H2O")
}
