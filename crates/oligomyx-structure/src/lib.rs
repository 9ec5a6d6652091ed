//! Oligomyx Structure - access to PDB structures and their derived facts.
//!
//! This crate covers everything the filtering stages treat as a black box:
//! 1. Fetching PDB files from RCSB into a local directory
//! 2. Parsing atoms, chains and HELIX/SHEET records
//! 3. Comparing chain sequences
//! 4. Running the external volumizer and reading its annotations
//! 5. Memoising parsed structures for the length of one run

pub mod residues;
pub mod parser;
pub mod sequence;
pub mod pdb;
pub mod repository;
pub mod volumizer;
pub mod annotation;

pub use parser::Structure;
pub use repository::{LoadedStructure, StructureRepository};
