//! oligomyx-filters: Identifier extraction and the size, stoichiometry and
//! secondary-structure filter stages.
//!
//! Every stage is list in, list out: it never adds an identifier, and a
//! collaborator failure for one identifier excludes only that identifier.

pub mod id_list;
pub mod extractor;
pub mod providers;
pub mod stage;
pub mod size;
pub mod stoichiometry;
pub mod secondary;

pub use extractor::extract_ids;
pub use id_list::{format_id_list, parse_id_list};
pub use providers::{ChainLookup, MockStructureProvider, SecondaryStructureLookup, SizeProbe};
pub use secondary::SecondaryStructureFilter;
pub use size::SizeFilter;
pub use stage::{StageContext, Verdict};
pub use stoichiometry::{Stoichiometry, StoichiometryFilter};
