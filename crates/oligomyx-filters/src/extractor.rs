//! Identifier extraction from sequence-cluster files.
//!
//! Cluster files hold one cluster per line as whitespace-separated
//! `<pdb>_<entity>` tokens, the cluster representative first. Model
//! identifiers that are not PDB codes (`AF_...`, `MA_...`) are skipped.

use oligomyx_common::pipeline_config::ClusterMode;
use oligomyx_common::PdbId;
use std::collections::BTreeSet;
use tracing::debug;

/// Extract the unique identifiers from cluster text, sorted lexically.
///
/// In [`ClusterMode::Representatives`] each line contributes its first
/// token that is a PDB code.
pub fn extract_ids(text: &str, mode: ClusterMode) -> Vec<PdbId> {
    let mut ids = BTreeSet::new();
    let mut clusters = 0usize;

    for line in text.lines() {
        let mut members = line.split_whitespace().filter_map(PdbId::parse).peekable();
        if members.peek().is_none() {
            continue;
        }
        clusters += 1;
        match mode {
            ClusterMode::Representatives => ids.extend(members.next()),
            ClusterMode::AllMembers => ids.extend(members),
        }
    }

    debug!("Extracted {} identifiers from {} clusters", ids.len(), clusters);
    ids.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CLUSTERS: &str = "\
4hhb_1 1a3n_1 2hhb_1
AF_AFP69905F1 1abc_2 1ABC_1
5xyz_3

2hhb_2 4HHB_2
";

    fn strs(ids: Vec<PdbId>) -> Vec<String> {
        ids.into_iter().map(String::from).collect()
    }

    #[test]
    fn test_representatives() {
        let ids = extract_ids(CLUSTERS, ClusterMode::Representatives);
        assert_eq!(strs(ids), vec!["1ABC", "2HHB", "4HHB", "5XYZ"]);
    }

    #[test]
    fn test_all_members_deduplicates_across_case_and_entity() {
        let ids = extract_ids(CLUSTERS, ClusterMode::AllMembers);
        assert_eq!(strs(ids), vec!["1A3N", "1ABC", "2HHB", "4HHB", "5XYZ"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_ids("", ClusterMode::AllMembers).is_empty());
        assert!(extract_ids("AF_AFP1F1 MA_XYZ\n", ClusterMode::Representatives).is_empty());
    }
}
