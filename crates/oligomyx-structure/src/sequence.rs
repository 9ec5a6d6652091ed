//! Chain sequence comparison.
//!
//! Exact comparison is the default; the identity cutoff policy uses a
//! Needleman-Wunsch global alignment with a flat substitution score.

use oligomyx_common::pipeline_config::IdentityPolicy;

const MATCH: i32 = 2;
const MISMATCH: i32 = -1;
const GAP: i32 = -2;

/// Fraction of alignment columns holding identical residues.
pub fn global_identity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    let mut score = vec![0i32; (n + 1) * width];
    for i in 1..=n {
        score[i * width] = i as i32 * GAP;
    }
    for j in 1..=m {
        score[j] = j as i32 * GAP;
    }

    let sub = |x: char, y: char| if x == y { MATCH } else { MISMATCH };
    for i in 1..=n {
        for j in 1..=m {
            let diag = score[(i - 1) * width + j - 1] + sub(a[i - 1], b[j - 1]);
            let up = score[(i - 1) * width + j] + GAP;
            let left = score[i * width + j - 1] + GAP;
            score[i * width + j] = diag.max(up).max(left);
        }
    }

    // Traceback, preferring the diagonal on ties
    let (mut i, mut j) = (n, m);
    let (mut columns, mut identical) = (0usize, 0usize);
    while i > 0 || j > 0 {
        columns += 1;
        let here = score[i * width + j];
        if i > 0 && j > 0 && here == score[(i - 1) * width + j - 1] + sub(a[i - 1], b[j - 1]) {
            if a[i - 1] == b[j - 1] {
                identical += 1;
            }
            i -= 1;
            j -= 1;
        } else if i > 0 && here == score[(i - 1) * width + j] + GAP {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    identical as f64 / columns as f64
}

pub fn sequences_match(a: &str, b: &str, policy: IdentityPolicy) -> bool {
    match policy {
        IdentityPolicy::Exact => a == b,
        IdentityPolicy::MinIdentity(cutoff) => a == b || global_identity(a, b) >= cutoff,
    }
}

/// Greedy sequence clustering: each sequence joins the first cluster whose
/// representative (first member) it matches, otherwise starts a new one.
/// Returns member indices per cluster, in order of creation.
pub fn cluster_sequences<S: AsRef<str>>(sequences: &[S], policy: IdentityPolicy) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for (idx, seq) in sequences.iter().enumerate() {
        let joined = clusters
            .iter_mut()
            .find(|members| sequences_match(seq.as_ref(), sequences[members[0]].as_ref(), policy));
        match joined {
            Some(members) => members.push(idx),
            None => clusters.push(vec![idx]),
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_of_equal_sequences() {
        assert!((global_identity("MKVLAG", "MKVLAG") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_identity_with_point_mutation() {
        let id = global_identity("MKVLAGWT", "MKVLSGWT");
        assert!((id - 7.0 / 8.0).abs() < 1e-9, "got {id}");
    }

    #[test]
    fn test_identity_with_truncation() {
        // one trailing residue missing: 9 identical of 10 columns
        let id = global_identity("MKVLAGWTEQ", "MKVLAGWTE");
        assert!((id - 0.9).abs() < 1e-9, "got {id}");
        assert_eq!(global_identity("", "MK"), 0.0);
    }

    #[test]
    fn test_exact_policy_is_strict() {
        assert!(sequences_match("MKV", "MKV", IdentityPolicy::Exact));
        assert!(!sequences_match("MKVLAGWTEQ", "MKVLAGWTE", IdentityPolicy::Exact));
        assert!(sequences_match("MKVLAGWTEQ", "MKVLAGWTE", IdentityPolicy::MinIdentity(0.9)));
    }

    #[test]
    fn test_cluster_sequences() {
        let seqs = ["MKV", "GGS", "MKV", "MKV", "GGS", "PPP"];
        let clusters = cluster_sequences(&seqs, IdentityPolicy::Exact);
        let sizes: Vec<usize> = clusters.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 2, 1]);
        assert_eq!(clusters[1], vec![1, 4]);
        assert!(cluster_sequences::<&str>(&[], IdentityPolicy::Exact).is_empty());
    }
}
