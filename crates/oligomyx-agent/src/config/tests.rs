#[cfg(test)]
mod tests {
    use super::super::*;
    use oligomyx_common::pipeline_config::RankDirection;

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = PipelineConfig::default();
        config.size.min_size = 10;
        config.size.max_size = Some(20);

        let overrides = Overrides {
            min_size: Some(60),
            max_size: Some(400),
            min_chains: Some(8),
            helix_threshold: Some(0.5),
            top_k: Some(1),
            direction: Some(RankDirection::Ascending),
            ..Default::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.size.min_size, 60);
        assert_eq!(config.size.max_size, Some(400));
        assert_eq!(config.stoichiometry.min_chains, 8);
        assert_eq!(config.secondary_structure.helix_threshold, 0.5);
        assert_eq!(config.ranking.top_k, Some(1));
        assert_eq!(config.ranking.resolved_direction(), RankDirection::Ascending);
    }

    #[test]
    fn test_direction_override_replaces_file_direction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oligomyx.toml");
        std::fs::write(&path, "[ranking]\nmetric = \"volume\"\ndirection = \"ascending\"\n").unwrap();

        let overrides = Overrides { direction: Some(RankDirection::Descending), ..Default::default() };
        let config = load(Some(&path), &overrides).unwrap();
        assert_eq!(config.ranking.resolved_direction(), RankDirection::Descending);

        let config = load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(config.ranking.resolved_direction(), RankDirection::Ascending);
    }

    #[test]
    fn test_absent_overrides_keep_file_values() {
        let mut config = PipelineConfig::default();
        config.size.max_size = Some(500);
        config.source.fetch_missing = true;
        Overrides::default().apply(&mut config);
        assert_eq!(config.size.max_size, Some(500));
        assert!(config.source.fetch_missing);
    }

    #[test]
    fn test_volumizer_override_keeps_voxel_size() {
        let mut config = PipelineConfig::default();
        config.source.volumizer =
            Some(VolumizerConfig { executable: PathBuf::from("/opt/old"), voxel_size: Some(3.0) });
        let overrides = Overrides { volumizer: Some(PathBuf::from("/usr/bin/volumize")), ..Default::default() };
        overrides.apply(&mut config);

        let volumizer = config.source.volumizer.unwrap();
        assert_eq!(volumizer.executable, PathBuf::from("/usr/bin/volumize"));
        assert_eq!(volumizer.voxel_size, Some(3.0));
    }

    #[test]
    fn test_invalid_override_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oligomyx.toml");
        std::fs::write(&path, "[size]\nmin_size = 60\n").unwrap();

        let overrides = Overrides { max_size: Some(10), ..Default::default() };
        let err = load(Some(&path), &overrides).unwrap_err();
        assert!(format!("{err:#}").contains("max_size"));
    }

    #[test]
    fn test_missing_explicit_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml")), &Overrides::default()).is_err());
    }

    #[test]
    fn test_load_from_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "[stoichiometry]\nmin_chains = 4\n\n[ranking]\nmetric = \"atoms\"\n",
        )
        .unwrap();
        let overrides = Overrides { min_identity: Some(0.95), ..Default::default() };

        let config = load(Some(&path), &overrides).unwrap();
        assert_eq!(config.stoichiometry.min_chains, 4);
        assert_eq!(config.stoichiometry.identity, IdentityPolicy::MinIdentity(0.95));
        assert_eq!(config.ranking.metric, "atoms");
    }

    #[test]
    fn test_example_config_is_valid() {
        let example = include_str!("../../../../oligomyx.example.toml");
        let config: PipelineConfig = toml::from_str(example).unwrap();
        config.validate().unwrap();
        assert_eq!(config.stoichiometry.min_chains, 8);
        assert_eq!(config.stoichiometry.identity, IdentityPolicy::Exact);
        assert_eq!(config.extract.mode, ClusterMode::Representatives);
    }
}
