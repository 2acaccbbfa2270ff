use super::*;
use crate::step::StepName;

#[test]
fn defaults_match_documented_thresholds() {
    let config = OrchestrationConfig::default();
    assert_eq!(config.stale_threshold_secs, 300);
    assert_eq!(config.wall_clock_cap_secs, 14_400);
    assert_eq!(config.max_heal_attempts, 2);
}

#[test]
fn deserializes_with_missing_fields_defaulted() {
    let config: OrchestrationConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.batch_size_fallback, 5);
    assert!(!config.auto_merge);
}

#[test]
fn skips_is_false_for_merge_and_complete_regardless_of_flags() {
    let mut config = OrchestrationConfig::default();
    config.skip_design = true;
    config.skip_analyze = true;
    config.skip_implement = true;
    config.skip_verify = true;
    assert!(!config.skips(StepName::Merge));
    assert!(!config.skips(StepName::Complete));
    assert!(config.skips(StepName::Design));
}
