use docweave::router::deployment::{classify, DeploymentDetector, DEFAULT_HOSTED_SUFFIXES};
use docweave::DeploymentType;
use std::time::Duration;

fn suffixes() -> Vec<String> {
    DEFAULT_HOSTED_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

#[test]
fn classification_is_deterministic() {
    let suffixes = suffixes();
    for _ in 0..3 {
        assert_eq!(
            classify("https://acme.example-hosted.net", &suffixes),
            DeploymentType::Hosted
        );
        assert_eq!(
            classify("https://jira.acme-internal.com", &suffixes),
            DeploymentType::SelfManaged
        );
        assert_eq!(classify("", &suffixes), DeploymentType::Unknown);
        assert_eq!(classify("ftp://acme.example-hosted.net", &suffixes), DeploymentType::Unknown);
        assert_eq!(classify("not a url", &suffixes), DeploymentType::Unknown);
    }
}

#[test]
fn suffix_must_align_with_a_label() {
    assert_eq!(
        classify("https://evilexample-hosted.net", &suffixes()),
        DeploymentType::SelfManaged
    );
}

#[test]
fn detector_caches_per_address() {
    let detector = DeploymentDetector::default();
    assert_eq!(detector.cached("https://acme.atlassian.net"), None);
    assert_eq!(detector.detect("https://acme.atlassian.net/"), DeploymentType::Hosted);
    assert_eq!(
        detector.cached("https://ACME.atlassian.net"),
        Some(DeploymentType::Hosted)
    );
    detector.clear();
    assert_eq!(detector.cached("https://acme.atlassian.net"), None);
}

#[test]
fn custom_suffixes() {
    let detector = DeploymentDetector::new(vec![".corp.cloud".into()], Duration::from_secs(60), 8);
    assert_eq!(detector.detect("https://team.corp.cloud"), DeploymentType::Hosted);
    assert_eq!(detector.detect("https://acme.atlassian.net"), DeploymentType::SelfManaged);
}
