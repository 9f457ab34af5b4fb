use docweave::router::rollout::in_rollout;
use proptest::prelude::*;

#[test]
fn rollout_splits_users() {
    let inside = (0..1000)
        .filter(|i| in_rollout(Some(&format!("user-{i}")), 50))
        .count();
    assert!((350..650).contains(&inside), "{inside} of 1000 in a 50% rollout");
}

proptest! {
    #[test]
    fn raising_percentage_never_removes_a_user(
        user in "[a-z0-9_-]{1,24}",
        low in 0u8..=100,
        high in 0u8..=100,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        if in_rollout(Some(&user), low) {
            prop_assert!(in_rollout(Some(&user), high));
        }
    }
}
