//! Assertion helpers over load plans and call logs

use mosaic_core::types::ExtensionLoadInfo;

/// Assert `earlier` appears before `later` in a resolved plan
pub fn assert_ordered(plan: &[ExtensionLoadInfo], earlier: &str, later: &str) {
    let pos = |id: &str| {
        plan.iter()
            .position(|entry| entry.id == id)
            .unwrap_or_else(|| panic!("{id} missing from plan {plan:?}"))
    };
    assert!(
        pos(earlier) < pos(later),
        "{earlier} should precede {later} in {plan:?}"
    );
}

/// Assert `earlier` appears before `later` in a call log
pub fn assert_logged_before(log: &[String], earlier: &str, later: &str) {
    let pos = |needle: &str| {
        log.iter()
            .position(|entry| entry == needle)
            .unwrap_or_else(|| panic!("{needle} missing from log {log:?}"))
    };
    assert!(
        pos(earlier) < pos(later),
        "{earlier} should precede {later} in {log:?}"
    );
}

/// Number of log entries matching a hook suffix, e.g. ":on_init"
pub fn count_calls(log: &[String], suffix: &str) -> usize {
    log.iter().filter(|entry| entry.ends_with(suffix)).count()
}
