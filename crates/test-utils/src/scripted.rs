//! Real child processes driven by short `sh` scripts.

use std::time::Duration;

use toolwatch::exec::ProcessSpec;
use toolwatch::supervise::SupervisionPolicy;

/// `sh -c <script>`.
pub fn sh(script: &str) -> ProcessSpec {
    ProcessSpec::new("sh").args(["-c", script])
}

/// Tight bounds so tests finish quickly: 20ms polling, 10s runtime cap,
/// 500ms termination grace.
pub fn fast_policy() -> SupervisionPolicy {
    let mut policy = SupervisionPolicy::new(Duration::from_millis(20), Duration::from_secs(10));
    policy.termination_grace = Duration::from_millis(500);
    policy
}
