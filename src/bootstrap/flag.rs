//! Process-lifetime "already bootstrapped" marker.

use std::sync::OnceLock;

static TOKEN: OnceLock<String> = OnceLock::new();

/// Set once per process after the first successful cold bootstrap.
///
/// Never persisted: a fresh process always starts unset.
pub struct ProcessFlag;

impl ProcessFlag {
    pub fn is_set() -> bool {
        TOKEN.get().is_some()
    }

    /// Set the flag to a fresh token. Later calls return the original token.
    pub(crate) fn mark() -> &'static str {
        TOKEN.get_or_init(|| {
            let now = chrono::Utc::now();
            format!(
                "{}-{}",
                std::process::id(),
                now.timestamp_nanos_opt()
                    .unwrap_or_else(|| now.timestamp_micros())
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::BootstrapMode;

    #[test]
    fn test_mark_is_idempotent_and_switches_mode() {
        let first = ProcessFlag::mark();
        let second = ProcessFlag::mark();

        assert_eq!(first, second);
        assert!(ProcessFlag::is_set());
        assert_eq!(BootstrapMode::for_process(), BootstrapMode::Warm);
    }
}
