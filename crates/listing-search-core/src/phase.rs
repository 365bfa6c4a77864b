//! Per-search lifecycle.
//!
//! ```text
//! Idle → Searching ─┬─▶ Success(list) ─────────────────────────▶ Idle
//!                   └─▶ Failed → FallbackFiltering → Success(list) ▶ Idle
//! ```
//!
//! The fallback path cannot fail, so every search ends in `Success`. The
//! triggering control is disabled for the duration and always re-enabled
//! through [`ControlGuard`], whichever path completes.

use serde::Serialize;

/// Which path produced a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrigin {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum SearchPhase {
    Idle,
    Searching,
    /// The remote fetch failed; the cause is logged, never shown.
    Failed,
    FallbackFiltering,
    Success { count: usize, origin: ResultOrigin },
}

/// The UI element that triggers a search.
///
/// `disable` is called before the request is issued and `enable` after the
/// result path completes. Implementations must be cheap and non-blocking.
pub trait SearchControl: Send + Sync {
    /// Disable the control and show `progress_label` on it.
    fn disable(&self, progress_label: &str);

    /// Restore the control's label and re-enable it.
    fn enable(&self);

    /// Observe phase transitions. Ignored by default.
    fn phase_changed(&self, _phase: SearchPhase) {}
}

/// A control with nothing to update (CLI, HTTP service).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopControl;

impl SearchControl for NoopControl {
    fn disable(&self, _progress_label: &str) {}
    fn enable(&self) {}
}

/// Disables a control on creation and re-enables it on drop.
pub struct ControlGuard<'a> {
    control: &'a dyn SearchControl,
}

impl<'a> ControlGuard<'a> {
    pub fn engage(control: &'a dyn SearchControl, progress_label: &str) -> Self {
        control.disable(progress_label);
        control.phase_changed(SearchPhase::Searching);
        Self { control }
    }

    pub fn transition(&self, phase: SearchPhase) {
        self.control.phase_changed(phase);
    }
}

impl Drop for ControlGuard<'_> {
    fn drop(&mut self) {
        self.control.enable();
        self.control.phase_changed(SearchPhase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SearchControl for Recorder {
        fn disable(&self, label: &str) {
            self.events.lock().unwrap().push(format!("disable:{}", label));
        }
        fn enable(&self) {
            self.events.lock().unwrap().push("enable".to_string());
        }
        fn phase_changed(&self, phase: SearchPhase) {
            self.events.lock().unwrap().push(format!("{:?}", phase));
        }
    }

    #[test]
    fn test_guard_reenables_on_drop() {
        let rec = Recorder::default();
        {
            let guard = ControlGuard::engage(&rec, "Searching MLS...");
            guard.transition(SearchPhase::Failed);
        }
        let events = rec.events.lock().unwrap();
        assert_eq!(events.first().unwrap(), "disable:Searching MLS...");
        assert_eq!(events[events.len() - 2], "enable");
        assert_eq!(events.last().unwrap(), "Idle");
    }

    #[test]
    fn test_guard_reenables_on_panic() {
        let rec = Recorder::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ControlGuard::engage(&rec, "busy");
            panic!("render blew up");
        }));
        assert!(result.is_err());
        assert!(rec
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&"enable".to_string()));
    }

    #[test]
    fn test_phase_serializes_tagged() {
        let phase = SearchPhase::Success {
            count: 2,
            origin: ResultOrigin::Fallback,
        };
        let json = serde_json::to_value(phase).unwrap();
        assert_eq!(json["phase"], "success");
        assert_eq!(json["origin"], "fallback");
    }
}
