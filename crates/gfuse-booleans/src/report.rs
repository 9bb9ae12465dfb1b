//! Alert and report plumbing shared by the pipeline stages.
//!
//! Each stage owns a [`Report`]; warnings accumulate without stopping the
//! stage, fails mark it as errored. The diagnostic layer above relays and
//! merges stage reports.

use gfuse_topo::ShapeRef;

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gravity {
    /// The stage can proceed.
    Warning,
    /// The stage result is unusable.
    Fail,
}

/// A single alert, optionally pointing at the shapes involved.
#[derive(Debug, Clone)]
pub struct Alert {
    /// Severity.
    pub gravity: Gravity,
    /// Stable message key describing the condition.
    pub message: &'static str,
    /// Shapes attached to the alert (may be empty).
    pub shapes: Vec<ShapeRef>,
}

/// Ordered collection of alerts raised by one stage.
#[derive(Debug, Clone, Default)]
pub struct Report {
    alerts: Vec<Alert>,
}

impl Report {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn add_warning(&mut self, message: &'static str, shapes: Vec<ShapeRef>) {
        self.alerts.push(Alert {
            gravity: Gravity::Warning,
            message,
            shapes,
        });
    }

    /// Record a failure.
    pub fn add_fail(&mut self, message: &'static str, shapes: Vec<ShapeRef>) {
        self.alerts.push(Alert {
            gravity: Gravity::Fail,
            message,
            shapes,
        });
    }

    /// Whether any failure was recorded.
    pub fn has_fails(&self) -> bool {
        self.alerts.iter().any(|a| a.gravity == Gravity::Fail)
    }

    /// All alerts in recording order.
    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }

    /// Alerts of one gravity, in recording order.
    pub fn alerts(&self, gravity: Gravity) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(move |a| a.gravity == gravity)
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Append another report's alerts.
    pub fn merge(&mut self, other: &Report) {
        self.alerts.extend(other.alerts.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_fail() {
        let mut report = Report::new();
        report.add_warning("unsupported surface pair skipped", Vec::new());
        assert!(!report.has_fails());
        assert_eq!(report.alerts(Gravity::Warning).count(), 1);
    }

    #[test]
    fn test_fail_detected() {
        let mut report = Report::new();
        report.add_fail("no arguments for the intersection stage", Vec::new());
        assert!(report.has_fails());
        assert_eq!(report.alerts(Gravity::Fail).count(), 1);
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut a = Report::new();
        a.add_warning("first", Vec::new());
        let mut b = Report::new();
        b.add_fail("second", Vec::new());
        a.merge(&b);
        assert_eq!(a.all().len(), 2);
        assert_eq!(a.all()[1].message, "second");
    }
}
