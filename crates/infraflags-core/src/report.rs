use crate::check::CheckReport;
use crate::error::FlagsError;
use crate::reconcile::Status;
use std::fmt::Write as _;

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    let _ = writeln!(out, "{heading} ({}):", items.len());
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

/// Plain-text report for a completed check. Output depends only on the report.
pub fn render_report(report: &CheckReport) -> String {
    let result = &report.result;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "infraflags: application '{}', environment '{}'",
        report.application, report.environment
    );
    match (&report.snapshot, &report.component) {
        (Some(snapshot), Some(component)) => {
            let _ = writeln!(out, "change set: {snapshot} (component {component})");
        }
        (Some(snapshot), None) => {
            let _ = writeln!(out, "change set: {snapshot}");
        }
        _ => {}
    }
    out.push('\n');

    push_list(&mut out, "required flags", result.required.flags());
    let deployed_heading = format!("deployed to {}", report.environment);
    push_list(&mut out, &deployed_heading, &result.deployed);

    if !report.warnings.is_empty() {
        out.push('\n');
        for w in &report.warnings {
            let _ = writeln!(out, "warning: {w}");
        }
    }

    out.push('\n');
    match result.status {
        Status::Satisfied => {
            let _ = writeln!(
                out,
                "SATISFIED: every required flag is deployed to {}.",
                report.environment
            );
        }
        Status::Unsatisfied => {
            let noun = if result.missing.len() == 1 {
                "flag is"
            } else {
                "flags are"
            };
            let _ = writeln!(
                out,
                "UNSATISFIED: {} required {noun} not deployed to {}:",
                result.missing.len(),
                report.environment
            );
            for flag in &result.missing {
                let _ = writeln!(out, "  - {flag}");
            }
            let _ = writeln!(
                out,
                "Enable the missing flags for '{}' in '{}' on the platform and apply the change set, \
                 or remove them from the requirements file.",
                report.application, report.environment
            );
        }
        Status::Indeterminate => {
            let _ = writeln!(out, "INDETERMINATE: deployed state could not be determined.");
        }
    }
    out
}

/// Plain-text report for a check that failed before comparison.
pub fn render_failure(report: &CheckReport, error: &FlagsError) -> String {
    let mut out = render_report(report);
    let _ = writeln!(out, "error ({}): {error}", error.kind());
    let _ = writeln!(out, "{}", error.remediation());
    out
}

/// JSON body describing a failure.
pub fn failure_json(error: &FlagsError) -> serde_json::Value {
    serde_json::json!({
        "kind": error.kind(),
        "message": error.to_string(),
        "remediation": error.remediation(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckRequest;
    use crate::platform::{ComponentRef, SnapshotId, SnapshotRef};
    use crate::reconcile::reconcile;
    use crate::requirements::RequirementSet;

    fn report(required: &[&str], deployed: &[&str]) -> CheckReport {
        let deployed: Vec<String> = deployed.iter().map(|s| s.to_string()).collect();
        CheckReport {
            application: "shop".into(),
            environment: "prod".into(),
            snapshot: Some(SnapshotId("cs-1".into())),
            component: Some(ComponentRef("c-1".into())),
            result: reconcile(&RequirementSet::new(required.iter().copied()), &deployed),
            warnings: vec![],
        }
    }

    #[test]
    fn unsatisfied_report_lists_everything() {
        let text = render_report(&report(&["baseline", "redis"], &["baseline"]));
        assert!(text.contains("required flags (2):\n  - baseline\n  - redis\n"));
        assert!(text.contains("deployed to prod (1):\n  - baseline\n"));
        assert!(text.contains("UNSATISFIED: 1 required flag is not deployed to prod:\n  - redis\n"));
        assert!(text.contains("change set: cs-1 (component c-1)"));
    }

    #[test]
    fn satisfied_report() {
        let text = render_report(&report(&[], &[]));
        assert!(text.contains("required flags (0):\n  (none)\n"));
        assert!(text.contains("SATISFIED"));
        assert!(!text.contains("UNSATISFIED"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let r = report(&["redis", "cdn", "baseline"], &["baseline"]);
        assert_eq!(render_report(&r), render_report(&r));
        let text = render_report(&r);
        let redis = text.rfind("  - redis").unwrap();
        let cdn = text.rfind("  - cdn").unwrap();
        assert!(redis < cdn, "missing flags keep requirement order");
    }

    #[test]
    fn failure_includes_remediation() {
        let req = CheckRequest {
            application: "shop".into(),
            environment: "prod".into(),
            snapshot: SnapshotRef::Head,
            requirements_path: "infraflags.yaml".into(),
            requirements_key: "flags".into(),
        };
        let r = CheckReport::indeterminate(&req, RequirementSet::new(["redis"]));
        let err = FlagsError::ComponentNotFound {
            kind: "InfraFlags".into(),
            application: "shop".into(),
            snapshot: "cs-1".into(),
        };
        let text = render_failure(&r, &err);
        assert!(text.contains("INDETERMINATE"));
        assert!(text.contains("error (component_not_found_error)"));
        assert!(text.contains("found none"));

        let v = failure_json(&err);
        assert_eq!(v["kind"], "component_not_found_error");
    }
}
