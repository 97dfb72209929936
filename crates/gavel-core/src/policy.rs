// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The Policy Engine.
//!
//! [`evaluate`] is a pure function: `evaluate(action_type, content)` always
//! returns the same [`PolicyOutcome`] for the same inputs, in any process.
//! It performs no I/O and holds no state — the rule table below is the
//! entire policy, and `POLICY_VERSION` is stamped onto every ledger event so
//! historical evaluations stay reproducible even after the table changes.

use crate::types::{Decision, PolicyOutcome, Violation};

/// The constitution in force. Bump this whenever the rule table below
/// changes — every audit event records which version evaluated it.
pub const POLICY_VERSION: &str = "v1.0.0";

/// Escalation threshold: a risk score at or above this, with no hard
/// violation present, routes the intent to a human reviewer.
pub const ESCALATION_THRESHOLD: f64 = 0.8;

/// Evaluate a proposed action against the policy v1.0.0 rule set.
///
/// `content` is treated as free text — typically a shell command or a file
/// path, depending on `action_type`. Matching is substring/whole-token based
/// and case-sensitive, matching the source rule set exactly.
pub fn evaluate(action_type: &str, content: &str) -> PolicyOutcome {
    let violations = hard_violations(action_type, content);
    let risk_score = clamp(risk_score(action_type, content));

    let decision = if !violations.is_empty() {
        Decision::Denied
    } else if risk_score >= ESCALATION_THRESHOLD {
        Decision::Escalated
    } else {
        Decision::Approved
    };

    PolicyOutcome {
        decision,
        risk_score,
        violations,
    }
}

// ---------------------------------------------------------------------------
// Hard violations — always DENIED, regardless of other signals.
// ---------------------------------------------------------------------------

fn hard_violations(action_type: &str, content: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    if has_whole_token(content, "sudo") {
        violations.push(Violation::new(
            "NO_SUDO",
            "command invokes sudo, which is never permitted",
        ));
    }

    if has_chmod_777(content) {
        violations.push(Violation::new(
            "NO_CHMOD_777",
            "command grants world read/write/execute via chmod 777",
        ));
    }

    if touches_protected_path(action_type, content) {
        violations.push(Violation::new(
            "PROTECTED_PATH",
            "action targets a path under governance/, policy/, or the identity allow-list",
        ));
    }

    violations
}

fn has_chmod_777(content: &str) -> bool {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    tokens
        .windows(2)
        .any(|pair| pair[0] == "chmod" && pair[1] == "777")
}

const PROTECTED_PREFIXES: &[&str] = &["governance/", "policy/", "identities.json"];

/// Matched as a token prefix on file paths. Applies regardless of
/// `action_type` — a shell command that references a protected path
/// directly (e.g. `rm policy/rules.toml`) is caught the same as a
/// `file_write` targeting it.
fn touches_protected_path(_action_type: &str, content: &str) -> bool {
    content
        .split_whitespace()
        .any(|token| PROTECTED_PREFIXES.iter().any(|p| token.starts_with(p)))
}

// ---------------------------------------------------------------------------
// Risk signals — accumulate risk_score, never deny directly.
// ---------------------------------------------------------------------------

fn risk_score(action_type: &str, content: &str) -> f64 {
    let mut score = 0.0;

    if has_any_whole_token(content, &["kubectl", "terraform", "helm"]) {
        score += 0.8;
    }

    if has_any_whole_token(content, &["curl", "wget", "http"]) {
        score += 0.3;
    }

    if action_type == "file_write" && content.contains("config/") {
        score += 0.2;
    }

    if content.contains("rm -rf") || has_whole_token(content, "DROP") {
        score += 0.5;
    }

    score
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}

fn has_whole_token(content: &str, token: &str) -> bool {
    content.split_whitespace().any(|t| t == token)
}

fn has_any_whole_token(content: &str, tokens: &[&str]) -> bool {
    content
        .split_whitespace()
        .any(|t| tokens.iter().any(|candidate| t == *candidate || t.starts_with(candidate)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_read_is_approved_with_zero_risk() {
        let outcome = evaluate("file_read", "src/main.py");
        assert_eq!(outcome.decision, Decision::Approved);
        assert_eq!(outcome.risk_score, 0.0);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn sudo_is_hard_denied() {
        let outcome = evaluate("bash", "sudo rm -rf /");
        assert_eq!(outcome.decision, Decision::Denied);
        assert!(outcome.violations.iter().any(|v| v.rule == "NO_SUDO"));
    }

    #[test]
    fn sudo_rm_rf_reports_both_violations() {
        let outcome = evaluate("bash", "sudo rm -rf /");
        let rules: Vec<&str> = outcome.violations.iter().map(|v| v.rule.as_str()).collect();
        assert!(rules.contains(&"NO_SUDO"));
    }

    #[test]
    fn chmod_777_is_hard_denied() {
        let outcome = evaluate("bash", "chmod   777 ./deploy.sh");
        assert_eq!(outcome.decision, Decision::Denied);
        assert!(outcome.violations.iter().any(|v| v.rule == "NO_CHMOD_777"));
    }

    #[test]
    fn chmod_without_777_is_not_flagged() {
        let outcome = evaluate("bash", "chmod 755 ./deploy.sh");
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn protected_path_write_is_denied() {
        let outcome = evaluate("file_write", "governance/rules.toml");
        assert_eq!(outcome.decision, Decision::Denied);
        assert!(outcome.violations.iter().any(|v| v.rule == "PROTECTED_PATH"));
    }

    #[test]
    fn kubectl_scale_escalates() {
        let outcome = evaluate("bash", "kubectl scale deployment web --replicas=3");
        assert_eq!(outcome.decision, Decision::Escalated);
        assert!(outcome.risk_score >= ESCALATION_THRESHOLD);
    }

    #[test]
    fn curl_alone_is_approved_not_escalated() {
        let outcome = evaluate("bash", "curl https://example.com/health");
        assert_eq!(outcome.decision, Decision::Approved);
        assert!((outcome.risk_score - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_score_clamps_to_one() {
        // kubectl (+0.8) + rm -rf (+0.5) + curl (+0.3) = 1.6, clamped to 1.0
        let outcome = evaluate("bash", "kubectl exec pod -- curl http://x && rm -rf /data");
        assert_eq!(outcome.risk_score, 1.0);
    }

    #[test]
    fn evaluate_is_pure() {
        let a = evaluate("bash", "terraform apply");
        let b = evaluate("bash", "terraform apply");
        assert_eq!(a.decision, b.decision);
        assert_eq!(a.risk_score, b.risk_score);
    }
}
