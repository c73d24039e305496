use crate::diff::{ChangeKind, ChangeRecord};
use crate::policy::PolicyTable;
use tracing::debug;

/// Outcome of filtering a diff through the policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedChanges {
    /// Records the policy asks to surface, in diff order.
    pub reported: Vec<ChangeRecord>,
    /// Number of records the policy suppressed.
    pub suppressed: usize,
}

/// Keep only the changes whose kind is flagged by the policy governing
/// their path. `ignore` keeps nothing and `immutable` keeps everything.
pub fn report(changes: Vec<ChangeRecord>, table: &PolicyTable) -> ReportedChanges {
    let mut reported = Vec::with_capacity(changes.len());
    let mut suppressed = 0;

    for change in changes {
        let policy = table.resolve(&change.path);

        if policy.contains(change.kind.policy_flag()) {
            reported.push(change);
        } else {
            suppressed += 1;
            let source = match table.matching_rule(&change.path) {
                Some(rule) => format!("rule `{}`", rule.prefix),
                None => "default policy".to_string(),
            };
            debug!(
                "Suppressed {:?} {} (policy `{}` from {})",
                change.kind, change.path, policy, source
            );
        }
    }

    ReportedChanges {
        reported,
        suppressed,
    }
}

pub fn print_changes(changes: &[ChangeRecord], show_digests: bool) {
    for change in changes {
        println!("{}", format_change(change));

        if show_digests {
            for line in format_digest_lines(change) {
                println!("{}", line);
            }
        }
    }
}

fn change_symbol(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Added => "+",
        ChangeKind::Modified => "!",
        ChangeKind::Deleted => "-",
    }
}

pub fn format_change(change: &ChangeRecord) -> String {
    format!("{} {}", change_symbol(change.kind), change.path)
}

fn format_digest_lines(change: &ChangeRecord) -> Vec<String> {
    match (&change.old_checksum, &change.new_checksum) {
        (Some(old), Some(new)) => vec![format!(
            "   sha256: {} -> {}",
            truncate_sha256(old),
            truncate_sha256(new)
        )],
        (Some(old), None) => vec![format!("   was: sha256 {}", truncate_sha256(old))],
        (None, Some(new)) => vec![format!("   now: sha256 {}", truncate_sha256(new))],
        (None, None) => Vec::new(),
    }
}

fn truncate_sha256(sha256: &str) -> String {
    if sha256.len() > 12 {
        format!("{}...", &sha256[..12])
    } else {
        sha256.to_string()
    }
}
