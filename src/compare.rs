use crate::diff::diff;
use crate::policy::{PolicyConfig, PolicyError, PolicyTable};
use crate::report::{ReportedChanges, report};
use crate::snapshot::{Snapshot, SnapshotError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("IO failure reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed snapshot {}: {source}", path.display())]
    MalformedSnapshot {
        path: PathBuf,
        source: SnapshotError,
    },
    #[error("Invalid policy config: {0}")]
    InvalidPolicyConfig(#[from] PolicyError),
}

pub struct CompareOptions {
    pub config: Option<PathBuf>,
    pub default_policy: Option<String>,
    pub old_snapshot: PathBuf,
    pub new_snapshot: PathBuf,
}

/// Compare two snapshot files under a policy config.
///
/// All three inputs are read into memory up front. The policy table is built
/// before either snapshot is parsed, so a broken config fails the run before
/// any diffing. Either the whole comparison succeeds (possibly with nothing
/// to report) or it fails; there are no partial results.
///
/// Without a config file, the table has no rules and its default policy is
/// `options.default_policy` or `immutable`.
pub fn compare_snapshots(options: &CompareOptions) -> Result<ReportedChanges, CompareError> {
    let config_content = options.config.as_deref().map(read_input).transpose()?;
    let old_content = read_input(&options.old_snapshot)?;
    let new_content = read_input(&options.new_snapshot)?;

    let config = match &config_content {
        Some(content) => PolicyConfig::parse(content)?,
        None => PolicyConfig::default(),
    };
    let table = PolicyTable::build(&config, options.default_policy.as_deref())?;
    debug!(
        "Policy table: default `{}`, {} rule(s)",
        table.default_policy(),
        table.rules().len()
    );

    let older = parse_snapshot(&options.old_snapshot, &old_content)?;
    let newer = parse_snapshot(&options.new_snapshot, &new_content)?;

    let changes = diff(&older, &newer);
    info!(
        "Found {} change(s) between {} and {}",
        changes.len(),
        older.captured_at(),
        newer.captured_at()
    );

    Ok(report(changes, &table))
}

fn read_input(path: &Path) -> Result<String, CompareError> {
    std::fs::read_to_string(path).map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_snapshot(path: &Path, content: &str) -> Result<Snapshot, CompareError> {
    let snapshot = Snapshot::parse(content).map_err(|source| CompareError::MalformedSnapshot {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "Loaded {} ({} entries, root {}, tool {})",
        path.display(),
        snapshot.len(),
        snapshot.root(),
        snapshot.tool()
    );
    Ok(snapshot)
}
