//! Snapshot files: a header followed by `sha256sum`-style lines.
//!
//! ```text
//! snapcheck: 2024-01-01-120000
//! snapcheck: /home/user
//!
//! <64 hex chars>  ./relative/path
//! ```
//!
//! The first two lines name the producing tool, the capture time (UTC) and
//! the root that was walked. The third line separates the header from the
//! data and is not inspected. Data lines are sorted by path.
//!
//! Digests are kept exactly as written. Upper and lower case hex are both
//! accepted, but no case folding happens, so the same digest spelled in a
//! different case in two snapshots compares as a modification.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeMap;

/// Number of hex characters in a SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Tool name written into snapshots produced by this crate.
pub const TOOL_NAME: &str = "snapcheck";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";
const HEADER_SEPARATOR: &str = ": ";
const DATA_SEPARATOR: &str = "  ";
const PATH_PREFIX: &str = "./";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("truncated snapshot: missing {0} line")]
    Truncated(&'static str),
    #[error("line {line}: malformed header: {reason}")]
    MalformedHeader { line: usize, reason: String },
    #[error("line {line}: malformed snapshot line: `{content}`")]
    MalformedLine { line: usize, content: String },
    #[error("line {line}: path collision: {path}")]
    DuplicatePath { line: usize, path: String },
}

/// In-memory form of one snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    tool: String,
    root: String,
    captured_at: DateTime<Utc>,
    /// Relative path (`./...`) to hex encoded SHA-256.
    entries: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn new(
        tool: impl Into<String>,
        root: impl Into<String>,
        captured_at: DateTime<Utc>,
        entries: BTreeMap<String, String>,
    ) -> Self {
        Snapshot {
            tool: tool.into(),
            root: root.into(),
            captured_at,
            entries,
        }
    }

    /// Parse the textual representation of a snapshot.
    ///
    /// Paths are opaque strings here; no normalization is applied beyond
    /// requiring the `./` prefix. A repeated path is an error rather than an
    /// overwrite, since a well-formed snapshot cannot contain one.
    pub fn parse(content: &str) -> Result<Self, SnapshotError> {
        let mut lines = content.lines().enumerate().map(|(i, line)| (i + 1, line));

        let (line_no, header) = lines.next().ok_or(SnapshotError::Truncated("header"))?;
        let (tool, timestamp) = split_header_line(line_no, header)?;
        let captured_at = parse_timestamp(line_no, timestamp)?;

        let (line_no, root_line) = lines.next().ok_or(SnapshotError::Truncated("root"))?;
        let (root_tool, root) = split_header_line(line_no, root_line)?;
        if root_tool != tool {
            return Err(SnapshotError::MalformedHeader {
                line: line_no,
                reason: format!("tool name `{root_tool}` does not match `{tool}`"),
            });
        }

        lines.next().ok_or(SnapshotError::Truncated("separator"))?;

        let mut entries = BTreeMap::new();
        for (line_no, line) in lines {
            let (checksum, path) = parse_data_line(line_no, line)?;
            if entries.insert(path.to_string(), checksum.to_string()).is_some() {
                return Err(SnapshotError::DuplicatePath {
                    line: line_no,
                    path: path.to_string(),
                });
            }
        }

        Ok(Snapshot {
            tool: tool.to_string(),
            root: root.to_string(),
            captured_at,
            entries,
        })
    }

    /// Render the snapshot in file form, data lines sorted by path.
    pub fn to_snapshot_string(&self) -> String {
        let mut out = format!(
            "{tool}{sep}{ts}\n{tool}{sep}{root}\n\n",
            tool = self.tool,
            sep = HEADER_SEPARATOR,
            ts = self.captured_at.format(TIMESTAMP_FORMAT),
            root = self.root,
        );
        for (path, checksum) in &self.entries {
            out.push_str(checksum);
            out.push_str(DATA_SEPARATOR);
            out.push_str(path);
            out.push('\n');
        }
        out
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    #[cfg(test)]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn split_header_line(line_no: usize, line: &str) -> Result<(&str, &str), SnapshotError> {
    match line.split_once(HEADER_SEPARATOR) {
        Some((tool, value)) if !tool.is_empty() && !value.is_empty() => Ok((tool, value)),
        _ => Err(SnapshotError::MalformedHeader {
            line: line_no,
            reason: format!("expected `<tool>: <value>`, got `{line}`"),
        }),
    }
}

fn parse_timestamp(line_no: usize, value: &str) -> Result<DateTime<Utc>, SnapshotError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| SnapshotError::MalformedHeader {
            line: line_no,
            reason: format!("bad timestamp `{value}`: {e}"),
        })
}

/// Split a data line into `(checksum, path)`.
fn parse_data_line(line_no: usize, line: &str) -> Result<(&str, &str), SnapshotError> {
    let malformed = || SnapshotError::MalformedLine {
        line: line_no,
        content: line.to_string(),
    };

    // Checking the hex digits first also guarantees the split below lands on
    // a char boundary.
    let checksum = line.get(..SHA256_HEX_LEN).ok_or_else(malformed)?;
    if !checksum.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    let path = line[SHA256_HEX_LEN..]
        .strip_prefix(DATA_SEPARATOR)
        .ok_or_else(malformed)?;
    if !path.starts_with(PATH_PREFIX) || path.len() == PATH_PREFIX.len() {
        return Err(malformed());
    }

    Ok((checksum, path))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const HEADER: &str = "snapcheck: 2024-01-01-120000\nsnapcheck: /home/user\n\n";

    /// Prepend a valid header to some data lines.
    pub fn snapshot_text(data_lines: &str) -> String {
        format!("{HEADER}{data_lines}")
    }

    /// A 64 character checksum made of one repeated hex digit.
    pub fn digest(c: char) -> String {
        std::iter::repeat_n(c, SHA256_HEX_LEN).collect()
    }

    pub fn snapshot_of(entries: &[(&str, char)]) -> Snapshot {
        let entries = entries
            .iter()
            .map(|(path, c)| (path.to_string(), digest(*c)))
            .collect();
        Snapshot::new(
            TOOL_NAME,
            "/home/user",
            NaiveDateTime::parse_from_str("2024-01-01-120000", TIMESTAMP_FORMAT)
                .unwrap()
                .and_utc(),
            entries,
        )
    }
}
