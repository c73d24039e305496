use crate::policy::PolicyFlag;
use crate::snapshot::Snapshot;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    /// The policy flag that must be set for this kind of change to be
    /// reported.
    pub fn policy_flag(self) -> PolicyFlag {
        match self {
            ChangeKind::Added => PolicyFlag::NoAdd,
            ChangeKind::Modified => PolicyFlag::NoModify,
            ChangeKind::Deleted => PolicyFlag::NoDelete,
        }
    }
}

/// A single difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: String,
    pub kind: ChangeKind,
    /// Checksum in the older snapshot; `None` for additions.
    pub old_checksum: Option<String>,
    /// Checksum in the newer snapshot; `None` for deletions.
    pub new_checksum: Option<String>,
}

impl ChangeRecord {
    fn added(path: &str, checksum: &str) -> Self {
        ChangeRecord {
            path: path.to_string(),
            kind: ChangeKind::Added,
            old_checksum: None,
            new_checksum: Some(checksum.to_string()),
        }
    }

    fn deleted(path: &str, checksum: &str) -> Self {
        ChangeRecord {
            path: path.to_string(),
            kind: ChangeKind::Deleted,
            old_checksum: Some(checksum.to_string()),
            new_checksum: None,
        }
    }

    fn modified(path: &str, old: &str, new: &str) -> Self {
        ChangeRecord {
            path: path.to_string(),
            kind: ChangeKind::Modified,
            old_checksum: Some(old.to_string()),
            new_checksum: Some(new.to_string()),
        }
    }
}

/// Classify every path that differs between `before` and `after`.
///
/// Both snapshots keep their entries sorted by path, so this is a single
/// merge-join over the two key sets. The result is sorted by path. Paths
/// present in both with the same checksum produce no record.
pub fn diff(before: &Snapshot, after: &Snapshot) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();
    let mut old_iter = before.entries().iter().peekable();
    let mut new_iter = after.entries().iter().peekable();

    loop {
        let ordering = match (old_iter.peek(), new_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((old_path, _)), Some((new_path, _))) => old_path.cmp(new_path),
        };

        match ordering {
            Ordering::Less => {
                if let Some((path, checksum)) = old_iter.next() {
                    changes.push(ChangeRecord::deleted(path, checksum));
                }
            }
            Ordering::Greater => {
                if let Some((path, checksum)) = new_iter.next() {
                    changes.push(ChangeRecord::added(path, checksum));
                }
            }
            Ordering::Equal => {
                if let (Some((path, old)), Some((_, new))) = (old_iter.next(), new_iter.next())
                    && old != new
                {
                    changes.push(ChangeRecord::modified(path, old, new));
                }
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::test_support::{digest, snapshot_of, snapshot_text};

    #[test]
    fn test_diff_of_identical_snapshots_is_empty() {
        let snapshot = snapshot_of(&[("./a.txt", '1'), ("./b/c.txt", '2'), ("./d", '3')]);
        assert!(diff(&snapshot, &snapshot).is_empty());

        let empty = snapshot_of(&[]);
        assert!(diff(&empty, &empty).is_empty());
    }

    #[test]
    fn test_diff_classifies_changes() {
        let before = snapshot_of(&[("./a.txt", '1'), ("./b.txt", '2')]);
        let after = snapshot_of(&[("./a.txt", '1'), ("./b.txt", '3'), ("./c.txt", '4')]);

        let changes = diff(&before, &after);
        assert_eq!(
            changes,
            vec![
                ChangeRecord {
                    path: "./b.txt".to_string(),
                    kind: ChangeKind::Modified,
                    old_checksum: Some(digest('2')),
                    new_checksum: Some(digest('3')),
                },
                ChangeRecord {
                    path: "./c.txt".to_string(),
                    kind: ChangeKind::Added,
                    old_checksum: None,
                    new_checksum: Some(digest('4')),
                },
            ]
        );
    }

    #[test]
    fn test_disjoint_snapshots() {
        let before = snapshot_of(&[("./a/b/c", '0')]);
        let after = snapshot_of(&[("./x/y/z", '0')]);

        let changes = diff(&before, &after);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].path, "./a/b/c");
        assert_eq!(changes[0].kind, ChangeKind::Deleted);
        assert_eq!(changes[0].old_checksum, Some(digest('0')));
        assert_eq!(changes[0].new_checksum, None);
        assert_eq!(changes[1].path, "./x/y/z");
        assert_eq!(changes[1].kind, ChangeKind::Added);
    }

    #[test]
    fn test_diff_output_is_sorted_by_path() {
        let before = snapshot_of(&[
            ("./a/b/changed", '0'),
            ("./c/d/unchanged", '0'),
            ("./e/f/deleted", '0'),
            ("./i/j/changed", '0'),
        ]);
        let after = snapshot_of(&[
            ("./a/b/changed", 'f'),
            ("./b/added", '0'),
            ("./c/d/unchanged", '0'),
            ("./i/j/changed", 'f'),
            ("./z/added", '0'),
        ]);

        let paths: Vec<_> = diff(&before, &after)
            .into_iter()
            .map(|c| (c.path, c.kind))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("./a/b/changed".to_string(), ChangeKind::Modified),
                ("./b/added".to_string(), ChangeKind::Added),
                ("./e/f/deleted".to_string(), ChangeKind::Deleted),
                ("./i/j/changed".to_string(), ChangeKind::Modified),
                ("./z/added".to_string(), ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_diff_is_symmetric() {
        let before = snapshot_of(&[
            ("./gone", '1'),
            ("./kept", '2'),
            ("./changed", '3'),
            ("./also-gone", '4'),
        ]);
        let after = snapshot_of(&[
            ("./kept", '2'),
            ("./changed", '5'),
            ("./new", '6'),
            ("./z-new", '7'),
        ]);

        let forward = diff(&before, &after);
        let backward = diff(&after, &before);
        assert_eq!(forward.len(), backward.len());

        for (f, b) in forward.iter().zip(&backward) {
            assert_eq!(f.path, b.path);
            let expected_kind = match f.kind {
                ChangeKind::Added => ChangeKind::Deleted,
                ChangeKind::Deleted => ChangeKind::Added,
                ChangeKind::Modified => ChangeKind::Modified,
            };
            assert_eq!(b.kind, expected_kind);
            assert_eq!(f.old_checksum, b.new_checksum);
            assert_eq!(f.new_checksum, b.old_checksum);
        }
    }

    #[test]
    fn test_everything_added_or_deleted_against_empty() {
        let empty = snapshot_of(&[]);
        let full = snapshot_of(&[("./a", '1'), ("./b", '2')]);

        assert!(
            diff(&empty, &full)
                .iter()
                .all(|c| c.kind == ChangeKind::Added)
        );
        assert!(
            diff(&full, &empty)
                .iter()
                .all(|c| c.kind == ChangeKind::Deleted)
        );
        assert_eq!(diff(&full, &empty).len(), 2);
    }

    #[test]
    fn test_digest_case_is_significant() {
        let lower = "ab".repeat(32);
        let upper = "AB".repeat(32);
        let before = Snapshot::parse(&snapshot_text(&format!("{lower}  ./x\n"))).unwrap();
        let after = Snapshot::parse(&snapshot_text(&format!("{upper}  ./x\n"))).unwrap();

        let changes = diff(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn test_policy_flag_per_kind() {
        assert_eq!(ChangeKind::Added.policy_flag(), PolicyFlag::NoAdd);
        assert_eq!(ChangeKind::Modified.policy_flag(), PolicyFlag::NoModify);
        assert_eq!(ChangeKind::Deleted.policy_flag(), PolicyFlag::NoDelete);
    }
}
