pub(super) const ROOT_LONG_ABOUT: &str = "\
Checksum snapshots of directory trees and policy-driven comparison

Snapcheck records the SHA-256 of every file below a directory in a plain text
snapshot, and later compares two snapshots. A YAML policy file decides, per
path prefix, which kinds of change (additions, modifications, deletions) are
worth reporting. Everything else is silently suppressed.

CORE CONCEPTS:

  Snapshots:
    A snapshot is a sorted list of sha256 digests and relative paths, preceded
    by a short header naming the capture time and the root directory:

      snapcheck: 2024-01-02-030405
      snapcheck: /home/alice

      2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824  ./notes.txt

  Policies:
    A policy is a comma separated list of tokens:
      noadd      report files that appeared
      nomodify   report files whose content changed
      nodelete   report files that disappeared
      ignore     report nothing (cannot be combined)
      immutable  report everything (cannot be combined)

TYPICAL WORKFLOW:

  1. Capture a baseline:
     $ snapcheck checksum ~/archive -o monday.snap

  2. Capture again later:
     $ snapcheck checksum ~/archive -o friday.snap

  3. Compare under a policy:
     $ snapcheck compare -c policy.yaml monday.snap friday.snap

COMMANDS:

  checksum
    Walk a directory tree and write a snapshot of it.

  compare
    Compare two snapshots and print the changes the policy asks for.

GLOBAL OPTIONS:

  -C <DIRECTORY>
    Change to directory before operating (like git -C or make -C).
    Relative paths given to subcommands are resolved from there.

  -v, --verbose
    Log progress on stderr: -v for info, -vv for debug.
    Takes precedence over RUST_LOG.

  --log-level <LEVEL>
    Set the stderr log level explicitly (error, warn, info, debug, trace).
    Takes precedence over RUST_LOG. Cannot be combined with -v.
";

pub(super) const CHECKSUM_LONG_ABOUT: &str = "\
Capture a checksum snapshot of a directory tree

Recursively walks DIR, computes the SHA-256 of every regular file and writes a
snapshot to OUTPUT. The snapshot is written to a temporary file first and
renamed into place, so OUTPUT is never left half written.

WHAT IS RECORDED:

  - Regular files, with paths relative to DIR in ./a/b form
  - The capture time (UTC, second precision)
  - The canonical absolute path of DIR

WHAT IS SKIPPED:

  - Files and directories whose name begins with '.' (and everything below
    hidden directories). DIR itself may be hidden.
  - Symlinks, sockets, fifos and devices. Symlinks are never followed.

ERRORS:

  A file that changes while it is being hashed aborts the capture, as does any
  unreadable file or directory. Nothing is written in that case.

EXAMPLES:

  # Snapshot the current directory
  $ snapcheck checksum . -o /backups/today.snap

  # Snapshot a directory relative to another working directory
  $ snapcheck -C /srv checksum data -o /backups/data.snap
";

pub(super) const COMPARE_LONG_ABOUT: &str = "\
Compare two snapshots and report changes the policy cares about

Computes which files were added, modified or deleted between OLD and NEW, then
looks up the policy governing each changed path. A change is printed only if
its policy contains the matching token (noadd for additions, nomodify for
modifications, nodelete for deletions).

OUTPUT FORMAT:

  One line per reported change, sorted by path:
    + ./path   file added
    ! ./path   file modified
    - ./path   file deleted

  With --diff, each line is followed by the truncated old and/or new sha256.
  A summary of reported and suppressed changes is logged at info level (-v).

POLICY CONFIG:

  default-policy: immutable
  policies:
    ./Music/: noadd,nomodify
    ./Pictures/2020/: ignore
    ./Documents/: nodelete

  Each key under 'policies' is a path prefix. The longest prefix that matches
  a path decides its policy. A prefix ending in '/' covers everything below
  it; any other prefix matches the path itself and paths below it, so
  ./Documents never covers ./DocumentsX. Paths with no matching rule use the
  default policy.

DEFAULT POLICY:

  The first of these that is present:
    1. --default-policy on the command line
    2. default-policy in the config file
    3. immutable

  Without --config, no rules apply and every path uses the default policy.

EXIT STATUS:

  0    Comparison completed (whether or not changes were reported)
  255  Malformed snapshot, invalid policy config, or unreadable input

EXAMPLES:

  # Report every change
  $ snapcheck compare monday.snap friday.snap

  # Only report changes the policy file flags
  $ snapcheck compare -c policy.yaml monday.snap friday.snap

  # Report nothing outside configured prefixes
  $ snapcheck compare -c policy.yaml -d ignore monday.snap friday.snap
";
