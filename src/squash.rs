//! C7 — Squash pass.
//!
//! Collapses a contiguous run of bookkeeping commits at a branch tip into a
//! single commit. `check_squashable` walks the first-parent log as a
//! `NOT_FOUND -> FOUND_MARKER -> FOUND_NON_MARKER` state machine;
//! `squash_commits` verifies the run is still contiguous, then performs a
//! soft reset and a single replacement commit.

use std::path::Path;

use crate::types::{CommitHash, CommitRange};
use crate::vcs::VcsAdapter;

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

struct LoggedCommit {
    hash: CommitHash,
    subject: String,
    body: String,
}

fn log_first_parent(
    vcs: &VcsAdapter,
    repo: &Path,
    revision_range: &str,
) -> anyhow::Result<Vec<LoggedCommit>> {
    let format = format!("--format=%H{FIELD_SEP}%s{FIELD_SEP}%b{RECORD_SEP}");
    let output = vcs.run(&["log", "--first-parent", &format, revision_range], repo, false)?;
    let stdout = output.stdout_str();
    Ok(stdout
        .split(RECORD_SEP)
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .map(|record| {
            let mut fields = record.splitn(3, FIELD_SEP);
            let hash = fields.next().unwrap_or_default().trim().to_owned();
            let subject = fields.next().unwrap_or_default().to_owned();
            let body = fields.next().unwrap_or_default().trim().to_owned();
            LoggedCommit {
                hash: CommitHash::new(hash),
                subject,
                body,
            }
        })
        .collect())
}

enum State {
    NotFound,
    FoundMarker,
    FoundNonMarker,
}

/// Determines whether `branch`'s tip is a contiguous run of marker commits
///. `None` means not squashable: absence of a marker at
/// HEAD, a non-marker-then-marker transition, or no markers at all.
pub fn check_squashable(
    vcs: &VcsAdapter,
    repo: &Path,
    branch: &str,
    marker: &str,
) -> anyhow::Result<Option<CommitRange>> {
    let commits = log_first_parent(vcs, repo, branch)?;
    let mut state = State::NotFound;
    let mut head = None;
    let mut tail = None;
    for commit in &commits {
        let is_marker = commit.subject.starts_with(marker);
        state = match (state, is_marker) {
            (State::NotFound, true) => {
                head = Some(commit.hash.clone());
                tail = Some(commit.hash.clone());
                State::FoundMarker
            }
            (State::NotFound, false) => return Ok(None),
            (State::FoundMarker, true) => {
                tail = Some(commit.hash.clone());
                State::FoundMarker
            }
            (State::FoundMarker, false) => State::FoundNonMarker,
            (State::FoundNonMarker, true) => return Ok(None),
            (State::FoundNonMarker, false) => State::FoundNonMarker,
        };
    }
    match (head, tail) {
        (Some(head), Some(tail)) => Ok(Some(CommitRange { head, tail })),
        _ => Ok(None),
    }
}

/// Verifies `range` is still a contiguous first-parent run, then replaces it
/// with a single commit: `title`, `description`, an `---` separator, then
/// the original subjects+bodies oldest-to-newest.
pub fn squash_commits(
    vcs: &VcsAdapter,
    repo: &Path,
    range: &CommitRange,
    title: &str,
    description: &str,
) -> anyhow::Result<()> {
    let tail_parent = format!("{}^", range.tail);
    let revision_range = format!("{tail_parent}..{}", range.head);
    let commits = log_first_parent(vcs, repo, &revision_range)?;
    anyhow::ensure!(
        commits.last().map(|c| &c.hash) == Some(&range.tail),
        "squash range {:?}..{} is not contiguous along first-parent ancestry",
        range.tail,
        range.head
    );

    let mut message = format!("{title}\n\n{description}\n\n---\n");
    for commit in commits.iter().rev() {
        message.push_str(&commit.subject);
        message.push('\n');
        if !commit.body.is_empty() {
            message.push_str(&commit.body);
            message.push('\n');
        }
    }

    let message_file = tempfile::Builder::new()
        .prefix("monomerge-squash-message-")
        .tempfile()?;
    std::fs::write(message_file.path(), &message)?;

    vcs.run(&["reset", "--soft", &tail_parent], repo, false)?;
    vcs.run(
        &["commit", "-F", &message_file.path().to_string_lossy()],
        repo,
        false,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(hash: &str, subject: &str) -> LoggedCommit {
        LoggedCommit {
            hash: CommitHash::new(hash),
            subject: subject.to_owned(),
            body: String::new(),
        }
    }

    fn run_state_machine(commits: &[LoggedCommit], marker: &str) -> Option<CommitRange> {
        let mut state = State::NotFound;
        let mut head = None;
        let mut tail = None;
        for c in commits {
            let is_marker = c.subject.starts_with(marker);
            state = match (state, is_marker) {
                (State::NotFound, true) => {
                    head = Some(c.hash.clone());
                    tail = Some(c.hash.clone());
                    State::FoundMarker
                }
                (State::NotFound, false) => return None,
                (State::FoundMarker, true) => {
                    tail = Some(c.hash.clone());
                    State::FoundMarker
                }
                (State::FoundMarker, false) => State::FoundNonMarker,
                (State::FoundNonMarker, true) => return None,
                (State::FoundNonMarker, false) => State::FoundNonMarker,
            };
        }
        match (head, tail) {
            (Some(head), Some(tail)) => Some(CommitRange { head, tail }),
            _ => None,
        }
    }

    #[test]
    fn contiguous_markers_at_tip_are_squashable() {
        let commits = [
            commit("h0", "[monomerge] a"),
            commit("h1", "[monomerge] b"),
            commit("h2", "[monomerge] c"),
            commit("h3", "feature work"),
            commit("h4", "initial"),
        ];
        let range = run_state_machine(&commits, "[monomerge]").unwrap();
        assert_eq!(range.head.as_str(), "h0");
        assert_eq!(range.tail.as_str(), "h2");
    }

    #[test]
    fn non_marker_at_head_is_not_squashable() {
        let commits = [commit("h0", "feature work"), commit("h1", "[monomerge] a")];
        assert!(run_state_machine(&commits, "[monomerge]").is_none());
    }

    #[test]
    fn marker_after_non_marker_is_not_squashable() {
        let commits = [
            commit("h0", "[monomerge] a"),
            commit("h1", "feature work"),
            commit("h2", "[monomerge] b"),
        ];
        assert!(run_state_machine(&commits, "[monomerge]").is_none());
    }

    #[test]
    fn no_markers_at_all_is_not_squashable() {
        let commits = [commit("h0", "feature work"), commit("h1", "initial")];
        assert!(run_state_machine(&commits, "[monomerge]").is_none());
    }
}
