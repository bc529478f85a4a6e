use crate::error::GitResult;
use crate::git::records::{Branch, BranchList};

/// Parse plain `git branch` output
///
/// Format: `* main` for the checked out branch, `  feature-x` otherwise.
/// Lines are not validated: whatever follows the marker is the name, even
/// when empty. Only the first starred line is reported as current.
pub fn parse_branch_list(output: &str) -> GitResult<BranchList> {
    let mut branches = Vec::new();
    let mut seen_current = false;

    for line in output.lines() {
        let (marked, rest) = match line.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let is_current = marked && !seen_current;
        seen_current |= is_current;

        branches.push(Branch {
            name: rest.trim_start_matches(' ').to_string(),
            is_current,
        });
    }

    Ok(BranchList { branches })
}
