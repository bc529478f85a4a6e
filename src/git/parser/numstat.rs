use crate::error::{GitError, GitResult};
use crate::git::records::ChangedFileEntry;
use crate::git::text::unquote_path;

/// Parse `git show --numstat` output for revision `rev`
///
/// Format per line: `<added>\t<removed>\t<path>`, `-` counts for binary
/// files. Blank lines (such as the one left by an empty `--format`) are
/// skipped. When the first line is not a numstat line it is the commit's
/// notes, printed by `--format=%N`; everything up to the last blank line is
/// skipped. Any malformed line after that fails the whole batch.
pub fn parse_numstat(output: &str, rev: &str) -> GitResult<Vec<ChangedFileEntry>> {
    let lines: Vec<&str> = output.lines().collect();
    let start = stats_start(&lines);
    let mut entries = Vec::new();

    for (index, line) in lines.iter().enumerate().skip(start) {
        if line.is_empty() {
            continue;
        }

        let Some((added, removed, path)) = split_fields(line) else {
            return Err(GitError::InvalidResult(format!(
                "line {}: expected 3 tab-separated fields: {line}",
                index + 1
            )));
        };

        entries.push(ChangedFileEntry {
            hash: rev.to_string(),
            added: parse_count(added, index)?,
            removed: parse_count(removed, index)?,
            path: unquote_path(path)?,
        });
    }

    Ok(entries)
}

/// Index of the first line after the notes block, 0 when there is none
fn stats_start(lines: &[&str]) -> usize {
    let Some(first) = lines.iter().position(|line| !line.is_empty()) else {
        return 0;
    };
    if is_stat_line(lines[first]) {
        return 0;
    }
    // notes may hold blank lines of their own; stat lines never do
    lines
        .iter()
        .rposition(|line| line.is_empty())
        .filter(|&blank| blank > first)
        .map_or(first, |blank| blank + 1)
}

fn split_fields(line: &str) -> Option<(&str, &str, &str)> {
    let mut fields = line.splitn(3, '\t');
    Some((fields.next()?, fields.next()?, fields.next()?))
}

fn is_stat_line(line: &str) -> bool {
    split_fields(line).is_some_and(|(added, removed, _)| {
        parse_count(added, 0).is_ok() && parse_count(removed, 0).is_ok()
    })
}

fn parse_count(field: &str, index: usize) -> GitResult<usize> {
    if field == "-" {
        return Ok(0);
    }
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GitError::InvalidResult(format!(
            "line {}: invalid line count '{field}'",
            index + 1
        )));
    }
    field.parse::<usize>().map_err(|_| {
        GitError::InvalidResult(format!(
            "line {}: line count '{field}' overflows",
            index + 1
        ))
    })
}
