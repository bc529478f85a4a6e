use std::collections::HashMap;

use crate::error::{GitError, GitResult};
use crate::git::records::BlameEntry;
use crate::git::text::is_hash;

/// Header line of one blamed line
struct Header<'a> {
    hash: &'a str,
    final_line: usize,
    group_size: Option<usize>,
}

/// Entry being assembled between its header and its content line
struct Pending {
    hash: String,
    line: usize,
    author: Option<String>,
    grouped: bool,
}

/// Lines still expected for the current commit group
struct Group {
    hash: String,
    author: Option<String>,
    remaining: usize,
    last_line: usize,
}

/// Parse `git blame --porcelain` or `--line-porcelain` output
///
/// Each line is described by a header
/// `<hash> <orig-line> <final-line> [<group-size>]`, metadata lines, then the
/// source line prefixed with a tab. Only the first header of a group carries
/// the group size; the following headers must repeat the group's hash on
/// consecutive lines and inherit its author. An `author` line is only
/// guaranteed the first time a commit appears, so authors are remembered per
/// hash.
pub fn parse_blame_porcelain(output: &str) -> GitResult<Vec<BlameEntry>> {
    let mut entries = Vec::new();
    let mut authors: HashMap<String, String> = HashMap::new();
    let mut group: Option<Group> = None;
    let mut pending: Option<Pending> = None;

    for (index, line) in output.lines().enumerate() {
        let line_no = index + 1;

        if line.starts_with('\t') {
            let Some(entry) = pending.take() else {
                return Err(GitError::InvalidResult(format!(
                    "line {line_no}: content line without a header"
                )));
            };
            entries.push(finish_entry(entry, &mut group, &mut authors)?);
            continue;
        }

        if let Some(entry) = pending.as_mut() {
            if let Some(("author", name)) = line.split_once(' ') {
                if !entry.grouped {
                    entry.author = Some(name.to_string());
                }
            }
            continue;
        }

        let header = parse_header(line, line_no)?;
        pending = Some(open_entry(header, &mut group, line_no)?);
    }

    if pending.is_some() {
        return Err(GitError::IncompleteResult(
            "blame entry without content line".to_string(),
        ));
    }
    if let Some(g) = group.filter(|g| g.remaining > 0) {
        return Err(GitError::IncompleteResult(format!(
            "commit group {} is missing {} line(s)",
            g.hash, g.remaining
        )));
    }

    Ok(entries)
}

fn parse_header(line: &str, line_no: usize) -> GitResult<Header<'_>> {
    let invalid = || GitError::InvalidResult(format!("line {line_no}: bad blame header: {line}"));

    let fields: Vec<&str> = line.split(' ').collect();
    if !(3..=4).contains(&fields.len()) || !is_hash(fields[0]) {
        return Err(invalid());
    }

    fields[1].parse::<usize>().map_err(|_| invalid())?;
    let final_line = fields[2].parse::<usize>().map_err(|_| invalid())?;
    let group_size = match fields.get(3) {
        Some(n) => Some(n.parse::<usize>().map_err(|_| invalid())?),
        None => None,
    };
    if final_line == 0 || group_size == Some(0) {
        return Err(invalid());
    }

    Ok(Header {
        hash: fields[0],
        final_line,
        group_size,
    })
}

fn open_entry(header: Header<'_>, group: &mut Option<Group>, line_no: usize) -> GitResult<Pending> {
    match group.as_mut().filter(|g| g.remaining > 0) {
        Some(g) => {
            if header.group_size.is_some() {
                return Err(GitError::InvalidResult(format!(
                    "line {line_no}: new group while {} line(s) of {} remain",
                    g.remaining, g.hash
                )));
            }
            if !header.hash.eq_ignore_ascii_case(&g.hash) {
                return Err(GitError::InvalidResult(format!(
                    "line {line_no}: grouped entry {} doesn't match group {}",
                    header.hash, g.hash
                )));
            }
            if header.final_line != g.last_line + 1 {
                return Err(GitError::InvalidResult(format!(
                    "line {line_no}: grouped entry jumps from line {} to {}",
                    g.last_line, header.final_line
                )));
            }
            g.remaining -= 1;
            g.last_line = header.final_line;

            Ok(Pending {
                hash: g.hash.clone(),
                line: header.final_line,
                author: g.author.clone(),
                grouped: true,
            })
        }
        None => {
            let hash = header.hash.to_ascii_lowercase();
            *group = Some(Group {
                hash: hash.clone(),
                author: None,
                remaining: header.group_size.unwrap_or(1) - 1,
                last_line: header.final_line,
            });

            Ok(Pending {
                hash,
                line: header.final_line,
                author: None,
                grouped: false,
            })
        }
    }
}

fn finish_entry(
    entry: Pending,
    group: &mut Option<Group>,
    authors: &mut HashMap<String, String>,
) -> GitResult<BlameEntry> {
    let author = match entry.author {
        Some(author) => author,
        None => authors.get(&entry.hash).cloned().ok_or_else(|| {
            GitError::IncompleteResult(format!("no author for commit {}", entry.hash))
        })?,
    };

    if !entry.grouped {
        authors.insert(entry.hash.clone(), author.clone());
        if let Some(g) = group.as_mut() {
            g.author = Some(author.clone());
        }
    }

    Ok(BlameEntry {
        line: entry.line,
        hash: entry.hash,
        author,
    })
}
