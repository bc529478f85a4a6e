use crate::error::{GitError, GitResult};
use crate::git::records::Commit;
use crate::git::text::{ensure_valid_utf8, is_hash, unwrap_lines};

/// Byte separating the fields of one log record; never valid in UTF-8 text
pub const FIELD_SEPARATOR: u8 = 0xff;

/// Fields per record: hash, date, author, summary, body
const FIELDS_PER_RECORD: usize = 5;

/// `--format` value producing records understood by [`parse_log`]
pub const LOG_FORMAT: &str = "%H%xff%aD%xff%an <%ae>%xff%s%xff%B%xff";

/// Parse git log output produced with [`LOG_FORMAT`]
///
/// git separates records with a newline, so every hash except the first one
/// is preceded by `\n`, and the stream ends with a lone `\n` chunk.
pub fn parse_log(output: &[u8]) -> GitResult<Vec<Commit>> {
    let chunks: Vec<&[u8]> = output.split(|&b| b == FIELD_SEPARATOR).collect();
    let mut commits = Vec::new();
    let mut i = 0;

    while i < chunks.len() {
        let head = chunks[i];
        if i + 1 == chunks.len() && head.iter().all(u8::is_ascii_whitespace) {
            break;
        }

        if i + FIELDS_PER_RECORD > chunks.len() {
            return Err(GitError::IncompleteResult(format!(
                "commit record {} has {} of {} fields",
                commits.len() + 1,
                chunks.len() - i,
                FIELDS_PER_RECORD
            )));
        }

        let hash = ensure_valid_utf8(head.trim_ascii_start());
        if !is_hash(&hash) {
            return Err(GitError::InvalidResult(format!(
                "record {} doesn't start with a hash",
                commits.len() + 1
            )));
        }

        commits.push(Commit::new(
            hash.to_ascii_lowercase(),
            ensure_valid_utf8(chunks[i + 1]),
            ensure_valid_utf8(chunks[i + 2]),
            ensure_valid_utf8(chunks[i + 3]),
            unwrap_lines(&ensure_valid_utf8(chunks[i + 4])),
        ));
        i += FIELDS_PER_RECORD;
    }

    Ok(commits)
}
