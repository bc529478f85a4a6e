//! Property-based tests for the git output parsers
//!
//! Uses proptest to check the parsers against generated git-like output and
//! to verify they never panic on arbitrary input.

use gitpipe::git::parser::{
    FIELD_SEPARATOR, parse_blame_porcelain, parse_branch_list, parse_log, parse_numstat,
};
use gitpipe::git::text::{is_hash, unquote_path, unwrap_lines};
use proptest::prelude::*;

// =============================================================================
// Strategy generators for realistic-ish git output
// =============================================================================

fn hash_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{40}".prop_map(|s| s.to_string())
}

fn summary_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 :_-]{0,60}".prop_map(|s| s.to_string())
}

/// Multi-line commit body
fn body_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,\n-]{0,120}".prop_map(|s| s.to_string())
}

fn branch_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9/_-]{0,20}".prop_map(|s| s.to_string())
}

#[derive(Debug, Clone)]
struct Record {
    hash: String,
    date: String,
    author: String,
    summary: String,
    body: String,
}

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        hash_strategy(),
        "[A-Z][a-z]{2}, [0-9]{1,2} [A-Z][a-z]{2} 20[0-9]{2}",
        "[A-Za-z ]{1,20} <[a-z]{1,8}@[a-z]{1,8}\\.org>",
        summary_strategy(),
        body_strategy(),
    )
        .prop_map(|(hash, date, author, summary, body)| Record {
            hash,
            date,
            author,
            summary,
            body,
        })
}

/// Serialize records the way `git log --format=<LOG_FORMAT>` does
fn log_blob(records: &[Record]) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        for field in [
            &record.hash,
            &record.date,
            &record.author,
            &record.summary,
            &record.body,
        ] {
            out.extend_from_slice(field.as_bytes());
            out.push(FIELD_SEPARATOR);
        }
        out.push(b'\n');
    }
    out
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every 40 character hex string is a hash, in either case
    #[test]
    fn full_length_hex_is_hash(hash in "[0-9a-fA-F]{40}") {
        prop_assert!(is_hash(&hash));
    }

    /// Any other length is rejected
    #[test]
    fn other_lengths_are_not_hashes(hash in "[0-9a-f]{0,39}|[0-9a-f]{41,64}") {
        prop_assert!(!is_hash(&hash));
    }

    /// A single non-hex character is enough to reject
    #[test]
    fn non_hex_character_is_not_hash(
        hash in "[0-9a-f]{40}",
        pos in 0usize..40,
        bad in "[g-zG-Z !_]",
    ) {
        let mut s = hash.clone();
        s.replace_range(pos..pos + 1, &bad);
        prop_assert!(!is_hash(&s));
    }

    /// N well-formed records come back as N commits, in order
    #[test]
    fn log_round_trip(records in prop::collection::vec(record_strategy(), 0..12)) {
        let commits = parse_log(&log_blob(&records)).unwrap();

        prop_assert_eq!(commits.len(), records.len());
        for (commit, record) in commits.iter().zip(&records) {
            prop_assert_eq!(commit.hash(), record.hash.as_str());
            prop_assert_eq!(commit.date(), record.date.as_str());
            prop_assert_eq!(commit.author(), record.author.as_str());
            prop_assert_eq!(commit.summary(), record.summary.as_str());
            prop_assert_eq!(commit.details(), unwrap_lines(&record.body));
        }
    }

    /// Dropping any trailing field of the last record is reported, never parsed
    #[test]
    fn truncated_log_is_incomplete(
        records in prop::collection::vec(record_strategy(), 1..5),
        missing in 1usize..5,
    ) {
        let mut blob = log_blob(&records);
        // drop the trailing newline and separator, then `missing` fields
        blob.pop();
        blob.pop();
        for _ in 0..missing {
            let cut = blob.iter().rposition(|&b| b == FIELD_SEPARATOR).unwrap_or(0);
            blob.truncate(cut);
        }

        prop_assert!(matches!(
            parse_log(&blob),
            Err(gitpipe::GitError::IncompleteResult(_))
        ));
    }

    /// Unwrapping already unwrapped text changes nothing
    #[test]
    fn unwrap_is_idempotent(text in "[a-zA-Z0-9 .\n\t-]{0,200}") {
        let once = unwrap_lines(&text);
        prop_assert_eq!(unwrap_lines(&once), once);
    }

    /// Branch names survive parsing in order with the marked one current
    #[test]
    fn branch_list_keeps_order(
        names in prop::collection::vec(branch_name_strategy(), 1..10),
        current in any::<prop::sample::Index>(),
    ) {
        let current = current.index(names.len());
        let output: String = names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} {}\n", if i == current { '*' } else { ' ' }, name))
            .collect();

        let list = parse_branch_list(&output).unwrap();
        let parsed: Vec<&str> = list.names().collect();
        prop_assert_eq!(parsed, names.iter().map(String::as_str).collect::<Vec<_>>());
        prop_assert_eq!(list.current().map(|b| b.name.as_str()), Some(names[current].as_str()));
    }

    /// Plain numstat lines parse to their counts
    #[test]
    fn numstat_counts(added in 0usize..100_000, removed in 0usize..100_000, path in "[a-z0-9_/.]{1,40}") {
        let entries = parse_numstat(&format!("{added}\t{removed}\t{path}\n"), "HEAD").unwrap();
        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(entries[0].added, added);
        prop_assert_eq!(entries[0].removed, removed);
        prop_assert_eq!(&entries[0].path, &path);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Log parser should not panic on arbitrary input
    #[test]
    fn log_parser_does_not_panic(input in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = parse_log(&input);
    }

    /// Blame parser should not panic on arbitrary input
    #[test]
    fn blame_parser_does_not_panic(input in ".*") {
        let _ = parse_blame_porcelain(&input);
    }

    /// Numstat parser should not panic on arbitrary input
    #[test]
    fn numstat_parser_does_not_panic(input in ".*") {
        let _ = parse_numstat(&input, "HEAD");
    }

    /// Path unquoting should not panic on arbitrary input
    #[test]
    fn unquote_does_not_panic(input in "\"[\\\\a-z0-7\"]{0,30}") {
        let _ = unquote_path(&input);
    }
}
