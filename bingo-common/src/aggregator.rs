//! Admin aggregation
//!
//! Groups submissions by identity for the admin panel. Pure: recomputed from
//! the full submission list every time the panel opens.

use serde::Serialize;
use std::collections::HashMap;

use crate::identity::UNKNOWN_IDENTITY;
use crate::store::Submission;
use crate::symbol::SEQUENCE_LEN;

/// Identities longer than this are abbreviated for display
const SHORT_IDENTITY_MAX: usize = 20;

/// One admin-panel line, one per distinct identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub identity: String,
    pub submission_count: usize,
    /// Symbols of the group's submissions, in submission order
    pub unlocked_symbols: String,
    pub complete: bool,
    /// Post references, in submission order
    pub references: Vec<String>,
}

impl AggregateRow {
    /// e.g. `"2/4 (BS)"`
    pub fn progress_label(&self) -> String {
        format!(
            "{}/{} ({})",
            self.submission_count, SEQUENCE_LEN, self.unlocked_symbols
        )
    }

    /// First 10 and last 8 characters of long identities such as wallet addresses
    pub fn short_identity(&self) -> String {
        let chars: Vec<char> = self.identity.chars().collect();
        if chars.len() <= SHORT_IDENTITY_MAX {
            return self.identity.clone();
        }
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Grouped view over every submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminSummary {
    /// Grouped by identity, in first-seen order
    pub rows: Vec<AggregateRow>,
    pub unique_identity_count: usize,
    pub total_submissions: usize,
}

pub fn aggregate(submissions: &[Submission]) -> AdminSummary {
    let mut rows: Vec<AggregateRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for submission in submissions {
        let identity = match submission.identity.as_str() {
            "" => UNKNOWN_IDENTITY,
            identity => identity,
        };

        let position = *index.entry(identity).or_insert_with(|| {
            rows.push(AggregateRow {
                identity: identity.to_string(),
                submission_count: 0,
                unlocked_symbols: String::new(),
                complete: false,
                references: Vec::new(),
            });
            rows.len() - 1
        });

        let row = &mut rows[position];
        row.submission_count += 1;
        row.unlocked_symbols.push(submission.symbol.as_char());
        row.references.push(submission.reference.clone());
        row.complete = row.submission_count >= SEQUENCE_LEN;
    }

    AdminSummary {
        unique_identity_count: rows.len(),
        total_submissions: submissions.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Scope;
    use crate::symbol::Symbol;
    use chrono::Utc;
    use uuid::Uuid;

    fn submission(identity: &str, symbol: Symbol, n: u32) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            scope: Scope::Local,
            reference: format!("https://x.com/{}/status/{}", identity.trim_start_matches('@'), n),
            symbol,
            identity: identity.to_string(),
            sequence_index: n,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_input() {
        let summary = aggregate(&[]);
        assert!(summary.rows.is_empty());
        assert_eq!(summary.unique_identity_count, 0);
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let summary = aggregate(&[
            submission("alice", Symbol::B, 1),
            submission("bob", Symbol::A, 2),
            submission("alice", Symbol::S, 3),
        ]);

        assert_eq!(summary.unique_identity_count, 2);
        assert_eq!(summary.total_submissions, 3);

        let alice = &summary.rows[0];
        assert_eq!(alice.identity, "alice");
        assert_eq!(alice.submission_count, 2);
        assert_eq!(alice.unlocked_symbols, "BS");
        assert!(!alice.complete);
        assert_eq!(alice.progress_label(), "2/4 (BS)");

        let bob = &summary.rows[1];
        assert_eq!(bob.identity, "bob");
        assert_eq!(bob.submission_count, 1);
        assert_eq!(bob.unlocked_symbols, "A");
        assert!(!bob.complete);
    }

    #[test]
    fn test_complete_at_four_submissions() {
        let subs: Vec<Submission> = [Symbol::B, Symbol::A, Symbol::S, Symbol::E]
            .iter()
            .enumerate()
            .map(|(i, s)| submission("@dana", *s, i as u32 + 1))
            .collect();

        let summary = aggregate(&subs);
        assert_eq!(summary.rows.len(), 1);
        assert!(summary.rows[0].complete);
        assert_eq!(summary.rows[0].unlocked_symbols, "BASE");
        assert_eq!(summary.rows[0].references.len(), 4);
    }

    #[test]
    fn test_empty_identity_grouped_as_unknown() {
        let summary = aggregate(&[
            submission("", Symbol::B, 1),
            submission(UNKNOWN_IDENTITY, Symbol::A, 2),
            submission("  ", Symbol::S, 3),
        ]);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].identity, UNKNOWN_IDENTITY);
        assert_eq!(summary.rows[0].submission_count, 2);

        // Whitespace is a value of its own, not a missing identity
        assert_eq!(summary.rows[1].identity, "  ");
        assert_eq!(summary.rows[1].submission_count, 1);
    }

    #[test]
    fn test_short_identity() {
        let row = AggregateRow {
            identity: "0x1234567890abcdef1234567890abcdef12345678".to_string(),
            submission_count: 1,
            unlocked_symbols: "B".to_string(),
            complete: false,
            references: vec![],
        };
        assert_eq!(row.short_identity(), "0x12345678...12345678");

        let short = AggregateRow {
            identity: "@alice".to_string(),
            ..row
        };
        assert_eq!(short.short_identity(), "@alice");
    }
}
