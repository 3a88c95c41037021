//! Vote tally engine.
//!
//! Pure reduction of raw comment text into a single winning water
//! amount. No I/O; deterministic for a given comment order.

use std::sync::OnceLock;

use regex::Regex;

/// Characters stripped from comments before matching, so injection-style
/// content never reaches the extractor or the logs.
const BLOCKED_CHARS: [char; 6] = ['"', '(', ')', ';', ':', '\''];

/// Winning amount and its supporting vote count.
///
/// `{0, 0}` means no comment carried a vote; it is a valid result, not
/// a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyResult {
    pub water_amount: u32,
    pub vote_count: u32,
}

/// Matches a vote: one or two digits, optional whitespace, then the
/// literal unit marker.
fn vote_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{1,2}\s?ml").expect("vote pattern is valid"))
}

/// Tally votes from a sequence of raw comment bodies.
///
/// Each comment contributes at most one vote: the first `NNml` match
/// after sanitization. Counts are kept in first-seen order, and ties on
/// the highest count go to the amount seen first, so the result is
/// fully determined by the input order.
pub fn tally<S: AsRef<str>>(comments: &[S]) -> TallyResult {
    let pattern = vote_pattern();

    // (amount, count) pairs in first-seen order.
    let mut counts: Vec<(u32, u32)> = Vec::new();

    for comment in comments {
        let sanitized = sanitize(comment.as_ref());
        let Some(matched) = pattern.find(&sanitized) else {
            continue;
        };

        let amount = matched
            .as_str()
            .trim_end_matches("ml")
            .trim()
            .parse::<u32>()
            .expect("matched digits parse as u32");

        match counts.iter_mut().find(|(a, _)| *a == amount) {
            Some((_, count)) => *count += 1,
            None => counts.push((amount, 1)),
        }
    }

    let mut winner = TallyResult {
        water_amount: 0,
        vote_count: 0,
    };
    for &(amount, count) in &counts {
        // Strictly greater: the first-seen amount keeps the win on ties.
        if count > winner.vote_count {
            winner = TallyResult {
                water_amount: amount,
                vote_count: count,
            };
        }
    }

    winner
}

/// Strip the punctuation blocklist from a comment.
fn sanitize(comment: &str) -> String {
    comment
        .chars()
        .filter(|c| !BLOCKED_CHARS.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_zero() {
        let comments: Vec<String> = Vec::new();
        assert_eq!(
            tally(&comments),
            TallyResult {
                water_amount: 0,
                vote_count: 0
            }
        );
    }

    #[test]
    fn test_no_matching_comments_yields_zero() {
        let comments = ["water it a lot", "nice plant!", "tomorrow: more"];
        let result = tally(&comments);
        assert_eq!(result.water_amount, 0);
        assert_eq!(result.vote_count, 0);
    }

    #[test]
    fn test_majority_wins() {
        let comments = ["10 ml", "10ml", "15 ml"];
        let result = tally(&comments);
        assert_eq!(result.water_amount, 10);
        assert_eq!(result.vote_count, 2);
    }

    #[test]
    fn test_tie_goes_to_first_seen_amount() {
        let comments = ["7ml", "7ml", "7ml", "9ml", "9ml", "9ml"];
        let result = tally(&comments);
        assert_eq!(result.water_amount, 7);
        assert_eq!(result.vote_count, 3);
    }

    #[test]
    fn test_sanitization_strips_blocklist() {
        let comments = ["10ml\"; DROP"];
        let result = tally(&comments);
        assert_eq!(result.water_amount, 10);
        assert_eq!(result.vote_count, 1);
    }

    #[test]
    fn test_first_match_per_comment_only() {
        // One comment, one vote, even with two amounts mentioned.
        let comments = ["10ml or maybe 20ml"];
        let result = tally(&comments);
        assert_eq!(result.water_amount, 10);
        assert_eq!(result.vote_count, 1);
    }

    #[test]
    fn test_unit_marker_is_case_sensitive() {
        let comments = ["10 ML", "12 Ml", "11 ml"];
        let result = tally(&comments);
        assert_eq!(result.water_amount, 11);
        assert_eq!(result.vote_count, 1);
    }

    #[test]
    fn test_vote_embedded_in_sentence() {
        let comments = ["give it 35 ml please", "35ml!", "i say 40ml"];
        let result = tally(&comments);
        assert_eq!(result.water_amount, 35);
        assert_eq!(result.vote_count, 2);
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let comments = ["5ml", "8 ml", "5ml", "8 ml"];
        assert_eq!(tally(&comments), tally(&comments));
    }
}
