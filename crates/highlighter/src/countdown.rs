//! Countdown heuristic
//!
//! Decides whether the text of one element shows a clock that is running
//! down between two observations. Static timers, timers counting up and
//! unrelated numbers that merely changed do not count.
//!
//! Candidates are 2-4 numeric fields chained by colons (`12:05:33`) or by
//! duration words (`2 days 5 hours`, `3 Tage und 4 Stunden`, `5h 3m`).
//! Chains longer than any plausible clock are cut from the text first, so
//! a list like `1:2:3:4:5` is never taken for one.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

const UNIT: &str =
    r"(?:days?|hours?|minutes?|seconds?|tage?|stunden?|minuten?|sekunden?|[a-zA-Z]{1,3}\.?)";

static COUNTDOWN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:[0-9]{{1,2}}\s*:\s*){{1,3}}[0-9]{{1,2}}|(?:[0-9]{{1,2}}\s*{UNIT}(?:\s*und)?\s*){{2,4}}"
    ))
    .expect("countdown expression is valid")
});

static OVERLONG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:[0-9]{{1,2}}\s*:\s*){{4,}}[0-9]{{1,2}}|(?:[0-9]{{1,2}}\s*{UNIT}(?:\s*und)?\s*){{5,}}"
    ))
    .expect("overlong chain expression is valid")
});

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("number expression is valid"));

/// True when `current` shows a countdown that ticked down since `previous`
///
/// Without a previous observation there is nothing to compare, so a node
/// that just appeared is never a countdown.
pub fn is_countdown(current: &str, previous: Option<&str>) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    if current == previous {
        return false;
    }

    let new = candidates(current);
    let old = candidates(previous);
    if new.is_empty() || new.len() != old.len() {
        return false;
    }

    new.iter()
        .zip(&old)
        .any(|(new, old)| ticked_down(new, old))
}

fn candidates(text: &str) -> Vec<String> {
    let cleaned = OVERLONG.replace_all(text, "");
    COUNTDOWN
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn numbers(candidate: &str) -> Vec<u64> {
    NUMBER
        .find_iter(candidate)
        .map(|m| m.as_str().parse().unwrap_or(u64::MAX))
        .collect()
}

/// The first differing field decides: smaller means the clock ran down
fn ticked_down(new: &str, old: &str) -> bool {
    let new = numbers(new);
    let old = numbers(old);
    if new.len() != old.len() {
        return false;
    }

    for (n, o) in new.iter().zip(&old) {
        match n.cmp(o) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_ticking_down() {
        assert!(is_countdown("23:30:39", Some("23:30:40")));
        assert!(is_countdown("Sale ends in 00:05:10", Some("Sale ends in 00:05:30")));
    }

    #[test]
    fn test_clock_moving_forward() {
        assert!(!is_countdown("23:31:20", Some("23:30:40")));
    }

    #[test]
    fn test_unchanged_clock() {
        assert!(!is_countdown("23:30:40", Some("23:30:40")));
    }

    #[test]
    fn test_no_previous_state() {
        assert!(!is_countdown("23:30:39", None));
        assert!(!is_countdown("", None));
    }

    #[test]
    fn test_duration_words() {
        assert!(is_countdown("2 days 4 hours", Some("2 days 5 hours")));
        assert!(is_countdown("noch 3 Tage und 2 Stunden", Some("noch 3 Tage und 3 Stunden")));
        assert!(is_countdown("1h 59m", Some("2h 0m")));
    }

    #[test]
    fn test_later_pair_can_decide() {
        assert!(is_countdown(
            "Opened 01:01, closes 00:09",
            Some("Opened 01:00, closes 00:10")
        ));
    }

    #[test]
    fn test_candidate_count_must_match() {
        assert!(!is_countdown("00:09 or 00:05", Some("00:10")));
        assert!(!is_countdown("done", Some("00:10")));
    }

    #[test]
    fn test_long_chains_are_ignored() {
        assert!(!is_countdown("10:20:30:40:49", Some("10:20:30:40:50")));
        assert!(!is_countdown(
            "1 a 2 b 3 c 4 d 4 e",
            Some("1 a 2 b 3 c 4 d 5 e")
        ));
    }

    #[test]
    fn test_plain_numbers_are_not_clocks() {
        assert!(!is_countdown("Only 4 left", Some("Only 5 left")));
    }

    #[test]
    fn test_arbitrary_text_is_safe() {
        let junk = "99999999999999999999999:1 ::: 12ab. und und 7";
        assert!(!is_countdown(junk, Some(junk)));
        let _ = is_countdown(junk, Some("x"));
    }
}
