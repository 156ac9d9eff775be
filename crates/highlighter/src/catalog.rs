//! Built-in pattern catalog
//!
//! Declaration order matters (first registered wins), so the countdown
//! detector, the only one that needs both observations, comes first.

use crate::error::{HighlighterError, Result};
use crate::pattern::{Detector, Pattern, PatternRegistry};

const INFO_URL: &str = "https://en.wikipedia.org/wiki/Dark_pattern";
const LANGUAGES: &[&str] = &["en", "de"];

/// Amount with a currency sign or word on either side
const AMOUNT_EN: &str = r"(?:(?:€|₹|GBP|£|\$|USD)\s*\d+(?:\.\d{2})?|\d+(?:\.\d{2})?\s*(?:euros?|€|₹|GBP|£|pounds?(?:\s*sterling)?|\$|USD|dollars?))";
const PER_MONTH_EN: &str = r"(?:(?:(?:per|/|a)\s*month)|(?:p|/)m)";
const AMOUNT_DE: &str = r"\d+(?:,\d{2})?\s*(?:Euro|€)";

fn forced_continuity_en() -> Vec<String> {
    vec![
        format!(r"{AMOUNT_EN}\s*{PER_MONTH_EN}\s*(?:after|from\s*(?:month|day)\s*\d+)"),
        format!(
            r"{AMOUNT_EN}\s*(?:after\s*(?:the)?\s*\d+(?:th|nd|rd|th)?\s*(?:months?|days?)|from\s*(?:month|day)\s*\d+)"
        ),
        format!(r"(?:after\s*that|then|afterwards|subsequently)\s*{AMOUNT_EN}\s*{PER_MONTH_EN}"),
        format!(r"after\s*(?:the)?\s*\d+(?:th|nd|rd|th)?\s*months?\s*(?:only|just)?\s*{AMOUNT_EN}"),
    ]
}

fn forced_continuity_de() -> Vec<String> {
    vec![
        format!(
            r"{AMOUNT_DE}\s*(?:(?:pro|im|/)\s*Monat)?\s*(?:ab\s*(?:dem)?\s*\d+\.\s*Monat|nach\s*\d+\s*(?:Monaten|Tagen)|nach\s*(?:einem|1)\s*Monat)"
        ),
        format!(r"(?:anschließend|danach)\s*{AMOUNT_DE}\s*(?:pro|im|/)\s*Monat"),
        format!(r"{AMOUNT_DE}\s*(?:pro|im|/)\s*Monat\s*(?:anschließend|danach)"),
        format!(r"ab(?:\s*dem)?\s*\d+\.\s*Monat(?:\s*nur)?\s*{AMOUNT_DE}"),
    ]
}

fn pattern(name: &str, class_key: &str, info: &str, detectors: Vec<Detector>) -> Pattern {
    Pattern {
        name: name.to_string(),
        class_key: class_key.to_string(),
        detectors,
        info_url: INFO_URL.to_string(),
        info: info.to_string(),
        languages: LANGUAGES.iter().map(|l| l.to_string()).collect(),
    }
}

fn builtin_patterns() -> std::result::Result<Vec<Pattern>, regex::Error> {
    let en = forced_continuity_en();
    let de = forced_continuity_de();
    let en: Vec<&str> = en.iter().map(String::as_str).collect();
    let de: Vec<&str> = de.iter().map(String::as_str).collect();

    Ok(vec![
        pattern(
            "Countdown",
            "countdown",
            "A timer on the page counts down to pressure a quick decision. Such timers are often reset or simply restart on reload.",
            vec![Detector::Countdown],
        ),
        pattern(
            "Bait and Switch",
            "bait-and-switch",
            "Goods are advertised as limited to create artificial scarcity, often to steer the buyer toward a different offer.",
            vec![Detector::any_of(&[r"limited"])?],
        ),
        pattern(
            "False Urgency",
            "false-urgency",
            "Claims such as low stock or daily deals suggest the offer is about to disappear.",
            vec![
                Detector::all_of(&[r"urgent", r"false"])?,
                Detector::any_of(&[r"deal\s*of\s*the\s*day"])?,
                Detector::any_of(&[r"only\s*left\s*in\s*stock"])?,
                Detector::any_of(&[r"Activate\s*coupon"])?,
                Detector::any_of(&[r"only \s*"])?,
            ],
        ),
        pattern(
            "Subscription Trap",
            "subscription-trap",
            "A free premium or VIP tier is offered that silently turns into a paid subscription.",
            vec![
                Detector::any_of(&[r"Get\s*Premium\s*free"])?,
                Detector::any_of(&[r"v\s*i\s*p"])?,
            ],
        ),
        pattern(
            "Disguised Ad",
            "disguised-ad",
            "Advertising is styled like regular content so it is clicked by mistake.",
            vec![
                Detector::any_of(&[r"ads\s*"])?,
                Detector::any_of(&[r"Sponsored"])?,
            ],
        ),
        pattern(
            "Forced Continuity",
            "forced-continuity",
            "A free or cheap trial continues as a paid subscription after a period, with the later price tucked away in small print.",
            vec![Detector::any_of(&en)?, Detector::any_of(&de)?],
        ),
    ])
}

impl PatternRegistry {
    /// The patterns shipped with the engine
    pub fn builtin() -> Result<Self> {
        let patterns = builtin_patterns().map_err(|source| HighlighterError::InvalidRegex {
            pattern: "built-in catalog".to_string(),
            source,
        })?;
        Self::new(patterns)
    }
}
