//! Passcode extraction from normalized message text.
//!
//! The matcher applies a deterministic two-stage policy:
//!
//! 1. **Keyword proximity.** For each keyword in a fixed priority order, look
//!    (case-insensitively) for the keyword followed within 30 characters by a
//!    run of 4 to 8 digits, or such a run followed within 30 characters by
//!    the keyword. The first keyword that matches wins; later keywords are
//!    not scanned.
//! 2. **Fallback.** If no keyword matched, take the first standalone run of
//!    exactly 6 digits anywhere in the text.
//!
//! The result carries [`Provenance`] recording which stage produced it.
//!
//! # Example
//!
//! ```
//! use otp_watch::matcher::{OtpMatcher, Provenance};
//!
//! let matcher = OtpMatcher::default();
//! let found = matcher.find("Your verification pin is: 483920. Do not share.").unwrap();
//! assert_eq!(found.code(), "483920");
//! assert_eq!(found.provenance(), &Provenance::Keyword("pin".into()));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Default keyword priority order, highest priority first.
pub const DEFAULT_KEYWORDS: [&str; 5] = ["otp", "code", "pin", "password", "verification"];

/// How many arbitrary characters may separate a keyword from its digit run.
const PROXIMITY_WINDOW: usize = 30;

/// Fallback pattern: a standalone run of exactly 6 digits. The word
/// boundaries reject runs embedded in longer numbers or alphanumeric tokens.
static FALLBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{6}\b").expect("valid regex"));

/// A passcode candidate extracted from message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCandidate {
    code: String,
    provenance: Provenance,
}

impl OtpCandidate {
    /// Returns the digit string, leading zeros preserved.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns which rule produced this candidate.
    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}

impl std::fmt::Display for OtpCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Which matching rule produced a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// A keyword-proximity match; carries the keyword that matched.
    Keyword(String),
    /// The standalone 6-digit fallback.
    Fallback,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Keyword(keyword) => write!(f, "matched-keyword:{keyword}"),
            Provenance::Fallback => write!(f, "fallback"),
        }
    }
}

/// Keyword-proximity passcode matcher with a 6-digit fallback.
///
/// [`find`](Self::find) is a pure function of the input text and the
/// configured keyword list: the same text always yields the same candidate
/// and provenance.
#[derive(Debug, Clone)]
pub struct OtpMatcher {
    keywords: Vec<KeywordPattern>,
}

#[derive(Debug, Clone)]
struct KeywordPattern {
    name: String,
    regex: Regex,
}

impl KeywordPattern {
    fn compile(keyword: &str) -> Self {
        let name = keyword.to_lowercase();
        let escaped = regex::escape(&name);
        // One alternation per keyword: digits-after-keyword is the first
        // branch, so leftmost-first matching breaks the tie when both
        // directions could start at the same position. The gap is lazy so
        // the digit run is captured from its first digit, not its tail.
        let pattern = format!(
            r"(?i){escaped}.{{0,{window}}}?(\d{{4,8}})|(\d{{4,8}}).{{0,{window}}}?{escaped}",
            window = PROXIMITY_WINDOW
        );
        Self {
            regex: Regex::new(&pattern).expect("valid keyword pattern"),
            name,
        }
    }
}

impl Default for OtpMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl OtpMatcher {
    /// Creates a matcher with a custom keyword priority list.
    ///
    /// Keywords are matched case-insensitively; regex metacharacters in a
    /// keyword are treated literally. An empty list leaves only the 6-digit
    /// fallback active.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| KeywordPattern::compile(k.as_ref()))
                .collect(),
        }
    }

    /// Returns the keyword list in priority order.
    #[must_use]
    pub fn keywords(&self) -> Vec<&str> {
        self.keywords.iter().map(|k| k.name.as_str()).collect()
    }

    /// Finds the most likely passcode in `text`, or `None`.
    ///
    /// Keywords are tried in priority order; the first keyword whose pattern
    /// matches anywhere returns immediately. The earliest match in document
    /// order wins within one keyword's scan. Only if every keyword misses is
    /// the standalone 6-digit fallback consulted.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<OtpCandidate> {
        for keyword in &self.keywords {
            if let Some(caps) = keyword.regex.captures(text) {
                // Exactly one of the two direction groups participates
                let digits = caps.get(1).or_else(|| caps.get(2))?;
                return Some(OtpCandidate {
                    code: digits.as_str().to_owned(),
                    provenance: Provenance::Keyword(keyword.name.clone()),
                });
            }
        }

        FALLBACK.find(text).map(|m| OtpCandidate {
            code: m.as_str().to_owned(),
            provenance: Provenance::Fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(name: &str) -> Provenance {
        Provenance::Keyword(name.into())
    }

    #[test]
    fn test_keyword_before_digits() {
        let matcher = OtpMatcher::default();
        let found = matcher.find("Your OTP is 4832").unwrap();
        assert_eq!(found.code(), "4832");
        assert_eq!(found.provenance(), &keyword("otp"));
    }

    #[test]
    fn test_digits_before_keyword() {
        let matcher = OtpMatcher::default();
        let found = matcher.find("Use 583920 as your login code").unwrap();
        assert_eq!(found.code(), "583920");
        assert_eq!(found.provenance(), &keyword("code"));
    }

    #[test]
    fn test_keyword_priority_order_beats_text_position() {
        // "pin" appears before "otp" in the text, but "otp" has higher
        // priority and is scanned first. The filler keeps "1111" out of the
        // otp pattern's window so only "otp 2222" can match it.
        let matcher = OtpMatcher::default();
        let text = format!("pin 1111 {} otp 2222", "x".repeat(40));
        let found = matcher.find(&text).unwrap();
        assert_eq!(found.code(), "2222");
        assert_eq!(found.provenance(), &keyword("otp"));
    }

    #[test]
    fn test_digits_shared_between_directions() {
        // "1111" sits before "otp" within the window, so the
        // digits-before-keyword branch matches leftmost and wins even
        // though "otp 2222" would also match
        let matcher = OtpMatcher::default();
        let found = matcher.find("pin 1111 then otp 2222").unwrap();
        assert_eq!(found.code(), "1111");
        assert_eq!(found.provenance(), &keyword("otp"));
    }

    #[test]
    fn test_first_occurrence_in_document_order() {
        let matcher = OtpMatcher::default();
        let found = matcher.find("code 1234 ... code 5678").unwrap();
        assert_eq!(found.code(), "1234");
        assert_eq!(found.provenance(), &keyword("code"));
    }

    #[test]
    fn test_proximity_window_respected() {
        let matcher = OtpMatcher::new(["code"]);
        let near = format!("code{}1234", "x".repeat(30));
        assert_eq!(matcher.find(&near).unwrap().provenance(), &keyword("code"));

        // 31 filler characters puts the digits out of reach; no fallback
        // either since the run is not exactly 6 digits
        let far = format!("code{}1234", "x".repeat(31));
        assert_eq!(matcher.find(&far), None);
    }

    #[test]
    fn test_digit_run_length_bounds() {
        let matcher = OtpMatcher::new(["code"]);
        assert!(matcher.find("code 123").is_none());
        assert_eq!(matcher.find("code 1234").unwrap().code(), "1234");
        assert_eq!(matcher.find("code 12345678").unwrap().code(), "12345678");
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = OtpMatcher::default();
        let found = matcher.find("YOUR CODE IS 987654").unwrap();
        assert_eq!(found.code(), "987654");
        assert_eq!(found.provenance(), &keyword("code"));
    }

    #[test]
    fn test_fallback_standalone_six_digits() {
        let matcher = OtpMatcher::default();
        let found = matcher.find("please enter 483920 to continue").unwrap();
        assert_eq!(found.code(), "483920");
        assert_eq!(found.provenance(), &Provenance::Fallback);
    }

    #[test]
    fn test_fallback_rejects_embedded_runs() {
        let matcher = OtpMatcher::default();
        // 6 digits inside an 8-digit number must not match
        assert_eq!(matcher.find("ref 12345678 end"), None);
        // nor inside an alphanumeric token
        assert_eq!(matcher.find("id abc123456def"), None);
    }

    #[test]
    fn test_fallback_requires_exactly_six() {
        let matcher = OtpMatcher::default();
        assert_eq!(matcher.find("numbers 12345 and 1234567 only"), None);
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let matcher = OtpMatcher::default();
        assert_eq!(matcher.find("otp 004231").unwrap().code(), "004231");
        assert_eq!(matcher.find("standalone 012345 here").unwrap().code(), "012345");
    }

    #[test]
    fn test_no_match() {
        let matcher = OtpMatcher::default();
        assert_eq!(matcher.find("nothing to see here"), None);
        assert_eq!(matcher.find(""), None);
    }

    #[test]
    fn test_custom_keywords() {
        let matcher = OtpMatcher::new(["token", "secret"]);
        let found = matcher.find("your token: 5541").unwrap();
        assert_eq!(found.provenance(), &keyword("token"));
        // default keywords are not active
        assert_eq!(
            matcher.find("otp 1234").map(|c| c.provenance().clone()),
            None
        );
    }

    #[test]
    fn test_keyword_with_metacharacters_is_literal() {
        let matcher = OtpMatcher::new(["c.de"]);
        assert!(matcher.find("cxde 1234").is_none());
        assert_eq!(matcher.find("c.de 1234").unwrap().code(), "1234");
    }

    #[test]
    fn test_idempotent() {
        let matcher = OtpMatcher::default();
        let text = "Your verification pin is: 483920. Do not share.";
        let first = matcher.find(text);
        let second = matcher.find(text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_provenance_display() {
        assert_eq!(keyword("pin").to_string(), "matched-keyword:pin");
        assert_eq!(Provenance::Fallback.to_string(), "fallback");
    }

    #[test]
    fn test_priority_when_two_keywords_in_range() {
        // Both "pin" and "verification" are within the window; "pin" is
        // earlier in the priority list and wins
        let matcher = OtpMatcher::default();
        let found = matcher
            .find("Your verification pin is: 483920. Do not share.")
            .unwrap();
        assert_eq!(found.code(), "483920");
        assert_eq!(found.provenance(), &keyword("pin"));
    }
}
