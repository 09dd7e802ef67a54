use std::sync::OnceLock;

use odoscan_core::OdometerReading;
use regex::Regex;

use crate::envelope::unwrap_natural_text;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Digit classes are spelled out as ASCII: OCR output mixes in Thai text and
// Thai numerals must neither count as digits nor as word characters.
re!(re_anchored,
    r"(?i)(?:ODO|odometer)[^0-9]{0,10}([0-9]{4,6})");
re!(re_standalone,
    r"(?:^|[^0-9A-Za-z_])([0-9]{5,6})(?:[^0-9A-Za-z_]|$)");

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct OdometerExtractor;

impl OdometerExtractor {
    /// Find the most likely odometer value in free-form OCR text.
    ///
    /// A digit run anchored by `ODO`/`odometer` wins over any other number;
    /// without an anchor the leftmost standalone 5–6 digit run is taken.
    pub fn extract(text: &str) -> Option<String> {
        Self::read(text).matched_value
    }

    /// Like [`extract`](Self::extract) but keeps the text the value was read from.
    pub fn read(text: &str) -> OdometerReading {
        let text = unwrap_natural_text(text);
        let matched = Self::anchored(&text).or_else(|| Self::standalone(&text)).map(str::to_string);
        OdometerReading::new(text.into_owned(), matched)
    }

    fn anchored(text: &str) -> Option<&str> {
        re_anchored().captures(text)?.get(1).map(|m| m.as_str())
    }

    fn standalone(text: &str) -> Option<&str> {
        re_standalone().captures(text)?.get(1).map(|m| m.as_str())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
