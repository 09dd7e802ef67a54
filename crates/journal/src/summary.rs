use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use odoscan_core::Money;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        pub(crate) fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_company, r"บริษัท\s+(.+?)\s+จำกัด");
re!(re_payee, r"Pay to\s+(.*)");
re!(re_date, r"Date Printed:\s+([0-9/]+)");
re!(re_doc_no, r"Document No.\s+(\S+)");
re!(re_total, r"TOTALS\s+([0-9,]+\.[0-9]+)");
re!(re_bank, r"Bank\s+(.*?)\s+#([0-9]+)");
re!(re_entry,
    r"\|\s*([0-9]+)\s*\|\s*([0-9]+)\s*\|\s*(.*?)\s*\|\s*(.*?)\s*\|\s*([0-9,]+\.[0-9]+)?\s*\|");

/// Placeholder the external summarizer prints for a missing field.
const NOT_FOUND_TH: &str = "ไม่พบ";

const DEBIT_PREFIX: &str = "2154";
const CREDIT_PREFIX: &str = "2111";

// ── Types ────────────────────────────────────────────────────────────────────

/// One row of the journal's pipe-delimited account table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub line: String,
    pub account_code: String,
    pub description: String,
    pub note: String,
    #[serde(deserialize_with = "amount")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insight {
    Balanced,
    Unbalanced,
    AdvanceRefund,
    Instrumentation,
    NoPurchaseTax,
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Insight::Balanced => "Balanced: debit and credit totals match",
            Insight::Unbalanced => "Unbalanced: please check debit and credit totals",
            Insight::AdvanceRefund => "Involves a refund of excess advance expenses (ADV)",
            Insight::Instrumentation => "Relates to Instrumentation project work",
            Insight::NoPurchaseTax => "No purchase tax recorded for this payment",
        };
        write!(f, "{s}")
    }
}

/// Structured summary of an OCR'd payment journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalSummary {
    #[serde(default, deserialize_with = "found")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "found")]
    pub payee: Option<String>,
    #[serde(default, deserialize_with = "found")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "found")]
    pub doc_no: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    pub total: Decimal,
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
    #[serde(default)]
    pub account_totals: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub debit_total: Decimal,
    #[serde(default)]
    pub credit_total: Decimal,
    pub balance_ok: bool,
    #[serde(default)]
    pub insights: Vec<String>,
}

impl JournalSummary {
    /// Summarize journal text. Never fails: fields that cannot be found are
    /// `None` and a missing total is zero.
    pub fn from_text(text: &str) -> Self {
        let entries = entries(text);
        let account_totals = account_totals(&entries);

        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;
        for entry in &entries {
            if entry.account_code.starts_with(DEBIT_PREFIX) {
                debit_total += entry.amount;
            } else if entry.account_code.starts_with(CREDIT_PREFIX) {
                credit_total += entry.amount;
            }
        }
        let balance_ok = debit_total == credit_total;

        let mut insights = vec![if balance_ok { Insight::Balanced } else { Insight::Unbalanced }];
        if text.contains("ADV") {
            insights.push(Insight::AdvanceRefund);
        }
        if entries.iter().any(|e| e.note.contains("Instrumentation")) {
            insights.push(Insight::Instrumentation);
        }
        if text.contains("ภาษีซื้อ") && text.contains("0.00") {
            insights.push(Insight::NoPurchaseTax);
        }

        Self {
            company: capture(re_company(), text),
            payee: capture(re_payee(), text),
            date: capture(re_date(), text),
            doc_no: capture(re_doc_no(), text),
            total: capture(re_total(), text).map(|t| parse_amount(&t)).unwrap_or(Decimal::ZERO),
            entries,
            account_totals,
            debit_total,
            credit_total,
            balance_ok,
            insights: insights.iter().map(Insight::to_string).collect(),
        }
    }

    /// Human-readable report.
    pub fn render(&self) -> String {
        let mut out = String::from("Journal summary\n");
        out.push_str(&format!("- Company: {}\n", or_not_found(&self.company)));
        out.push_str(&format!("- Payee: {}\n", or_not_found(&self.payee)));
        out.push_str(&format!("- Date: {}\n", or_not_found(&self.date)));
        out.push_str(&format!("- Document: {}\n", or_not_found(&self.doc_no)));
        out.push_str(&format!("- Total: {} THB\n", Money::from_decimal(self.total)));
        out.push_str(&format!("- Debit total: {} THB\n", Money::from_decimal(self.debit_total)));
        out.push_str(&format!("- Credit total: {} THB\n", Money::from_decimal(self.credit_total)));
        out.push_str(&format!(
            "- Balanced: {}\n",
            if self.balance_ok { "yes" } else { "no" }
        ));
        if !self.insights.is_empty() {
            out.push_str("\nInsights:\n");
            for insight in &self.insights {
                out.push_str(&format!("- {insight}\n"));
            }
        }
        out
    }
}

// ── Parsing helpers ──────────────────────────────────────────────────────────

pub(crate) fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)?
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `1,234.50` → 1234.50. Anything unparseable counts as zero.
pub(crate) fn parse_amount(s: &str) -> Decimal {
    Decimal::from_str(&s.replace(',', "")).unwrap_or(Decimal::ZERO)
}

pub(crate) fn entries(text: &str) -> Vec<JournalEntry> {
    re_entry()
        .captures_iter(text)
        .map(|c| JournalEntry {
            line: c[1].to_string(),
            account_code: c[2].to_string(),
            description: c[3].trim().to_string(),
            note: c[4].trim().to_string(),
            amount: c.get(5).map(|m| parse_amount(m.as_str())).unwrap_or(Decimal::ZERO),
        })
        .collect()
}

pub(crate) fn account_totals(entries: &[JournalEntry]) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.account_code.clone()).or_insert(Decimal::ZERO) += entry.amount;
    }
    totals
}

pub(crate) fn or_not_found(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("not found")
}

// ── Serde helpers for externally produced summaries ──────────────────────────

fn found<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty() && v != NOT_FOUND_TH))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(Decimal),
}

fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    Ok(match Option::<RawAmount>::deserialize(deserializer)? {
        Some(RawAmount::Text(s)) => parse_amount(&s),
        Some(RawAmount::Number(d)) => d,
        None => Decimal::ZERO,
    })
}
