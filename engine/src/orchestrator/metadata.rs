//! Case metadata extraction
//!
//! Metadata is best-effort context for the report summary: client, case
//! number, case type and so on, each with a confidence. Nothing in the
//! pipeline depends on it being present.
//!
//! [`PatternExtractor`] is the built-in source. It uses regular expressions
//! and keyword lists only, never a text-generation provider.

use super::types::OrchestratorError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// A single extracted value with its confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub value: String,
    pub confidence: f64,
}

impl Field {
    fn new(value: impl Into<String>, confidence: f64) -> Self {
        Self {
            value: value.into(),
            confidence,
        }
    }
}

/// Read-only metadata for one case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub client_name: Option<Field>,
    pub case_number: Option<Field>,
    pub case_type: Option<Field>,
    pub insurance_company: Option<Field>,
    /// Normalised to YYYY-MM-DD
    pub date_of_incident: Option<Field>,
    #[serde(default)]
    pub medical_providers: Vec<Field>,
}

impl CaseMetadata {
    pub fn case_number(&self) -> Option<&str> {
        self.case_number.as_ref().map(|f| f.value.as_str())
    }

    pub fn case_type(&self) -> Option<&str> {
        self.case_type.as_ref().map(|f| f.value.as_str())
    }
}

/// Source of case metadata
pub trait MetadataSource: Send + Sync {
    fn extract(&self, text: &str) -> Result<CaseMetadata, OrchestratorError>;
}

/// Regex and keyword based extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl MetadataSource for PatternExtractor {
    fn extract(&self, text: &str) -> Result<CaseMetadata, OrchestratorError> {
        let patterns = patterns();
        let metadata = CaseMetadata {
            client_name: first_capture(&patterns.client_name, text),
            case_number: first_capture(&patterns.case_number, text),
            case_type: case_type(patterns, text),
            insurance_company: insurance_company(patterns, text),
            date_of_incident: incident_date(patterns, text),
            medical_providers: medical_providers(patterns, text),
        };

        tracing::debug!(
            client_name = metadata.client_name.is_some(),
            case_number = ?metadata.case_number(),
            case_type = ?metadata.case_type(),
            providers = metadata.medical_providers.len(),
            "Extracted case metadata"
        );

        Ok(metadata)
    }
}

struct Patterns {
    client_name: Vec<(Regex, f64)>,
    case_number: Vec<(Regex, f64)>,
    case_type_label: Regex,
    insurer_named: Vec<(Regex, f64)>,
    date_labelled: Vec<Regex>,
    date_any: Vec<Regex>,
    doctors: Vec<(Regex, f64)>,
    facilities: Vec<(Regex, f64)>,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid metadata pattern")
}

fn weighted(list: &[(&str, f64)]) -> Vec<(Regex, f64)> {
    list.iter().map(|(p, c)| (compile(p), *c)).collect()
}

const NAME: &str = r"([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){1,3})\b";

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        client_name: [
            ("client", 0.95),
            ("plaintiff", 0.90),
            ("claimant", 0.85),
            ("patient", 0.80),
        ]
        .iter()
        .map(|(label, c)| (compile(&format!(r"(?i:\b{})[ \t]*:?[ \t]*{}", label, NAME)), *c))
        .collect(),
        case_number: weighted(&[
            (
                r"(?i)case\s*(?:#|no\.?|number)?\s*:?\s*([A-Z0-9]{2,4}-[A-Z0-9]{2,4}-[0-9]{3,6})",
                0.95,
            ),
            (r"\b([A-Z]{2}-\d{4}-\d{3,6})\b", 0.90),
            (r"(?i)case\s*(?:#|no\.?|number)?\s*:?\s*(\d{4,6})\b", 0.80),
            (r"(?i)file\s*(?:#|no\.?|number)\s*:?\s*([A-Z0-9-]{4,})", 0.85),
            (r"(?i)docket\s*(?:#|no\.?|number)?\s*:?\s*([A-Z0-9-]{4,})", 0.85),
        ]),
        case_type_label: compile(r"(?i)case\s*type\s*:\s*([^\n.;|]+)"),
        insurer_named: weighted(&[
            (r"([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+Insurance", 0.85),
            (r"([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+Assurance", 0.85),
            (r"([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)[ \t]+Mutual", 0.80),
            (r"(?i:insurance[ \t]+company)[ \t]*:?[ \t]*([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)", 0.80),
            (r"(?i:carrier)[ \t]*:?[ \t]*([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)", 0.75),
        ]),
        date_labelled: [
            r"([A-Za-z]+\.?\s+\d{1,2},?\s+\d{4})",
            r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
            r"(\d{4}-\d{2}-\d{2})",
        ]
        .iter()
        .map(|p| {
            compile(&format!(
                r"(?i)(?:date\s+of\s+)?(?:incident|accident|injury|occurrence)\s*:?\s*{}",
                p
            ))
        })
        .collect(),
        date_any: vec![
            compile(r"\b([A-Z][a-z]+\.?\s+\d{1,2},?\s+\d{4})\b"),
            compile(r"\b(\d{4}-\d{2}-\d{2})\b"),
            compile(r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b"),
        ],
        doctors: weighted(&[
            (r"\bDr\.?[ \t]+([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)?)", 0.90),
            (r"\bDoctor[ \t]+([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)?)", 0.85),
        ]),
        facilities: weighted(&[
            (
                r"(?:St\.|Mt\.|Saint)[ \t]+[A-Z][a-z]+(?:'s)?[ \t]+(?:Hospital|Medical[ \t]+Center|Clinic)",
                0.95,
            ),
            (
                r"[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*[ \t]+(?:Hospital|Medical[ \t]+Center|Clinic|Healthcare)",
                0.90,
            ),
        ]),
    })
}

fn first_capture(patterns: &[(Regex, f64)], text: &str) -> Option<Field> {
    patterns.iter().find_map(|(re, confidence)| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| Field::new(m.as_str().trim(), *confidence))
    })
}

/// Keyword groups in precedence order
const CASE_TYPES: [(&[&str], &str, f64); 7] = [
    (
        &[
            "auto accident",
            "motor vehicle accident",
            "car accident",
            "car crash",
            "vehicle collision",
            "traffic accident",
        ],
        "personal injury - motor vehicle",
        0.95,
    ),
    (
        &[
            "slip and fall",
            "trip and fall",
            "premises liability",
            "dangerous condition",
            "hazardous condition",
            "wet floor",
        ],
        "premises liability",
        0.95,
    ),
    (
        &[
            "medical malpractice",
            "medical negligence",
            "surgical error",
            "misdiagnosis",
            "wrong medication",
            "hospital negligence",
        ],
        "medical malpractice",
        0.95,
    ),
    (
        &[
            "wrongful termination",
            "employment discrimination",
            "workplace harassment",
            "retaliation",
            "hostile work environment",
            "wage dispute",
        ],
        "employment law",
        0.90,
    ),
    (
        &[
            "insurance dispute",
            "claim denial",
            "bad faith insurance",
            "coverage dispute",
            "insurance claim",
        ],
        "insurance dispute",
        0.90,
    ),
    (
        &[
            "breach of contract",
            "contract dispute",
            "agreement violation",
            "contractual obligation",
        ],
        "contract dispute",
        0.85,
    ),
    (
        &["personal injury", "bodily injury", "negligence", "liability"],
        "personal injury",
        0.75,
    ),
];

const CASE_TYPE_LABEL_CONFIDENCE: f64 = 0.98;

fn case_type(patterns: &Patterns, text: &str) -> Option<Field> {
    if let Some(label) = patterns
        .case_type_label
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
    {
        return Some(Field::new(label, CASE_TYPE_LABEL_CONFIDENCE));
    }

    let lower = text.to_lowercase();
    CASE_TYPES
        .iter()
        .find(|(keywords, _, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, name, confidence)| Field::new(*name, *confidence))
}

const KNOWN_INSURERS: [&str; 18] = [
    "state farm",
    "allstate",
    "geico",
    "progressive",
    "farmers",
    "nationwide",
    "liberty mutual",
    "usaa",
    "travelers",
    "american family",
    "aig",
    "metlife",
    "prudential",
    "aetna",
    "cigna",
    "united healthcare",
    "blue cross",
    "anthem",
];

fn insurance_company(patterns: &Patterns, text: &str) -> Option<Field> {
    let lower = text.to_lowercase();
    for insurer in KNOWN_INSURERS {
        let Some(start) = find_word(&lower, insurer) else {
            continue;
        };
        // Lowercasing can shift byte offsets for non-ASCII text
        let original = text
            .get(start..start + insurer.len())
            .filter(|s| s.eq_ignore_ascii_case(insurer))
            .unwrap_or(insurer);
        return Some(Field::new(original, 0.95));
    }

    first_capture(&patterns.insurer_named, text).map(|mut field| {
        if !field.value.to_lowercase().contains("insurance") {
            field.value = format!("{} Insurance", field.value);
        }
        field
    })
}

/// Byte offset of `needle` in `haystack` on word boundaries
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(i, _)| i).find(|&i| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn incident_date(patterns: &Patterns, text: &str) -> Option<Field> {
    let found = |list: &[Regex], confidence: f64| {
        list.iter().find_map(|re| {
            re.captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .find_map(|m| normalize_date(m.as_str()))
                .map(|date| Field::new(date, confidence))
        })
    };

    found(&patterns.date_labelled, 0.95).or_else(|| found(&patterns.date_any, 0.70))
}

/// Parse a date in one of the common US formats and render it as YYYY-MM-DD
pub fn normalize_date(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace('.', "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    // Two-digit years only make sense with %y; ISO dates lead with the year
    let iso = cleaned.split('-').next().is_some_and(|year| year.len() == 4);
    let short_year = !iso
        && cleaned
            .rsplit(['/', '-'])
            .next()
            .is_some_and(|year| year.len() == 2);

    let formats: &[&str] = if short_year {
        &["%m/%d/%y", "%m-%d-%y"]
    } else {
        &[
            "%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%B %d, %Y", "%b %d, %Y", "%B %d %Y", "%b %d %Y",
        ]
    };

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn medical_providers(patterns: &Patterns, text: &str) -> Vec<Field> {
    let mut seen = HashSet::new();
    let mut providers = Vec::new();
    let mut push = |name: String, confidence: f64| {
        if seen.insert(name.to_lowercase()) {
            providers.push(Field::new(name, confidence));
        }
    };

    for (re, confidence) in &patterns.doctors {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                push(format!("Dr. {}", m.as_str().trim()), *confidence);
            }
        }
    }

    for (re, confidence) in &patterns.facilities {
        for m in re.find_iter(text) {
            push(m.as_str().trim().to_string(), *confidence);
        }
    }

    providers
}
