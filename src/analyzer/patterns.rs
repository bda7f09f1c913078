//! Symptom Pattern Library
//!
//! Compiled text-matching rules that map analysis text to symptom
//! identifiers. Most patterns are derived from the knowledge base at
//! construction (condition names, symptom identifiers, keyword phrases); a
//! fixed set of generic visual cues is appended after them.
//!
//! Also holds the static phrase tables the extractor consults before and
//! after pattern matching: scaffold prefixes, healthy phrasing, definitive
//! problem words, implicit stress cues and negation words.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::AnalyzerError;
use crate::knowledge_base::KnowledgeBase;
use crate::utils::slugify;

use super::types::SymptomSource;

// ============================================================================
// Confidence constants
// ============================================================================

pub const BASE_CONFIDENCE: f64 = 0.7;
pub const LINKED_CONFIDENCE: f64 = 0.8;
pub const LONG_MATCH_BONUS: f64 = 0.1;
pub const SHORT_MATCH_PENALTY: f64 = 0.2;
pub const LONG_MATCH_CHARS: usize = 10;
pub const SHORT_MATCH_CHARS: usize = 5;
pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Words inspected before a match when looking for a negation.
pub const NEGATION_WINDOW: usize = 3;
/// Wider window for definitive-problem words ("no visible signs of disease").
pub const DEFINITIVE_NEGATION_WINDOW: usize = 4;

/// Confidence for a matched span.
pub fn symptom_confidence(text_match: &str, condition_linked: bool) -> f64 {
    let mut confidence = if condition_linked { LINKED_CONFIDENCE } else { BASE_CONFIDENCE };

    let chars = text_match.chars().count();
    if chars > LONG_MATCH_CHARS {
        confidence += LONG_MATCH_BONUS;
    } else if chars < SHORT_MATCH_CHARS {
        confidence -= SHORT_MATCH_PENALTY;
    }

    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

// ============================================================================
// Pattern library
// ============================================================================

#[derive(Debug, Clone)]
pub struct SymptomPattern {
    pub name: String,
    pub regex: Regex,
    /// Tied to a named knowledge-base condition.
    pub condition_linked: bool,
    pub source: SymptomSource,
}

/// Generic visual cues that are not tied to one condition.
static GENERIC_PATTERNS: &[(&str, &str)] = &[
    (
        "fungal_infection",
        r"\b(?:fungal\s+infection|fungal\s+disease|fungus\s+growing|moldy|mold\s+growth)\b",
    ),
    (
        "bacterial_infection",
        r"\b(?:bacterial\s+infection|bacterial\s+disease|bacterial\s+lesions?|bacterial\s+ooze|oozing)\b",
    ),
    (
        "viral_infection",
        r"\b(?:viral\s+infection|viral\s+disease|mosaic\s+pattern|mottled\s+leaves)\b",
    ),
    (
        "insect_damage",
        r"\b(?:chewed\s+(?:leaves|edges|holes)|holes?\s+(?:eaten|chewed)|insect\s+bites?|pest\s+damage|feeding\s+damage|nibbled|gnawed)\b",
    ),
    ("browning", r"\b(?:brown|browning)\b[^.]*?\b(?:edges?|margins?|tips?)\b"),
    ("yellowing", r"\b(?:yellow|yellowing)\b[^.]*?\b(?:leaf|leaves|foliage)\b"),
    ("spots", r"\b(?:spots?|lesions?)\b"),
    ("wilting", r"\b(?:wilt|wilting|wilted|drooping)\b"),
];

/// Ordered list of compiled symptom patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<SymptomPattern>,
}

impl PatternLibrary {
    /// Build the library from the knowledge base. Patterns that fail to
    /// compile are logged and skipped.
    pub fn from_knowledge_base(kb: &KnowledgeBase) -> Self {
        let mut library = Self::default();
        let mut seen: FxHashSet<String> = FxHashSet::default();

        for record in kb.records() {
            library.register(
                &mut seen,
                &record.name,
                identifier_regex(&record.name),
                true,
                SymptomSource::ConditionName,
            );

            for symptom in &record.symptoms {
                library.register(
                    &mut seen,
                    symptom,
                    identifier_regex(symptom),
                    true,
                    SymptomSource::ConditionSymptom,
                );
            }

            for keyword in &record.keywords {
                let name = slugify(keyword);
                if name.is_empty() {
                    continue;
                }
                library.register(
                    &mut seen,
                    &name,
                    phrase_regex(keyword),
                    true,
                    SymptomSource::ConditionKeyword,
                );
            }
        }

        for (name, pattern) in GENERIC_PATTERNS {
            library.register(&mut seen, name, pattern.to_string(), false, SymptomSource::VisualCue);
        }

        tracing::debug!("Compiled {} symptom patterns", library.patterns.len());
        library
    }

    fn register(
        &mut self,
        seen: &mut FxHashSet<String>,
        name: &str,
        pattern: String,
        condition_linked: bool,
        source: SymptomSource,
    ) {
        if !seen.insert(pattern.clone()) {
            return;
        }

        match compile(name, &pattern) {
            Ok(regex) => self.patterns.push(SymptomPattern {
                name: name.to_string(),
                regex,
                condition_linked,
                source,
            }),
            Err(e) => tracing::warn!("Skipping symptom pattern: {}", e),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymptomPattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.name == name)
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex, AnalyzerError> {
    Regex::new(&format!("(?i){}", pattern)).map_err(|source| AnalyzerError::InvalidPattern {
        name: name.to_string(),
        source,
    })
}

/// `circular_lesions` matches "circular lesions", "circular-lesions" and
/// the identifier itself.
fn identifier_regex(identifier: &str) -> String {
    let words: Vec<String> = identifier
        .split('_')
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    bounded(&words.join(r"[\s_-]+"))
}

/// Keyword phrase with flexible internal whitespace.
fn phrase_regex(phrase: &str) -> String {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    bounded(&words.join(r"\s+"))
}

fn bounded(body: &str) -> String {
    let starts_word = body.chars().next().is_some_and(|c| c.is_alphanumeric());
    let ends_word = body.chars().last().is_some_and(|c| c.is_alphanumeric());
    format!(
        "{}(?:{}){}",
        if starts_word { r"\b" } else { "" },
        body,
        if ends_word { r"\b" } else { "" }
    )
}

// ============================================================================
// Text normalization
// ============================================================================

static ANSWER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^.*?\banswer:\s*").expect("valid regex"));
static ASSISTANT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*assistant\b[:\s]*").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip generator scaffolding and collapse whitespace.
pub fn normalize_text(raw: &str) -> String {
    let text = ANSWER_PREFIX.replace(raw, "");
    let text = ASSISTANT_PREFIX.replace(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

// ============================================================================
// Phrase tables
// ============================================================================

static HEALTHY_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bhealthy\s+plant\b").expect("valid regex"),
        Regex::new(r"(?i)\b(?:appears|looks|seems)\s+(?:to\s+be\s+)?healthy\b").expect("valid regex"),
        Regex::new(r"(?i)\bno\s+(?:visible\s+)?signs?\s+of\s+(?:disease|problems?|issues?)\b")
            .expect("valid regex"),
        Regex::new(r"(?i)\bno\s+visible\s+(?:problems?|disease|damage)\b").expect("valid regex"),
        Regex::new(r"(?i)\bplant\s+is\s+healthy\b").expect("valid regex"),
        Regex::new(r"(?i)\bgood\s+health\b").expect("valid regex"),
    ]
});

/// A word that rules out a healthy verdict, with an optional follower that
/// cancels it ("disease resistant").
struct DefinitiveCue {
    regex: Regex,
    unless_followed_by: Option<&'static str>,
}

static DEFINITIVE_PROBLEMS: LazyLock<Vec<DefinitiveCue>> = LazyLock::new(|| {
    let cue = |pattern: &str, unless_followed_by: Option<&'static str>| DefinitiveCue {
        regex: Regex::new(pattern).expect("valid regex"),
        unless_followed_by,
    };
    vec![
        cue(r"(?i)\b(?:fungal|bacterial|viral)\s+infection\b", None),
        cue(r"(?i)\bdisease\b", Some("resistant")),
        cue(r"(?i)\binfection\b", None),
        cue(r"(?i)\bblight\b", None),
        cue(r"(?i)\brust\b", Some("resistant")),
        cue(r"(?i)\bmildew\b", None),
        cue(r"(?i)\brot(?:ting)?\b", None),
        cue(r"(?i)\b(?:fungal|bacterial|viral)\b", None),
    ]
});

static IMPLICIT_PROBLEMS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bbrown\b[^.]*?\b(?:edges?|tips?|spots?)\b").expect("valid regex"),
        Regex::new(r"(?i)\byellow\b[^.]*?\b(?:leaf|leaves)\b").expect("valid regex"),
        Regex::new(r"(?i)\bwilt(?:ing|ed)?\b").expect("valid regex"),
        Regex::new(r"(?i)\bdamage[ds]?\b").expect("valid regex"),
        Regex::new(r"(?i)\bstress(?:ed)?\b").expect("valid regex"),
        Regex::new(r"(?i)\bproblems?\b").expect("valid regex"),
        Regex::new(r"(?i)\bissues?\b").expect("valid regex"),
    ]
});

static NEGATION_WORDS: &[&str] = &["no", "not", "without"];
static NEGATION_PHRASES: &[&str] = &["absence of", "free from", "clear of"];
const SENTENCE_BREAKS: &[char] = &['.', '!', '?', ';'];

/// First explicit healthy phrase in the text.
pub fn healthy_phrase(text: &str) -> Option<&str> {
    HEALTHY_PHRASES
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str())
}

/// A non-negated definitive-problem word is present.
pub fn has_definitive_problem(text: &str) -> bool {
    DEFINITIVE_PROBLEMS.iter().any(|cue| {
        cue.regex.find_iter(text).any(|m| {
            let cancelled = cue.unless_followed_by.is_some_and(|word| {
                text[m.end()..]
                    .trim_start()
                    .get(..word.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(word))
            });
            !cancelled && !is_negated(text, m.start(), DEFINITIVE_NEGATION_WINDOW)
        })
    })
}

/// First non-negated stress or damage cue.
pub fn implicit_problem(text: &str) -> Option<&str> {
    IMPLICIT_PROBLEMS.iter().find_map(|re| {
        re.find_iter(text)
            .find(|m| !is_negated(text, m.start(), NEGATION_WINDOW))
            .map(|m| m.as_str())
    })
}

/// Whether one of the `window` words before `start` (within the same
/// sentence) negates what follows.
pub fn is_negated(text: &str, start: usize, window: usize) -> bool {
    let Some(before) = text.get(..start) else {
        return false;
    };
    let clause = match before.rfind(SENTENCE_BREAKS) {
        Some(idx) => &before[idx + 1..],
        None => before,
    };

    let mut words: SmallVec<[String; 4]> = clause
        .split_whitespace()
        .rev()
        .take(window)
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect();
    words.reverse();

    if words.iter().any(|w| NEGATION_WORDS.contains(&w.as_str())) {
        return true;
    }

    let joined = words.join(" ");
    NEGATION_PHRASES.iter().any(|phrase| joined.contains(phrase))
}
