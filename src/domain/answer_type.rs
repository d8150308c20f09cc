// ============================================================
// Layer 3: Answer Typing
// ============================================================
// Every answer gets one category from a closed taxonomy. The
// category is what makes a substitution "type-preserving":
// a PERSON answer should be swapped for another PERSON.
//
// Two kinds of evidence feed the decision:
//   1. Knowledge-base type labels (Wikidata "instance of" ids
//      such as Q5 = human, or plain labels such as "year")
//   2. The NER label produced by the annotator (spaCy style:
//      PERSON, GPE, ORG, DATE, CARDINAL, ...)
//
// Both go through ONE lookup table. KB labels win when they
// agree on a single category; otherwise the NER label is
// used; otherwise MISC.
//
// classify() is pure: same evidence, same category, on every
// run and every machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Closed answer-type taxonomy.
///
/// Ord is derived so categories can key ordered maps and
/// iterate in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnswerType {
    Person,
    Location,
    Organization,
    Date,
    Numeric,
    Misc,
}

impl AnswerType {
    pub const ALL: [AnswerType; 6] = [
        AnswerType::Person,
        AnswerType::Location,
        AnswerType::Organization,
        AnswerType::Date,
        AnswerType::Numeric,
        AnswerType::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::Person       => "PERSON",
            AnswerType::Location     => "LOCATION",
            AnswerType::Organization => "ORGANIZATION",
            AnswerType::Date         => "DATE",
            AnswerType::Numeric      => "NUMERIC",
            AnswerType::Misc         => "MISC",
        }
    }

    /// DATE and NUMERIC answers make poor alias substitutions
    pub fn is_numeric_like(&self) -> bool {
        matches!(self, AnswerType::Date | AnswerType::Numeric)
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSON"                => Ok(AnswerType::Person),
            "LOCATION"              => Ok(AnswerType::Location),
            "ORG" | "ORGANIZATION"  => Ok(AnswerType::Organization),
            "DATE"                  => Ok(AnswerType::Date),
            "NUMERIC"               => Ok(AnswerType::Numeric),
            "MISC"                  => Ok(AnswerType::Misc),
            other => Err(format!("unknown answer type '{other}'")),
        }
    }
}

/// Opaque typing evidence supplied by the caller.
///
/// The typing module does not care how the evidence was
/// produced: an NER model, a gazetteer, or a hand label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeEvidence {
    pub ner_label: Option<String>,
    pub kb_types:  Vec<String>,
}

impl TypeEvidence {
    pub fn new(ner_label: Option<String>, kb_types: Vec<String>) -> Self {
        Self { ner_label, kb_types }
    }

    /// Evidence from knowledge-base labels only (used to type entities)
    pub fn from_kb_types(kb_types: &[String]) -> Self {
        Self { ner_label: None, kb_types: kb_types.to_vec() }
    }
}

/// The fixed label → category table shared by KB and NER labels.
/// Keys are matched case-insensitively.
fn lookup(label: &str) -> Option<AnswerType> {
    let key = label.trim().to_ascii_uppercase();
    let category = match key.as_str() {
        // Wikidata: human, fictional human
        "Q5" | "Q15632617" => AnswerType::Person,
        // Wikidata: city, country, sovereign state, human settlement,
        // capital, US state, big city, river, mountain, continent
        "Q515" | "Q6256" | "Q3624078" | "Q486972" | "Q5119" | "Q35657" | "Q1549591"
        | "Q4022" | "Q8502" | "Q5107" => AnswerType::Location,
        // Wikidata: organization, business, university, political party,
        // sports team, enterprise
        "Q43229" | "Q4830453" | "Q3918" | "Q7278" | "Q12973014" | "Q6881511" => {
            AnswerType::Organization
        }
        // Wikidata: year, calendar date
        "Q577" | "Q205892" | "YEAR" => AnswerType::Date,
        // Wikidata: natural number, integer
        "Q21199" | "Q12503" => AnswerType::Numeric,

        // NER labels
        "PERSON" | "PER"                                   => AnswerType::Person,
        "GPE" | "LOC" | "LOCATION" | "FAC"                  => AnswerType::Location,
        "ORG" | "ORGANIZATION"                              => AnswerType::Organization,
        "DATE" | "TIME"                                     => AnswerType::Date,
        "CARDINAL" | "QUANTITY" | "MONEY" | "PERCENT" | "ORDINAL" => AnswerType::Numeric,
        "NORP" | "EVENT" | "WORK_OF_ART" | "LAW" | "LANGUAGE" | "PRODUCT" | "MISC" => {
            AnswerType::Misc
        }
        _ => return None,
    };
    Some(category)
}

/// Assign a category from the evidence.
///
/// 1. KB type labels that map to exactly one category decide.
/// 2. Otherwise the NER label, through the same table.
/// 3. Otherwise MISC.
pub fn classify(evidence: &TypeEvidence) -> AnswerType {
    let kb_categories: BTreeSet<AnswerType> = evidence
        .kb_types
        .iter()
        .filter_map(|t| lookup(t))
        .collect();

    if kb_categories.len() == 1 {
        if let Some(category) = kb_categories.into_iter().next() {
            return category;
        }
    }

    evidence
        .ner_label
        .as_deref()
        .and_then(lookup)
        .unwrap_or(AnswerType::Misc)
}

/// Which answer types a run should substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind", content = "type")]
pub enum CategoryFilter {
    All,
    /// Everything except DATE and NUMERIC
    NonNumeric,
    Only(AnswerType),
}

impl CategoryFilter {
    pub fn accepts(&self, answer_type: AnswerType) -> bool {
        match self {
            CategoryFilter::All          => true,
            CategoryFilter::NonNumeric   => !answer_type.is_numeric_like(),
            CategoryFilter::Only(wanted) => *wanted == answer_type,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL"        => Ok(CategoryFilter::All),
            "NONNUMERIC" => Ok(CategoryFilter::NonNumeric),
            other        => other.parse().map(CategoryFilter::Only),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All        => f.write_str("ALL"),
            CategoryFilter::NonNumeric => f.write_str("NONNUMERIC"),
            CategoryFilter::Only(t)    => write!(f, "{t}"),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn ev(ner: Option<&str>, kb: &[&str]) -> TypeEvidence {
        TypeEvidence::new(ner.map(String::from), kb.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_kb_types_win_when_unambiguous() {
        // NER says ORG but Wikidata says human
        assert_eq!(classify(&ev(Some("ORG"), &["Q5"])), AnswerType::Person);
    }

    #[test]
    fn test_ambiguous_kb_types_fall_back_to_ner() {
        // Q5 (PERSON) and Q43229 (ORGANIZATION) disagree
        assert_eq!(classify(&ev(Some("GPE"), &["Q5", "Q43229"])), AnswerType::Location);
    }

    #[test]
    fn test_unknown_kb_types_are_ignored() {
        assert_eq!(classify(&ev(Some("PERSON"), &["Q999999"])), AnswerType::Person);
    }

    #[test]
    fn test_no_evidence_is_misc() {
        assert_eq!(classify(&TypeEvidence::default()), AnswerType::Misc);
    }

    #[test]
    fn test_year_label_is_date() {
        assert_eq!(classify(&ev(Some("CARDINAL"), &["year"])), AnswerType::Date);
        assert_eq!(classify(&ev(Some("CARDINAL"), &[])), AnswerType::Numeric);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let e = ev(Some("LOC"), &["Q515", "Q6256"]);
        let first = classify(&e);
        for _ in 0..10 {
            assert_eq!(classify(&e), first);
        }
        assert_eq!(first, AnswerType::Location);
    }

    #[test]
    fn test_category_filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("NONNUMERIC".parse::<CategoryFilter>().unwrap(), CategoryFilter::NonNumeric);
        assert_eq!(
            "person".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(AnswerType::Person)
        );
        assert!("planet".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn test_nonnumeric_filter() {
        let f = CategoryFilter::NonNumeric;
        assert!(f.accepts(AnswerType::Person));
        assert!(!f.accepts(AnswerType::Date));
        assert!(!f.accepts(AnswerType::Numeric));
    }
}
