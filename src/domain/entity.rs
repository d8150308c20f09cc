// ============================================================
// Layer 3: Entity Domain Type
// ============================================================
// One knowledge-base entity from the Wikidata extract:
// an id ("Q90"), a canonical name ("Paris"), alternative names,
// "instance of" type labels and a page-view popularity count.
//
// Entities are immutable once loaded. The KnowledgeBase owns
// them; answers only hold the id as a weak reference.

use serde::{Deserialize, Serialize};

use crate::domain::answer_type::{classify, AnswerType, TypeEvidence};

/// Knowledge-base identifier, e.g. a Wikidata QID
pub type EntityId = String;

/// An entity record as it appears in the knowledge extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Filled from the map key when the extract is keyed by id
    #[serde(default)]
    pub id: EntityId,

    /// Canonical English name
    #[serde(alias = "label")]
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// "instance of" labels, e.g. ["Q5"]
    #[serde(default, alias = "entity_types")]
    pub types: Vec<String>,

    /// Monthly (or daily) page views. Missing counts as 0.
    #[serde(default)]
    pub popularity: u64,

    #[serde(default)]
    pub wikipedia_page: Option<String>,
}

impl Entity {
    pub fn new(
        id:         impl Into<String>,
        name:       impl Into<String>,
        types:      Vec<String>,
        popularity: u64,
    ) -> Self {
        Self {
            id:             id.into(),
            name:           name.into(),
            aliases:        Vec::new(),
            types,
            popularity,
            wikipedia_page: None,
        }
    }

    /// Category of this entity judged from its KB types alone
    pub fn answer_type(&self) -> AnswerType {
        classify(&TypeEvidence::from_kb_types(&self.types))
    }
}
