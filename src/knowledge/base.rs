// ============================================================
// Layer 5: Entity Knowledge Base
// ============================================================
// A read-only, in-memory index over the Wikidata extract.
//
// Built once per run, then shared by reference with every
// substitution. Nothing writes to it after construction, so
// several workers can hold &KnowledgeBase at once.
//
// Indices:
//   entities    id    → Entity
//   alias_index alias → ids carrying that name or alias
//   by_type     type  → ids ranked by popularity (ascending,
//                       ties broken by id)
//   corpus      type  → answer texts of the loaded dataset
//
// Extract formats:
//   *.jsonl   one entity object per line, with an "id" field
//   other     one JSON object keyed by entity id
//
// Reference: Rust Book §8.3 (Hash Maps)
//            Wikidata JSON dump format

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::data::sampler::sample_without_replacement;
use crate::domain::answer_type::AnswerType;
use crate::domain::entity::{Entity, EntityId};
use crate::domain::errors::DataLoadError;
use crate::knowledge::corpus::CorpusIndex;
use crate::knowledge::popularity::PopularityBracket;

/// Knobs applied while the popularity rankings are built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KbOptions {
    /// Keep at most this many entities per identical popularity
    /// value in each type ranking, so long runs of equal counts
    /// do not straddle bracket edges. None keeps all.
    pub max_per_popularity: Option<usize>,
}

pub struct KnowledgeBase {
    entities:    BTreeMap<EntityId, Entity>,
    alias_index: BTreeMap<String, BTreeSet<EntityId>>,
    by_type:     BTreeMap<AnswerType, Vec<EntityId>>,
    corpus:      CorpusIndex,
}

impl KnowledgeBase {
    /// Load a knowledge extract from disk.
    ///
    /// Fails with DataLoadError when the file is missing, unreadable,
    /// corrupt or empty.
    pub fn load(path: &Path, options: &KbOptions) -> Result<Self, DataLoadError> {
        if !path.exists() {
            return Err(DataLoadError::Missing { path: path.to_path_buf() });
        }
        let raw = fs::read_to_string(path)
            .map_err(|source| DataLoadError::Io { path: path.to_path_buf(), source })?;

        let is_jsonl = path.extension().and_then(|e| e.to_str()) == Some("jsonl");
        let entities = if is_jsonl {
            parse_jsonl(path, &raw)?
        } else {
            parse_keyed_object(path, &raw)?
        };

        if entities.is_empty() {
            return Err(DataLoadError::Empty { path: path.to_path_buf() });
        }

        let kb = Self::from_entities(entities, options);
        tracing::info!(
            "Loaded {} entities ({} aliases) from '{}'",
            kb.len(),
            kb.alias_index.len(),
            path.display()
        );
        Ok(kb)
    }

    /// Build the indices from entities already in memory.
    /// Entities without an id or a name are dropped.
    pub fn from_entities(entities: Vec<Entity>, options: &KbOptions) -> Self {
        let mut map: BTreeMap<EntityId, Entity> = BTreeMap::new();
        for entity in entities {
            if entity.id.trim().is_empty() || entity.name.trim().is_empty() {
                tracing::debug!("Dropping entity without id or name: {:?}", entity.id);
                continue;
            }
            map.insert(entity.id.clone(), entity);
        }

        let mut alias_index: BTreeMap<String, BTreeSet<EntityId>> = BTreeMap::new();
        let mut by_type: BTreeMap<AnswerType, Vec<EntityId>> = BTreeMap::new();

        for (id, entity) in &map {
            for name in std::iter::once(&entity.name).chain(entity.aliases.iter()) {
                alias_index.entry(name.clone()).or_default().insert(id.clone());
            }
            by_type.entry(entity.answer_type()).or_default().push(id.clone());
        }

        // Rank each type by popularity, least popular first
        for ids in by_type.values_mut() {
            ids.sort_by(|a, b| {
                let pa = map.get(a).map(|e| e.popularity).unwrap_or(0);
                let pb = map.get(b).map(|e| e.popularity).unwrap_or(0);
                pa.cmp(&pb).then_with(|| a.cmp(b))
            });
            if let Some(cap) = options.max_per_popularity {
                cap_equal_popularity(ids, &map, cap);
            }
        }

        Self { entities: map, alias_index, by_type, corpus: CorpusIndex::default() }
    }

    /// Attach the corpus index of the dataset being processed
    pub fn with_corpus(mut self, corpus: CorpusIndex) -> Self {
        self.corpus = corpus;
        self
    }

    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    pub fn lookup(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Aliases of an entity in extract order. Empty if unknown.
    pub fn aliases_of(&self, id: &str) -> &[String] {
        self.lookup(id).map(|e| e.aliases.as_slice()).unwrap_or(&[])
    }

    /// Entities whose name or alias is exactly `surface`
    pub fn entities_named(&self, surface: &str) -> Vec<&Entity> {
        self.alias_index
            .get(surface)
            .map(|ids| ids.iter().filter_map(|id| self.lookup(id)).collect())
            .unwrap_or_default()
    }

    /// Entities of `answer_type` in ascending popularity order
    pub fn ranked(&self, answer_type: AnswerType) -> Vec<&Entity> {
        self.by_type
            .get(&answer_type)
            .map(|ids| ids.iter().filter_map(|id| self.lookup(id)).collect())
            .unwrap_or_default()
    }

    /// Entities of `answer_type` whose rank falls inside `bracket`
    /// (or all of them without a bracket), minus `exclude`.
    pub fn candidates_by_type(
        &self,
        answer_type: AnswerType,
        bracket:     Option<&PopularityBracket>,
        exclude:     &BTreeSet<EntityId>,
    ) -> Vec<&Entity> {
        let ranked = self.ranked(answer_type);
        let range  = match bracket {
            Some(b) => b.rank_range(ranked.len()),
            None    => 0..ranked.len(),
        };
        ranked[range]
            .iter()
            .copied()
            .filter(|e| !exclude.contains(&e.id))
            .collect()
    }

    /// Up to `n` entities of `answer_type`, optionally restricted to a
    /// popularity bracket, never one of `exclude`. May return fewer
    /// than `n`, including none.
    pub fn sample_by_type<R: Rng + ?Sized>(
        &self,
        answer_type: AnswerType,
        bracket:     Option<&PopularityBracket>,
        exclude:     &BTreeSet<EntityId>,
        n:           usize,
        rng:         &mut R,
    ) -> Vec<&Entity> {
        let pool = self.candidates_by_type(answer_type, bracket, exclude);
        sample_without_replacement(&pool, n, rng).into_iter().copied().collect()
    }

    /// Up to `n` entities of any type except `exclude_type`
    pub fn sample_different_type<R: Rng + ?Sized>(
        &self,
        exclude_type: AnswerType,
        exclude:      &BTreeSet<EntityId>,
        n:            usize,
        rng:          &mut R,
    ) -> Vec<&Entity> {
        let pool: Vec<&Entity> = self
            .by_type
            .keys()
            .filter(|t| **t != exclude_type)
            .flat_map(|t| self.candidates_by_type(*t, None, exclude))
            .collect();
        sample_without_replacement(&pool, n, rng).into_iter().copied().collect()
    }

    /// Entity counts per type
    pub fn type_counts(&self) -> Vec<(AnswerType, usize)> {
        self.by_type.iter().map(|(t, ids)| (*t, ids.len())).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Drop entities beyond the first `cap` of each popularity value.
/// `ids` must already be sorted by popularity.
fn cap_equal_popularity(ids: &mut Vec<EntityId>, map: &BTreeMap<EntityId, Entity>, cap: usize) {
    let mut last: Option<u64> = None;
    let mut run = 0usize;
    ids.retain(|id| {
        let pop = map.get(id).map(|e| e.popularity).unwrap_or(0);
        if last == Some(pop) {
            run += 1;
        } else {
            last = Some(pop);
            run = 1;
        }
        run <= cap
    });
}

fn parse_jsonl(path: &Path, raw: &str) -> Result<Vec<Entity>, DataLoadError> {
    let mut entities = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entity: Entity = serde_json::from_str(line).map_err(|e| DataLoadError::Parse {
            path:    path.to_path_buf(),
            line:    i + 1,
            message: e.to_string(),
        })?;
        entities.push(entity);
    }
    Ok(entities)
}

fn parse_keyed_object(path: &Path, raw: &str) -> Result<Vec<Entity>, DataLoadError> {
    let keyed: BTreeMap<EntityId, Entity> =
        serde_json::from_str(raw).map_err(|e| DataLoadError::Parse {
            path:    path.to_path_buf(),
            line:    e.line(),
            message: e.to_string(),
        })?;
    Ok(keyed
        .into_iter()
        .map(|(id, mut entity)| {
            entity.id = id;
            entity
        })
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::sampler::example_rng;
    use std::io::Write;

    /// A small fixture: six people of rising popularity, two cities,
    /// one organisation.
    pub(crate) fn fixture_kb() -> KnowledgeBase {
        let person = |id: &str, name: &str, pop: u64| {
            Entity::new(id, name, vec!["Q5".into()], pop)
        };
        let mut paris = Entity::new("Q90", "Paris", vec!["Q515".into()], 1000);
        paris.aliases = vec!["City of Light".into(), "Paname".into()];
        let entities = vec![
            person("Q1", "Ada Lovelace", 10),
            person("Q2", "Alan Turing", 20),
            person("Q3", "Grace Hopper", 30),
            person("Q4", "Marie Curie", 40),
            person("Q937", "Albert Einstein", 50),
            person("Q517", "Napoleon", 60),
            paris,
            Entity::new("Q456", "Lyon", vec!["Q515".into()], 300),
            Entity::new("Q95", "Google", vec!["Q4830453".into()], 900),
        ];
        KnowledgeBase::from_entities(entities, &KbOptions::default())
    }

    #[test]
    fn test_lookup_and_aliases() {
        let kb = fixture_kb();
        assert_eq!(kb.lookup("Q90").map(|e| e.name.as_str()), Some("Paris"));
        assert_eq!(kb.aliases_of("Q90"), &["City of Light".to_string(), "Paname".to_string()]);
        assert!(kb.aliases_of("Q517").is_empty());
        assert!(kb.aliases_of("Q0").is_empty());
        assert!(kb.lookup("Q0").is_none());
    }

    #[test]
    fn test_alias_index() {
        let kb = fixture_kb();
        let named: Vec<&str> = kb.entities_named("Paname").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(named, vec!["Q90"]);
    }

    #[test]
    fn test_ranking_is_ascending() {
        let kb = fixture_kb();
        let pops: Vec<u64> = kb.ranked(AnswerType::Person).iter().map(|e| e.popularity).collect();
        assert_eq!(pops, vec![10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_sample_by_type_respects_bracket_and_exclusion() {
        let kb      = fixture_kb();
        let top     = PopularityBracket::top(50.0).unwrap();
        let exclude = BTreeSet::from(["Q517".to_string()]);
        let mut rng = example_rng(3, 0);
        let picked  = kb.sample_by_type(AnswerType::Person, Some(&top), &exclude, 10, &mut rng);

        let mut ids: Vec<&str> = picked.iter().map(|e| e.id.as_str()).collect();
        ids.sort();
        // Top half is Q4, Q937, Q517; Q517 is excluded
        assert_eq!(ids, vec!["Q4", "Q937"]);
    }

    #[test]
    fn test_sample_by_type_may_return_nothing() {
        let kb = fixture_kb();
        let picked = kb.sample_by_type(
            AnswerType::Date,
            None,
            &BTreeSet::new(),
            3,
            &mut example_rng(0, 0),
        );
        assert!(picked.is_empty());
    }

    #[test]
    fn test_sample_different_type() {
        let kb = fixture_kb();
        let picked = kb.sample_different_type(
            AnswerType::Person,
            &BTreeSet::from(["Q456".to_string()]),
            10,
            &mut example_rng(0, 0),
        );
        let mut ids: Vec<&str> = picked.iter().map(|e| e.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["Q90", "Q95"]);
    }

    #[test]
    fn test_cap_equal_popularity() {
        let entities = (0..5)
            .map(|i| Entity::new(format!("Q{i}"), format!("P{i}"), vec!["Q5".into()], 7))
            .chain(std::iter::once(Entity::new("Q9", "Top", vec!["Q5".into()], 99)))
            .collect();
        let kb = KnowledgeBase::from_entities(entities, &KbOptions { max_per_popularity: Some(2) });
        let ids: Vec<&str> = kb.ranked(AnswerType::Person).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["Q0", "Q1", "Q9"]);
    }

    #[test]
    fn test_load_keyed_object() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("entity_info.json");
        std::fs::write(
            &path,
            r#"{"Q90": {"label": "Paris", "aliases": ["City of Light"],
                        "entity_types": ["Q515"], "popularity": 5}}"#,
        )
        .unwrap();
        let kb = KnowledgeBase::load(&path, &KbOptions::default()).unwrap();
        assert_eq!(kb.lookup("Q90").map(|e| e.id.as_str()), Some("Q90"));
    }

    #[test]
    fn test_load_jsonl() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"id":"Q1","name":"Ada Lovelace","types":["Q5"],"popularity":3}}"#).unwrap();
        writeln!(f).unwrap();
        writeln!(f, r#"{{"id":"Q2","label":"Alan Turing","entity_types":["Q5"]}}"#).unwrap();
        let kb = KnowledgeBase::load(&path, &KbOptions::default()).unwrap();
        assert_eq!(kb.len(), 2);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = KnowledgeBase::load(&dir.path().join("nope.json"), &KbOptions::default());
        assert!(matches!(missing, Err(DataLoadError::Missing { .. })));

        let corrupt_path = dir.path().join("bad.jsonl");
        std::fs::write(&corrupt_path, "{\"id\": \"Q1\", \"name\": \"A\"}\n{not json\n").unwrap();
        match KnowledgeBase::load(&corrupt_path, &KbOptions::default()) {
            Err(DataLoadError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other.map(|kb| kb.len())),
        }

        let empty_path = dir.path().join("empty.jsonl");
        std::fs::write(&empty_path, "\n").unwrap();
        assert!(matches!(
            KnowledgeBase::load(&empty_path, &KbOptions::default()),
            Err(DataLoadError::Empty { .. })
        ));
    }
}
