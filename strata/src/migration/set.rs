use std::collections::BTreeMap;

use crate::errors::MigrationError;
use crate::migration::id::MigrationId;
use crate::migration::unit::MigrationUnit;

/// Ordered registry of migration units, keyed and sorted by id.
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    units: BTreeMap<MigrationId, MigrationUnit>,
}

impl MigrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: MigrationUnit) -> Result<(), MigrationError> {
        if self.units.contains_key(&unit.id) {
            return Err(MigrationError::DuplicateId { id: unit.id.to_string() });
        }
        self.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Builds a set from units given in any order.
    pub fn from_units<I>(units: I) -> Result<Self, MigrationError>
    where
        I: IntoIterator<Item = MigrationUnit>,
    {
        let mut set = Self::new();
        for unit in units {
            set.insert(unit)?;
        }
        Ok(set)
    }

    /// Parses `(id, json)` pairs, as emitted by the build-time embedder.
    pub fn from_sources<'a, I>(sources: I) -> Result<Self, MigrationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut set = Self::new();
        for (id, source) in sources {
            set.insert(MigrationUnit::parse(MigrationId::new(id)?, source)?)?;
        }
        Ok(set)
    }

    /// Units in ascending id order. Every call starts over.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MigrationUnit> + '_ {
        self.units.values()
    }

    pub fn get(&self, id: &str) -> Option<&MigrationUnit> {
        let id = MigrationId::new(id).ok()?;
        self.units.get(&id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl<'a> IntoIterator for &'a MigrationSet {
    type Item = &'a MigrationUnit;
    type IntoIter = std::collections::btree_map::Values<'a, MigrationId, MigrationUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::step::Transform;

    fn unit(raw: &str) -> MigrationUnit {
        MigrationUnit::new(MigrationId::new(raw).unwrap(), Transform::default(), Transform::default())
    }

    #[test]
    fn iterates_ascending_regardless_of_insert_order() {
        let set = MigrationSet::from_units([unit("10_b"), unit("9_a"), unit("10_a")]).unwrap();
        let ids: Vec<_> = set.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["9_a", "10_a", "10_b"]);

        // restartable
        assert_eq!(set.iter().count(), 3);
        assert_eq!(set.iter().next_back().unwrap().id.as_str(), "10_b");
    }

    #[test]
    fn rejects_duplicates() {
        let err = MigrationSet::from_units([unit("1_a"), unit("1_a")]).unwrap_err();
        assert!(matches!(err, MigrationError::DuplicateId { id } if id == "1_a"));
    }

    #[test]
    fn parses_embedded_sources() {
        let set = MigrationSet::from_sources([
            ("1750346047_updated_shorts", r#"{"up":[],"down":[]}"#),
            ("1750159161_updated_mix", r#"{"up":[],"down":[]}"#),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("1750159161_updated_mix"));
        assert!(set.get("not an id").is_none());
        assert_eq!(set.iter().next().unwrap().id.as_str(), "1750159161_updated_mix");
    }

    #[test]
    fn embedded_source_with_bad_id_fails() {
        let err = MigrationSet::from_sources([("mix", r#"{"up":[],"down":[]}"#)]).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidId { .. }));
    }
}
