use hashbrown::HashMap;

use crate::models::{Street, StreetId};

/// Street directory with substring search over active street names
pub struct StreetDirectory {
    streets: HashMap<StreetId, Street>,
    /// (lowercased name, id), sorted for deterministic search order
    names: Vec<(String, StreetId)>,
}

impl StreetDirectory {
    pub fn new(streets: Vec<Street>) -> Self {
        let mut names: Vec<(String, StreetId)> = streets
            .iter()
            .filter(|s| s.active)
            .map(|s| (fold(&s.name), s.id))
            .collect();
        names.sort();

        Self {
            streets: streets.into_iter().map(|s| (s.id, s)).collect(),
            names,
        }
    }

    pub fn get(&self, id: StreetId) -> Option<&Street> {
        self.streets.get(&id)
    }

    /// Active streets whose name contains `query` (case-insensitive), at most `limit`
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Street> {
        let needle = fold(query);
        if needle.is_empty() {
            return Vec::new();
        }

        self.names
            .iter()
            .filter(|(name, _)| name.contains(&needle))
            .filter_map(|(_, id)| self.streets.get(id))
            .take(limit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.streets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streets.is_empty()
    }
}

/// Lowercase and collapse runs of whitespace
fn fold(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StreetDirectory {
        let mut closed = Street::new(StreetId(4), "Calle Los Pinos Antigua");
        closed.active = false;
        StreetDirectory::new(vec![
            Street::new(StreetId(1), "Calle Los Pinos"),
            Street::new(StreetId(2), "Av. Los Pinos"),
            Street::new(StreetId(3), "Jr. Huallaga"),
            closed,
        ])
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let dir = directory();
        let hits: Vec<StreetId> = dir.search("los  PINOS", 10).iter().map(|s| s.id).collect();
        assert_eq!(hits, vec![StreetId(2), StreetId(1)]);
    }

    #[test]
    fn test_search_skips_inactive_and_respects_limit() {
        let dir = directory();
        assert_eq!(dir.search("pinos", 1).len(), 1);
        assert!(dir.search("antigua", 10).is_empty());
        assert!(dir.get(StreetId(4)).is_some());
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        assert!(directory().search("   ", 10).is_empty());
    }
}
