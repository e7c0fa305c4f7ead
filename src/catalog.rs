use crate::station::Station;
use std::collections::HashMap;

/// Bucket for stations that carry no language.
pub const DEFAULT_GROUP: &str = "Others";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub stations: Vec<Station>,
}

/// Stations partitioned by language, groups kept in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Single stable pass; no de-duplication and no normalization of
    /// language values ("Hindi" and "hindi" are different groups).
    pub fn group(stations: Vec<Station>) -> Self {
        let mut catalog = Catalog::default();

        for station in stations {
            let key = group_key(&station).to_string();
            let slot = match catalog.index.get(&key) {
                Some(&i) => i,
                None => {
                    catalog.groups.push(Group {
                        name: key.clone(),
                        stations: Vec::new(),
                    });
                    catalog.index.insert(key, catalog.groups.len() - 1);
                    catalog.groups.len() - 1
                }
            };
            catalog.groups[slot].stations.push(station);
        }

        tracing::info!(
            "catalog built: {} stations in {} groups",
            catalog.len(),
            catalog.groups.len()
        );
        catalog
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.index.get(name).map(|&i| &self.groups[i])
    }

    /// Stations of `name`, or an empty slice for an unknown group.
    pub fn stations(&self, name: &str) -> &[Station] {
        self.get(name).map(|g| g.stations.as_slice()).unwrap_or(&[])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Total number of stations across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.stations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn group_key(station: &Station) -> &str {
    match station.language.as_deref() {
        Some(lang) if !lang.is_empty() => lang,
        _ => DEFAULT_GROUP,
    }
}

/// Positions in `stations` whose name or tags contain `query`, ignoring case.
/// An empty query matches everything.
pub fn matching_indices(stations: &[Station], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..stations.len()).collect();
    }

    let needle = query.to_lowercase();
    stations
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            s.name.to_lowercase().contains(&needle)
                || s
                    .tags
                    .as_deref()
                    .map_or(false, |t| t.to_lowercase().contains(&needle))
        })
        .map(|(i, _)| i)
        .collect()
}

pub fn filter(stations: &[Station], query: &str) -> Vec<Station> {
    matching_indices(stations, query)
        .into_iter()
        .map(|i| stations[i].clone())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn station(id: &str, name: &str, tags: Option<&str>, lang: Option<&str>) -> Station {
        Station {
            id: id.to_string(),
            name: name.to_string(),
            url: format!("http://stream.example/{}", id),
            icon: None,
            tags: tags.map(str::to_string),
            language: lang.map(str::to_string),
        }
    }

    fn sample() -> Vec<Station> {
        vec![
            station("1", "Radio Mirchi", Some("bollywood,Rock"), Some("hindi")),
            station("2", "Big FM", None, Some("tamil")),
            station("3", "Radio City", Some("news"), Some("hindi")),
            station("4", "Vividh Bharati", Some("classical"), None),
            station("5", "Rock Nation", None, Some("")),
            station("6", "Hindi Hits", Some("pop"), Some("Hindi")),
        ]
    }

    #[test]
    fn test_every_station_in_exactly_one_group() {
        let input = sample();
        let catalog = Catalog::group(input.clone());

        assert_eq!(catalog.len(), input.len());
        for s in &input {
            let hits = catalog
                .groups()
                .iter()
                .filter(|g| g.stations.contains(s))
                .count();
            assert_eq!(hits, 1, "{} should be in one group", s.name);
        }
    }

    #[test]
    fn test_groups_keep_source_order() {
        let catalog = Catalog::group(sample());

        let names: Vec<_> = catalog.group_names().collect();
        assert_eq!(names, vec!["hindi", "tamil", DEFAULT_GROUP, "Hindi"]);

        let hindi: Vec<_> = catalog.stations("hindi").iter().map(|s| s.id.as_str()).collect();
        assert_eq!(hindi, vec!["1", "3"]);

        let others: Vec<_> = catalog
            .stations(DEFAULT_GROUP)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(others, vec!["4", "5"]);
        assert_eq!(catalog.position("tamil"), Some(1));
    }

    #[test]
    fn test_no_language_anywhere_goes_to_others() {
        let input = vec![
            station("1", "A", None, None),
            station("2", "B", None, None),
            station("3", "C", None, Some("")),
        ];
        let catalog = Catalog::group(input);
        assert_eq!(catalog.groups().len(), 1);
        assert_eq!(catalog.stations(DEFAULT_GROUP).len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let catalog = Catalog::group(Vec::new());
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert!(catalog.stations(DEFAULT_GROUP).is_empty());
        assert!(catalog.get("hindi").is_none());
    }

    #[test]
    fn test_empty_query_is_identity() {
        let stations = sample();
        assert_eq!(filter(&stations, ""), stations);
    }

    #[test]
    fn test_filter_ignores_case() {
        let stations = sample();
        let upper = filter(&stations, "ROCK");
        let lower = filter(&stations, "rock");
        assert_eq!(upper, lower);

        let ids: Vec<_> = upper.iter().map(|s| s.id.as_str()).collect();
        // "1" matches on tags, "5" on name with no tags at all.
        assert_eq!(ids, vec!["1", "5"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let stations = sample();
        for q in ["radio", "HIT", "news", "zzz", ""] {
            let once = filter(&stations, q);
            assert_eq!(filter(&once, q), once, "query {:?}", q);
        }
    }

    #[test]
    fn test_filter_does_not_search_language() {
        let stations = sample();
        let ids: Vec<_> = filter(&stations, "tamil").iter().map(|s| s.id.clone()).collect();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_matching_indices_point_into_input() {
        let stations = sample();
        assert_eq!(matching_indices(&stations, "radio"), vec![0, 2]);
        assert_eq!(matching_indices(&stations, ""), vec![0, 1, 2, 3, 4, 5]);
    }
}
