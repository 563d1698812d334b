use std::collections::HashMap;

use crate::core::query::{DataQuery, MoleculeQueryMatch};
use crate::core::score::{is_better_score, ScoreType, Scored};
use crate::identification::IdentificationData;
use crate::registry::Handle;

impl IdentificationData {
    /// Best-scoring match for every data query that has at least one match
    /// scored with `score_type`.
    ///
    /// Matches are grouped by their data query, whatever order they were
    /// registered in. Ties keep the match registered first. Output follows
    /// the order in which queries are first seen. An unknown score type
    /// yields an empty list.
    pub fn best_match_per_query(
        &self,
        score_type: Handle<ScoreType>,
    ) -> Vec<Handle<MoleculeQueryMatch>> {
        let Some(higher_better) = self.score_types.get(score_type).map(|s| s.higher_better) else {
            return Vec::new();
        };

        let mut order: Vec<Handle<DataQuery>> = Vec::new();
        let mut best: HashMap<Handle<DataQuery>, (Handle<MoleculeQueryMatch>, f64)> =
            HashMap::new();

        for (handle, query_match) in self.query_matches.iter() {
            let Some(value) = query_match.score(score_type) else {
                continue;
            };
            match best.get_mut(&query_match.data_query) {
                Some(current) => {
                    if is_better_score(value, current.1, higher_better) {
                        *current = (handle, value);
                    }
                }
                None => {
                    order.push(query_match.data_query);
                    best.insert(query_match.data_query, (handle, value));
                }
            }
        }

        order
            .iter()
            .filter_map(|query| best.get(query).map(|&(handle, _)| handle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::molecule::IdentifiedPeptide;
    use crate::core::query::{DataQuery, MoleculeQueryMatch};
    use crate::core::score::ScoreType;
    use crate::identification::IdentificationData;

    fn scored_store(
        higher_better: bool,
        values: &[(&str, &str, Option<f64>)],
    ) -> (IdentificationData, Vec<crate::registry::Handle<MoleculeQueryMatch>>) {
        let mut data = IdentificationData::new();
        let score = data
            .register_score_type(ScoreType::new("score", higher_better))
            .unwrap();
        let mut matches = Vec::new();
        for (query_id, sequence, value) in values {
            let query = data.register_data_query(DataQuery::new(*query_id)).unwrap();
            let peptide = data
                .register_identified_peptide(IdentifiedPeptide::new(*sequence))
                .unwrap();
            let m = data
                .register_molecule_query_match(MoleculeQueryMatch::new(peptide, query))
                .unwrap();
            if let Some(value) = value {
                data.add_score(m, score, *value).unwrap();
            }
            matches.push(m);
        }
        (data, matches)
    }

    #[test]
    fn test_orientation_selects_best() {
        let values = [
            ("q1", "PEPA", Some(0.9)),
            ("q1", "PEPB", Some(0.95)),
            ("q1", "PEPC", Some(0.80)),
        ];

        let (data, matches) = scored_store(true, &values);
        let score = data.find_score_type("score", None).unwrap();
        assert_eq!(data.best_match_per_query(score), vec![matches[1]]);

        let (data, matches) = scored_store(false, &values);
        let score = data.find_score_type("score", None).unwrap();
        assert_eq!(data.best_match_per_query(score), vec![matches[2]]);
    }

    #[test]
    fn test_interleaved_queries() {
        let values = [
            ("q1", "PEPA", Some(10.0)),
            ("q2", "PEPB", Some(3.0)),
            ("q1", "PEPC", Some(20.0)),
            ("q2", "PEPD", Some(5.0)),
            ("q1", "PEPE", Some(15.0)),
        ];
        let (data, matches) = scored_store(true, &values);
        let score = data.find_score_type("score", None).unwrap();
        assert_eq!(data.best_match_per_query(score), vec![matches[2], matches[3]]);
    }

    #[test]
    fn test_unscored_matches_and_ties() {
        let values = [
            ("q1", "PEPA", None),
            ("q2", "PEPB", Some(1.0)),
            ("q2", "PEPC", Some(1.0)),
            ("q3", "PEPD", None),
        ];
        let (data, matches) = scored_store(false, &values);
        let score = data.find_score_type("score", None).unwrap();
        assert_eq!(data.best_match_per_query(score), vec![matches[1]]);
    }

    #[test]
    fn test_unknown_score_type() {
        let (data, _) = scored_store(true, &[("q1", "PEPA", Some(1.0))]);
        let mut other = IdentificationData::new();
        let foreign = other
            .register_score_type(ScoreType::new("score", true))
            .unwrap();
        assert!(data.best_match_per_query(foreign).is_empty());
    }
}
