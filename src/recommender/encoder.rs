use std::collections::{BTreeSet, HashMap};

use crate::error::{AppError, AppResult};

/// Integer id assigned to a restaurant by the encoder
pub type RestaurantId = u32;

/// Fixed bijection between restaurant names and integer ids
///
/// Ids follow the lexicographic order of the names, so the same universe of
/// names always encodes the same way regardless of load order.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantEncoder {
    names: Vec<String>,
    ids: HashMap<String, RestaurantId>,
}

impl RestaurantEncoder {
    /// Builds an encoder over the distinct names in `names`
    pub fn fit<I, S>(names: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if sorted.len() > RestaurantId::MAX as usize {
            return Err(AppError::Dataset(format!(
                "{} restaurants exceed the id space",
                sorted.len()
            )));
        }

        let names: Vec<String> = sorted.into_iter().collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx as RestaurantId))
            .collect();

        Ok(Self { names, ids })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Restaurant names in id order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn id_of(&self, name: &str) -> Option<RestaurantId> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: RestaurantId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Encodes every name or fails with the full list of unknown names
    pub fn transform<S: AsRef<str>>(&self, names: &[S]) -> AppResult<Vec<RestaurantId>> {
        let mut ids = Vec::with_capacity(names.len());
        let mut missing = Vec::new();

        for name in names {
            match self.id_of(name.as_ref()) {
                Some(id) => ids.push(id),
                None => missing.push(name.as_ref().to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(AppError::NameNotFound(missing));
        }

        Ok(ids)
    }

    pub fn inverse_transform(&self, id: RestaurantId) -> AppResult<&str> {
        self.name_of(id)
            .ok_or_else(|| AppError::Internal(format!("Restaurant id {} is not encoded", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> RestaurantEncoder {
        RestaurantEncoder::fit(["Sate Khas Senayan", "Bakmi GM", "Ayam Goreng Suharti", "Bakmi GM"])
            .unwrap()
    }

    #[test]
    fn test_ids_follow_name_order() {
        let enc = encoder();
        assert_eq!(enc.len(), 3);
        assert_eq!(enc.id_of("Ayam Goreng Suharti"), Some(0));
        assert_eq!(enc.id_of("Bakmi GM"), Some(1));
        assert_eq!(enc.id_of("Sate Khas Senayan"), Some(2));
    }

    #[test]
    fn test_transform_and_inverse() {
        let enc = encoder();
        let ids = enc.transform(&["Sate Khas Senayan", "Bakmi GM"]).unwrap();
        assert_eq!(ids, vec![2, 1]);

        for (id, name) in ids.iter().zip(["Sate Khas Senayan", "Bakmi GM"]) {
            assert_eq!(enc.inverse_transform(*id).unwrap(), name);
        }
    }

    #[test]
    fn test_transform_reports_all_missing_names() {
        let enc = encoder();
        let err = enc
            .transform(&["Bakmi GM", "Nonexistent Diner XYZ", "Ghost Kitchen"])
            .unwrap_err();

        match err {
            AppError::NameNotFound(missing) => {
                assert_eq!(missing, vec!["Nonexistent Diner XYZ", "Ghost Kitchen"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_inverse_transform_unknown_id() {
        let enc = encoder();
        assert!(enc.inverse_transform(99).is_err());
    }
}
