use std::collections::HashSet;

use super::encoder::{RestaurantEncoder, RestaurantId};
use crate::error::{AppError, AppResult};

/// Fewest favorites a selection may contain
pub const MIN_FAVORITES: usize = 3;

/// Most favorites a selection may contain
pub const MAX_FAVORITES: usize = 5;

/// Checks the selection size and rejects repeated names
pub fn check_selection<S: AsRef<str>>(favorites: &[S]) -> AppResult<()> {
    let count = favorites.len();
    if count < MIN_FAVORITES {
        return Err(AppError::InvalidSelection(format!(
            "select at least {} restaurants, got {}",
            MIN_FAVORITES, count
        )));
    }
    if count > MAX_FAVORITES {
        return Err(AppError::InvalidSelection(format!(
            "select at most {} restaurants, got {}",
            MAX_FAVORITES, count
        )));
    }

    let mut seen = HashSet::with_capacity(count);
    for name in favorites {
        if !seen.insert(name.as_ref()) {
            return Err(AppError::InvalidSelection(format!(
                "restaurant selected more than once: {}",
                name.as_ref()
            )));
        }
    }

    Ok(())
}

/// Validates a selection and resolves it to restaurant ids, all or nothing
pub fn resolve_favorites<S: AsRef<str>>(
    favorites: &[S],
    encoder: &RestaurantEncoder,
) -> AppResult<Vec<RestaurantId>> {
    check_selection(favorites)?;
    encoder.transform(favorites)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> RestaurantEncoder {
        RestaurantEncoder::fit(["A", "B", "C", "D", "E", "F"]).unwrap()
    }

    #[test]
    fn test_two_and_six_names_rejected() {
        let enc = encoder();
        let two = ["A", "B"];
        let six = ["A", "B", "C", "D", "E", "F"];

        assert!(matches!(
            resolve_favorites(&two, &enc),
            Err(AppError::InvalidSelection(_))
        ));
        assert!(matches!(
            resolve_favorites(&six, &enc),
            Err(AppError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_bounds_accepted() {
        let enc = encoder();
        assert_eq!(resolve_favorites(&["A", "B", "C"], &enc).unwrap(), vec![0, 1, 2]);
        assert_eq!(
            resolve_favorites(&["A", "B", "C", "D", "E"], &enc).unwrap().len(),
            5
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let enc = encoder();
        assert!(matches!(
            resolve_favorites(&["A", "B", "A"], &enc),
            Err(AppError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_unknown_name_rejects_whole_selection() {
        let enc = encoder();
        let err = resolve_favorites(&["A", "B", "Nonexistent Diner XYZ"], &enc).unwrap_err();
        assert!(matches!(err, AppError::NameNotFound(ref names) if names.len() == 1));
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let enc = encoder();
        let selection = ["F", "A", "C", "D"];
        let first = resolve_favorites(&selection, &enc).unwrap();

        let names: Vec<&str> = first
            .iter()
            .map(|id| enc.inverse_transform(*id).unwrap())
            .collect();
        let second = resolve_favorites(&names, &enc).unwrap();

        assert_eq!(first, second);
    }
}
