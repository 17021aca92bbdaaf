use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::recommender::{Rating, RatingsDataset, RestaurantEncoder, UserId};

/// One row of the processed ratings CSV; other columns are ignored
#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "User ID")]
    user_id: UserId,
    #[serde(rename = "Restaurant Name")]
    restaurant_name: String,
    #[serde(rename = "User Rating")]
    rating: f64,
}

/// Ratings table together with the encoder built over its restaurants
#[derive(Debug, Clone)]
pub struct LoadedRatings {
    pub dataset: RatingsDataset,
    pub encoder: RestaurantEncoder,
}

/// Loads the ratings CSV at `path`
pub fn load_ratings<P: AsRef<Path>>(path: P) -> AppResult<LoadedRatings> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        AppError::Dataset(format!("failed to open {}: {}", path.display(), e))
    })?;

    let loaded = read_ratings(file)?;
    tracing::info!(
        path = %path.display(),
        ratings = loaded.dataset.len(),
        restaurants = loaded.encoder.len(),
        "Ratings loaded"
    );
    Ok(loaded)
}

/// Parses ratings CSV from any reader.
///
/// The encoder covers every distinct restaurant name in the file, ids assigned
/// in name order.
pub fn read_ratings<R: Read>(reader: R) -> AppResult<LoadedRatings> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let records = csv_reader
        .deserialize::<RatingRecord>()
        .collect::<Result<Vec<_>, _>>()?;

    let encoder = RestaurantEncoder::fit(records.iter().map(|r| r.restaurant_name.as_str()))?;

    let ratings = records
        .iter()
        .map(|r| {
            encoder
                .id_of(&r.restaurant_name)
                .map(|id| Rating::new(r.user_id, id, r.rating))
                .ok_or_else(|| {
                    AppError::Internal(format!("{} missing from encoder", r.restaurant_name))
                })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let dataset = RatingsDataset::new(ratings)?;
    Ok(LoadedRatings { dataset, encoder })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
Restaurant Name,User ID,User Rating,Cuisine
Sate Khas Senayan,12,4.5,Indonesian
Bakmi GM,3,4.0,Chinese
Sate Khas Senayan,3,5.0,Indonesian
 Ayam Goreng Suharti ,40,3.0,Indonesian
";

    #[test]
    fn test_read_ratings() {
        let loaded = read_ratings(CSV.as_bytes()).unwrap();

        assert_eq!(loaded.dataset.len(), 4);
        assert_eq!(loaded.dataset.max_user_id(), 40);
        assert_eq!(
            loaded.encoder.names(),
            &["Ayam Goreng Suharti", "Bakmi GM", "Sate Khas Senayan"]
        );

        let first = loaded.dataset.ratings()[0];
        assert_eq!(first, Rating::new(12, 2, 4.5));
    }

    #[test]
    fn test_missing_column() {
        let csv = "Restaurant Name,User Rating\nBakmi GM,4.0\n";
        assert!(matches!(read_ratings(csv.as_bytes()), Err(AppError::Csv(_))));
    }

    #[test]
    fn test_empty_file() {
        let csv = "Restaurant Name,User ID,User Rating\n";
        assert!(matches!(
            read_ratings(csv.as_bytes()),
            Err(AppError::Dataset(_))
        ));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let loaded = load_ratings(file.path()).unwrap();
        assert_eq!(loaded.encoder.len(), 3);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_ratings("/definitely/not/here.csv"),
            Err(AppError::Dataset(_))
        ));
    }
}
