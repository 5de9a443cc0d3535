//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_algorithm_serialization() {
        assert_eq!(
            serde_json::to_string(&Algorithm::LinearRegression).unwrap(),
            "\"linear_regression\""
        );
        assert_eq!(serde_json::to_string(&Algorithm::Svm).unwrap(), "\"svm\"");
        let parsed: Algorithm = serde_json::from_str("\"random_forest\"").unwrap();
        assert_eq!(parsed, Algorithm::RandomForest);
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("ensemble".parse::<Algorithm>().unwrap(), Algorithm::Ensemble);
        assert_eq!("Linear_Regression".parse::<Algorithm>().unwrap(), Algorithm::LinearRegression);
        assert_eq!("rf".parse::<Algorithm>().unwrap(), Algorithm::RandomForest);
        assert!("lstm".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_algorithm_display_matches_as_str() {
        for algo in Algorithm::ALL {
            assert_eq!(algo.to_string(), algo.as_str());
        }
    }

    #[test]
    fn test_algorithm_variants() {
        assert_eq!(Algorithm::LinearRegression.variants(), &[Variant::Linear]);
        assert_eq!(Algorithm::RandomForest.variants(), &[Variant::RandomForest]);
        assert_eq!(Algorithm::Svm.variants(), &[Variant::Kernel]);
        assert_eq!(
            Algorithm::Ensemble.variants(),
            &[Variant::Linear, Variant::RandomForest, Variant::Kernel]
        );
    }

    #[test]
    fn test_variant_stems() {
        assert_eq!(Variant::Linear.stem(), "linear");
        assert_eq!(Variant::RandomForest.stem(), "rf");
        assert_eq!(Variant::Kernel.stem(), "svm");
    }

    #[test]
    fn test_synthetic_bar_band() {
        let bar = Bar::synthetic(day(1), 200.0, 1500.0);
        assert_eq!(bar.open, 200.0);
        assert_eq!(bar.close, 200.0);
        assert!((bar.high - 202.0).abs() < 1e-9);
        assert!((bar.low - 198.0).abs() < 1e-9);
        assert_eq!(bar.volume, 1500.0);
    }

    #[test]
    fn test_price_series_helpers() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                Bar::synthetic(day(1), 10.0, 1.0),
                Bar::synthetic(day(4), 11.0, 1.0),
            ],
        );
        assert_eq!(series.len(), 2);
        assert!(series.is_ordered());
        assert_eq!(series.last_date(), Some(day(4)));

        let unordered = PriceSeries::new(
            "AAPL",
            vec![
                Bar::synthetic(day(4), 10.0, 1.0),
                Bar::synthetic(day(4), 11.0, 1.0),
            ],
        );
        assert!(!unordered.is_ordered());
        assert!(PriceSeries::default().is_empty());
    }

    #[test]
    fn test_check_symbol() {
        for ok in ["AAPL", "brk.b", "BF-B", "^GSPC"] {
            assert!(check_symbol(ok).is_ok(), "{}", ok);
        }
        for bad in ["", ".", "..", "../x", "a/b", "a\\b", "x..y"] {
            assert!(check_symbol(bad).is_err(), "{:?}", bad);
        }
    }
}
