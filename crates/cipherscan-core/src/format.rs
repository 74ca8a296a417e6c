//! Display formatting for prediction results.
//!
//! Rendering never fails on missing fields: a prediction without a
//! `confidence` simply deserializes to `0.0` and formats as `0.0%` / `0.000`.

/// Format a probability in `0..1` as a percentage with one decimal.
pub fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Format a confidence value with three decimals.
pub fn confidence(c: f64) -> String {
    format!("{c:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_one_decimal() {
        assert_eq!(percent(0.8234), "82.3%");
        assert_eq!(percent(0.91), "91.0%");
        assert_eq!(percent(0.05), "5.0%");
    }

    #[test]
    fn percent_missing_confidence_renders_zero() {
        let p = cipherscan_client::Prediction::default();
        assert_eq!(percent(p.confidence), "0.0%");
    }

    #[test]
    fn confidence_three_decimals() {
        assert_eq!(confidence(0.91), "0.910");
        assert_eq!(confidence(0.0), "0.000");
    }
}
