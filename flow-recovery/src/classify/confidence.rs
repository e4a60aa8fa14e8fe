//! Heuristic confidence scoring for a failure diagnosis.

use super::ClassifiableError;

/// Error codes that are a near-certain signal on their own.
///
/// `ECONNRESET` is intentionally absent: a reset connection is a network
/// error for classification purposes but too ambiguous to boost confidence.
const HARD_FAILURE_CODES: [&str; 3] = ["ENOTFOUND", "ECONNREFUSED", "ETIMEDOUT"];

/// HTTP statuses with unambiguous meaning for recovery planning.
const KNOWN_STATUSES: [u16; 6] = [401, 403, 429, 500, 502, 503];

/// Scores how certain the diagnosis is, in `[0, 1]`.
///
/// Additive: 0.5 base, +0.3 for a hard-failure code, +0.2 for a known HTTP
/// status, +0.1 when the failing node is identified. The raw sum can reach
/// 1.1, so the clamp is load-bearing.
#[must_use]
pub fn confidence_score(error: &ClassifiableError, node_id: Option<&str>) -> f64 {
    let mut score: f64 = 0.5;

    if HARD_FAILURE_CODES.contains(&error.code_str()) {
        score += 0.3;
    }
    if error.status.is_some_and(|s| KNOWN_STATUSES.contains(&s)) {
        score += 0.2;
    }
    if node_id.is_some() {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_score() {
        let score = confidence_score(&ClassifiableError::new(), None);
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_signals_clamp_to_one() {
        let error = ClassifiableError::new()
            .with_code("ECONNREFUSED")
            .with_status(503);
        let score = confidence_score(&error, Some("n1"));
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_econnreset_gets_no_code_bonus() {
        let error = ClassifiableError::new().with_code("ECONNRESET");
        let score = confidence_score(&error, None);
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_status_bonus_only_for_known_statuses() {
        let known = confidence_score(&ClassifiableError::new().with_status(502), None);
        assert!((known - 0.7).abs() < f64::EPSILON);

        let unknown = confidence_score(&ClassifiableError::new().with_status(418), None);
        assert!((unknown - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_node_bonus() {
        let score = confidence_score(&ClassifiableError::new(), Some("n1"));
        assert!((score - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_always_in_range() {
        let errors = [
            ClassifiableError::new(),
            ClassifiableError::new().with_code("ETIMEDOUT").with_status(500),
            ClassifiableError::new().with_status(429),
        ];
        for error in &errors {
            for node in [None, Some("n1")] {
                let score = confidence_score(error, node);
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }
}
