use serde::Deserialize;

use crate::models::ScorePrediction;
use crate::services::PredictionError;

/// Strip a surrounding Markdown code fence (optionally tagged `json`) and whitespace.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
        if text.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
            text = &text[4..];
        }
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Wire shape of the model's answer. Numbers are read as floats so that `2.0`
/// is accepted while `2.5` is rejected during validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrediction {
    home_score: f64,
    away_score: f64,
    confidence: f64,
    reason: String,
}

/// Parse the provider's raw text into a validated prediction.
pub fn normalize(raw: &str) -> Result<ScorePrediction, PredictionError> {
    let json = strip_code_fence(raw);
    let parsed: RawPrediction = serde_json::from_str(json)
        .map_err(|e| PredictionError::Malformed(e.to_string()))?;

    Ok(ScorePrediction {
        home_score: whole_number("homeScore", parsed.home_score, u32::MAX as f64)?,
        away_score: whole_number("awayScore", parsed.away_score, u32::MAX as f64)?,
        confidence: whole_number("confidence", parsed.confidence, 100.0)? as u8,
        reason: parsed.reason,
    })
}

fn whole_number(field: &str, value: f64, max: f64) -> Result<u32, PredictionError> {
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > max {
        return Err(PredictionError::Malformed(format!(
            "{} must be a whole number between 0 and {}, got {}",
            field, max, value
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"homeScore": 2, "awayScore": 1, "confidence": 72, "reason": "Home side won 3 of the last 5"}"#;

    #[test]
    fn fenced_and_bare_json_parse_identically() {
        let fenced = format!("```json\n{}\n```", BODY);
        assert_eq!(strip_code_fence(&fenced), BODY);
        assert_eq!(normalize(&fenced).unwrap(), normalize(BODY).unwrap());
    }

    #[test]
    fn untagged_fence_and_padding_are_stripped() {
        let fenced = format!("  \n```\n{}\n```  \n", BODY);
        assert_eq!(strip_code_fence(&fenced), BODY);
        assert_eq!(strip_code_fence("```JSON {} ```"), "{}");
    }

    #[test]
    fn valid_prediction_fields() {
        let p = normalize(BODY).unwrap();
        assert_eq!(p.home_score, 2);
        assert_eq!(p.away_score, 1);
        assert_eq!(p.confidence, 72);
        assert_eq!(p.reason, "Home side won 3 of the last 5");
    }

    #[test]
    fn whole_floats_are_accepted() {
        let p = normalize(r#"{"homeScore": 1.0, "awayScore": 0, "confidence": 55.0, "reason": "x"}"#).unwrap();
        assert_eq!((p.home_score, p.confidence), (1, 55));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = normalize("The home team will probably win 2-1.").unwrap_err();
        assert!(matches!(err, PredictionError::Malformed(_)));
    }

    #[test]
    fn shape_mismatches_are_rejected() {
        for body in [
            r#"{"homeScore": 2, "awayScore": 1, "confidence": 72}"#,
            r#"{"homeScore": -1, "awayScore": 1, "confidence": 72, "reason": "x"}"#,
            r#"{"homeScore": 1.5, "awayScore": 1, "confidence": 72, "reason": "x"}"#,
            r#"{"homeScore": 1, "awayScore": 1, "confidence": 140, "reason": "x"}"#,
            r#"{"homeScore": "2", "awayScore": 1, "confidence": 72, "reason": "x"}"#,
        ] {
            assert!(
                matches!(normalize(body), Err(PredictionError::Malformed(_))),
                "accepted {}",
                body
            );
        }
    }
}
