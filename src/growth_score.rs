// src/growth_score.rs
//! Growth score computation.
//!
//! Turns the loosely typed profile analysis returned by the LLM into a 0-100
//! score made of four dimensions worth 25 points each. Every input field is
//! optional: absent or malformed values contribute a neutral amount, so
//! scoring never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const MAX_SUB_SCORE: u8 = 25;
pub const MAX_TOTAL: u8 = 100;

/// Total reported when an analysis cannot be scored at all.
pub const NEUTRAL_SCORE: u8 = 50;

const CTA_STRONG: &[&str] = &["strong", "effective", "good"];
const CTA_MODERATE: &[&str] = &["moderate", "some"];
const CTA_WEAK: &[&str] = &["weak", "missing", "lacking"];
const HASHTAG_POSITIVE: &[&str] = &["good", "effective", "strategic"];

/// Profile analysis as produced by the LLM.
///
/// Field names follow the snake_case keys the model is prompted to return.
/// Values of the wrong JSON type are read as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub detected_niche: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub target_audience: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub content_strengths: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::list")]
    pub content_gaps: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::tone")]
    pub tone_analysis: Option<ToneAnalysis>,
    #[serde(deserialize_with = "lenient::list")]
    pub growth_opportunities: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::text")]
    pub hashtag_usage: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub cta_effectiveness: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub posting_patterns: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToneAnalysis {
    #[serde(deserialize_with = "lenient::text")]
    pub primary_tone: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub secondary_tone: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub consistency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneConsistency {
    High,
    Medium,
    Low,
    Unknown,
}

impl ToneConsistency {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_lowercase).as_deref() {
            Some("high") => ToneConsistency::High,
            Some("medium") => ToneConsistency::Medium,
            Some("low") => ToneConsistency::Low,
            _ => ToneConsistency::Unknown,
        }
    }
}

impl AnalysisRecord {
    /// Reads a record out of arbitrary JSON. Anything other than an object
    /// yields the empty record.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::deserialize(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    fn tone_consistency(&self) -> ToneConsistency {
        ToneConsistency::parse(
            self.tone_analysis
                .as_ref()
                .and_then(|tone| tone.consistency.as_deref()),
        )
    }

    fn secondary_tone(&self) -> Option<&str> {
        self.tone_analysis
            .as_ref()
            .and_then(|tone| tone.secondary_tone.as_deref())
            .filter(|tone| !tone.is_empty())
    }
}

/// One scored dimension as shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScore {
    pub score: u8,
    pub max_score: u8,
}

impl SubScore {
    fn from_raw(raw: f64) -> Self {
        Self {
            score: round_to(raw, MAX_SUB_SCORE),
            max_score: MAX_SUB_SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScores {
    pub consistency: SubScore,
    pub niche_clarity: SubScore,
    pub cta_usage: SubScore,
    pub engagement_encouragement: SubScore,
}

/// Composite score plus the per-dimension detail. `breakdown` is `None`
/// only for the neutral fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub total: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<DimensionScores>,
}

impl ScoreBreakdown {
    pub fn neutral() -> Self {
        Self {
            total: NEUTRAL_SCORE,
            breakdown: None,
        }
    }
}

/// Un-rounded dimension scores, each already clamped to `[0, 25]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScores {
    pub consistency: f64,
    pub niche_clarity: f64,
    pub cta_usage: f64,
    pub engagement: f64,
}

impl RawScores {
    pub fn of(record: &AnalysisRecord) -> Self {
        Self {
            consistency: score_consistency(record),
            niche_clarity: score_niche_clarity(record),
            cta_usage: score_cta_usage(record),
            engagement: score_engagement(record),
        }
    }

    pub fn sum(&self) -> f64 {
        self.consistency + self.niche_clarity + self.cta_usage + self.engagement
    }
}

/// Single-number score: raw dimensions are summed, then rounded once.
pub fn calculate(record: &AnalysisRecord) -> u8 {
    round_to(RawScores::of(record).sum(), MAX_TOTAL)
}

/// Full breakdown. Each dimension is rounded on its own for display while
/// `total` is the same value `calculate` returns.
pub fn breakdown(record: &AnalysisRecord) -> ScoreBreakdown {
    let raw = RawScores::of(record);

    ScoreBreakdown {
        total: round_to(raw.sum(), MAX_TOTAL),
        breakdown: Some(DimensionScores {
            consistency: SubScore::from_raw(raw.consistency),
            niche_clarity: SubScore::from_raw(raw.niche_clarity),
            cta_usage: SubScore::from_raw(raw.cta_usage),
            engagement_encouragement: SubScore::from_raw(raw.engagement),
        }),
    }
}

pub fn breakdown_value(analysis: &Value) -> ScoreBreakdown {
    breakdown(&AnalysisRecord::from_value(analysis))
}

/// Scores an analysis kept as serialized JSON. Text that is not JSON at all
/// gets the neutral score.
pub fn breakdown_stored(analysis_json: &str) -> ScoreBreakdown {
    match serde_json::from_str::<Value>(analysis_json) {
        Ok(value) => breakdown_value(&value),
        Err(e) => {
            warn!(error = %e, "Stored analysis is not valid JSON, using neutral score");
            ScoreBreakdown::neutral()
        }
    }
}

fn score_consistency(record: &AnalysisRecord) -> f64 {
    let mut score = 10.0;

    score += match record.tone_consistency() {
        ToneConsistency::High => 15.0,
        ToneConsistency::Medium => 8.0,
        ToneConsistency::Low | ToneConsistency::Unknown => 3.0,
    };

    if let Some(patterns) = record.posting_patterns.as_deref() {
        if !patterns.is_empty() && !patterns.to_lowercase().contains("inconsist") {
            score += 2.0;
        }
    }

    clamp_sub_score(score)
}

fn score_niche_clarity(record: &AnalysisRecord) -> f64 {
    let mut score = 5.0;

    if record
        .detected_niche
        .as_deref()
        .is_some_and(|niche| niche.chars().count() > 3)
    {
        score += 10.0;
    }

    score += (1.5 * list_len(&record.content_strengths)).min(5.0);

    // No gap list at all says nothing about focus, so only a reported list
    // earns the bonus.
    if let Some(gaps) = &record.content_gaps {
        score += match gaps.len() {
            0..=2 => 5.0,
            3..=4 => 3.0,
            _ => 0.0,
        };
    }

    clamp_sub_score(score)
}

fn score_cta_usage(record: &AnalysisRecord) -> f64 {
    let mut score = 5.0;

    let cta = lowercase(&record.cta_effectiveness);
    score += if contains_any(&cta, CTA_STRONG) {
        15.0
    } else if contains_any(&cta, CTA_MODERATE) {
        8.0
    } else if contains_any(&cta, CTA_WEAK) {
        2.0
    } else {
        5.0
    };

    if contains_any(&lowercase(&record.hashtag_usage), HASHTAG_POSITIVE) {
        score += 5.0;
    }

    clamp_sub_score(score)
}

fn score_engagement(record: &AnalysisRecord) -> f64 {
    let mut score = 5.0;

    score += (2.5 * list_len(&record.growth_opportunities)).min(10.0);

    if record
        .target_audience
        .as_deref()
        .is_some_and(|audience| audience.chars().count() > 10)
    {
        score += 5.0;
    }

    if record.secondary_tone().is_some() {
        score += 3.0;
    }

    clamp_sub_score(score)
}

fn clamp_sub_score(score: f64) -> f64 {
    score.clamp(0.0, f64::from(MAX_SUB_SCORE))
}

fn round_to(value: f64, max: u8) -> u8 {
    value.round().clamp(0.0, f64::from(max)) as u8
}

fn list_len(list: &Option<Vec<String>>) -> f64 {
    list.as_ref().map_or(0, Vec::len) as f64
}

fn lowercase(text: &Option<String>) -> String {
    text.as_deref().unwrap_or_default().to_lowercase()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

mod lenient {
    use super::ToneAnalysis;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Some(text),
            _ => None,
        })
    }

    pub fn list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(text) => text,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn tone<'de, D>(deserializer: D) -> Result<Option<ToneAnalysis>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            value @ Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        })
    }
}
