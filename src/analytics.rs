//! Aggregate views over a user's emotion history.
//!
//! Everything here is in-memory arithmetic over records the caller already
//! fetched. An empty window is never an error; each view has its own empty
//! shape (see the individual methods).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use utoipa::ToSchema;

use crate::emotion::{EmotionCategory, EmotionLabel};
use crate::error::Result;
use crate::history::EmotionHistoryRecord;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Intensity assumed for records stored without one.
pub const DEFAULT_INTENSITY: f64 = 0.5;

pub type EmotionDistribution = BTreeMap<EmotionLabel, f64>;
pub type EmotionFrequency = BTreeMap<EmotionLabel, usize>;
pub type EmotionTrends = BTreeMap<EmotionLabel, Vec<TrendPoint>>;
pub type EmotionalBalance = BTreeMap<EmotionCategory, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyMood {
    pub date: NaiveDate,
    pub intensity: f64,
    pub count: usize,
}

/// Chart point: `x` is the date, `y` the occurrences that day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrendPoint {
    pub x: NaiveDate,
    pub y: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SentimentPoint {
    pub date: NaiveDate,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SummaryStats {
    pub total_entries: usize,
    pub most_common_emotion: String,
    pub average_sentiment: f64,
    pub days_tracked: usize,
}

/// All seven views at once.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AnalyticsReport {
    #[schema(value_type = Object)]
    pub emotion_distribution: EmotionDistribution,
    pub daily_mood: Vec<DailyMood>,
    #[schema(value_type = Object)]
    pub emotion_trends: EmotionTrends,
    #[schema(value_type = Object)]
    pub emotion_frequency: EmotionFrequency,
    #[schema(value_type = Object)]
    pub emotional_balance: EmotionalBalance,
    pub sentiment_trends: Vec<SentimentPoint>,
    pub summary: SummaryStats,
}

/// 0001-01-01T00:00:00Z, the floor for any lookback cutoff. Postgres
/// `timestamptz` cannot hold chrono's minimum instant.
const EARLIEST_CUTOFF_SECS: i64 = -62_135_596_800;

fn earliest_cutoff() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(EARLIEST_CUTOFF_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Start of a `days` lookback ending at `now`. Lookbacks reaching past the
/// earliest storable instant saturate to it, so every record is included.
pub fn lookback_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let floor = earliest_cutoff();
    Duration::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .map_or(floor, |cutoff| cutoff.max(floor))
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// One user's records inside a lookback window.
pub struct EmotionAnalytics<'a> {
    records: Vec<&'a EmotionHistoryRecord>,
}

impl<'a> EmotionAnalytics<'a> {
    /// Keep `user_id`'s records with `timestamp >= now - days`, in input order.
    /// Fails only if a kept record breaks the history invariants.
    pub fn new(
        user_id: &str,
        records: &'a [EmotionHistoryRecord],
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let cutoff = lookback_start(now, days);
        let records: Vec<&EmotionHistoryRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id && r.timestamp >= cutoff)
            .collect();

        for record in &records {
            record.validate()?;
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn date_of(record: &EmotionHistoryRecord) -> NaiveDate {
        record.timestamp.date_naive()
    }

    /// Counts per emotion in first-seen order.
    fn counts_in_order(&self) -> Vec<(EmotionLabel, usize)> {
        let mut counts: Vec<(EmotionLabel, usize)> = Vec::new();
        for record in &self.records {
            match counts.iter_mut().find(|(label, _)| *label == record.emotion) {
                Some((_, count)) => *count += 1,
                None => counts.push((record.emotion, 1)),
            }
        }
        counts
    }

    /// Percentage share (0-100) of each emotion present. Empty map if no records.
    pub fn emotion_distribution(&self) -> EmotionDistribution {
        let total = self.records.len() as f64;
        self.emotion_frequency()
            .into_iter()
            .map(|(label, count)| (label, count as f64 / total * 100.0))
            .collect()
    }

    /// Average intensity and record count per calendar day, oldest first.
    pub fn daily_mood(&self) -> Vec<DailyMood> {
        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for record in &self.records {
            by_day
                .entry(Self::date_of(record))
                .or_default()
                .push(record.intensity.unwrap_or(DEFAULT_INTENSITY));
        }

        by_day
            .into_iter()
            .map(|(date, intensities)| DailyMood {
                date,
                intensity: round_to(mean(&intensities), 2),
                count: intensities.len(),
            })
            .collect()
    }

    /// Per-emotion daily occurrence series. Days without an occurrence are
    /// left out of that emotion's series rather than zero-filled.
    pub fn emotion_trends(&self) -> EmotionTrends {
        let mut by_emotion: BTreeMap<EmotionLabel, BTreeMap<NaiveDate, usize>> = BTreeMap::new();
        for record in &self.records {
            *by_emotion
                .entry(record.emotion)
                .or_default()
                .entry(Self::date_of(record))
                .or_insert(0) += 1;
        }

        by_emotion
            .into_iter()
            .map(|(label, days)| {
                let series = days.into_iter().map(|(x, y)| TrendPoint { x, y }).collect();
                (label, series)
            })
            .collect()
    }

    /// Raw occurrence counts per emotion present.
    pub fn emotion_frequency(&self) -> EmotionFrequency {
        self.counts_in_order().into_iter().collect()
    }

    /// Average intensity per valence category; a category with no records is 0.
    pub fn emotional_balance(&self) -> EmotionalBalance {
        EmotionCategory::ALL
            .iter()
            .map(|category| {
                let intensities: Vec<f64> = self
                    .records
                    .iter()
                    .filter(|r| r.emotion.category() == *category)
                    .map(|r| r.intensity.unwrap_or(DEFAULT_INTENSITY))
                    .collect();
                let score = if intensities.is_empty() {
                    0.0
                } else {
                    mean(&intensities)
                };
                (*category, score)
            })
            .collect()
    }

    /// Average sentiment per day over records that carry one, oldest first.
    pub fn sentiment_trends(&self) -> Vec<SentimentPoint> {
        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for record in &self.records {
            if let Some(sentiment) = record.sentiment {
                by_day.entry(Self::date_of(record)).or_default().push(sentiment);
            }
        }

        by_day
            .into_iter()
            .map(|(date, scores)| SentimentPoint {
                date,
                sentiment: round_to(mean(&scores), 3),
            })
            .collect()
    }

    /// Headline numbers. The most common emotion breaks ties by whichever
    /// emotion appeared first in the window; `"N/A"` when there are no records.
    pub fn summary_stats(&self) -> SummaryStats {
        let most_common_emotion = self
            .counts_in_order()
            .into_iter()
            .fold(None, |best: Option<(EmotionLabel, usize)>, (label, count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((label, count)),
            })
            .map(|(label, _)| label.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        let sentiments: Vec<f64> = self.records.iter().filter_map(|r| r.sentiment).collect();
        let average_sentiment = if sentiments.is_empty() {
            0.0
        } else {
            round_to(mean(&sentiments), 3)
        };

        let days_tracked = self
            .records
            .iter()
            .map(|r| Self::date_of(r))
            .collect::<BTreeSet<_>>()
            .len();

        SummaryStats {
            total_entries: self.records.len(),
            most_common_emotion,
            average_sentiment,
            days_tracked,
        }
    }

    pub fn report(&self) -> AnalyticsReport {
        AnalyticsReport {
            emotion_distribution: self.emotion_distribution(),
            daily_mood: self.daily_mood(),
            emotion_trends: self.emotion_trends(),
            emotion_frequency: self.emotion_frequency(),
            emotional_balance: self.emotional_balance(),
            sentiment_trends: self.sentiment_trends(),
            summary: self.summary_stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::history::SourceType;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn record(
        emotion: EmotionLabel,
        day: u32,
        hour: u32,
        intensity: f64,
        sentiment: Option<f64>,
    ) -> EmotionHistoryRecord {
        EmotionHistoryRecord {
            user_id: "alice".into(),
            source_type: SourceType::Chat,
            source_id: format!("{}-{}", day, hour),
            emotion,
            confidence: 0.7,
            sentiment,
            intensity: Some(intensity),
            timestamp: Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap(),
        }
    }

    fn joy_joy_sadness() -> Vec<EmotionHistoryRecord> {
        vec![
            record(EmotionLabel::Joy, 28, 9, 0.8, Some(0.6)),
            record(EmotionLabel::Joy, 28, 18, 0.6, Some(0.2)),
            record(EmotionLabel::Sadness, 29, 10, 0.9, Some(-0.5)),
        ]
    }

    #[test]
    fn test_distribution_and_frequency() {
        let records = joy_joy_sadness();
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();

        let distribution = analytics.emotion_distribution();
        assert!((distribution[&EmotionLabel::Joy] - 66.67).abs() < 0.01);
        assert!((distribution[&EmotionLabel::Sadness] - 33.33).abs() < 0.01);
        let total: f64 = distribution.values().sum();
        assert!((total - 100.0).abs() < 1e-9);

        let frequency = analytics.emotion_frequency();
        assert_eq!(frequency.len(), 2);
        assert_eq!(frequency[&EmotionLabel::Joy], 2);
        assert_eq!(frequency[&EmotionLabel::Sadness], 1);
    }

    #[test]
    fn test_daily_mood_groups_same_day() {
        let records = joy_joy_sadness();
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        let mood = analytics.daily_mood();

        assert_eq!(mood.len(), 2);
        assert_eq!(mood[0].date, NaiveDate::from_ymd_opt(2024, 6, 28).unwrap());
        assert_eq!(mood[0].count, 2);
        assert_eq!(mood[0].intensity, 0.7);
        assert_eq!(mood[1].count, 1);
        assert_eq!(mood[1].intensity, 0.9);
    }

    #[test]
    fn test_missing_intensity_defaults() {
        let mut records = joy_joy_sadness();
        records[2].intensity = None;
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        assert_eq!(analytics.daily_mood()[1].intensity, DEFAULT_INTENSITY);
    }

    #[test]
    fn test_trends_are_not_zero_filled() {
        let records = joy_joy_sadness();
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        let trends = analytics.emotion_trends();

        let joy = &trends[&EmotionLabel::Joy];
        assert_eq!(joy.len(), 1);
        assert_eq!(joy[0].y, 2);
        let sadness = &trends[&EmotionLabel::Sadness];
        assert_eq!(sadness.len(), 1);
        assert_eq!(sadness[0].x, NaiveDate::from_ymd_opt(2024, 6, 29).unwrap());
    }

    #[test]
    fn test_trend_series_sorted_by_date() {
        let records = vec![
            record(EmotionLabel::Fear, 27, 9, 0.5, None),
            record(EmotionLabel::Fear, 25, 9, 0.5, None),
            record(EmotionLabel::Joy, 26, 9, 0.5, None),
            record(EmotionLabel::Fear, 29, 9, 0.5, None),
            record(EmotionLabel::Fear, 25, 20, 0.5, None),
        ];
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        let fear = &analytics.emotion_trends()[&EmotionLabel::Fear];

        let days: Vec<NaiveDate> = fear.iter().map(|p| p.x).collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 6, 25).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 29).unwrap(),
            ]
        );
        assert_eq!(fear[0].y, 2);
    }

    #[test]
    fn test_emotional_balance() {
        let mut records = joy_joy_sadness();
        records.push(record(EmotionLabel::Surprise, 29, 11, 0.4, None));
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        let balance = analytics.emotional_balance();

        assert!((balance[&EmotionCategory::Positive] - 0.6).abs() < 1e-9);
        assert!((balance[&EmotionCategory::Negative] - 0.9).abs() < 1e-9);
        assert_eq!(balance[&EmotionCategory::Neutral], 0.0);
    }

    #[test]
    fn test_sentiment_trends_skip_missing_scores() {
        let mut records = joy_joy_sadness();
        records.push(record(EmotionLabel::Neutral, 29, 15, 0.5, None));
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        let trend = analytics.sentiment_trends();

        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].sentiment, 0.4);
        assert_eq!(trend[1].sentiment, -0.5);
    }

    #[test]
    fn test_summary_stats() {
        let records = joy_joy_sadness();
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        let summary = analytics.summary_stats();

        assert_eq!(
            summary,
            SummaryStats {
                total_entries: 3,
                most_common_emotion: "joy".into(),
                average_sentiment: 0.1,
                days_tracked: 2,
            }
        );
    }

    #[test]
    fn test_most_common_tie_uses_first_seen() {
        let records = vec![
            record(EmotionLabel::Fear, 20, 9, 0.5, None),
            record(EmotionLabel::Love, 21, 9, 0.5, None),
            record(EmotionLabel::Love, 22, 9, 0.5, None),
            record(EmotionLabel::Fear, 23, 9, 0.5, None),
        ];
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        assert_eq!(analytics.summary_stats().most_common_emotion, "fear");
    }

    #[test]
    fn test_empty_window_defaults() {
        let records: Vec<EmotionHistoryRecord> = Vec::new();
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();

        assert!(analytics.is_empty());
        assert!(analytics.emotion_distribution().is_empty());
        assert!(analytics.daily_mood().is_empty());
        assert!(analytics.emotion_trends().is_empty());
        assert!(analytics.emotion_frequency().is_empty());
        assert!(analytics.sentiment_trends().is_empty());
        assert!(analytics.emotional_balance().values().all(|v| *v == 0.0));
        assert_eq!(
            analytics.summary_stats(),
            SummaryStats {
                total_entries: 0,
                most_common_emotion: "N/A".into(),
                average_sentiment: 0.0,
                days_tracked: 0,
            }
        );
    }

    #[test]
    fn test_window_and_user_filter() {
        let mut records = joy_joy_sadness();
        records.push(record(EmotionLabel::Anger, 1, 9, 0.5, None));
        let mut other = record(EmotionLabel::Fear, 29, 9, 0.5, None);
        other.user_id = "bob".into();
        records.push(other);

        let analytics = EmotionAnalytics::new("alice", &records, 7, now()).unwrap();
        assert_eq!(analytics.len(), 3);

        // Inclusive cutoff: exactly `days` ago is kept.
        let boundary = vec![EmotionHistoryRecord {
            timestamp: now() - Duration::days(7),
            ..record(EmotionLabel::Joy, 1, 0, 0.5, None)
        }];
        assert_eq!(EmotionAnalytics::new("alice", &boundary, 7, now()).unwrap().len(), 1);
    }

    #[test]
    fn test_huge_lookback_saturates() {
        assert_eq!(lookback_start(now(), u32::MAX), earliest_cutoff());
        assert_eq!(lookback_start(now(), 100_000_000), earliest_cutoff());
        assert_eq!(lookback_start(now(), 7), now() - Duration::days(7));
        assert_eq!(lookback_start(now(), 0), now());

        let mut records = joy_joy_sadness();
        records[0].timestamp = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap();
        for days in [1_000_000, 100_000_000, u32::MAX] {
            let analytics = EmotionAnalytics::new("alice", &records, days, now()).unwrap();
            assert_eq!(analytics.len(), 3);
            assert_eq!(analytics.summary_stats().total_entries, 3);
        }
    }

    #[test]
    fn test_invalid_record_is_integrity_error() {
        let mut records = joy_joy_sadness();
        records[0].intensity = Some(1.5);
        let result = EmotionAnalytics::new("alice", &records, 30, now());
        assert!(matches!(result, Err(CoreError::DataIntegrity(_))));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let records = joy_joy_sadness();
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        assert_eq!(analytics.report(), analytics.report());
    }

    #[test]
    fn test_report_json_shape() {
        let records = joy_joy_sadness();
        let analytics = EmotionAnalytics::new("alice", &records, 30, now()).unwrap();
        let json = serde_json::to_value(analytics.report()).unwrap();

        assert_eq!(json["emotion_frequency"]["joy"], 2);
        assert_eq!(json["daily_mood"][0]["date"], "2024-06-28");
        assert_eq!(json["emotion_trends"]["sadness"][0]["x"], "2024-06-29");
        assert!(json["emotional_balance"]["Positive"].is_number());
        assert_eq!(json["summary"]["most_common_emotion"], "joy");
    }
}
