use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;

use crate::core::error::CoreError;
use crate::core::filters::passes_spatiotemporal_filter;
use crate::core::media::load_image;
use crate::core::normalize::OracleVerdict;
use crate::core::scoring::round2;
use crate::models::{LostDogNotice, ReconcileOutcome, ReconcileThresholds, StrayDogReport};
use crate::services::{
    GenerationOptions, MediaPart, NotificationSink, OracleError, VisionOracle,
};

/// Lost/stray reconciliation engine
///
/// # Pipeline Stages
/// 1. Spatiotemporal pre-filter (no oracle cost)
/// 2. Visual comparison of each surviving report against the notice
/// 3. Aggregation into one outcome, then at most one owner notification
///
/// Any oracle failure aborts the whole run: no partial outcome is returned
/// and no notification is sent.
pub struct DogMatcher {
    oracle: Arc<dyn VisionOracle>,
    prompt: String,
    thresholds: ReconcileThresholds,
    temperature: f64,
    oracle_timeout: Duration,
    max_concurrent: usize,
}

impl DogMatcher {
    pub fn new(oracle: Arc<dyn VisionOracle>, prompt: String) -> Self {
        Self {
            oracle,
            prompt,
            thresholds: ReconcileThresholds::default(),
            temperature: 0.2,
            oracle_timeout: Duration::from_secs(60),
            max_concurrent: 4,
        }
    }

    pub fn with_thresholds(mut self, thresholds: ReconcileThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn thresholds(&self) -> &ReconcileThresholds {
        &self.thresholds
    }

    /// Reconcile a lost-dog notice against candidate stray reports
    ///
    /// # Arguments
    /// * `notice` - The owner's lost-dog notice
    /// * `candidates` - Stray reports to compare against, in priority order
    /// * `owner_id` - Owner to notify on a positive outcome
    /// * `notifier` - Sink for the notification, if any
    ///
    /// # Returns
    /// The aggregated outcome; matched ids keep the candidates' order
    pub async fn reconcile(
        &self,
        notice: &LostDogNotice,
        candidates: &[StrayDogReport],
        owner_id: Option<&str>,
        notifier: Option<&dyn NotificationSink>,
    ) -> Result<ReconcileOutcome, CoreError> {
        if candidates.is_empty() {
            return Ok(ReconcileOutcome::no_match());
        }

        let notice_part = load_image(&notice.image).await?;

        let survivors: Vec<&StrayDogReport> = candidates
            .iter()
            .filter(|report| {
                let keep = passes_spatiotemporal_filter(notice, report, &self.thresholds);
                if !keep {
                    tracing::debug!(
                        "Report {} rejected by spatiotemporal filter",
                        report.report_id
                    );
                }
                keep
            })
            .collect();

        tracing::debug!(
            "{} of {} reports passed the spatiotemporal filter",
            survivors.len(),
            candidates.len()
        );

        // buffered() yields results in input order
        let verdicts: Vec<(&StrayDogReport, OracleVerdict)> = stream::iter(survivors)
            .map(|report| {
                let notice_part = &notice_part;
                async move {
                    let verdict = self.compare(notice_part, report).await?;
                    Ok::<_, CoreError>((report, verdict))
                }
            })
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        let mut highest_similarity = 0.0_f64;
        let mut matched_report_ids = Vec::new();
        for (report, verdict) in &verdicts {
            highest_similarity = highest_similarity.max(verdict.similarity);
            if verdict.is_match || verdict.similarity >= self.thresholds.similarity_threshold {
                matched_report_ids.push(report.report_id.clone());
            }
        }

        let is_match = !matched_report_ids.is_empty();

        if is_match {
            if let (Some(owner_id), Some(notifier)) = (owner_id, notifier) {
                notifier
                    .notify_possible_match(owner_id, &matched_report_ids, highest_similarity)
                    .await?;
                tracing::info!(
                    "Notified owner {} of {} possible matches",
                    owner_id,
                    matched_report_ids.len()
                );
            }
        }

        Ok(ReconcileOutcome {
            is_match,
            similarity_score: round2(highest_similarity),
            matched_report_ids,
        })
    }

    async fn compare(
        &self,
        notice_part: &MediaPart,
        report: &StrayDogReport,
    ) -> Result<OracleVerdict, CoreError> {
        let report_part = load_image(&report.image).await?;
        let parts = [notice_part.clone(), report_part];
        let options = GenerationOptions::image(self.temperature);

        let raw = tokio::time::timeout(
            self.oracle_timeout,
            self.oracle.generate_json(&self.prompt, &parts, &options),
        )
        .await
        .map_err(|_| OracleError::Timeout(self.oracle_timeout.as_secs()))??;

        let verdict = OracleVerdict::from_response(&raw);
        tracing::debug!(
            "Report {} similarity {:.2} (model match: {})",
            report.report_id,
            verdict.similarity,
            verdict.is_match
        );

        Ok(verdict)
    }
}

/// Merge stored and inline candidates by report id
///
/// Inline entries replace stored ones with the same id in place; new inline
/// entries are appended in request order.
pub fn merge_candidates(
    stored: Vec<StrayDogReport>,
    inline: Vec<StrayDogReport>,
) -> Vec<StrayDogReport> {
    let mut merged = stored;
    for report in inline {
        match merged.iter_mut().find(|r| r.report_id == report.report_id) {
            Some(existing) => *existing = report,
            None => merged.push(report),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, ImageRef};
    use crate::services::{JsonObject, MemoryStore, MockOracle};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Oracle returning a fixed score per report image byte
    struct ScriptedOracle {
        calls: AtomicUsize,
        fail_on: Option<u8>,
        /// Marker the model calls a match whatever its score
        vouch_for: Option<u8>,
    }

    impl ScriptedOracle {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0), fail_on: None, vouch_for: None }
        }
    }

    #[async_trait]
    impl VisionOracle for ScriptedOracle {
        async fn generate_json(
            &self,
            _prompt: &str,
            parts: &[MediaPart],
            _options: &GenerationOptions,
        ) -> Result<JsonObject, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let marker = match parts.get(1) {
                Some(MediaPart::Inline { data, .. }) => data.first().copied().unwrap_or(0),
                _ => 0,
            };
            if Some(marker) == self.fail_on {
                return Err(OracleError::Parse("garbled".to_string()));
            }
            let is_match = Some(marker) == self.vouch_for;
            let value = json!({ "similarity_score": f64::from(marker), "is_match": is_match });
            match value {
                serde_json::Value::Object(map) => Ok(map),
                _ => unreachable!(),
            }
        }

        async fn upload_video(&self, _path: &Path) -> Result<MediaPart, OracleError> {
            Err(OracleError::Upload("unsupported".to_string()))
        }
    }

    fn notice(location: Option<GeoPoint>) -> LostDogNotice {
        LostDogNotice {
            image: ImageRef::Inline(vec![1]),
            lost_at: None,
            location,
        }
    }

    fn report(id: &str, score: u8, location: Option<GeoPoint>) -> StrayDogReport {
        StrayDogReport {
            report_id: id.to_string(),
            image: ImageRef::Inline(vec![score]),
            reported_at: None,
            location,
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_oracle() {
        let oracle = Arc::new(ScriptedOracle::new());
        let matcher = DogMatcher::new(oracle.clone(), "prompt".to_string());
        // A path that does not exist proves the notice image is never loaded
        let notice = LostDogNotice {
            image: ImageRef::Path("/missing.jpg".to_string()),
            lost_at: None,
            location: None,
        };

        let outcome = matcher.reconcile(&notice, &[], None, None).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::no_match());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_max_score_and_threshold() {
        let oracle = Arc::new(ScriptedOracle::new());
        let matcher = DogMatcher::new(oracle.clone(), "prompt".to_string());
        let candidates = vec![report("A", 65, None), report("B", 80, None), report("C", 71, None)];

        let outcome = matcher.reconcile(&notice(None), &candidates, None, None).await.unwrap();

        assert!(outcome.is_match);
        assert_eq!(outcome.similarity_score, 80.0);
        assert_eq!(outcome.matched_report_ids, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_model_verdict_or_threshold_edge_matches() {
        let oracle = Arc::new(ScriptedOracle { vouch_for: Some(10), ..ScriptedOracle::new() });
        let matcher = DogMatcher::new(oracle, "prompt".to_string());
        let candidates = vec![
            report("vouched", 10, None),
            report("edge", 70, None),
            report("below", 69, None),
            report("peak", 85, None),
        ];

        let outcome = matcher.reconcile(&notice(None), &candidates, None, None).await.unwrap();

        assert!(outcome.is_match);
        assert_eq!(outcome.similarity_score, 85.0);
        assert_eq!(
            outcome.matched_report_ids,
            vec!["vouched".to_string(), "edge".to_string(), "peak".to_string()]
        );
    }

    #[tokio::test]
    async fn test_filtered_reports_never_scored() {
        let oracle = Arc::new(ScriptedOracle::new());
        let matcher = DogMatcher::new(oracle.clone(), "prompt".to_string());
        let here = GeoPoint { latitude: 1.0, longitude: 1.0 };
        let far = GeoPoint { latitude: 10.0, longitude: 10.0 };
        let candidates = vec![report("near", 40, Some(here)), report("far", 99, Some(far))];

        let outcome = matcher
            .reconcile(&notice(Some(here)), &candidates, None, None)
            .await
            .unwrap();

        assert!(!outcome.is_match);
        assert_eq!(outcome.similarity_score, 40.0);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_aborts_without_notification() {
        let oracle = Arc::new(ScriptedOracle { fail_on: Some(50), ..ScriptedOracle::new() });
        let matcher = DogMatcher::new(oracle, "prompt".to_string());
        let store = MemoryStore::new();
        let candidates = vec![report("A", 90, None), report("B", 50, None)];

        let result = matcher
            .reconcile(&notice(None), &candidates, Some("owner"), Some(&store))
            .await;

        assert!(matches!(result, Err(CoreError::Oracle(OracleError::Parse(_)))));
        assert!(store.list_notifications(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notifies_once_with_peak_score() {
        let matcher = DogMatcher::new(Arc::new(ScriptedOracle::new()), "prompt".to_string())
            .with_max_concurrent(2);
        let store = MemoryStore::new();
        let candidates = vec![report("A", 75, None), report("B", 90, None), report("C", 10, None)];

        matcher
            .reconcile(&notice(None), &candidates, Some("owner"), Some(&store))
            .await
            .unwrap();

        let notifications = store.list_notifications(Some("owner")).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].matched_report_ids, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(notifications[0].similarity_score, 90.0);
    }

    #[tokio::test]
    async fn test_no_owner_means_no_notification() {
        let matcher = DogMatcher::new(Arc::new(MockOracle::new()), "\"similarity_score\" \"is_match\"".to_string());
        let store = MemoryStore::new();
        let candidates = vec![report("A", 1, None)];

        let outcome = matcher
            .reconcile(&notice(None), &candidates, None, Some(&store))
            .await
            .unwrap();

        // Identical bytes score 95 with the mock oracle
        assert!(outcome.is_match);
        assert!(store.list_notifications(None).await.unwrap().is_empty());
    }

    struct SlowOracle;

    #[async_trait]
    impl VisionOracle for SlowOracle {
        async fn generate_json(
            &self,
            _prompt: &str,
            _parts: &[MediaPart],
            _options: &GenerationOptions,
        ) -> Result<JsonObject, OracleError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(JsonObject::new())
        }

        async fn upload_video(&self, _path: &Path) -> Result<MediaPart, OracleError> {
            Err(OracleError::Upload("unsupported".to_string()))
        }
    }

    #[tokio::test]
    async fn test_slow_oracle_times_out() {
        let matcher = DogMatcher::new(Arc::new(SlowOracle), "prompt".to_string())
            .with_oracle_timeout(Duration::from_millis(20));

        let result = matcher
            .reconcile(&notice(None), &[report("A", 1, None)], None, None)
            .await;

        assert!(matches!(result, Err(CoreError::Oracle(OracleError::Timeout(_)))));
    }

    #[test]
    fn test_merge_candidates_inline_wins() {
        let stored = vec![report("A", 1, None), report("B", 2, None)];
        let inline = vec![report("C", 3, None), report("A", 9, None)];

        let merged = merge_candidates(stored, inline);
        let ids: Vec<&str> = merged.iter().map(|r| r.report_id.as_str()).collect();

        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(merged[0].image, ImageRef::Inline(vec![9]));
    }

    #[tokio::test]
    async fn test_missing_report_image_is_hard_failure() {
        let matcher = DogMatcher::new(Arc::new(ScriptedOracle::new()), "prompt".to_string());
        let candidates = vec![StrayDogReport {
            report_id: "A".to_string(),
            image: ImageRef::Path("/nope/stray.jpg".to_string()),
            reported_at: None,
            location: None,
        }];

        let result = matcher.reconcile(&notice(None), &candidates, None, None).await;
        assert!(matches!(result, Err(CoreError::MissingResource(_))));
    }
}
