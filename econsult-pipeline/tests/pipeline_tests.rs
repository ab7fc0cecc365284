//! End-to-end behaviour of the analysis service over the in-memory store.

use econsult_core::{HealthStatus, PipelineConfig, ProvidersConfig};
use econsult_pipeline::{AnalysisService, ArtifactSource};
use econsult_test_utils::assertions::{
    assert_default_sentiment, assert_persistence_failure, assert_record_within_bounds,
    assert_validation_error,
};
use econsult_test_utils::fixtures::{
    test_pipeline_config, NEGATIVE_COMMENT, POSITIVE_COMMENT, SHORT_COMMENT,
};
use econsult_test_utils::*;
use std::sync::Arc;
use std::time::Duration;

fn service_with(
    config: PipelineConfig,
    sentiment: Arc<dyn SentimentProvider>,
    summary: Arc<dyn SummaryProvider>,
    gateway: Arc<dyn econsult_storage::PersistenceGateway>,
) -> AnalysisService {
    AnalysisService::new(config, sentiment_chain(sentiment), summary_chain(summary), gateway)
        .expect("test config is valid")
}

fn counting_service() -> (
    AnalysisService,
    Arc<CountingSentimentProvider>,
    Arc<CountingSummaryProvider>,
) {
    let sentiment = Arc::new(CountingSentimentProvider::new(SentimentLabel::Positive, 0.8));
    let summary = Arc::new(CountingSummaryProvider::new());
    let service = service_with(
        test_pipeline_config(Duration::from_secs(5)),
        sentiment.clone(),
        summary.clone(),
        Arc::new(InMemoryGateway::new()),
    );
    (service, sentiment, summary)
}

/// Service on the built-in local analyzers, as resolved with no credentials.
fn heuristic_service(gateway: Arc<dyn econsult_storage::PersistenceGateway>) -> AnalysisService {
    AnalysisService::from_config(
        test_pipeline_config(Duration::from_secs(5)),
        &ProvidersConfig::default(),
        gateway,
    )
    .expect("local analyzers always resolve")
}

// ============================================================================
// HAPPY PATH
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_positive_comment_end_to_end() {
    init_test_tracing();
    let service = heuristic_service(Arc::new(InMemoryGateway::new()));

    let record = service.submit("citizen", POSITIVE_COMMENT).await.unwrap();

    assert_record_within_bounds(&record);
    assert_eq!(record.stakeholder_type, StakeholderType::Citizen);
    assert_eq!(record.raw_text, POSITIVE_COMMENT);
    assert_eq!(record.sentiment.label, SentimentLabel::Positive);
    assert!((record.sentiment.score - 0.9).abs() < 1e-9);

    let fetched = service.get(record.id).await.unwrap().unwrap();
    assert_eq!(fetched, record);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_negative_comment_is_capped() {
    let service = heuristic_service(Arc::new(InMemoryGateway::new()));

    let record = service.submit("business", NEGATIVE_COMMENT).await.unwrap();

    assert_eq!(record.sentiment.label, SentimentLabel::Negative);
    assert!((record.sentiment.score - 0.95).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_short_text_is_its_own_summary() {
    let (service, sentiment, summary) = counting_service();

    let outcome = service
        .process_submission(econsult_core::Submission::new(StakeholderType::Ngo, SHORT_COMMENT).unwrap())
        .await
        .unwrap();

    assert_eq!(outcome.record.summary.text(), SHORT_COMMENT);
    assert_eq!(outcome.summary_source, ArtifactSource::ShortText);
    assert_eq!(outcome.sentiment_source, ArtifactSource::Provider);
    assert_eq!(summary.calls(), 0);
    assert_eq!(sentiment.calls(), 1);
    assert_eq!(service.stats().short_text_bypasses, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_long_text_is_truncated_not_rejected() {
    let (service, _, _) = counting_service();
    let text = "word ".repeat(80);

    let record = service.process(StakeholderType::Academic, &text).await.unwrap();

    assert_eq!(record.raw_text.chars().count(), RAW_TEXT_MAX_CHARS);
    assert!(text.starts_with(&record.raw_text));
    assert_record_within_bounds(&record);
}

// ============================================================================
// CACHING
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeat_text_hits_cache() {
    let (service, sentiment, summary) = counting_service();

    let first = service
        .process_submission(econsult_core::Submission::new(StakeholderType::Citizen, POSITIVE_COMMENT).unwrap())
        .await
        .unwrap();
    let second = service
        .process_submission(econsult_core::Submission::new(StakeholderType::Business, POSITIVE_COMMENT).unwrap())
        .await
        .unwrap();

    assert_eq!(sentiment.calls(), 1);
    assert_eq!(summary.calls(), 1);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(second.sentiment_source, ArtifactSource::Cache);
    assert_eq!(second.summary_source, ArtifactSource::Cache);
    assert_eq!(first.record.sentiment, second.record.sentiment);
    assert_eq!(first.record.summary, second.record.summary);
    assert_ne!(first.record.id, second.record.id);

    let stats = service.stats();
    assert_eq!(stats.sentiment_hits, 1);
    assert_eq!(stats.sentiment_misses, 1);
    assert_eq!(stats.processed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cache_size_stays_bounded() {
    let (service, _, _) = counting_service();
    let capacity = service.config().cache_capacity;

    for i in 0..capacity + 30 {
        let text = format!("comment number {} about the draft", i);
        service.process(StakeholderType::Citizen, &text).await.unwrap();
        assert!(service.sentiment_cache().len() <= capacity);
        assert!(service.summary_cache().len() <= capacity);
    }
    assert!(service.sentiment_cache().stats().evictions > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failure_defaults_are_not_cached() {
    let failing = Arc::new(FailingProvider::new());
    let service = service_with(
        test_pipeline_config(Duration::from_secs(5)),
        failing.clone(),
        failing.clone(),
        Arc::new(InMemoryGateway::new()),
    );

    service.process(StakeholderType::Citizen, POSITIVE_COMMENT).await.unwrap();
    service.process(StakeholderType::Citizen, POSITIVE_COMMENT).await.unwrap();

    assert_eq!(failing.calls(), 4);
    assert!(service.sentiment_cache().is_empty());
    assert!(service.summary_cache().is_empty());
}

// ============================================================================
// DEGRADED ANALYSIS
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_providers_fall_back_to_defaults() {
    let failing = Arc::new(FailingProvider::new());
    let service = service_with(
        test_pipeline_config(Duration::from_secs(5)),
        failing.clone(),
        failing,
        Arc::new(InMemoryGateway::new()),
    );
    let text = "x".repeat(120) + " and a few more words";

    let outcome = service
        .process_submission(econsult_core::Submission::new(StakeholderType::Citizen, &text).unwrap())
        .await
        .unwrap();

    assert!(outcome.is_degraded());
    assert_default_sentiment(&outcome.record);
    assert_record_within_bounds(&outcome.record);
    assert!(outcome.record.summary.text().starts_with("xxx"));

    let stats = service.stats();
    assert_eq!(stats.degraded_sentiment, 1);
    assert_eq!(stats.degraded_summary, 1);
    assert_eq!(stats.timeouts, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_provider_output_is_replaced() {
    let service = service_with(
        test_pipeline_config(Duration::from_secs(5)),
        Arc::new(GarbageProvider),
        Arc::new(GarbageProvider),
        Arc::new(InMemoryGateway::new()),
    );

    let record = service.process(StakeholderType::Ngo, POSITIVE_COMMENT).await.unwrap();

    assert_default_sentiment(&record);
    assert_record_within_bounds(&record);
    assert_eq!(record.summary.text(), "I love this policy, it is excellent and will he...");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_providers_do_not_fail_the_request() {
    let service = service_with(
        test_pipeline_config(Duration::from_secs(5)),
        Arc::new(PanickingProvider),
        Arc::new(PanickingProvider),
        Arc::new(InMemoryGateway::new()),
    );

    let record = service.process(StakeholderType::Citizen, POSITIVE_COMMENT).await.unwrap();

    assert_default_sentiment(&record);
    assert_record_within_bounds(&record);
    assert_eq!(service.pool_stats().failed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stalled_providers_time_out() {
    let stalling = Arc::new(StallingProvider::new(Duration::from_millis(400)));
    let service = service_with(
        test_pipeline_config(Duration::from_millis(100)),
        stalling.clone(),
        stalling,
        Arc::new(InMemoryGateway::new()),
    );

    let started = std::time::Instant::now();
    let outcome = service
        .process_submission(econsult_core::Submission::new(StakeholderType::Citizen, POSITIVE_COMMENT).unwrap())
        .await
        .unwrap();

    // Both analyzers run concurrently, so one timeout bounds the request.
    assert!(started.elapsed() < Duration::from_millis(350));
    assert_eq!(outcome.sentiment_source, ArtifactSource::Default);
    assert_eq!(outcome.summary_source, ArtifactSource::Default);
    assert_default_sentiment(&outcome.record);
    assert_eq!(service.stats().timeouts, 2);
}

// ============================================================================
// VALIDATION AND BATCHES
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_rejects_unknown_stakeholder() {
    let (service, sentiment, _) = counting_service();

    let result = service.submit("alien", POSITIVE_COMMENT).await;

    assert_validation_error(&result);
    assert_eq!(sentiment.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_rejects_blank_text() {
    let (service, _, _) = counting_service();
    assert_validation_error(&service.submit("citizen", "   \n\t").await);
    assert_validation_error(&service.submit("citizen", "").await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_batch_skips_invalid_rows() {
    let (service, _, _) = counting_service();
    let rows = vec![
        ("citizen", POSITIVE_COMMENT),
        ("martian", "a perfectly fine comment"),
        ("ngo", "   "),
        ("Business", NEGATIVE_COMMENT),
    ];

    let report = service.process_batch(rows).await.unwrap();

    assert_eq!(report.processed.len(), 2);
    let skipped: Vec<usize> = report.skipped.iter().map(|row| row.index).collect();
    assert_eq!(skipped, vec![1, 2]);
    assert_eq!(report.processed[1].stakeholder_type, StakeholderType::Business);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_batch_aborts_on_storage_failure() {
    let gateway = Arc::new(FailingGateway::new());
    let service = service_with(
        test_pipeline_config(Duration::from_secs(5)),
        Arc::new(CountingSentimentProvider::new(SentimentLabel::Neutral, 0.6)),
        Arc::new(CountingSummaryProvider::new()),
        gateway.clone(),
    );

    let result = service
        .process_batch(vec![("citizen", POSITIVE_COMMENT), ("ngo", NEGATIVE_COMMENT)])
        .await;

    assert_persistence_failure(&result);
    assert_eq!(gateway.attempts(), 1);
    assert_eq!(service.stats().persistence_failures, 1);
    assert_eq!(service.stats().processed, 0);
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_each_store_one_record() {
    let (service, _, _) = counting_service();
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..24 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            // Each text appears three times so cache reads and writes interleave.
            let text = format!("shared opinion number {}", i % 8);
            service.process(StakeholderType::Citizen, &text).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert_record_within_bounds(&record);
        ids.push(record.id);
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 24);
    assert_eq!(service.list(100, 0).await.unwrap().len(), 24);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_identical_texts_race_on_one_entry() {
    let (service, sentiment, summary) = counting_service();
    let service = Arc::new(service);
    let tasks = 16;

    let mut handles = Vec::new();
    for _ in 0..tasks {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.process(StakeholderType::Citizen, POSITIVE_COMMENT).await
        }));
    }

    let mut records = Vec::new();
    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert_record_within_bounds(&record);
        records.push(record);
    }

    let mut ids: Vec<_> = records.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), tasks);
    assert!(records.iter().all(|r| r.sentiment == records[0].sentiment));
    assert!(records.iter().all(|r| r.summary == records[0].summary));

    // In-flight work is not deduplicated, but the cache holds one entry.
    assert_eq!(service.sentiment_cache().len(), 1);
    assert_eq!(service.summary_cache().len(), 1);
    assert!((1..=tasks).contains(&sentiment.calls()));
    assert!((1..=tasks).contains(&summary.calls()));
    assert_eq!(service.stats().processed, tasks as u64);
}

// ============================================================================
// READ SIDE
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dashboard_percentages_and_recent() {
    let service = heuristic_service(Arc::new(InMemoryGateway::new()));
    for _ in 0..4 {
        service.submit("citizen", POSITIVE_COMMENT).await.unwrap();
    }
    for _ in 0..2 {
        service.submit("ngo", NEGATIVE_COMMENT).await.unwrap();
    }

    let dashboard = service.dashboard().await.unwrap();

    assert_eq!(dashboard.total_comments, 6);
    assert!((dashboard.positive_percentage - 66.67).abs() < 1e-9);
    assert!((dashboard.negative_percentage - 33.33).abs() < 1e-9);
    assert_eq!(dashboard.neutral_percentage, 0.0);
    assert_eq!(dashboard.recent_comments.len(), 5);
    let ids: Vec<_> = dashboard.recent_comments.iter().map(|r| r.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);
    assert_eq!(ids[0], 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_empty_dashboard() {
    let (service, _, _) = counting_service();
    let dashboard = service.dashboard().await.unwrap();
    assert_eq!(dashboard.total_comments, 0);
    assert_eq!(dashboard.positive_percentage, 0.0);
    assert!(dashboard.recent_comments.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_reports_fallback_chains() {
    let service = heuristic_service(Arc::new(InMemoryGateway::new()));
    service.submit("citizen", POSITIVE_COMMENT).await.unwrap();

    let report = service.health().await;

    assert_eq!(report.status, HealthStatus::Degraded);
    assert_eq!(
        report.check("sentiment_provider").unwrap().status,
        HealthStatus::Degraded
    );
    let store = report.check("store").unwrap();
    assert_eq!(store.status, HealthStatus::Healthy);
    assert_eq!(store.metadata["records"], 1);
    assert_eq!(store.metadata["backend"], "memory");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_reports_store_failure() {
    let service = service_with(
        test_pipeline_config(Duration::from_secs(5)),
        Arc::new(CountingSentimentProvider::new(SentimentLabel::Neutral, 0.6)),
        Arc::new(CountingSummaryProvider::new()),
        Arc::new(FailingGateway::new()),
    );

    let report = service.health().await;

    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert_eq!(report.check("store").unwrap().status, HealthStatus::Unhealthy);
    assert_eq!(
        report.check("summary_provider").unwrap().status,
        HealthStatus::Healthy
    );
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

mod prop_tests {
    use super::*;
    use econsult_test_utils::generators::{arb_comment_text, arb_oversized_text, arb_stakeholder_type};
    use proptest::prelude::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: every stored record respects the text, summary and score bounds
        #[test]
        fn prop_records_within_bounds(
            stakeholder in arb_stakeholder_type(),
            text in prop_oneof![arb_comment_text(), arb_oversized_text()],
        ) {
            let rt = runtime();
            rt.block_on(async {
                let service = heuristic_service(Arc::new(InMemoryGateway::new()));
                match service.process(stakeholder, &text).await {
                    Ok(record) => {
                        assert_record_within_bounds(&record);
                        assert_eq!(record.stakeholder_type, stakeholder);
                    }
                    Err(e) => {
                        // Only whitespace-only text may be refused.
                        assert!(text.trim().is_empty(), "unexpected error: {}", e);
                    }
                }
            });
        }

        /// Property: identical text yields identical artifacts
        #[test]
        fn prop_same_text_same_artifacts(text in arb_comment_text()) {
            prop_assume!(!text.trim().is_empty());
            let rt = runtime();
            rt.block_on(async {
                let service = heuristic_service(Arc::new(InMemoryGateway::new()));
                let first = service.process(StakeholderType::Citizen, &text).await.unwrap();
                let second = service.process(StakeholderType::Academic, &text).await.unwrap();
                assert_eq!(first.sentiment, second.sentiment);
                assert_eq!(first.summary, second.summary);
            });
        }
    }
}
