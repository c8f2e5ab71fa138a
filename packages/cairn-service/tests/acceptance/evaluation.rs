use std::time::Duration;

use cairn_domain::{ChunkStore, Collection, EvaluationStore, QueryType};
use cairn_service::SearchRequest;
use cairn_testkit::{build_service, test_config};

use crate::acceptance::{aligned_providers, seed_chunk, vector_with_cosine};

fn request(query: &str, query_type: QueryType) -> SearchRequest {
	SearchRequest {
		query: query.to_string(),
		query_type: Some(query_type),
		top_k: None,
		use_web_search: None,
		web_search_only: None,
		filters: None,
	}
}

/// The log append runs on a detached task; poll briefly instead of assuming
/// it landed before the response returned.
async fn wait_for_records(
	store: &cairn_storage::MemoryEvalStore,
	expected: usize,
) -> Vec<cairn_domain::QueryLog> {
	for _ in 0..100 {
		let records = store.query(None).await.expect("query failed");

		if records.len() >= expected {
			return records;
		}

		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	panic!("Evaluation log never reached {expected} records.");
}

#[tokio::test]
async fn completed_queries_are_logged_without_blocking_the_response() {
	let query = "Tell me about TechCorp";
	let providers = aligned_providers(query, "TechCorp builds accelerators [1].");
	let (service, store, evaluation) = build_service(test_config(2), providers);

	store
		.put(vec![seed_chunk(
			"TechCorp builds inference accelerators.",
			Collection::Startup,
			vector_with_cosine(0.9),
		)])
		.await
		.expect("put failed");

	let result =
		service.search(request(query, QueryType::StartupSearch)).await.expect("search failed");
	let records = wait_for_records(&evaluation, 1).await;

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].query, query);
	assert_eq!(records[0].query_type, QueryType::StartupSearch);
	assert_eq!(records[0].retrieved_chunks, result.retrieved_chunks);
	assert_eq!(records[0].citations_count, result.citations.len() as u32);
	assert!(records[0].processing_time_ms >= 0.0);
}

#[tokio::test]
async fn aggregation_reports_means_and_a_query_type_histogram() {
	let query = "Tell me about TechCorp";
	let providers = aligned_providers(query, "TechCorp builds accelerators [1].");
	let (service, store, evaluation) = build_service(test_config(2), providers);

	store
		.put(vec![seed_chunk(
			"TechCorp builds inference accelerators.",
			Collection::Startup,
			vector_with_cosine(0.9),
		)])
		.await
		.expect("put failed");

	for query_type in [QueryType::StartupSearch, QueryType::StartupSearch, QueryType::General] {
		service.search(request(query, query_type)).await.expect("search failed");
	}

	wait_for_records(&evaluation, 3).await;

	let metrics = service.aggregate_metrics(None).await.expect("aggregation failed");

	assert_eq!(metrics.total_queries, 3);
	assert_eq!(metrics.query_type_distribution["startup_search"], 2);
	assert_eq!(metrics.query_type_distribution["general"], 1);
	assert!(metrics.avg_confidence_score > 0.0);
	assert!(metrics.avg_retrieved_chunks >= 1.0);

	// Windowed reads bound the aggregation without touching the log.
	let windowed = service.aggregate_metrics(Some(1)).await.expect("aggregation failed");

	assert_eq!(windowed.total_queries, 1);
	assert_eq!(wait_for_records(&evaluation, 3).await.len(), 3);
}

#[tokio::test]
async fn logging_can_be_disabled_without_affecting_results() {
	let query = "Tell me about TechCorp";
	let providers = aligned_providers(query, "TechCorp builds accelerators [1].");
	let mut cfg = test_config(2);

	cfg.evaluation.enabled = false;

	let (service, store, evaluation) = build_service(cfg, providers);

	store
		.put(vec![seed_chunk(
			"TechCorp builds inference accelerators.",
			Collection::Startup,
			vector_with_cosine(0.9),
		)])
		.await
		.expect("put failed");

	let result =
		service.search(request(query, QueryType::General)).await.expect("search failed");

	assert_eq!(result.citations.len(), 1);

	tokio::time::sleep(Duration::from_millis(50)).await;

	assert!(evaluation.query(None).await.expect("query failed").is_empty());
}
