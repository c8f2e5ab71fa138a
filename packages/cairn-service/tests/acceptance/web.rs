use std::sync::Arc;

use cairn_domain::{ChunkStore, Collection, QueryType, SearchMode, WebHit};
use cairn_service::{Providers, SearchRequest};
use cairn_testkit::{
	FailingWebSearch, MappedEmbedding, StubGenerator, StubWebSearch, build_service, test_config,
};

use crate::acceptance::{seed_chunk, vector_with_cosine};

fn web_hits() -> Vec<WebHit> {
	vec![
		WebHit {
			title: "TechCorp raises $50M".to_string(),
			url: "https://techcrunch.com/techcorp-series-b".to_string(),
			snippet: "TechCorp announced a $50M Series B this morning.".to_string(),
			rank: 0,
		},
		WebHit {
			title: "Series B analysis".to_string(),
			url: "https://crunchbase.com/techcorp".to_string(),
			snippet: "An analysis of TechCorp's latest round.".to_string(),
			rank: 1,
		},
	]
}

fn request(query: &str, web_only: bool) -> SearchRequest {
	SearchRequest {
		query: query.to_string(),
		query_type: Some(QueryType::StartupSearch),
		top_k: None,
		use_web_search: Some(true),
		web_search_only: Some(web_only),
		filters: None,
	}
}

#[tokio::test]
async fn web_only_search_skips_local_retrieval() {
	let query = "TechCorp Series B";
	let providers = Providers::new(
		Arc::new(MappedEmbedding::new(2).with_vector(query, vec![1.0, 0.0])),
		Arc::new(StubGenerator::new("TechCorp raised $50M [1].")),
		Arc::new(StubWebSearch { hits: web_hits() }),
	);
	let mut cfg = test_config(2);

	cfg.web.enabled = true;

	let (service, store, _) = build_service(cfg, providers);

	// Local data exists but must not be consulted.
	store
		.put(vec![seed_chunk(
			"Local TechCorp chunk.",
			Collection::Startup,
			vector_with_cosine(0.95),
		)])
		.await
		.expect("put failed");

	let result = service.search(request(query, true)).await.expect("search failed");

	assert_eq!(result.metadata.search_mode, SearchMode::WebOnly);
	assert_eq!(result.metadata.local_count, 0);
	assert_eq!(result.metadata.web_count, 2);
	assert!(result.metadata.collections_searched.is_empty());
	assert_eq!(result.citations.len(), 1);
	assert_eq!(
		result.citations[0].source_url.as_deref(),
		Some("https://techcrunch.com/techcorp-series-b")
	);
	assert_eq!(result.citations[0].source_type, "web_search");
}

#[tokio::test]
async fn web_results_merge_with_local_results() {
	let query = "TechCorp Series B";
	let providers = Providers::new(
		Arc::new(MappedEmbedding::new(2).with_vector(query, vec![1.0, 0.0])),
		Arc::new(StubGenerator::new("Hybrid answer [1][2].")),
		Arc::new(StubWebSearch { hits: web_hits() }),
	);
	let mut cfg = test_config(2);

	cfg.web.enabled = true;

	let (service, store, _) = build_service(cfg, providers);

	store
		.put(vec![seed_chunk(
			"TechCorp Series B local coverage.",
			Collection::Startup,
			vector_with_cosine(0.9),
		)])
		.await
		.expect("put failed");

	let result = service.search(request(query, false)).await.expect("search failed");

	assert_eq!(result.metadata.search_mode, SearchMode::Hybrid);
	assert_eq!(result.metadata.local_count, 1);
	assert_eq!(result.metadata.web_count, 2);
	assert_eq!(result.retrieved_chunks, 3);

	// The top web hit carries relevance 1.0 and outranks the local chunk.
	assert!(result.citations[0].source_url.is_some());
}

#[tokio::test]
async fn web_failure_degrades_to_local_results() {
	let query = "TechCorp Series B";
	let providers = Providers::new(
		Arc::new(MappedEmbedding::new(2).with_vector(query, vec![1.0, 0.0])),
		Arc::new(StubGenerator::new("Local answer [1].")),
		Arc::new(FailingWebSearch),
	);
	let mut cfg = test_config(2);

	cfg.web.enabled = true;

	let (service, store, _) = build_service(cfg, providers);

	store
		.put(vec![seed_chunk(
			"TechCorp Series B local coverage.",
			Collection::Startup,
			vector_with_cosine(0.9),
		)])
		.await
		.expect("put failed");

	let result = service.search(request(query, false)).await.expect("search failed");

	assert_eq!(result.metadata.local_count, 1);
	assert_eq!(result.metadata.web_count, 0);
	assert_eq!(result.citations.len(), 1);
}

#[tokio::test]
async fn web_candidates_bypass_the_similarity_floor() {
	let query = "TechCorp Series B";
	let hits = vec![WebHit {
		title: "Low ranked".to_string(),
		url: "https://techcrunch.com/low".to_string(),
		snippet: "A low-relevance mention of TechCorp.".to_string(),
		rank: 4,
	}];
	let providers = Providers::new(
		Arc::new(MappedEmbedding::new(2).with_vector(query, vec![1.0, 0.0])),
		Arc::new(StubGenerator::new("Thin sourcing [1].")),
		Arc::new(StubWebSearch { hits }),
	);
	let mut cfg = test_config(2);

	cfg.web.enabled = true;

	let (service, _, _) = build_service(cfg, providers);
	let result = service.search(request(query, true)).await.expect("search failed");

	// Relevance 1/5 would fail the 0.7 local floor; web origin keeps it.
	assert_eq!(result.retrieved_chunks, 1);
	assert_eq!(result.citations.len(), 1);
	assert!(result.citations[0].confidence_score < 0.7);
}

#[tokio::test]
async fn web_only_is_rejected_when_web_search_is_disabled() {
	let providers = Providers::new(
		Arc::new(MappedEmbedding::new(2)),
		Arc::new(StubGenerator::new("unused")),
		Arc::new(StubWebSearch { hits: Vec::new() }),
	);
	let (service, _, _) = build_service(test_config(2), providers);

	let result = service.search(request("anything", true)).await;

	assert!(matches!(result, Err(cairn_service::ServiceError::InvalidRequest { .. })));
}

#[tokio::test]
async fn local_failure_with_live_web_degrades_to_web_results() {
	use cairn_domain::{BoxFuture, ChunkHit, KeywordSearch, QueryFilters, StoreError, StoreResult,
		VectorSearch};
	use cairn_service::{CairnService, Stores};
	use cairn_storage::{MemoryEvalStore, MemoryStore};

	struct DownIndex;

	impl VectorSearch for DownIndex {
		fn query<'a>(
			&'a self,
			_embedding: &'a [f32],
			_top_k: u32,
			_collections: &'a [Collection],
			_filters: &'a QueryFilters,
		) -> BoxFuture<'a, StoreResult<Vec<ChunkHit>>> {
			Box::pin(async move {
				Err(StoreError::Unavailable { message: "vector index offline".to_string() })
			})
		}
	}

	impl KeywordSearch for DownIndex {
		fn query<'a>(
			&'a self,
			_text: &'a str,
			_top_k: u32,
			_collections: &'a [Collection],
			_filters: &'a QueryFilters,
		) -> BoxFuture<'a, StoreResult<Vec<ChunkHit>>> {
			Box::pin(async move {
				Err(StoreError::Unavailable { message: "keyword index offline".to_string() })
			})
		}
	}

	let index = Arc::new(DownIndex);
	let stores = Stores {
		vector: index.clone(),
		keyword: index,
		chunks: Arc::new(MemoryStore::new()),
		evaluation: Arc::new(MemoryEvalStore::new()),
	};
	let providers = Providers::new(
		Arc::new(MappedEmbedding::new(2)),
		Arc::new(StubGenerator::new("Web-sourced answer [1].")),
		Arc::new(StubWebSearch { hits: web_hits() }),
	);
	let mut cfg = test_config(2);

	cfg.web.enabled = true;

	let service = CairnService::with_providers(cfg, stores, providers);
	let result = service.search(request("TechCorp Series B", false)).await.expect("search failed");

	assert_eq!(result.metadata.local_count, 0);
	assert_eq!(result.metadata.web_count, 2);
	assert_eq!(result.citations.len(), 1);
}
