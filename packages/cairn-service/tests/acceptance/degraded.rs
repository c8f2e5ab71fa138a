use std::sync::{Arc, atomic::AtomicUsize};

use cairn_domain::{
	BoxFuture, ChunkHit, ChunkStore, Collection, KeywordSearch, QueryFilters, QueryType, StoreError,
	StoreResult, VectorSearch,
};
use cairn_service::{
	CairnService, DocumentMetadata, IngestRequest, Providers, SearchRequest, ServiceError, Stores,
};
use cairn_storage::{MemoryEvalStore, MemoryStore};
use cairn_testkit::{FailingEmbedding, FailingGenerator, MappedEmbedding, StubGenerator,
	StubWebSearch, build_service, test_config};

use crate::acceptance::{seed_chunk, vector_with_cosine};

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

fn request(query: &str) -> SearchRequest {
	SearchRequest {
		query: query.to_string(),
		query_type: Some(QueryType::General),
		top_k: None,
		use_web_search: None,
		web_search_only: None,
		filters: None,
	}
}

#[tokio::test]
async fn embedding_outage_falls_back_for_every_text_in_the_batch() {
	let calls = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(FailingEmbedding { calls: calls.clone() }),
		Arc::new(StubGenerator::new("Degraded but alive [1].")),
		Arc::new(StubWebSearch { hits: Vec::new() }),
	);
	let (service, store, _) = build_service(test_config(64), providers);

	// Five windows: stride is 800 with the default 1000/200 chunking.
	let content = "TechCorp funding news update. ".repeat(120);
	let response = service
		.ingest(IngestRequest {
			content,
			document_type: None,
			metadata: DocumentMetadata::default(),
		})
		.await
		.expect("ingest failed");

	assert_eq!(response.chunks_created, 5);

	let stored = store.snapshot().await;

	assert_eq!(stored.len(), 5);

	for chunk in &stored {
		let embedding = chunk.embedding.as_ref().expect("missing embedding");

		assert_eq!(embedding.len(), 64);
	}

	// The degraded query still completes end to end.
	let result = service
		.search(request("TechCorp funding news"))
		.await
		.expect("search failed in degraded mode");

	assert!(result.confidence_score >= 0.0);
}

#[tokio::test]
async fn identical_text_retrieves_under_fallback_embeddings() {
	let providers = Providers::new(
		Arc::new(FailingEmbedding { calls: Arc::new(AtomicUsize::new(0)) }),
		Arc::new(StubGenerator::new("Found it [1].")),
		Arc::new(StubWebSearch { hits: Vec::new() }),
	);
	let (service, store, _) = build_service(test_config(64), providers);
	let text = "TechCorp AI raised a $50M Series B round.";

	service
		.ingest(IngestRequest {
			content: text.to_string(),
			document_type: None,
			metadata: DocumentMetadata::default(),
		})
		.await
		.expect("ingest failed");

	assert_eq!(store.chunk_count().await, 1);

	// Fallback vectors are deterministic, so the same text embeds to the
	// same vector and similarity is exact.
	let result = service.search(request(text)).await.expect("search failed");

	assert_eq!(result.retrieved_chunks, 1);
	assert_eq!(result.citations.len(), 1);
}

#[tokio::test]
async fn generation_failure_is_fatal_for_the_query() {
	let query = "Tell me about TechCorp";
	let providers = Providers::new(
		Arc::new(MappedEmbedding::new(2).with_vector(query, vec![1.0, 0.0])),
		Arc::new(FailingGenerator),
		Arc::new(StubWebSearch { hits: Vec::new() }),
	);
	let (service, store, _) = build_service(test_config(2), providers);

	store
		.put(vec![seed_chunk(
			"TechCorp builds accelerators.",
			Collection::Startup,
			vector_with_cosine(0.9),
		)])
		.await
		.expect("put failed");

	let result = service.search(request(query)).await;

	assert!(matches!(result, Err(ServiceError::Generation { .. })));
}

#[tokio::test]
async fn both_search_paths_down_surfaces_a_retrieval_error() {
	let index = Arc::new(DownIndex);
	let store = Arc::new(MemoryStore::new());
	let stores = Stores {
		vector: index.clone(),
		keyword: index,
		chunks: store,
		evaluation: Arc::new(MemoryEvalStore::new()),
	};
	let providers = Providers::new(
		Arc::new(MappedEmbedding::new(2)),
		Arc::new(StubGenerator::new("unused")),
		Arc::new(StubWebSearch { hits: Vec::new() }),
	);
	let service = CairnService::with_providers(test_config(2), stores, providers);

	let result = service.search(request("anything")).await;

	assert!(matches!(result, Err(ServiceError::Retrieval { .. })));
}
