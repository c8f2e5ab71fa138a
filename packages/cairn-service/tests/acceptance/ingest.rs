use cairn_domain::{Collection, EntityRefs};
use cairn_service::{DocumentMetadata, IngestRequest, IngestStatus, ServiceError};
use cairn_testkit::{build_service, test_config};

use crate::acceptance::aligned_providers;

fn article(content: &str, url: Option<&str>) -> IngestRequest {
	IngestRequest {
		content: content.to_string(),
		document_type: Some("article".to_string()),
		metadata: DocumentMetadata {
			title: Some("TechCorp coverage".to_string()),
			url: url.map(str::to_string),
			..DocumentMetadata::default()
		},
	}
}

#[tokio::test]
async fn reingesting_identical_content_creates_no_duplicate_chunks() {
	let providers = aligned_providers("unused", "unused");
	let (service, store, _) = build_service(test_config(2), providers);
	let request = article("TechCorp AI raised a $50M Series B round.", None);

	let first = service.ingest(request.clone()).await.expect("ingest failed");
	let count_after_first = store.chunk_count().await;
	let second = service.ingest(request).await.expect("re-ingest failed");

	assert_eq!(first.status, IngestStatus::Created);
	assert_eq!(first.chunks_created, 1);
	assert_eq!(second.status, IngestStatus::Skipped);
	assert_eq!(second.chunks_created, 0);
	assert_eq!(second.document_id, first.document_id);
	assert_eq!(store.chunk_count().await, count_after_first);
}

#[tokio::test]
async fn url_metadata_drives_the_document_id() {
	let providers = aligned_providers("unused", "unused");
	let (service, _, _) = build_service(test_config(2), providers);

	let by_url = service
		.ingest(article("First crawl of the page.", Some("https://techcrunch.com/techcorp")))
		.await
		.expect("ingest failed");
	let recrawl = service
		.ingest(article("Second crawl, same page.", Some("https://techcrunch.com/techcorp")))
		.await
		.expect("ingest failed");

	assert_eq!(by_url.status, IngestStatus::Created);
	assert_eq!(recrawl.status, IngestStatus::Skipped);
	assert_eq!(recrawl.document_id, by_url.document_id);
}

#[tokio::test]
async fn long_documents_chunk_with_sequential_indices() {
	let providers = aligned_providers("unused", "unused");
	let (service, store, _) = build_service(test_config(2), providers);
	let content = "TechCorp shipped another accelerator revision. ".repeat(80);
	let response = service
		.ingest(article(&content, None))
		.await
		.expect("ingest failed");

	assert!(response.chunks_created > 1);

	let stored = store.snapshot().await;
	let mut indices: Vec<i32> = stored.iter().map(|chunk| chunk.chunk_index).collect();

	indices.sort_unstable();

	let expected: Vec<i32> = (0..response.chunks_created as i32).collect();

	assert_eq!(indices, expected);
	assert!(stored.iter().all(|chunk| chunk.source_id == response.document_id));
	assert!(stored.iter().all(|chunk| chunk.source_title == "TechCorp coverage"));
}

#[tokio::test]
async fn entity_references_route_documents_to_their_collection() {
	let providers = aligned_providers("unused", "unused");
	let (service, store, _) = build_service(test_config(2), providers);

	service
		.ingest(IngestRequest {
			content: "Example Ventures led the round.".to_string(),
			document_type: Some("press_release".to_string()),
			metadata: DocumentMetadata {
				title: Some("Round announcement".to_string()),
				entity_refs: EntityRefs {
					round_id: Some("round-7".to_string()),
					startup_id: Some("techcorp".to_string()),
					..EntityRefs::default()
				},
				..DocumentMetadata::default()
			},
		})
		.await
		.expect("ingest failed");

	let stored = store.snapshot().await;

	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].collection, Collection::Funding);
	assert_eq!(stored[0].source_type, "press_release");
	assert_eq!(stored[0].entity_refs.round_id.as_deref(), Some("round-7"));
}

#[tokio::test]
async fn empty_content_is_rejected() {
	let providers = aligned_providers("unused", "unused");
	let (service, _, _) = build_service(test_config(2), providers);

	let result = service.ingest(article("   \n\t  ", None)).await;

	assert!(matches!(result, Err(ServiceError::InvalidRequest { .. })));
}
