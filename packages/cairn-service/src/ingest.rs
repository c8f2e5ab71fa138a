use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use cairn_chunking::{ChunkingConfig, normalize_whitespace, split_text};
use cairn_domain::{Chunk, EntityRefs};

use crate::{CairnService, ServiceError, ServiceResult};

/// Leading-content window hashed into a document id when no URL is present.
const SOURCE_ID_CONTENT_CHARS: usize = 1_000;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DocumentMetadata {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, with = "cairn_domain::time_serde::option")]
	pub published_date: Option<OffsetDateTime>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub industry: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stage: Option<String>,
	#[serde(default)]
	pub entity_refs: EntityRefs,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IngestRequest {
	pub content: String,
	#[serde(default)]
	pub document_type: Option<String>,
	#[serde(default)]
	pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
	Created,
	Skipped,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IngestResponse {
	pub status: IngestStatus,
	pub document_id: String,
	pub chunks_created: u32,
}

impl CairnService {
	pub async fn ingest(&self, req: IngestRequest) -> ServiceResult<IngestResponse> {
		let content = normalize_whitespace(&req.content);

		if content.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Document content must be non-empty.".to_string(),
			});
		}

		let document_id = derive_source_id(&content, req.metadata.url.as_deref());

		if self.stores.chunks.source_exists(&document_id).await? {
			info!(document_id = document_id.as_str(), "Document already ingested; skipping.");

			return Ok(IngestResponse {
				status: IngestStatus::Skipped,
				document_id,
				chunks_created: 0,
			});
		}

		let chunking = ChunkingConfig {
			chunk_size: self.cfg.chunking.chunk_size as usize,
			chunk_overlap: self.cfg.chunking.chunk_overlap as usize,
			sentence_aware: self.cfg.chunking.sentence_aware,
		};
		let pieces = split_text(&content, &chunking)
			.map_err(|err| ServiceError::InvalidRequest { message: err.to_string() })?;
		let texts: Vec<String> = pieces.iter().map(|piece| piece.text.clone()).collect();
		let embeddings = self.embed_texts(&texts).await;

		let metadata = &req.metadata;
		let source_type = req.document_type.clone().unwrap_or_else(|| "article".to_string());
		let source_title = metadata.title.clone().unwrap_or_else(|| "Unknown".to_string());
		let collection = metadata.entity_refs.collection();
		let chunks: Vec<Chunk> = pieces
			.into_iter()
			.zip(embeddings)
			.map(|(piece, embedding)| Chunk {
				id: Uuid::new_v4(),
				content: piece.text,
				source_id: document_id.clone(),
				source_type: source_type.clone(),
				source_title: source_title.clone(),
				source_url: metadata.url.clone(),
				collection,
				chunk_index: piece.chunk_index,
				embedding: Some(embedding),
				entity_refs: metadata.entity_refs.clone(),
				industry: metadata.industry.clone(),
				stage: metadata.stage.clone(),
				published_date: metadata.published_date,
			})
			.collect();
		let chunks_created = chunks.len() as u32;

		self.stores.chunks.put(chunks).await?;

		info!(
			document_id = document_id.as_str(),
			chunks_created,
			collection = collection.as_str(),
			"Document ingested."
		);

		Ok(IngestResponse { status: IngestStatus::Created, document_id, chunks_created })
	}
}

/// Stable document id: the URL hash when a URL is present, otherwise a hash
/// of the leading content. Re-ingesting identical input derives the same id.
fn derive_source_id(content: &str, url: Option<&str>) -> String {
	match url.filter(|url| !url.trim().is_empty()) {
		Some(url) => blake3::hash(url.trim().as_bytes()).to_hex().to_string(),
		None => {
			let head_end = content
				.char_indices()
				.nth(SOURCE_ID_CONTENT_CHARS)
				.map(|(offset, _)| offset)
				.unwrap_or(content.len());

			format!("doc_{}", blake3::hash(content[..head_end].as_bytes()).to_hex())
		},
	}
}
