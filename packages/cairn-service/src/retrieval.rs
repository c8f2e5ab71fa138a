use std::time::Duration;

use ahash::AHashMap;
use tracing::warn;
use uuid::Uuid;

use cairn_domain::{Candidate, ChunkHit, Collection, Origin, QueryFilters};

use crate::{CairnService, ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, Default)]
struct PathScores {
	vector: Option<f32>,
	keyword: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HybridScore {
	pub similarity: f32,
	pub keyword: f32,
	pub combined: f32,
}

impl CairnService {
	/// Runs the vector and keyword paths concurrently, merges their hits by
	/// chunk id, applies the similarity floor, and returns the top `top_k`
	/// local candidates. Fails only when both paths are down.
	pub(crate) async fn retrieve_local(
		&self,
		query: &str,
		embedding: &[f32],
		top_k: u32,
		collections: &[Collection],
		filters: &QueryFilters,
	) -> ServiceResult<Vec<Candidate>> {
		let retrieval = &self.cfg.retrieval;
		let candidate_k = top_k.saturating_mul(2);
		let timeout = Duration::from_millis(retrieval.search_timeout_ms);
		let (vector_outcome, keyword_outcome) = tokio::join!(
			tokio::time::timeout(
				timeout,
				self.stores.vector.query(embedding, candidate_k, collections, filters),
			),
			tokio::time::timeout(
				timeout,
				self.stores.keyword.query(query, candidate_k, collections, filters),
			),
		);
		let vector_hits = settle_path(vector_outcome, "vector");
		let keyword_hits = settle_path(keyword_outcome, "keyword");

		if vector_hits.is_none() && keyword_hits.is_none() {
			return Err(ServiceError::Retrieval {
				message: "Both vector and keyword search paths are unavailable.".to_string(),
			});
		}

		let merged = merge_hits(vector_hits.as_deref(), keyword_hits.as_deref());
		let mut candidates = Vec::with_capacity(merged.len());

		for (chunk_id, scores) in merged {
			let Some(score) = hybrid_score(
				scores.vector,
				scores.keyword,
				retrieval.vector_weight,
				retrieval.keyword_weight,
				retrieval.similarity_threshold,
			) else {
				continue;
			};
			let Some(chunk) = self.stores.chunks.get(chunk_id).await? else {
				warn!(chunk_id = %chunk_id, "Retrieved chunk is missing from the chunk store.");

				continue;
			};

			candidates.push(Candidate {
				chunk_id: Some(chunk.id),
				source_id: chunk.source_id,
				source_type: chunk.source_type,
				source_title: chunk.source_title,
				source_url: chunk.source_url,
				chunk_index: chunk.chunk_index,
				published_date: chunk.published_date,
				content: chunk.content,
				similarity_score: score.similarity,
				keyword_score: score.keyword,
				combined_score: score.combined,
				origin: Origin::Local,
			});
		}

		rank_candidates(&mut candidates);
		candidates.truncate(top_k as usize);

		Ok(candidates)
	}
}

fn settle_path(
	outcome: Result<cairn_domain::StoreResult<Vec<ChunkHit>>, tokio::time::error::Elapsed>,
	path: &str,
) -> Option<Vec<ChunkHit>> {
	match outcome {
		Ok(Ok(hits)) => Some(hits),
		Ok(Err(err)) => {
			warn!(error = %err, path, "Search path failed; continuing without it.");

			None
		},
		Err(_) => {
			warn!(path, "Search path timed out; continuing without it.");

			None
		},
	}
}

fn merge_hits(
	vector_hits: Option<&[ChunkHit]>,
	keyword_hits: Option<&[ChunkHit]>,
) -> AHashMap<Uuid, PathScores> {
	let mut merged: AHashMap<Uuid, PathScores> = AHashMap::new();

	for hit in vector_hits.unwrap_or_default() {
		merged.entry(hit.chunk_id).or_default().vector = Some(hit.score.clamp(0.0, 1.0));
	}
	for hit in keyword_hits.unwrap_or_default() {
		merged.entry(hit.chunk_id).or_default().keyword = Some(hit.score.clamp(0.0, 1.0));
	}

	merged
}

/// Weighted blend of the two path scores; a side the paths did not score
/// contributes 0. The similarity floor applies only to candidates the vector
/// path actually measured — keyword-only candidates have no comparable
/// similarity, like web results.
fn hybrid_score(
	vector: Option<f32>,
	keyword: Option<f32>,
	vector_weight: f32,
	keyword_weight: f32,
	similarity_threshold: f32,
) -> Option<HybridScore> {
	if vector.map(|similarity| similarity < similarity_threshold).unwrap_or(false) {
		return None;
	}

	let similarity = vector.unwrap_or(0.0);
	let keyword = keyword.unwrap_or(0.0);
	let combined = (vector_weight * similarity + keyword_weight * keyword).clamp(0.0, 1.0);

	Some(HybridScore { similarity, keyword, combined })
}

/// Deterministic order: combined score descending, then more recent
/// published date, then chunk index ascending.
pub(crate) fn rank_candidates(candidates: &mut [Candidate]) {
	candidates.sort_by(|a, b| {
		b.combined_score
			.partial_cmp(&a.combined_score)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| b.published_date.cmp(&a.published_date))
			.then_with(|| a.chunk_index.cmp(&b.chunk_index))
	});
}
