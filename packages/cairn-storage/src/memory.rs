use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use uuid::Uuid;

use cairn_domain::{
	BoxFuture, Chunk, ChunkHit, ChunkStore, Collection, KeywordSearch, QueryFilters, StoreResult,
	VectorSearch,
};

/// In-process chunk store backing all three read capabilities. Writes take
/// the write lock once per batch, so concurrent readers observe either the
/// previous or the new chunk set, never a partial batch.
#[derive(Default)]
pub struct MemoryStore {
	inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
	chunks: Vec<Chunk>,
	by_id: HashMap<Uuid, usize>,
	sources: HashSet<String>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn chunk_count(&self) -> usize {
		self.inner.read().await.chunks.len()
	}

	/// Copy of the current chunk set, in insertion order.
	pub async fn snapshot(&self) -> Vec<Chunk> {
		self.inner.read().await.chunks.clone()
	}

	async fn scan<F>(
		&self,
		top_k: u32,
		collections: &[Collection],
		filters: &QueryFilters,
		score: F,
	) -> Vec<ChunkHit>
	where
		F: Fn(&Chunk) -> Option<f32>,
	{
		let inner = self.inner.read().await;
		let mut hits: Vec<ChunkHit> = inner
			.chunks
			.iter()
			.filter(|chunk| collections.contains(&chunk.collection))
			.filter(|chunk| filters.matches(chunk))
			.filter_map(|chunk| {
				score(chunk).map(|score| ChunkHit { chunk_id: chunk.id, score })
			})
			.collect();

		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(top_k as usize);

		hits
	}
}

impl VectorSearch for MemoryStore {
	fn query<'a>(
		&'a self,
		embedding: &'a [f32],
		top_k: u32,
		collections: &'a [Collection],
		filters: &'a QueryFilters,
	) -> BoxFuture<'a, StoreResult<Vec<ChunkHit>>> {
		Box::pin(async move {
			let hits = self
				.scan(top_k, collections, filters, |chunk| {
					chunk
						.embedding
						.as_deref()
						.filter(|stored| stored.len() == embedding.len())
						.map(|stored| cosine_similarity(embedding, stored))
				})
				.await;

			Ok(hits)
		})
	}
}

impl KeywordSearch for MemoryStore {
	fn query<'a>(
		&'a self,
		text: &'a str,
		top_k: u32,
		collections: &'a [Collection],
		filters: &'a QueryFilters,
	) -> BoxFuture<'a, StoreResult<Vec<ChunkHit>>> {
		Box::pin(async move {
			let terms = tokenize(text);
			let hits = self
				.scan(top_k, collections, filters, |chunk| {
					let score = keyword_overlap(&terms, &chunk.content);

					(score > 0.0).then_some(score)
				})
				.await;

			Ok(hits)
		})
	}
}

impl ChunkStore for MemoryStore {
	fn get<'a>(&'a self, chunk_id: Uuid) -> BoxFuture<'a, StoreResult<Option<Chunk>>> {
		Box::pin(async move {
			let inner = self.inner.read().await;

			Ok(inner.by_id.get(&chunk_id).map(|idx| inner.chunks[*idx].clone()))
		})
	}

	fn put<'a>(&'a self, chunks: Vec<Chunk>) -> BoxFuture<'a, StoreResult<()>> {
		Box::pin(async move {
			let mut inner = self.inner.write().await;

			for chunk in chunks {
				let slot = inner.chunks.len();

				inner.sources.insert(chunk.source_id.clone());
				inner.by_id.insert(chunk.id, slot);
				inner.chunks.push(chunk);
			}

			Ok(())
		})
	}

	fn source_exists<'a>(&'a self, source_id: &'a str) -> BoxFuture<'a, StoreResult<bool>> {
		Box::pin(async move { Ok(self.inner.read().await.sources.contains(source_id)) })
	}
}

/// Cosine similarity shifted into [0, 1] so it is comparable with the
/// pipeline's similarity threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	let mut dot = 0.0_f64;
	let mut norm_a = 0.0_f64;
	let mut norm_b = 0.0_f64;

	for (x, y) in a.iter().zip(b.iter()) {
		dot += f64::from(*x) * f64::from(*y);
		norm_a += f64::from(*x) * f64::from(*x);
		norm_b += f64::from(*y) * f64::from(*y);
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());

	(((cosine + 1.0) / 2.0) as f32).clamp(0.0, 1.0)
}

fn tokenize(text: &str) -> Vec<String> {
	let mut normalized = String::with_capacity(text.len());

	for ch in text.chars() {
		if ch.is_alphanumeric() {
			normalized.extend(ch.to_lowercase());
		} else {
			normalized.push(' ');
		}
	}

	let mut out = Vec::new();
	let mut seen = HashSet::new();

	for token in normalized.split_whitespace() {
		if token.len() < 2 {
			continue;
		}
		if seen.insert(token.to_string()) {
			out.push(token.to_string());
		}
	}

	out
}

/// Share of distinct query terms present in the chunk content.
fn keyword_overlap(terms: &[String], content: &str) -> f32 {
	if terms.is_empty() {
		return 0.0;
	}

	let content = content.to_lowercase();
	let matched = terms.iter().filter(|term| content.contains(term.as_str())).count();

	matched as f32 / terms.len() as f32
}
