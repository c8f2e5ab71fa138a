use std::time::Duration;

use tracing::warn;

use cairn_providers::fallback::fallback_embedding;

use crate::CairnService;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

impl CairnService {
	/// Embeds texts in provider-sized batches. A batch that fails after one
	/// retry degrades to deterministic fallback vectors instead of failing
	/// the caller; every returned vector has the configured dimensionality.
	pub(crate) async fn embed_texts(&self, texts: &[String]) -> Vec<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let batch_size = (cfg.batch_size as usize).max(1);
		let mut out = Vec::with_capacity(texts.len());

		for batch in texts.chunks(batch_size) {
			match self.embed_batch(batch).await {
				Some(vectors) => out.extend(vectors),
				None => {
					warn!(
						batch_len = batch.len(),
						provider_id = cfg.provider_id.as_str(),
						"Embedding provider unavailable; using fallback vectors."
					);

					out.extend(
						batch
							.iter()
							.map(|text| fallback_embedding(text, cfg.dimensions as usize)),
					);
				},
			}
		}

		out
	}

	pub(crate) async fn embed_single(&self, text: &str) -> Vec<f32> {
		let mut vectors = self.embed_texts(std::slice::from_ref(&text.to_string())).await;

		vectors.pop().unwrap_or_else(|| {
			fallback_embedding(text, self.cfg.providers.embedding.dimensions as usize)
		})
	}

	/// One call plus one retry with backoff; `None` means the batch must
	/// degrade. Dimension mismatches count as failures so shape errors never
	/// leak downstream.
	async fn embed_batch(&self, batch: &[String]) -> Option<Vec<Vec<f32>>> {
		let cfg = &self.cfg.providers.embedding;

		for attempt in 0..2 {
			if attempt > 0 {
				tokio::time::sleep(RETRY_BACKOFF).await;
			}

			match self.providers.embedding.embed(cfg, batch).await {
				Ok(vectors) => {
					let shape_ok = vectors.len() == batch.len()
						&& vectors.iter().all(|vec| vec.len() == cfg.dimensions as usize);

					if shape_ok {
						return Some(vectors);
					}

					warn!(
						expected = batch.len(),
						received = vectors.len(),
						"Embedding provider returned a mismatched shape."
					);
				},
				Err(err) => {
					warn!(error = %err, attempt, "Embedding call failed.");
				},
			}
		}

		None
	}
}
