use tracing::warn;

use cairn_domain::{Candidate, Origin, QueryType, WebHit};

use crate::CairnService;

const INVESTOR_QUERY_HINTS: [&str; 4] = ["vc", "investor", "fund", "venture capital"];

impl CairnService {
	/// Live web augmentation. Never fails the query: a provider error is
	/// reported as `None` so the caller can tell a failed path from a path
	/// that found nothing.
	pub(crate) async fn augment_with_web(
		&self,
		query: &str,
		query_type: QueryType,
	) -> Option<Vec<Candidate>> {
		let domains = self.domain_allowlist(query, query_type);
		let outcome = self
			.providers
			.web_search
			.search(&self.cfg.providers.web_search, query, domains, self.cfg.web.max_results)
			.await;

		match outcome {
			Ok(hits) => Some(normalize_hits(hits, self.cfg.chunking.chunk_size as usize)),
			Err(err) => {
				warn!(error = %err, "Web search failed; continuing with local results only.");

				None
			},
		}
	}

	fn domain_allowlist(&self, query: &str, query_type: QueryType) -> &[String] {
		if is_investor_focused(query, query_type) {
			&self.cfg.web.investor_domains
		} else {
			&self.cfg.web.startup_domains
		}
	}
}

fn is_investor_focused(query: &str, query_type: QueryType) -> bool {
	if query_type == QueryType::InvestorSearch {
		return true;
	}

	let query = query.to_lowercase();

	INVESTOR_QUERY_HINTS.iter().any(|hint| query.contains(hint))
}

/// Normalizes web hits into candidates. Relevance derives from the provider
/// rank normalized to [0, 1]; there is no keyword contribution. Long hit
/// content is split into chunk-sized pieces so a single page cannot flood
/// the context budget.
pub(crate) fn normalize_hits(hits: Vec<WebHit>, chunk_size: usize) -> Vec<Candidate> {
	let total = hits.len();
	let mut candidates = Vec::new();

	for hit in hits {
		let relevance = rank_relevance(hit.rank, total);

		for (chunk_index, piece) in split_chars(&hit.snippet, chunk_size).into_iter().enumerate() {
			candidates.push(Candidate {
				chunk_id: None,
				source_id: format!("web_{}", hit.url),
				source_type: "web_search".to_string(),
				source_title: hit.title.clone(),
				source_url: Some(hit.url.clone()),
				chunk_index: chunk_index as i32,
				published_date: None,
				content: piece,
				similarity_score: relevance,
				keyword_score: 0.0,
				combined_score: relevance,
				origin: Origin::Web,
			});
		}
	}

	candidates
}

/// First result maps to 1.0, later ranks decay linearly over the batch. The
/// denominator stretches when a provider reports ranks past the batch size.
fn rank_relevance(rank: u32, total: usize) -> f32 {
	let span = total.max(rank as usize + 1);

	if span == 0 {
		return 0.0;
	}

	(1.0 - rank as f32 / span as f32).clamp(0.0, 1.0)
}

fn split_chars(text: &str, chunk_size: usize) -> Vec<String> {
	if chunk_size == 0 || text.is_empty() {
		return Vec::new();
	}

	let chars: Vec<char> = text.chars().collect();

	chars.chunks(chunk_size).map(|piece| piece.iter().collect()).collect()
}
