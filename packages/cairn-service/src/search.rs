use std::time::{Duration, Instant};

use serde_json::Value;
use time::OffsetDateTime;
use tracing::{info, warn};

use cairn_domain::{
	Origin, QueryFilters, QueryLog, QueryType, SearchMetadata, SearchMode, SearchResult,
	bind_citations, confidence_score, language,
};

use crate::{CairnService, ServiceError, ServiceResult, context, retrieval};

const GENERATION_RETRY_BACKOFF: Duration = Duration::from_millis(250);
const NO_RESULTS_ANSWER: &str = "I couldn't find sufficient relevant information to answer your \
	query. Please try rephrasing or providing more context.";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub query_type: Option<QueryType>,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub use_web_search: Option<bool>,
	#[serde(default)]
	pub web_search_only: Option<bool>,
	#[serde(default)]
	pub filters: Option<QueryFilters>,
}

impl CairnService {
	pub async fn search(&self, req: SearchRequest) -> ServiceResult<SearchResult> {
		let started = Instant::now();
		let query = req.query.trim().to_string();

		if query.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Query must be non-empty.".to_string(),
			});
		}

		let query_type = req.query_type.unwrap_or(QueryType::General);
		let filters = req.filters.unwrap_or_default();

		filters
			.validate_for(query_type)
			.map_err(|message| ServiceError::InvalidRequest { message })?;

		let web_only = req.web_search_only.unwrap_or(false);

		if web_only && !self.cfg.web.enabled {
			return Err(ServiceError::InvalidRequest {
				message: "web_search_only requires web search to be enabled.".to_string(),
			});
		}

		let use_web = self.cfg.web.enabled && (web_only || req.use_web_search.unwrap_or(true));
		let top_k = req.top_k.unwrap_or(self.cfg.retrieval.top_k).max(1);
		let collections = query_type.collections();

		let local_outcome = async {
			if web_only {
				return Ok(Vec::new());
			}

			let embedding = self.embed_single(&query).await;

			self.retrieve_local(&query, &embedding, top_k, collections, &filters).await
		};
		let web_outcome = async {
			if use_web { self.augment_with_web(&query, query_type).await } else { None }
		};
		let (local_outcome, web_outcome) = tokio::join!(local_outcome, web_outcome);
		let local_candidates = match local_outcome {
			Ok(candidates) => candidates,
			// Local retrieval is fatal only when no other path is alive.
			Err(err) => match web_outcome.as_ref() {
				Some(_) => {
					warn!(error = %err, "Local retrieval failed; degrading to web results only.");

					Vec::new()
				},
				None => return Err(err),
			},
		};
		let mut candidates = local_candidates;

		candidates.extend(web_outcome.unwrap_or_default());
		retrieval::rank_candidates(&mut candidates);
		candidates.truncate(top_k as usize);

		let search_mode = if web_only {
			SearchMode::WebOnly
		} else if use_web {
			SearchMode::Hybrid
		} else {
			SearchMode::Local
		};
		let collections_searched =
			if web_only { Vec::new() } else { collections.to_vec() };

		if candidates.is_empty() {
			let result = SearchResult {
				query,
				answer: NO_RESULTS_ANSWER.to_string(),
				citations: Vec::new(),
				retrieved_chunks: 0,
				processing_time: started.elapsed().as_secs_f64(),
				confidence_score: 0.0,
				metadata: SearchMetadata {
					query_type,
					search_mode,
					local_count: 0,
					web_count: 0,
					collections_searched,
				},
			};

			self.record_query(query_log(&result));

			return Ok(result);
		}

		let assembled = self.assemble_context(candidates);
		let local_count = assembled
			.source_map
			.entries()
			.iter()
			.filter(|candidate| candidate.origin == Origin::Local)
			.count() as u32;
		let web_count = assembled.source_map.len() as u32 - local_count;
		let messages = context::build_messages(
			&query,
			query_type,
			&assembled.prompt_context,
			language::response_language(&query),
		);
		let answer = self.generate_answer(&messages).await?;
		let binding = bind_citations(
			&answer,
			&assembled.source_map,
			self.cfg.context.excerpt_max_chars as usize,
		);
		let confidence = confidence_score(
			&assembled.source_map,
			&binding,
			self.cfg.confidence.retrieval_weight,
			self.cfg.confidence.citation_weight,
		);
		let result = SearchResult {
			query,
			answer,
			citations: binding.citations,
			retrieved_chunks: assembled.source_map.len() as u32,
			processing_time: started.elapsed().as_secs_f64(),
			confidence_score: confidence,
			metadata: SearchMetadata {
				query_type,
				search_mode,
				local_count,
				web_count,
				collections_searched,
			},
		};

		info!(
			query_type = query_type.as_str(),
			retrieved_chunks = result.retrieved_chunks,
			citations = result.citations.len(),
			confidence = result.confidence_score,
			local_count,
			web_count,
			"Search completed."
		);
		self.record_query(query_log(&result));

		Ok(result)
	}

	/// One call plus one retry with backoff. Generation failure is fatal for
	/// the query; no partial answer is fabricated from retrieved chunks.
	async fn generate_answer(&self, messages: &[Value]) -> ServiceResult<String> {
		let cfg = &self.cfg.providers.generator;
		let mut last_error = String::new();

		for attempt in 0..2 {
			if attempt > 0 {
				tokio::time::sleep(GENERATION_RETRY_BACKOFF).await;
			}

			match self.providers.generator.generate(cfg, messages).await {
				Ok(answer) => return Ok(answer),
				Err(err) => {
					warn!(error = %err, attempt, "Generation call failed.");

					last_error = err.to_string();
				},
			}
		}

		Err(ServiceError::Generation { message: last_error })
	}
}

fn query_log(result: &SearchResult) -> QueryLog {
	QueryLog {
		query: result.query.clone(),
		query_type: result.metadata.query_type,
		retrieved_chunks: result.retrieved_chunks,
		citations_count: result.citations.len() as u32,
		confidence_score: result.confidence_score,
		processing_time_ms: result.processing_time * 1_000.0,
		response_length: result.answer.chars().count() as u32,
		timestamp: OffsetDateTime::now_utc(),
	}
}
