use serde_json::Value;

use cairn_domain::{Candidate, QueryType, SourceMap};

use crate::CairnService;

/// Per-entry overhead for the `[n] ` marker and the blank line between
/// entries, counted against the context budget.
const ENTRY_OVERHEAD_CHARS: usize = 8;

pub(crate) struct AssembledContext {
	pub source_map: SourceMap,
	pub prompt_context: String,
}

impl CairnService {
	pub(crate) fn assemble_context(&self, candidates: Vec<Candidate>) -> AssembledContext {
		assemble(candidates, self.cfg.context.max_context_chars as usize)
	}
}

/// Builds the 1-indexed source map and the numbered prompt context. When the
/// character budget would be exceeded, whole lowest-scored candidates are
/// dropped — an entry is never truncated mid-content, so any excerpt cited
/// later is intact.
pub(crate) fn assemble(mut candidates: Vec<Candidate>, max_context_chars: usize) -> AssembledContext {
	let cost =
		|candidate: &Candidate| candidate.content.chars().count() + ENTRY_OVERHEAD_CHARS;
	let mut total: usize = candidates.iter().map(cost).sum();

	// Candidates arrive ranked, so the lowest-scored entry is last.
	while total > max_context_chars && candidates.len() > 1 {
		if let Some(dropped) = candidates.pop() {
			total -= cost(&dropped);
		}
	}

	let mut prompt_context = String::new();

	for (idx, candidate) in candidates.iter().enumerate() {
		if idx > 0 {
			prompt_context.push_str("\n\n");
		}

		prompt_context.push_str(&format!("[{}] {}", idx + 1, candidate.content));
	}

	AssembledContext { source_map: SourceMap::new(candidates), prompt_context }
}

/// Chat messages for the generator: a system instruction enforcing indexed
/// citations and a user turn carrying the numbered context and the query.
pub(crate) fn build_messages(
	query: &str,
	query_type: QueryType,
	prompt_context: &str,
	response_language: Option<&str>,
) -> Vec<Value> {
	let language_instruction = response_language
		.map(|language| {
			format!(
				"\n6. Respond in {language}, keeping the [n] citation markers unchanged."
			)
		})
		.unwrap_or_default();
	let system_prompt = format!(
		"You are an expert investment analyst. Answer using ONLY the numbered sources provided.\n\
		Rules:\n\
		1. Cite sources inline with their exact bracketed index, e.g. [1] or [2][3], for every factual claim.\n\
		2. Never cite an index that is not in the source list.\n\
		3. If the sources do not contain enough information, state what is missing.\n\
		4. Be precise with numbers, dates, and names.\n\
		5. Use multiple citations when a claim draws on multiple sources.{language_instruction}"
	);
	let user_prompt = format!(
		"Sources:\n{prompt_context}\n\nBased on the sources above, answer this {query_type} query:\n{query}\n\nProvide a comprehensive answer with inline citations.",
		query_type = query_type.as_str(),
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}
