use crate::{
	citation::CitationBinding,
	types::{Origin, SourceMap},
};

/// Blend of retrieval quality and citation precision, clamped to [0, 1].
/// An empty source map scores 0.0 regardless of the binding.
pub fn confidence_score(
	source_map: &SourceMap,
	binding: &CitationBinding,
	retrieval_weight: f32,
	citation_weight: f32,
) -> f32 {
	if source_map.is_empty() {
		return 0.0;
	}

	let avg_similarity = average_relevance(source_map);
	let citation_score = binding.precision();
	let confidence = avg_similarity * retrieval_weight + citation_score * citation_weight;

	confidence.clamp(0.0, 1.0)
}

/// Mean combined score across the map; web entries contribute their
/// web-relevance score.
fn average_relevance(source_map: &SourceMap) -> f32 {
	let total: f32 = source_map
		.entries()
		.iter()
		.map(|candidate| match candidate.origin {
			Origin::Local => candidate.combined_score,
			Origin::Web => candidate.similarity_score,
		})
		.sum();

	total / source_map.len() as f32
}
