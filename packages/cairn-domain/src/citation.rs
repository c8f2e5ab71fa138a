use regex::Regex;

use crate::types::{Citation, Origin, SourceMap};

const MARKER_PATTERN: &str = r"\[(\d+)\]";

/// Outcome of binding an answer's inline markers against a source map.
#[derive(Debug, Clone, Default)]
pub struct CitationBinding {
	pub citations: Vec<Citation>,
	/// Distinct markers found in the answer, valid or not.
	pub marker_count: usize,
}

impl CitationBinding {
	/// Citation precision: bound markers over all distinct markers.
	pub fn precision(&self) -> f32 {
		self.citations.len() as f32 / self.marker_count.max(1) as f32
	}
}

/// Distinct `[n]` markers in first-occurrence order. Non-numeric or oversized
/// markers never parse; this function cannot fail.
pub fn extract_markers(answer: &str) -> Vec<usize> {
	let Ok(re) = Regex::new(MARKER_PATTERN) else {
		return Vec::new();
	};
	let mut seen = Vec::new();

	for capture in re.captures_iter(answer) {
		let Some(index) = capture.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
			continue;
		};

		if !seen.contains(&index) {
			seen.push(index);
		}
	}

	seen
}

/// Maps markers back to source-map entries. Markers outside `[1, len]` are
/// dropped without rewriting the answer text; consumers must tolerate markers
/// with no matching citation.
pub fn bind_citations(
	answer: &str,
	source_map: &SourceMap,
	excerpt_max_chars: usize,
) -> CitationBinding {
	let markers = extract_markers(answer);
	let marker_count = markers.len();
	let mut citations = Vec::new();

	for index in markers {
		let Some(candidate) = source_map.get(index) else {
			continue;
		};
		let confidence_score = match candidate.origin {
			Origin::Local => candidate.combined_score,
			Origin::Web => candidate.similarity_score,
		};

		citations.push(Citation {
			source_id: candidate.source_id.clone(),
			source_type: candidate.source_type.clone(),
			source_title: candidate.source_title.clone(),
			source_url: candidate.source_url.clone(),
			excerpt: excerpt_of(&candidate.content, excerpt_max_chars),
			confidence_score: confidence_score.clamp(0.0, 1.0),
			published_date: candidate.published_date,
		});
	}

	CitationBinding { citations, marker_count }
}

/// Leading snippet bounded to `max_chars` characters, never splitting a code
/// point.
pub fn excerpt_of(content: &str, max_chars: usize) -> String {
	let mut end = content.len();

	for (count, (offset, _)) in content.char_indices().enumerate() {
		if count == max_chars {
			end = offset;

			break;
		}
	}

	if end == content.len() {
		content.to_string()
	} else {
		format!("{}...", &content[..end])
	}
}
