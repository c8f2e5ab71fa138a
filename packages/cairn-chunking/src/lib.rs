use unicode_segmentation::UnicodeSegmentation;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size}).")]
	OverlapNotLessThanSize { chunk_size: usize, chunk_overlap: usize },
}

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub chunk_size: usize,
	pub chunk_overlap: usize,
	/// Prefer ending a window at a sentence boundary in its second half.
	pub sentence_aware: bool,
}

/// One window over the input text. Offsets are char positions into the text
/// handed to [`split_text`].
#[derive(Clone, Debug)]
pub struct Chunk {
	pub chunk_index: i32,
	pub start_offset: usize,
	pub end_offset: usize,
	pub text: String,
}

/// Collapses whitespace runs to single spaces and trims the ends. Applied
/// before windowing so window offsets are stable across formatting noise.
pub fn normalize_whitespace(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut pending_space = false;

	for ch in text.chars() {
		if ch.is_whitespace() {
			pending_space = !out.is_empty();
		} else {
			if pending_space {
				out.push(' ');

				pending_space = false;
			}

			out.push(ch);
		}
	}

	out
}

/// Splits text into consecutive windows of `chunk_size` chars, each window
/// starting `chunk_size - chunk_overlap` chars after the previous one, so
/// adjacent windows share an overlap region. The final window may be shorter.
/// With `sentence_aware`, a window may end early at a sentence boundary found
/// past its midpoint; the next window still starts `chunk_overlap` chars
/// before the effective end. Windows never split a code point.
pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Result<Vec<Chunk>> {
	if cfg.chunk_overlap >= cfg.chunk_size {
		return Err(Error::OverlapNotLessThanSize {
			chunk_size: cfg.chunk_size,
			chunk_overlap: cfg.chunk_overlap,
		});
	}

	// Byte offset of every char boundary, plus the end of the text.
	let mut boundaries: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();

	boundaries.push(text.len());

	let total_chars = boundaries.len() - 1;
	let sentence_ends =
		if cfg.sentence_aware { sentence_end_chars(text, &boundaries) } else { Vec::new() };
	let mut chunks = Vec::new();
	let mut start = 0_usize;
	let mut chunk_index = 0_i32;

	while start < total_chars {
		let hard_end = (start + cfg.chunk_size).min(total_chars);
		let mut end = hard_end;

		if cfg.sentence_aware && hard_end < total_chars {
			// Only boundaries past both the midpoint and the overlap keep the
			// window start strictly advancing.
			let floor = start + (cfg.chunk_size / 2).max(cfg.chunk_overlap);

			if let Some(boundary) = sentence_ends
				.iter()
				.rev()
				.find(|&&candidate| candidate > floor && candidate <= hard_end)
			{
				end = *boundary;
			}
		}

		chunks.push(Chunk {
			chunk_index,
			start_offset: start,
			end_offset: end,
			text: text[boundaries[start]..boundaries[end]].to_string(),
		});

		chunk_index += 1;

		if end >= total_chars {
			break;
		}

		start = end - cfg.chunk_overlap;
	}

	Ok(chunks)
}

/// Char positions where a sentence ends, derived from sentence-start bounds.
fn sentence_end_chars(text: &str, boundaries: &[usize]) -> Vec<usize> {
	text.split_sentence_bound_indices()
		.map(|(byte_offset, sentence)| byte_offset + sentence.len())
		.filter_map(|byte_end| boundaries.binary_search(&byte_end).ok())
		.collect()
}
