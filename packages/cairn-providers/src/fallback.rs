/// Deterministic pseudo-embedding for degraded mode: the blake3 extended
/// output of the text is mapped to a unit vector of the configured
/// dimensionality, so downstream similarity math keeps working when the
/// embedding capability is down. Identical text always yields an identical
/// vector.
pub fn fallback_embedding(text: &str, dimensions: usize) -> Vec<f32> {
	if dimensions == 0 {
		return Vec::new();
	}

	let mut hasher = blake3::Hasher::new();

	hasher.update(text.as_bytes());

	let mut reader = hasher.finalize_xof();
	let mut bytes = vec![0_u8; dimensions * 4];

	reader.fill(&mut bytes);

	let mut vec = Vec::with_capacity(dimensions);

	for window in bytes.chunks_exact(4) {
		let raw = u32::from_le_bytes([window[0], window[1], window[2], window[3]]);
		// Map to [-1, 1).
		let value = (raw as f64 / u32::MAX as f64) * 2.0 - 1.0;

		vec.push(value as f32);
	}

	let norm = vec.iter().map(|value| f64::from(*value) * f64::from(*value)).sum::<f64>().sqrt();

	if norm > 0.0 {
		for value in &mut vec {
			*value = (f64::from(*value) / norm) as f32;
		}
	}

	vec
}
