/// Detected response language for a query, as an English display name the
/// generator prompt can use. `None` means English or undetectable.
pub fn response_language(query: &str) -> Option<&'static str> {
	let info = whatlang::detect(query)?;

	// Only steer the response language when the detector is confident;
	// short queries frequently misdetect.
	if info.confidence() < 0.85 || info.lang() == whatlang::Lang::Eng {
		return None;
	}

	Some(info.lang().eng_name())
}
