use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use cairn_domain::WebHit;

pub async fn search(
	cfg: &cairn_config::WebSearchProviderConfig,
	query: &str,
	include_domains: &[String],
	max_results: u32,
) -> Result<Vec<WebHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"query": query,
		"search_depth": "advanced",
		"max_results": max_results,
		"include_domains": include_domains,
		"include_answer": false,
		"include_images": false,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

fn parse_search_response(json: Value) -> Result<Vec<WebHit>> {
	let results = json
		.get("results")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Web search response is missing results array."))?;

	let mut hits = Vec::with_capacity(results.len());
	for (rank, item) in results.iter().enumerate() {
		let url = item.get("url").and_then(|v| v.as_str()).unwrap_or_default();
		// Prefer the full page content when the provider returns it.
		let snippet = item
			.get("raw_content")
			.and_then(|v| v.as_str())
			.filter(|content| !content.trim().is_empty())
			.or_else(|| item.get("content").and_then(|v| v.as_str()))
			.unwrap_or_default();

		if url.is_empty() || snippet.trim().is_empty() {
			continue;
		}

		hits.push(WebHit {
			title: item.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
			url: url.to_string(),
			snippet: snippet.to_string(),
			rank: rank as u32,
		});
	}

	Ok(hits)
}
