use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub chunking: Chunking,
	pub retrieval: Retrieval,
	pub context: ContextBudget,
	pub confidence: Confidence,
	pub web: Web,
	pub providers: Providers,
	pub evaluation: Evaluation,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Chunking {
	pub chunk_size: u32,
	pub chunk_overlap: u32,
	/// Prefer ending a window at a sentence boundary found in its second half.
	#[serde(default = "default_true")]
	pub sentence_aware: bool,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub top_k: u32,
	pub similarity_threshold: f32,
	pub vector_weight: f32,
	pub keyword_weight: f32,
	pub search_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct ContextBudget {
	pub max_context_chars: u32,
	pub excerpt_max_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Confidence {
	pub retrieval_weight: f32,
	pub citation_weight: f32,
}

#[derive(Debug, Deserialize)]
pub struct Web {
	pub enabled: bool,
	pub max_results: u32,
	pub startup_domains: Vec<String>,
	pub investor_domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generator: GeneratorProviderConfig,
	pub web_search: WebSearchProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub batch_size: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratorProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct WebSearchProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Evaluation {
	pub enabled: bool,
	pub log_path: Option<String>,
}

fn default_true() -> bool {
	true
}
