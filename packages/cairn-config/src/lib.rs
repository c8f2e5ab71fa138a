mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Confidence, Config, ContextBudget, EmbeddingProviderConfig, Evaluation,
	GeneratorProviderConfig, Providers, Retrieval, Service, Web, WebSearchProviderConfig,
};

use std::{fs, path::Path};

const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.chunking.chunk_size == 0 {
		return Err(Error::Validation {
			message: "chunking.chunk_size must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.chunk_overlap >= cfg.chunking.chunk_size {
		return Err(Error::Validation {
			message: "chunking.chunk_overlap must be less than chunking.chunk_size.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.retrieval.similarity_threshold.is_finite()
		|| !(0.0..=1.0).contains(&cfg.retrieval.similarity_threshold)
	{
		return Err(Error::Validation {
			message: "retrieval.similarity_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}

	validate_weight_pair(
		"retrieval.vector_weight",
		cfg.retrieval.vector_weight,
		"retrieval.keyword_weight",
		cfg.retrieval.keyword_weight,
	)?;
	validate_weight_pair(
		"confidence.retrieval_weight",
		cfg.confidence.retrieval_weight,
		"confidence.citation_weight",
		cfg.confidence.citation_weight,
	)?;

	if cfg.retrieval.search_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.search_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.context.max_context_chars == 0 {
		return Err(Error::Validation {
			message: "context.max_context_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.context.excerpt_max_chars == 0 {
		return Err(Error::Validation {
			message: "context.excerpt_max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.batch_size == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.batch_size must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.generator.temperature.is_finite() || cfg.providers.generator.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.generator.temperature must be zero or greater.".to_string(),
		});
	}
	if cfg.providers.generator.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.generator.max_tokens must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("generator", &cfg.providers.generator.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.web.enabled {
		if cfg.web.max_results == 0 {
			return Err(Error::Validation {
				message: "web.max_results must be greater than zero when web search is enabled."
					.to_string(),
			});
		}
		if cfg.providers.web_search.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: "providers.web_search.api_key must be non-empty when web search is enabled."
					.to_string(),
			});
		}
		if cfg.web.startup_domains.is_empty() || cfg.web.investor_domains.is_empty() {
			return Err(Error::Validation {
				message: "web.startup_domains and web.investor_domains must be non-empty when web search is enabled."
					.to_string(),
			});
		}
	}

	Ok(())
}

fn validate_weight_pair(a_label: &str, a: f32, b_label: &str, b: f32) -> Result<()> {
	for (label, value) in [(a_label, a), (b_label, b)] {
		if !value.is_finite() || !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}
	if (a + b - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
		return Err(Error::Validation {
			message: format!("{a_label} and {b_label} must sum to 1.0."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.evaluation.log_path.as_deref().map(|path| path.trim().is_empty()).unwrap_or(false) {
		cfg.evaluation.log_path = None;
	}
}
