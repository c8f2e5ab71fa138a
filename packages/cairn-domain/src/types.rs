use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Storage collection a chunk belongs to. Chosen at ingestion from the
/// document's entity references, searched by query type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
	Startup,
	Investor,
	Funding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
	StartupSearch,
	InvestorSearch,
	FundingAnalysis,
	General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
	Local,
	Hybrid,
	WebOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
	Local,
	Web,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRefs {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub startup_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub investor_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub round_id: Option<String>,
}

/// Per-query metadata filter, tagged by the entity family it targets.
/// Validated against the query type at the pipeline boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryFilters {
	#[default]
	None,
	Startup {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		industry: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		stage: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		startup_id: Option<String>,
	},
	Investor {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		industry: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		investor_id: Option<String>,
	},
	Funding {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		round_id: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		startup_id: Option<String>,
	},
}

/// Stored fragment of an ingested document. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
	pub id: Uuid,
	pub content: String,
	pub source_id: String,
	pub source_type: String,
	pub source_title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_url: Option<String>,
	pub collection: Collection,
	pub chunk_index: i32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding: Option<Vec<f32>>,
	#[serde(default)]
	pub entity_refs: EntityRefs,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub industry: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stage: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub published_date: Option<OffsetDateTime>,
}

/// A scored hit from one retrieval path, body not yet fetched.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHit {
	pub chunk_id: Uuid,
	pub score: f32,
}

/// A live web search hit, before normalization into a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebHit {
	pub title: String,
	pub url: String,
	pub snippet: String,
	pub rank: u32,
}

/// Per-query scored fragment, local or web, eligible for the answer context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chunk_id: Option<Uuid>,
	pub source_id: String,
	pub source_type: String,
	pub source_title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_url: Option<String>,
	pub chunk_index: i32,
	#[serde(default, with = "crate::time_serde::option")]
	pub published_date: Option<OffsetDateTime>,
	pub content: String,
	pub similarity_score: f32,
	pub keyword_score: f32,
	pub combined_score: f32,
	pub origin: Origin,
}

/// The finalized, 1-indexed candidate list handed to the generator. The only
/// valid citation targets for the query; never persisted.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
	entries: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
	pub source_id: String,
	pub source_type: String,
	pub source_title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_url: Option<String>,
	pub excerpt: String,
	pub confidence_score: f32,
	#[serde(default, with = "crate::time_serde::option")]
	pub published_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
	pub query_type: QueryType,
	pub search_mode: SearchMode,
	pub local_count: u32,
	pub web_count: u32,
	pub collections_searched: Vec<Collection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
	pub query: String,
	pub answer: String,
	pub citations: Vec<Citation>,
	pub retrieved_chunks: u32,
	pub processing_time: f64,
	pub confidence_score: f32,
	pub metadata: SearchMetadata,
}

/// Append-only evaluation record, one per completed query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLog {
	pub query: String,
	pub query_type: QueryType,
	pub retrieved_chunks: u32,
	pub citations_count: u32,
	pub confidence_score: f32,
	pub processing_time_ms: f64,
	pub response_length: u32,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
}

impl Collection {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Startup => "startup_document",
			Self::Investor => "investor_document",
			Self::Funding => "funding_document",
		}
	}
}

impl QueryType {
	/// Collections searched for this query type, most relevant first.
	pub fn collections(self) -> &'static [Collection] {
		match self {
			Self::StartupSearch => &[Collection::Startup, Collection::Funding],
			Self::InvestorSearch => &[Collection::Investor, Collection::Funding],
			Self::FundingAnalysis =>
				&[Collection::Funding, Collection::Startup, Collection::Investor],
			Self::General => &[Collection::Startup, Collection::Investor, Collection::Funding],
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::StartupSearch => "startup_search",
			Self::InvestorSearch => "investor_search",
			Self::FundingAnalysis => "funding_analysis",
			Self::General => "general",
		}
	}
}

impl EntityRefs {
	pub fn is_empty(&self) -> bool {
		self.startup_id.is_none() && self.investor_id.is_none() && self.round_id.is_none()
	}

	/// Collection a document belongs to, by the strongest entity reference.
	pub fn collection(&self) -> Collection {
		if self.round_id.is_some() {
			Collection::Funding
		} else if self.investor_id.is_some() {
			Collection::Investor
		} else {
			Collection::Startup
		}
	}
}

impl QueryFilters {
	fn target_collection(&self) -> Option<Collection> {
		match self {
			Self::None => None,
			Self::Startup { .. } => Some(Collection::Startup),
			Self::Investor { .. } => Some(Collection::Investor),
			Self::Funding { .. } => Some(Collection::Funding),
		}
	}

	/// A filter is only accepted when the query type searches the collection
	/// it targets.
	pub fn validate_for(&self, query_type: QueryType) -> Result<(), String> {
		let Some(target) = self.target_collection() else {
			return Ok(());
		};

		if query_type.collections().contains(&target) {
			Ok(())
		} else {
			Err(format!(
				"Filter kind {} does not apply to query type {}.",
				target.as_str(),
				query_type.as_str()
			))
		}
	}

	pub fn matches(&self, chunk: &Chunk) -> bool {
		match self {
			Self::None => true,
			Self::Startup { industry, stage, startup_id } =>
				optional_eq_ignore_case(industry.as_deref(), chunk.industry.as_deref())
					&& optional_eq_ignore_case(stage.as_deref(), chunk.stage.as_deref())
					&& optional_eq(startup_id.as_deref(), chunk.entity_refs.startup_id.as_deref()),
			Self::Investor { industry, investor_id } =>
				optional_eq_ignore_case(industry.as_deref(), chunk.industry.as_deref())
					&& optional_eq(
						investor_id.as_deref(),
						chunk.entity_refs.investor_id.as_deref(),
					),
			Self::Funding { round_id, startup_id } =>
				optional_eq(round_id.as_deref(), chunk.entity_refs.round_id.as_deref())
					&& optional_eq(startup_id.as_deref(), chunk.entity_refs.startup_id.as_deref()),
		}
	}
}

impl SourceMap {
	pub fn new(entries: Vec<Candidate>) -> Self {
		Self { entries }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// 1-based lookup; index 0 is never valid.
	pub fn get(&self, index: usize) -> Option<&Candidate> {
		index.checked_sub(1).and_then(|idx| self.entries.get(idx))
	}

	pub fn entries(&self) -> &[Candidate] {
		&self.entries
	}
}

fn optional_eq(wanted: Option<&str>, actual: Option<&str>) -> bool {
	match wanted {
		None => true,
		Some(wanted) => actual.map(|actual| actual == wanted).unwrap_or(false),
	}
}

fn optional_eq_ignore_case(wanted: Option<&str>, actual: Option<&str>) -> bool {
	match wanted {
		None => true,
		Some(wanted) => actual.map(|actual| actual.eq_ignore_ascii_case(wanted)).unwrap_or(false),
	}
}
