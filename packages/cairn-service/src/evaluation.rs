use std::{collections::BTreeMap, sync::Arc};

use tracing::warn;

use cairn_domain::{EvaluationStore, QueryLog};

use crate::{CairnService, ServiceResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AggregateMetrics {
	pub total_queries: u64,
	pub avg_processing_time_ms: f64,
	pub avg_confidence_score: f64,
	pub avg_retrieved_chunks: f64,
	pub avg_citations: f64,
	pub avg_response_length: f64,
	pub query_type_distribution: BTreeMap<String, u64>,
}

impl CairnService {
	/// Read-side aggregation over the last `window` records (all when
	/// `None`). Never mutates the log.
	pub async fn aggregate_metrics(&self, window: Option<usize>) -> ServiceResult<AggregateMetrics> {
		let records = self.stores.evaluation.query(window).await?;

		Ok(aggregate(&records))
	}

	/// Appends the record on a detached task so the response never waits on
	/// logging; failures are logged and swallowed.
	pub(crate) fn record_query(&self, record: QueryLog) {
		if !self.cfg.evaluation.enabled {
			return;
		}

		let store: Arc<dyn EvaluationStore> = self.stores.evaluation.clone();

		tokio::spawn(async move {
			if let Err(err) = store.append(record).await {
				warn!(error = %err, "Failed to append evaluation record.");
			}
		});
	}
}

fn aggregate(records: &[QueryLog]) -> AggregateMetrics {
	let total = records.len();
	let mut distribution = BTreeMap::new();

	for record in records {
		*distribution.entry(record.query_type.as_str().to_string()).or_insert(0_u64) += 1;
	}

	AggregateMetrics {
		total_queries: total as u64,
		avg_processing_time_ms: mean(records, |record| record.processing_time_ms),
		avg_confidence_score: mean(records, |record| f64::from(record.confidence_score)),
		avg_retrieved_chunks: mean(records, |record| f64::from(record.retrieved_chunks)),
		avg_citations: mean(records, |record| f64::from(record.citations_count)),
		avg_response_length: mean(records, |record| f64::from(record.response_length)),
		query_type_distribution: distribution,
	}
}

fn mean<F>(records: &[QueryLog], value: F) -> f64
where
	F: Fn(&QueryLog) -> f64,
{
	if records.is_empty() {
		return 0.0;
	}

	records.iter().map(value).sum::<f64>() / records.len() as f64
}
