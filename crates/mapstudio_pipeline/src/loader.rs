//! Model payload loading.
//!
//! Lookups are independent, so with `payload_workers > 0` they run on a
//! dedicated rayon pool. Workers only produce results; the model table is
//! updated afterwards on the calling thread, in model order.

use mapstudio_foundation::{Diagnostics, Error, ErrorContext, ErrorKind, Family, ModelId, Result};
use mapstudio_schema::ModelSubtype;
use mapstudio_storage::{ModelTable, PayloadHandle};
use rayon::prelude::*;

use crate::collab::PayloadSource;

/// Outcome counts of one loading pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Models that received a payload.
    pub loaded: usize,
    /// Models whose payload did not exist.
    pub missing: usize,
}

struct Request {
    id: ModelId,
    name: String,
    subtype: ModelSubtype,
}

type Lookup = (ModelId, String, Result<Option<PayloadHandle>>);

/// Asks `source` for the payload of every declared model in `models`.
///
/// A payload that does not exist marks the model as a placeholder and records
/// a missing-payload diagnostic.
///
/// # Errors
///
/// Returns every failed lookup, aggregated, or an error if the worker pool
/// could not be started.
pub fn load_payloads(
    models: &mut ModelTable,
    source: &dyn PayloadSource,
    workers: usize,
    diagnostics: &mut Diagnostics,
) -> Result<LoadSummary> {
    let requests: Vec<Request> = models
        .iter()
        .filter(|(_, model)| !model.is_placeholder)
        .map(|(id, model)| Request {
            id,
            name: model.name.clone(),
            subtype: model.subtype,
        })
        .collect();

    let lookup = |request: &Request| -> Lookup {
        (
            request.id,
            request.name.clone(),
            source.load(&request.name, request.subtype),
        )
    };

    let results: Vec<Lookup> = if workers == 0 || requests.len() < 2 {
        requests.iter().map(lookup).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("mapstudio-payload-{i}"))
            .build()
            .map_err(|e| {
                Error::new(ErrorKind::Payload(format!(
                    "failed to start payload workers: {e}"
                )))
            })?;
        pool.install(|| requests.par_iter().map(lookup).collect())
    };

    let mut summary = LoadSummary::default();
    let mut errors = Vec::new();
    for (id, name, result) in results {
        match result {
            Ok(Some(payload)) => {
                models.bind_payload(&name, payload)?;
                summary.loaded += 1;
            }
            Ok(None) => {
                models.mark_missing_payload(id, diagnostics)?;
                summary.missing += 1;
            }
            Err(e) => {
                errors.push(e.with_context(ErrorContext::new().with_record(Family::Model, name)));
            }
        }
    }

    tracing::debug!(
        requested = summary.loaded + summary.missing + errors.len(),
        loaded = summary.loaded,
        missing = summary.missing,
        workers,
        "loaded model payloads"
    );

    if errors.is_empty() {
        Ok(summary)
    } else {
        Err(Error::aggregate(errors))
    }
}
