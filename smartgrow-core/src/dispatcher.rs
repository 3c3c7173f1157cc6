//! Stream Dispatcher
//!
//! ## Overview
//!
//! Entry point for one change-stream batch. Records are handled strictly in
//! delivery order, one at a time:
//!
//! ```text
//! record ─▶ INSERT? ─▶ NewImage? ─▶ normalize ─▶ classify ─▶ species?
//!                                                              │
//!   publish ◀─ recipients? ◀─ deviations? ◀─ detect ◀─ ideal ranges?
//! ```
//!
//! Every arrow can end the record early. Only decode/shape failures are
//! errors; they are logged here and the batch moves on to the next record.
//! Everything else (no species, no range, in range, nobody to tell) is a
//! normal [`RecordOutcome`].
//!
//! ## Counting
//!
//! `processed_records` counts records the classifier accepted as plot
//! states, whatever happened afterwards. Filtered, non-plot-state and
//! undecodable records are not counted.

use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::alert::{publish_alert, AlertContext, PublishOutcome};
use crate::attributes::{normalize_image, AttributeMap};
use crate::classifier::classify;
use crate::config::ProcessorConfig;
use crate::deviation::find_deviations;
use crate::errors::{ProcessorError, ProcessorResult};
use crate::events::ChangeBatch;
use crate::ranges::resolve_ideal_ranges;
use crate::roster::resolve_recipients;
use crate::traits::{Notifier, TableStore};

/// How a single plot-state record ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Key pair is not `PLOT#` / `STATE#`
    NotPlotState,
    MissingSpecies,
    NoIdealRange,
    WithinRange,
    /// Deviations found but nobody to notify
    NoRecipients,
    Alerted(PublishOutcome),
}

impl RecordOutcome {
    /// Whether the record reached plot-state evaluation
    pub const fn is_processed(&self) -> bool {
        !matches!(self, RecordOutcome::NotPlotState)
    }
}

/// Result of one batch invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub status: u16,
    pub processed_records: usize,
    pub total_records: usize,
    pub alerts_published: usize,
}

impl BatchSummary {
    fn new(total_records: usize) -> Self {
        Self {
            status: 200,
            processed_records: 0,
            total_records,
            alerts_published: 0,
        }
    }
}

/// Runs the evaluation pipeline over change-stream batches
pub struct StreamDispatcher<S, N> {
    config: ProcessorConfig,
    store: S,
    notifier: N,
}

impl<S: TableStore, N: Notifier> StreamDispatcher<S, N> {
    pub fn new(config: ProcessorConfig, store: S, notifier: N) -> Self {
        Self { config, store, notifier }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process every record of `batch`. Never fails as a whole.
    pub async fn handle_batch(&self, batch: &ChangeBatch) -> BatchSummary {
        let mut summary = BatchSummary::new(batch.records.len());
        info!("Received {} change stream records", summary.total_records);

        for record in &batch.records {
            if !record.is_insert() {
                debug!("Skipping {} ({:?}): not an insert", record.label(), record.event_name);
                continue;
            }
            let Some(image) = record.new_image() else {
                debug!("Skipping {}: record without NewImage", record.label());
                continue;
            };

            match self.process_image(image).await {
                Ok(outcome) => {
                    if outcome.is_processed() {
                        summary.processed_records += 1;
                    }
                    if outcome == RecordOutcome::Alerted(PublishOutcome::Published) {
                        summary.alerts_published += 1;
                    }
                }
                Err(e) => error!("Failed to process {}: {}", record.label(), e),
            }
        }

        info!(
            "Processed {}/{} records, {} alert(s) published",
            summary.processed_records, summary.total_records, summary.alerts_published
        );
        summary
    }

    /// Decode and evaluate one new image
    pub async fn process_image(&self, image: &Value) -> ProcessorResult<RecordOutcome> {
        let fields = image
            .as_object()
            .ok_or_else(|| ProcessorError::Malformed("NewImage is not an object".to_string()))?;
        let item = normalize_image(fields)?;
        Ok(self.evaluate(&item).await)
    }

    /// Run classification through publishing for a decoded item
    pub async fn evaluate(&self, item: &AttributeMap) -> RecordOutcome {
        let Some(state) = classify(item) else {
            debug!("Item is not a plot state event, skipping");
            return RecordOutcome::NotPlotState;
        };

        let Some(species_id) = state.species_id.as_deref() else {
            info!(
                "State {} of plot {} missing SpeciesId, skipping alert evaluation",
                state.timestamp, state.plot_id
            );
            return RecordOutcome::MissingSpecies;
        };
        let facility_id = state.facility_id.as_deref();

        let Some(ideal) = resolve_ideal_ranges(&self.store, facility_id, species_id).await else {
            warn!(
                "Ideal parameters not found for species {} (facility={:?})",
                species_id, facility_id
            );
            return RecordOutcome::NoIdealRange;
        };
        debug!("Using {} {} for species {}", ideal.source.name(), ideal.key, species_id);

        let business_id = state.business_id.clone().or_else(|| ideal.business_id());

        let deviations = find_deviations(item, &ideal.attributes);
        if deviations.is_empty() {
            info!(
                "Plot {} measurements at {} are within acceptable range",
                state.plot_id, state.timestamp
            );
            return RecordOutcome::WithinRange;
        }

        let recipients = resolve_recipients(&self.store, business_id.as_deref(), facility_id).await;
        if recipients.is_empty() {
            warn!(
                "No responsible emails found for facility {:?} (business={:?}); skipping notification",
                facility_id, business_id
            );
            return RecordOutcome::NoRecipients;
        }

        let alert = AlertContext {
            plot_id: &state.plot_id,
            species_id,
            facility_id,
            timestamp: Some(&state.timestamp),
            deviations: &deviations,
            recipients: &recipients,
        }
        .render();

        let outcome = publish_alert(
            &self.notifier,
            self.config.alerts_topic.as_deref(),
            &state.plot_id,
            &alert,
        )
        .await;
        RecordOutcome::Alerted(outcome)
    }
}
