//! The kickoff executioner: the batch loop at the heart of the engine.
//!
//! One `execute` call walks every eligible contact of a campaign in
//! ascending-id batches. For each batch, the campaign's kickoff events are
//! copied into a working set; any event that one contact defers is scheduled
//! for that contact and leaves the working set, and whatever survives is
//! executed immediately for the whole batch.

pub mod counter;
pub mod limiter;
pub mod progress;

pub use counter::Counter;
pub use limiter::ContactLimiter;
pub use progress::{OutputSink, Progress};

use std::io::Write;
use std::time::Instant;

use chrono::Utc;
use opentelemetry::KeyValue;
use tracing::{Instrument, Span, debug, info};
use uuid::Uuid;

use crate::contacts::ContactSource;
use crate::error::Result;
use crate::executor::EventExecutor;
use crate::model::{Campaign, CampaignEvent};
use crate::scheduler::EventScheduler;
use crate::telemetry::metrics;
use crate::telemetry::run::{record_batch, start_run_span};

/// Outcome of the preparation phase. Both empty conditions are routine,
/// expected outcomes, not faults.
enum Preparation {
    /// No kickoff events, or no eligible contacts. The run is a no-op.
    Empty,
    /// `total` kickoff events (root events x eligible contacts) ahead.
    Proceed { total: u64 },
}

/// Orchestrates one kickoff run over its three collaborators.
pub struct KickoffExecutioner<F, S, E> {
    finder: F,
    scheduler: S,
    executor: E,
}

impl<F, S, E> KickoffExecutioner<F, S, E>
where
    F: ContactSource,
    S: EventScheduler,
    E: EventExecutor,
{
    pub fn new(finder: F, scheduler: S, executor: E) -> Self {
        Self {
            finder,
            scheduler,
            executor,
        }
    }

    /// Run every kickoff event of `campaign` against every eligible contact.
    ///
    /// Returns the run's counter. "No contacts" and "no events" are clean
    /// no-op returns; collaborator failures propagate unchanged. The
    /// progress indicator is closed out on every exit path, success or
    /// failure.
    pub async fn execute(
        &mut self,
        campaign: &Campaign,
        limiter: &mut ContactLimiter,
        output: Option<&mut dyn Write>,
    ) -> Result<Counter> {
        let run_id = Uuid::new_v4();
        let span = start_run_span(campaign.id, &run_id);

        let mut counter = Counter::new();
        let mut sink = OutputSink::new(output);
        let mut progress: Option<Progress> = None;

        let run = self
            .run(campaign, limiter, &mut sink, &mut progress, &mut counter)
            .instrument(span)
            .await;

        if let Some(bar) = progress.as_mut() {
            bar.finish(&mut sink)?;
        }
        metrics::runs().add(
            1,
            &[KeyValue::new(
                "result",
                if run.is_ok() { "ok" } else { "error" },
            )],
        );

        run?;
        Ok(counter)
    }

    async fn run(
        &mut self,
        campaign: &Campaign,
        limiter: &mut ContactLimiter,
        sink: &mut OutputSink<'_>,
        progress: &mut Option<Progress>,
        counter: &mut Counter,
    ) -> Result<()> {
        info!(campaign_id = %campaign.id, "triggering kickoff events");

        let total = match self.prepare(campaign, limiter, sink).await? {
            Preparation::Empty => {
                debug!(campaign_id = %campaign.id, "no kickoff events to process");
                return Ok(());
            }
            Preparation::Proceed { total } => total,
        };
        *progress = Some(Progress::start(total));

        counter.advance_events(campaign.root_events.len() as u64);

        // One reference instant for every decision in this run.
        let now = Utc::now();

        let mut batch_index = 0usize;
        let mut contacts = self.finder.contacts(campaign.id, limiter).await?;
        while !contacts.is_empty() {
            let batch_started = Instant::now();

            // Keys ascend, so the last one drives the next page's lower bound.
            let next_min_contact_id = match contacts.keys().next_back() {
                Some(id) => id.next(),
                None => break,
            };

            // Fresh working copy of the kickoff events; an event leaves it
            // the moment one contact defers it, and is then neither
            // evaluated nor executed for the rest of this batch.
            let mut immediate: Vec<CampaignEvent> = Vec::with_capacity(campaign.root_events.len());
            for event in campaign.root_events.clone() {
                if let Some(bar) = progress.as_mut() {
                    bar.advance(contacts.len() as u64, sink)?;
                }
                counter.advance_evaluated(contacts.len() as u64);

                let mut deferred = false;
                for contact in contacts.values() {
                    self.scheduler.set_current_contact(contact);

                    let execution_at = self.scheduler.execution_date_time(&event, now)?;
                    debug!(
                        event_id = %event.id,
                        contact_id = %contact.id,
                        execute_at = %execution_at,
                        reference = %now,
                        "kickoff decision"
                    );

                    if self.scheduler.should_schedule(execution_at, now) {
                        counter.advance_scheduled(1);
                        self.scheduler
                            .schedule(&event, execution_at, std::slice::from_ref(contact))
                            .await?;
                        deferred = true;
                        break;
                    }
                }

                if !deferred {
                    immediate.push(event);
                }
            }

            if !immediate.is_empty() {
                self.executor
                    .execute_events_for_contacts(&immediate, &contacts, counter)
                    .await?;
            }

            self.finder.clear();

            metrics::batch_duration_ms().record(batch_started.elapsed().as_millis() as f64, &[]);
            record_batch(&Span::current(), batch_index, contacts.len());
            batch_index += 1;

            if limiter.contact_id().is_some() {
                // No use making another call
                break;
            }

            limiter.set_batch_min_contact_id(next_min_contact_id);
            debug!(
                batch_min_contact_id = %next_min_contact_id,
                "fetching the next batch of kickoff contacts"
            );
            contacts = self.finder.contacts(campaign.id, limiter).await?;
        }

        Ok(())
    }

    async fn prepare(
        &mut self,
        campaign: &Campaign,
        limiter: &ContactLimiter,
        sink: &mut OutputSink<'_>,
    ) -> Result<Preparation> {
        let root_event_ids = campaign.root_event_ids();
        debug!(campaign_id = %campaign.id, events = ?root_event_ids, "processing kickoff events");

        let total_contacts = self
            .finder
            .contact_count(campaign.id, &root_event_ids, limiter)
            .await?;
        let total = campaign.root_events.len() as u64 * total_contacts;

        sink.writeln(&format!(
            "Executing {total} kickoff event(s) in batches of {}",
            limiter.batch_limit()
        ))?;

        if total == 0 {
            return Ok(Preparation::Empty);
        }
        Ok(Preparation::Proceed { total })
    }
}
