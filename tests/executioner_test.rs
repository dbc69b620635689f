//! Integration tests for the kickoff executioner's batch loop.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use kickoff_rs::contacts::ContactSource;
use kickoff_rs::error::{Error, Result};
use kickoff_rs::executioner::{ContactLimiter, Counter, KickoffExecutioner};
use kickoff_rs::executor::EventExecutor;
use kickoff_rs::model::*;
use kickoff_rs::scheduler::EventScheduler;

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    count_calls: usize,
    fetches: Vec<Option<ContactId>>,
    cleared: usize,
    bound_contacts: Vec<(EventId, ContactId)>,
    scheduled: Vec<(EventId, ContactId)>,
    executions: Vec<(Vec<EventId>, Vec<ContactId>)>,
}

struct StubFinder {
    total: u64,
    pages: VecDeque<ContactBatch>,
    rec: Arc<Mutex<Recorder>>,
}

impl ContactSource for StubFinder {
    async fn contact_count(
        &self,
        _campaign_id: CampaignId,
        _root_events: &[EventId],
        _limiter: &ContactLimiter,
    ) -> Result<u64> {
        self.rec.lock().unwrap().count_calls += 1;
        Ok(self.total)
    }

    async fn contacts(
        &mut self,
        _campaign_id: CampaignId,
        limiter: &ContactLimiter,
    ) -> Result<ContactBatch> {
        self.rec
            .lock()
            .unwrap()
            .fetches
            .push(limiter.batch_min_contact_id());
        Ok(self.pages.pop_front().unwrap_or_default())
    }

    fn clear(&mut self) {
        self.rec.lock().unwrap().cleared += 1;
    }
}

struct StubScheduler {
    /// (event, contact) pairs whose execution time lands in the future.
    defer: HashSet<(i64, i64)>,
    fail_on_schedule: bool,
    current: Option<ContactId>,
    rec: Arc<Mutex<Recorder>>,
}

impl EventScheduler for StubScheduler {
    fn set_current_contact(&mut self, contact: &Contact) {
        self.current = Some(contact.id);
    }

    fn execution_date_time(
        &self,
        event: &CampaignEvent,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let contact = self
            .current
            .ok_or_else(|| Error::Other("no current contact bound".to_string()))?;
        self.rec
            .lock()
            .unwrap()
            .bound_contacts
            .push((event.id, contact));
        if self.defer.contains(&(event.id.0, contact.0)) {
            Ok(now + Duration::hours(1))
        } else {
            Ok(now)
        }
    }

    fn should_schedule(&self, execution_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        execution_at > now
    }

    async fn schedule(
        &mut self,
        event: &CampaignEvent,
        _execution_at: DateTime<Utc>,
        contacts: &[Contact],
    ) -> Result<()> {
        if self.fail_on_schedule {
            return Err(Error::Other("schedule failed".to_string()));
        }
        let mut rec = self.rec.lock().unwrap();
        for contact in contacts {
            rec.scheduled.push((event.id, contact.id));
        }
        Ok(())
    }
}

struct StubExecutor {
    rec: Arc<Mutex<Recorder>>,
}

impl EventExecutor for StubExecutor {
    async fn execute_events_for_contacts(
        &self,
        events: &[CampaignEvent],
        contacts: &ContactBatch,
        counter: &mut Counter,
    ) -> Result<()> {
        self.rec.lock().unwrap().executions.push((
            events.iter().map(|e| e.id).collect(),
            contacts.keys().copied().collect(),
        ));
        counter.advance_executed((events.len() * contacts.len()) as u64);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn contact(id: i64) -> Contact {
    Contact {
        id: ContactId(id),
        email: Some(format!("contact{id}@example.com")),
        timezone: None,
        date_added: Utc::now(),
    }
}

fn batch(ids: &[i64]) -> ContactBatch {
    ids.iter().map(|&id| (ContactId(id), contact(id))).collect()
}

fn event(id: i64) -> CampaignEvent {
    CampaignEvent {
        id: EventId(id),
        campaign_id: CampaignId(1),
        name: format!("kickoff {id}"),
        action_type: "email.send".to_string(),
        params: serde_json::json!({}),
        trigger: TriggerMode::Immediate,
        timing: None,
        event_order: id as i32,
    }
}

fn campaign(events: Vec<CampaignEvent>) -> Campaign {
    Campaign {
        id: CampaignId(1),
        name: "welcome series".to_string(),
        published: true,
        root_events: events,
        created_at: Utc::now(),
    }
}

struct Harness {
    executioner: KickoffExecutioner<StubFinder, StubScheduler, StubExecutor>,
    rec: Arc<Mutex<Recorder>>,
}

fn harness(total: u64, pages: Vec<ContactBatch>, defer: &[(i64, i64)]) -> Harness {
    let rec = Arc::new(Mutex::new(Recorder::default()));
    let finder = StubFinder {
        total,
        pages: pages.into(),
        rec: Arc::clone(&rec),
    };
    let scheduler = StubScheduler {
        defer: defer.iter().copied().collect(),
        fail_on_schedule: false,
        current: None,
        rec: Arc::clone(&rec),
    };
    let executor = StubExecutor {
        rec: Arc::clone(&rec),
    };
    Harness {
        executioner: KickoffExecutioner::new(finder, scheduler, executor),
        rec,
    }
}

// ---------------------------------------------------------------------------
// Benign-empty conditions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn campaign_without_kickoff_events_is_a_clean_noop() {
    let mut h = harness(5, vec![batch(&[1, 2])], &[]);
    let mut limiter = ContactLimiter::new(10);

    let counter = h
        .executioner
        .execute(&campaign(vec![]), &mut limiter, None)
        .await
        .unwrap();

    assert_eq!(counter, Counter::new());
    let rec = h.rec.lock().unwrap();
    assert!(rec.fetches.is_empty());
    assert!(rec.scheduled.is_empty());
    assert!(rec.executions.is_empty());
}

#[tokio::test]
async fn campaign_without_eligible_contacts_is_a_clean_noop() {
    let mut h = harness(0, vec![], &[]);
    let mut limiter = ContactLimiter::new(10);

    let counter = h
        .executioner
        .execute(&campaign(vec![event(1), event(2)]), &mut limiter, None)
        .await
        .unwrap();

    assert_eq!(counter, Counter::new());
    let rec = h.rec.lock().unwrap();
    assert_eq!(rec.count_calls, 1);
    assert!(rec.fetches.is_empty());
    assert!(rec.executions.is_empty());
}

#[tokio::test]
async fn empty_first_page_after_nonzero_estimate_returns_cleanly() {
    let mut h = harness(4, vec![], &[]);
    let mut limiter = ContactLimiter::new(10);

    let counter = h
        .executioner
        .execute(&campaign(vec![event(1)]), &mut limiter, None)
        .await
        .unwrap();

    assert_eq!(counter.events_total(), 1);
    assert_eq!(counter.evaluated(), 0);
    assert_eq!(counter.executed(), 0);
    assert!(h.rec.lock().unwrap().executions.is_empty());
}

// ---------------------------------------------------------------------------
// Immediate execution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_now_decisions_execute_the_whole_batch_at_once() {
    let mut h = harness(3, vec![batch(&[10, 11, 12])], &[]);
    let mut limiter = ContactLimiter::new(10);

    let counter = h
        .executioner
        .execute(&campaign(vec![event(1), event(2)]), &mut limiter, None)
        .await
        .unwrap();

    assert_eq!(counter.events_total(), 2);
    assert_eq!(counter.evaluated(), 6);
    assert_eq!(counter.scheduled(), 0);
    assert_eq!(counter.executed(), 6);

    let rec = h.rec.lock().unwrap();
    assert_eq!(rec.executions.len(), 1);
    let (events, contacts) = &rec.executions[0];
    assert_eq!(events, &vec![EventId(1), EventId(2)]);
    assert_eq!(
        contacts,
        &vec![ContactId(10), ContactId(11), ContactId(12)]
    );
}

// ---------------------------------------------------------------------------
// Deferral drops the event for the whole batch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_deferral_removes_event_for_the_rest_of_the_batch() {
    // Contact 1 defers the only event; contact 2 alone would not have.
    let mut h = harness(2, vec![batch(&[1, 2])], &[(1, 1)]);
    let mut limiter = ContactLimiter::new(10);

    let counter = h
        .executioner
        .execute(&campaign(vec![event(1)]), &mut limiter, None)
        .await
        .unwrap();

    assert_eq!(counter.scheduled(), 1);
    assert_eq!(counter.executed(), 0);
    // Evaluation is charged per event x batch contacts, up front.
    assert_eq!(counter.evaluated(), 2);

    let rec = h.rec.lock().unwrap();
    assert_eq!(rec.scheduled, vec![(EventId(1), ContactId(1))]);
    assert!(rec.executions.is_empty());
    // Contact 2 was never even considered for the dropped event.
    assert_eq!(rec.bound_contacts, vec![(EventId(1), ContactId(1))]);
}

#[tokio::test]
async fn deferral_of_one_event_leaves_other_events_executable() {
    let mut h = harness(2, vec![batch(&[1, 2])], &[(1, 1)]);
    let mut limiter = ContactLimiter::new(10);

    let counter = h
        .executioner
        .execute(&campaign(vec![event(1), event(2)]), &mut limiter, None)
        .await
        .unwrap();

    assert_eq!(counter.scheduled(), 1);
    assert_eq!(counter.executed(), 2);

    let rec = h.rec.lock().unwrap();
    assert_eq!(rec.scheduled, vec![(EventId(1), ContactId(1))]);
    assert_eq!(rec.executions.len(), 1);
    let (events, contacts) = &rec.executions[0];
    assert_eq!(events, &vec![EventId(2)]);
    assert_eq!(contacts, &vec![ContactId(1), ContactId(2)]);
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn paging_advances_the_contact_id_cursor_until_exhaustion() {
    let mut h = harness(5, vec![batch(&[10, 11, 12]), batch(&[20, 21])], &[]);
    let mut limiter = ContactLimiter::new(3);

    let counter = h
        .executioner
        .execute(&campaign(vec![event(1)]), &mut limiter, None)
        .await
        .unwrap();

    assert_eq!(counter.evaluated(), 5);
    assert_eq!(counter.executed(), 5);

    let rec = h.rec.lock().unwrap();
    // First fetch unbounded, then lower bounds past each batch's max id.
    assert_eq!(
        rec.fetches,
        vec![None, Some(ContactId(13)), Some(ContactId(22))]
    );
    assert_eq!(rec.executions.len(), 2);
    assert_eq!(rec.cleared, 2);
}

#[tokio::test]
async fn single_contact_mode_fetches_exactly_one_batch() {
    let mut h = harness(1, vec![batch(&[7]), batch(&[8])], &[]);
    let mut limiter = ContactLimiter::new(100).for_contact(ContactId(7));

    let counter = h
        .executioner
        .execute(&campaign(vec![event(1)]), &mut limiter, None)
        .await
        .unwrap();

    assert_eq!(counter.executed(), 1);

    let rec = h.rec.lock().unwrap();
    assert_eq!(rec.fetches, vec![None]);
    assert_eq!(rec.executions.len(), 1);
    assert_eq!(rec.executions[0].1, vec![ContactId(7)]);
}

// ---------------------------------------------------------------------------
// Progress output and failure propagation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn progress_stream_reports_total_and_closes_with_a_blank_line() {
    let mut h = harness(3, vec![batch(&[10, 11, 12])], &[]);
    let mut limiter = ContactLimiter::new(50);
    let mut out = Vec::new();

    h.executioner
        .execute(
            &campaign(vec![event(1), event(2)]),
            &mut limiter,
            Some(&mut out),
        )
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Executing 6 kickoff event(s) in batches of 50"));
    assert!(text.ends_with("\n\n"));
}

#[tokio::test]
async fn scheduling_failure_propagates_but_still_finalizes_progress() {
    let rec = Arc::new(Mutex::new(Recorder::default()));
    let finder = StubFinder {
        total: 2,
        pages: vec![batch(&[1, 2])].into(),
        rec: Arc::clone(&rec),
    };
    let scheduler = StubScheduler {
        defer: [(1, 1)].into_iter().collect(),
        fail_on_schedule: true,
        current: None,
        rec: Arc::clone(&rec),
    };
    let executor = StubExecutor {
        rec: Arc::clone(&rec),
    };
    let mut executioner = KickoffExecutioner::new(finder, scheduler, executor);

    let mut limiter = ContactLimiter::new(10);
    let mut out = Vec::new();
    let result = executioner
        .execute(&campaign(vec![event(1)]), &mut limiter, Some(&mut out))
        .await;

    assert!(result.is_err());
    assert!(rec.lock().unwrap().executions.is_empty());

    // The indicator is closed out on the failure path too.
    let text = String::from_utf8(out).unwrap();
    assert!(text.ends_with("\n\n"));
}

#[tokio::test]
async fn quiet_runs_produce_identical_counters() {
    let mut loud = harness(3, vec![batch(&[10, 11, 12])], &[(1, 10)]);
    let mut quiet = harness(3, vec![batch(&[10, 11, 12])], &[(1, 10)]);
    let events = vec![event(1), event(2)];

    let mut out = Vec::new();
    let with_output = loud
        .executioner
        .execute(
            &campaign(events.clone()),
            &mut ContactLimiter::new(10),
            Some(&mut out),
        )
        .await
        .unwrap();
    let without_output = quiet
        .executioner
        .execute(&campaign(events), &mut ContactLimiter::new(10), None)
        .await
        .unwrap();

    assert_eq!(with_output, without_output);
    assert!(!out.is_empty());
}
