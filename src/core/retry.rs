//! Multi-day fetch with a retry budget concentrated on the freshest days.
//!
//! The leading `fresh_slots` dates (yesterday first) are fetched once. If all
//! of them come back as zero, those slots alone get up to `extra_rounds` more
//! rounds; a slot drops out of later rounds once it holds a nonzero count.
//! The older dates are fetched once each, never retried.

use crate::api::gallery::CountFetcher;
use crate::config::RetryPolicy;
use crate::logging::{log, LogLevel};
use crate::model::{AssembleCount, DatePlan};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SlotState {
    Pending,
    Succeeded { count: AssembleCount },
    /// Every attempt the slot was given came back as zero.
    ExhaustedRetries,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResult {
    pub plan: DatePlan,
    #[serde(flatten)]
    pub state: SlotState,
    pub attempts: u32,
}

impl SlotResult {
    fn new(plan: DatePlan) -> Self {
        SlotResult {
            plan,
            state: SlotState::Pending,
            attempts: 0,
        }
    }

    /// Final count; zero unless the slot succeeded.
    pub fn count(&self) -> AssembleCount {
        match self.state {
            SlotState::Succeeded { count } => count,
            _ => 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == SlotState::Pending
    }

    async fn attempt(&mut self, fetcher: &dyn CountFetcher) -> AssembleCount {
        self.attempts += 1;
        let count = fetcher.fetch_count(&self.plan).await;
        if count > 0 {
            self.state = SlotState::Succeeded { count };
        }
        count
    }

    fn settle(&mut self) {
        if self.is_pending() {
            self.state = SlotState::ExhaustedRetries;
        }
    }
}

/// Fetches one count per planned date, in plan order.
pub async fn collect_counts(
    fetcher: &dyn CountFetcher,
    plans: &[DatePlan],
    policy: &RetryPolicy,
) -> Vec<SlotResult> {
    let mut slots: Vec<SlotResult> = plans.iter().cloned().map(SlotResult::new).collect();
    let fresh = policy.fresh_slots.min(slots.len());
    let (fresh_slots, stale_slots) = slots.split_at_mut(fresh);

    for slot in fresh_slots.iter_mut() {
        log_attempt(slot, "first pass");
        slot.attempt(fetcher).await;
    }

    if !fresh_slots.is_empty() && fresh_slots.iter().all(SlotResult::is_pending) {
        log(
            LogLevel::Warning,
            &format!(
                "All {} most recent day(s) returned 0; retrying up to {} more round(s)",
                fresh_slots.len(),
                policy.extra_rounds
            ),
        );
        for round in 1..=policy.extra_rounds {
            for slot in fresh_slots.iter_mut().filter(|s| s.is_pending()) {
                log_attempt(slot, &format!("retry round {}/{}", round, policy.extra_rounds));
                slot.attempt(fetcher).await;
            }
            if !fresh_slots.iter().any(SlotResult::is_pending) {
                log(
                    LogLevel::Success,
                    &format!("Recent days resolved after {} retry round(s)", round),
                );
                break;
            }
        }
    }
    fresh_slots.iter_mut().for_each(SlotResult::settle);

    for slot in stale_slots.iter_mut() {
        log_attempt(slot, "single pass");
        slot.attempt(fetcher).await;
        slot.settle();
    }

    for slot in slots.iter().filter(|s| s.state == SlotState::ExhaustedRetries) {
        log(
            LogLevel::Warning,
            &format!(
                "{} stayed at 0 after {} attempt(s)",
                slot.plan.date_key, slot.attempts
            ),
        );
    }
    slots
}

fn log_attempt(slot: &SlotResult, phase: &str) {
    log(
        LogLevel::Info,
        &format!(
            "Fetching {} ({} / {}) [{}]",
            slot.plan.date, slot.plan.folder_year_key, slot.plan.date_key, phase
        ),
    );
}
