#![forbid(unsafe_code)]
//! The rendezvous queue. One mutex owns the pending queue, the waiter
//! registry, and the audit history; blocked waits park on per-wait condvar
//! slots outside that mutex so senders never wait on waiters.

use crate::bus::EventBus;
use crate::error::BrokerError;
use crate::events;
use crate::history::BrokerHistory;
use crate::types::{
    CommandInput, CommandStatus, HistoryAction, PendingCommand, SendOutcome, WaitFilters,
    WaitingAgentInfo,
};
use gm_core::ids::new_id;
use gm_core::model::Priority;
use gm_core::time::now_ms;
use serde_json::json;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;
const DEFAULT_COMMAND_SOURCE: &str = "external";

const CAUSE_SUPERSEDED: &str = "superseded by new wait";
const CAUSE_EXTERNAL: &str = "cancelled by external request";

#[derive(Clone, Copy, Debug)]
pub struct BrokerConfig {
    pub default_wait_timeout_ms: u64,
    pub history_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            default_wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug)]
enum SlotState {
    Waiting,
    Resolved(Box<PendingCommand>),
    Cancelled(&'static str),
}

#[derive(Debug)]
struct WaitSlot {
    state: Mutex<SlotState>,
    cv: Condvar,
}

impl WaitSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Waiting),
            cv: Condvar::new(),
        }
    }

    /// Terminal transitions happen at most once; later attempts are no-ops.
    fn finish(&self, next: SlotState) {
        let mut guard = lock(&self.state);
        if matches!(*guard, SlotState::Waiting) {
            *guard = next;
            self.cv.notify_one();
        }
    }
}

#[derive(Debug)]
struct Waiter {
    agent_id: String,
    filters: WaitFilters,
    started_at_ms: i64,
    slot: Arc<WaitSlot>,
}

#[derive(Debug)]
struct BrokerState {
    pending: Vec<PendingCommand>,
    waiters: Vec<Waiter>,
    history: BrokerHistory,
}

/// Rendezvous broker. Owns its queues exclusively; clones of the `Arc` share
/// one queue. All state is process-local and volatile.
#[derive(Debug)]
pub struct CommandBroker {
    config: BrokerConfig,
    state: Mutex<BrokerState>,
    bus: Option<Arc<EventBus>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CommandBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self::build(config, None)
    }

    pub fn with_bus(config: BrokerConfig, bus: Arc<EventBus>) -> Self {
        Self::build(config, Some(bus))
    }

    fn build(config: BrokerConfig, bus: Option<Arc<EventBus>>) -> Self {
        Self {
            config,
            state: Mutex::new(BrokerState {
                pending: Vec::new(),
                waiters: Vec::new(),
                history: BrokerHistory::new(config.history_capacity),
            }),
            bus,
        }
    }

    fn publish(&self, name: &str, payload: serde_json::Value) {
        if let Some(bus) = &self.bus {
            bus.publish(name, payload);
        }
    }

    /// Block until a matching command arrives, the wait is cancelled, or the
    /// deadline passes. A second wait for the same agent supersedes the
    /// first, which rejects with a distinguishable cause.
    pub fn wait_for_command(
        &self,
        agent_id: &str,
        timeout_ms: Option<u64>,
        filters: WaitFilters,
    ) -> Result<PendingCommand, BrokerError> {
        let agent_id = agent_id.trim();
        if agent_id.is_empty() {
            return Err(BrokerError::InvalidInput("agentId must not be empty"));
        }
        let timeout_ms = timeout_ms.unwrap_or(self.config.default_wait_timeout_ms);
        let started_at_ms = now_ms();

        let slot = {
            let mut state = lock(&self.state);

            // One ACTIVE wait per agent: the older wait loses.
            if let Some(position) = state.waiters.iter().position(|w| w.agent_id == agent_id) {
                let old = state.waiters.remove(position);
                old.slot.finish(SlotState::Cancelled(CAUSE_SUPERSEDED));
                state.history.push(
                    HistoryAction::WaitFailed,
                    Some(agent_id),
                    json!({ "reason": CAUSE_SUPERSEDED }),
                );
                self.publish(
                    events::AGENT_WAIT_CANCELLED,
                    json!({ "agentId": agent_id, "reason": CAUSE_SUPERSEDED }),
                );
            }

            // Highest priority first, then oldest; strict comparison keeps
            // the earliest-queued command on ties.
            let mut best: Option<usize> = None;
            for (index, command) in state.pending.iter().enumerate() {
                if !filters.accepts(command) {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some(current) => {
                        let current = &state.pending[current];
                        command.priority > current.priority
                            || (command.priority == current.priority
                                && command.created_at_ms < current.created_at_ms)
                    }
                };
                if better {
                    best = Some(index);
                }
            }
            if let Some(index) = best {
                let mut command = state.pending.remove(index);
                command.status = CommandStatus::Delivered;
                command.delivered_to = Some(agent_id.to_string());
                command.delivered_at_ms = Some(now_ms());
                state.history.push(
                    HistoryAction::CommandReceived,
                    Some(agent_id),
                    command.to_json(),
                );
                drop(state);
                self.publish(events::COMMAND_DELIVERED, command.to_json());
                debug!(agent_id, command = %command.id, "pending command delivered on wait");
                return Ok(command);
            }

            let slot = Arc::new(WaitSlot::new());
            state.waiters.push(Waiter {
                agent_id: agent_id.to_string(),
                filters: filters.clone(),
                started_at_ms,
                slot: Arc::clone(&slot),
            });
            state.history.push(
                HistoryAction::WaitStarted,
                Some(agent_id),
                json!({ "filters": filters.to_json(), "timeoutMs": timeout_ms }),
            );
            slot
        };
        self.publish(
            events::AGENT_WAITING,
            json!({ "agentId": agent_id, "filters": filters.to_json(), "timeoutMs": timeout_ms }),
        );
        debug!(agent_id, timeout_ms, "agent wait registered");

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut guard = lock(&slot.state);
        loop {
            match &mut *guard {
                SlotState::Resolved(command) => {
                    let command = std::mem::replace(
                        command,
                        Box::new(placeholder_command()),
                    );
                    return Ok(*command);
                }
                SlotState::Cancelled(reason) => {
                    return Err(BrokerError::WaitCancelled { reason: *reason });
                }
                SlotState::Waiting => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    let (next, _timed_out) = wait_on(&slot.cv, guard, deadline - now);
                    guard = next;
                }
            }
        }
        drop(guard);

        // Deadline passed. Deregister under the broker mutex; a delivery that
        // raced the timeout wins.
        let mut state = lock(&self.state);
        {
            let slot_state = lock(&slot.state);
            match &*slot_state {
                SlotState::Resolved(command) => return Ok((**command).clone()),
                SlotState::Cancelled(reason) => {
                    return Err(BrokerError::WaitCancelled { reason: *reason });
                }
                SlotState::Waiting => {}
            }
        }
        state
            .waiters
            .retain(|waiter| !Arc::ptr_eq(&waiter.slot, &slot));
        state.history.push(
            HistoryAction::WaitFailed,
            Some(agent_id),
            json!({ "reason": "timeout", "timeoutMs": timeout_ms }),
        );
        debug!(agent_id, timeout_ms, "agent wait timed out");
        Err(BrokerError::WaitTimeout {
            waited_ms: timeout_ms,
        })
    }

    /// Hand a command to the earliest-registered matching waiter, or queue it
    /// as PENDING. Never an error on "no match".
    pub fn send_command(&self, input: CommandInput) -> Result<SendOutcome, BrokerError> {
        if input.command_type.trim().is_empty() {
            return Err(BrokerError::InvalidInput("command type must not be empty"));
        }

        let mut command = PendingCommand {
            id: input
                .id
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(new_id),
            command_type: input.command_type,
            source: input
                .source
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COMMAND_SOURCE.to_string()),
            payload: input.payload,
            priority: input.priority.unwrap_or(Priority::Medium),
            target_component_ids: input.target_component_ids,
            task_type: input.task_type,
            created_at_ms: now_ms(),
            status: CommandStatus::Pending,
            delivered_to: None,
            delivered_at_ms: None,
        };

        let mut state = lock(&self.state);
        let matched = state
            .waiters
            .iter()
            .position(|waiter| waiter.filters.accepts(&command));
        if let Some(position) = matched {
            let waiter = state.waiters.remove(position);
            command.status = CommandStatus::Delivered;
            command.delivered_to = Some(waiter.agent_id.clone());
            command.delivered_at_ms = Some(now_ms());
            state.history.push(
                HistoryAction::CommandSent,
                Some(&waiter.agent_id),
                command.to_json(),
            );
            waiter
                .slot
                .finish(SlotState::Resolved(Box::new(command.clone())));
            drop(state);
            self.publish(events::COMMAND_DELIVERED, command.to_json());
            debug!(command = %command.id, agent_id = %waiter.agent_id, "command delivered to waiter");
            return Ok(SendOutcome {
                delivered: true,
                agent_id: Some(waiter.agent_id),
                command,
            });
        }

        state.history.push(HistoryAction::CommandQueued, None, command.to_json());
        state.pending.push(command.clone());
        drop(state);
        self.publish(events::COMMAND_QUEUED, command.to_json());
        debug!(command = %command.id, "command queued");
        Ok(SendOutcome {
            delivered: false,
            agent_id: None,
            command,
        })
    }

    /// Remove a PENDING command. Unknown or already-terminal ids are a no-op.
    pub fn cancel_command(&self, id: &str) -> bool {
        let mut state = lock(&self.state);
        let Some(position) = state.pending.iter().position(|c| c.id == id) else {
            return false;
        };
        let mut command = state.pending.remove(position);
        command.status = CommandStatus::Cancelled;
        state
            .history
            .push(HistoryAction::CommandCancelled, None, command.to_json());
        true
    }

    /// Reject an ACTIVE wait with a cancellation cause. Unknown agents are a
    /// no-op.
    pub fn cancel_wait(&self, agent_id: &str) -> bool {
        let mut state = lock(&self.state);
        let Some(position) = state.waiters.iter().position(|w| w.agent_id == agent_id) else {
            return false;
        };
        let waiter = state.waiters.remove(position);
        waiter.slot.finish(SlotState::Cancelled(CAUSE_EXTERNAL));
        state.history.push(
            HistoryAction::WaitFailed,
            Some(agent_id),
            json!({ "reason": CAUSE_EXTERNAL }),
        );
        drop(state);
        self.publish(
            events::AGENT_WAIT_CANCELLED,
            json!({ "agentId": agent_id, "reason": CAUSE_EXTERNAL }),
        );
        true
    }

    /// Registry snapshot, in registration order.
    pub fn waiting_agents(&self) -> Vec<WaitingAgentInfo> {
        let state = lock(&self.state);
        let now = now_ms();
        state
            .waiters
            .iter()
            .map(|waiter| WaitingAgentInfo {
                agent_id: waiter.agent_id.clone(),
                filters: waiter.filters.clone(),
                started_at_ms: waiter.started_at_ms,
                elapsed_ms: now.saturating_sub(waiter.started_at_ms).max(0) as u64,
            })
            .collect()
    }

    /// PENDING commands in delivery order: priority descending, then oldest
    /// first.
    pub fn pending_commands(&self) -> Vec<PendingCommand> {
        let state = lock(&self.state);
        let mut pending = state.pending.clone();
        pending.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at_ms.cmp(&b.created_at_ms))
        });
        pending
    }

    /// Newest `limit` audit entries, newest first.
    pub fn history(&self, limit: Option<usize>) -> Vec<crate::types::HistoryEntry> {
        let state = lock(&self.state);
        state
            .history
            .newest(limit.unwrap_or(self.config.history_capacity))
    }
}

fn wait_on<'a>(
    cv: &Condvar,
    guard: MutexGuard<'a, SlotState>,
    remaining: Duration,
) -> (MutexGuard<'a, SlotState>, bool) {
    match cv.wait_timeout(guard, remaining) {
        Ok((guard, result)) => (guard, result.timed_out()),
        Err(poisoned) => {
            let (guard, result) = poisoned.into_inner();
            (guard, result.timed_out())
        }
    }
}

/// Placeholder swapped into a slot while moving the real command out; the
/// slot is terminal at that point and never read again.
fn placeholder_command() -> PendingCommand {
    PendingCommand {
        id: String::new(),
        command_type: String::new(),
        source: String::new(),
        payload: serde_json::Map::new(),
        priority: Priority::Medium,
        target_component_ids: Vec::new(),
        task_type: None,
        created_at_ms: 0,
        status: CommandStatus::Delivered,
        delivered_to: None,
        delivered_at_ms: None,
    }
}
