//! Registry of in-flight loads.
//!
//! Each load occupies one slot holding its completion. A slot is addressed by
//! `(index, generation)`; the generation bumps whenever a vacated slot is
//! reused, so a stale handle can never reach a newer request. Completing and
//! cancelling both vacate the slot under the registry lock, which makes the
//! first of the two win and the other a no-op.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::ports::{Completion, FeedImageDataLoaderTask, FetchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TaskId {
    index: usize,
    generation: u64,
}

struct Slot {
    generation: u64,
    completion: Option<Completion>,
}

#[derive(Default)]
struct Slots {
    entries: Vec<Slot>,
    free: Vec<usize>,
    in_flight: usize,
}

/// Arena of pending completions shared by a loader and its handles.
#[derive(Default)]
pub struct TaskRegistry {
    slots: Mutex<Slots>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a pending completion.
    ///
    /// The handle goes to the caller; the completer goes to whoever produces
    /// the result.
    #[must_use]
    pub fn register(self: &Arc<Self>, completion: Completion) -> (TaskHandle, Completer) {
        let id = {
            let mut slots = self.lock();
            let id = if let Some(index) = slots.free.pop() {
                let slot = &mut slots.entries[index];
                slot.generation += 1;
                slot.completion = Some(completion);
                TaskId {
                    index,
                    generation: slot.generation,
                }
            } else {
                slots.entries.push(Slot {
                    generation: 0,
                    completion: Some(completion),
                });
                TaskId {
                    index: slots.entries.len() - 1,
                    generation: 0,
                }
            };
            slots.in_flight += 1;
            id
        };
        trace!(index = id.index, generation = id.generation, "registered load");

        (
            TaskHandle {
                registry: Arc::clone(self),
                id,
            },
            Completer {
                registry: Arc::clone(self),
                id,
                finished: false,
            },
        )
    }

    /// Returns the number of loads that are neither completed nor cancelled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    fn is_pending(&self, id: TaskId) -> bool {
        self.lock()
            .entries
            .get(id.index)
            .is_some_and(|slot| slot.generation == id.generation && slot.completion.is_some())
    }

    /// Vacates the slot and hands back its completion, if `id` still owns it.
    ///
    /// The lock is released before the caller runs or drops the completion.
    fn take(&self, id: TaskId) -> Option<Completion> {
        let mut slots = self.lock();
        let slot = slots.entries.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let completion = slot.completion.take()?;
        slots.free.push(id.index);
        slots.in_flight -= 1;
        Some(completion)
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

/// Caller-side handle to a registered load.
pub struct TaskHandle {
    registry: Arc<TaskRegistry>,
    id: TaskId,
}

impl TaskHandle {
    /// Returns true until the load completes or is cancelled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.registry.is_pending(self.id)
    }
}

impl FeedImageDataLoaderTask for TaskHandle {
    fn cancel(&self) {
        if let Some(completion) = self.registry.take(self.id) {
            trace!(index = self.id.index, "cancelled load");
            drop(completion);
        }
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("index", &self.id.index)
            .field("generation", &self.id.generation)
            .finish()
    }
}

/// Producer-side handle that delivers the result of a registered load.
///
/// Dropping it without calling [`Completer::complete`] vacates the slot
/// without invoking the completion.
pub struct Completer {
    registry: Arc<TaskRegistry>,
    id: TaskId,
    finished: bool,
}

impl Completer {
    /// Delivers `result` unless the load was cancelled first.
    ///
    /// Returns whether the completion ran.
    pub fn complete(mut self, result: FetchResult) -> bool {
        self.finished = true;
        match self.registry.take(self.id) {
            Some(completion) => {
                completion(result);
                true
            }
            None => {
                trace!(index = self.id.index, "dropped result of cancelled load");
                false
            }
        }
    }

    /// Returns true once the caller has cancelled the load.
    ///
    /// Backends poll this to abandon work early.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        !self.registry.is_pending(self.id)
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.registry.take(self.id));
        }
    }
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("index", &self.id.index)
            .field("generation", &self.id.generation)
            .finish_non_exhaustive()
    }
}
