//! Deferred reactive flush.
//!
//! Signal subscribers run synchronously on every write. Watchers registered
//! through [`watch`] instead enqueue a job; queued jobs run when the host calls
//! [`flush`] (typically once per frame or event-loop tick). A job queued
//! several times before a flush runs once.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::{Dispose, Signal, effect};

pub type JobId = u64;

/// A job re-queued more often than this within one flush is assumed to be a
/// feedback loop and is dropped.
const RECURSION_LIMIT: usize = 100;

thread_local! {
    static QUEUE: RefCell<JobQueue> = RefCell::new(JobQueue::default());
}

#[derive(Default)]
struct JobQueue {
    next_job: JobId,
    pending: VecDeque<(JobId, Rc<dyn Fn()>)>,
    queued: HashSet<JobId>,
    flushing: bool,
}

pub fn next_job_id() -> JobId {
    QUEUE.with(|q| {
        let mut q = q.borrow_mut();
        let id = q.next_job;
        q.next_job += 1;
        id
    })
}

/// Queue `job` for the next flush unless a job with the same id is already
/// pending.
pub fn queue_job(id: JobId, job: Rc<dyn Fn()>) {
    QUEUE.with(|q| {
        let mut q = q.borrow_mut();
        if q.queued.insert(id) {
            q.pending.push_back((id, job));
        }
    });
}

pub fn has_pending_jobs() -> bool {
    QUEUE.with(|q| !q.borrow().pending.is_empty())
}

/// Run every pending job, including jobs queued by jobs. Returns the number of
/// jobs that ran. Re-entrant calls from inside a job return 0.
pub fn flush() -> usize {
    let started = QUEUE.with(|q| {
        let mut q = q.borrow_mut();
        if q.flushing {
            false
        } else {
            q.flushing = true;
            true
        }
    });
    if !started {
        return 0;
    }

    struct Finish;
    impl Drop for Finish {
        fn drop(&mut self) {
            QUEUE.with(|q| q.borrow_mut().flushing = false);
        }
    }
    let _finish = Finish;

    let mut ran = 0;
    let mut seen: HashMap<JobId, usize> = HashMap::new();
    loop {
        let next = QUEUE.with(|q| {
            let mut q = q.borrow_mut();
            let next = q.pending.pop_front();
            if let Some((id, _)) = &next {
                q.queued.remove(id);
            }
            next
        });
        let Some((id, job)) = next else { break };

        let count = seen.entry(id).or_default();
        *count += 1;
        if *count > RECURSION_LIMIT {
            log::warn!(
                "flush: job {} re-queued more than {} times in one flush; dropping it",
                id,
                RECURSION_LIMIT
            );
            continue;
        }

        job();
        ran += 1;
    }
    log::trace!("flush: ran {ran} job(s)");
    ran
}

/// Observe writes to `source`. After any number of writes, the next
/// [`flush`] calls `f` once with the value current at that time.
///
/// Registered with the current [`Scope`](crate::Scope) if any; running the
/// returned `Dispose` stops the watcher.
pub fn watch<T: Clone + 'static>(source: &Signal<T>, f: impl Fn(&T) + 'static) -> Dispose {
    let id = next_job_id();
    let weak = source.downgrade();
    let job: Rc<dyn Fn()> = Rc::new(move || {
        // Read first so `f` is free to write the source.
        if let Some(v) = weak.upgrade().map(|s| s.get()) {
            f(&v);
        }
    });

    effect(|| {
        let sub = source.subscribe(move |_| queue_job(id, job.clone()));
        let src = source.downgrade();
        Dispose::new(move || {
            if let Some(src) = src.upgrade() {
                src.unsubscribe(sub);
            }
            QUEUE.with(|q| {
                let mut q = q.borrow_mut();
                if q.queued.remove(&id) {
                    q.pending.retain(|(j, _)| *j != id);
                }
            });
        })
    })
}
