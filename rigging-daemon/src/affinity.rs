//! Single-owner-thread access to the project host.
//!
//! The host's project model is not safe for concurrent mutation. An
//! [`OwnerThread`] constructs the host on a dedicated thread and runs every
//! piece of project-model work there, one job at a time, in submission order.

use std::thread::{self, JoinHandle, ThreadId};

use tokio::sync::{mpsc, oneshot};

use crate::error::{io_err, DaemonError};

type Job<H> = Box<dyn FnOnce(&mut H) + Send>;

pub struct OwnerThread<H> {
    name: String,
    jobs: Option<mpsc::UnboundedSender<Job<H>>>,
    handle: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl<H: 'static> OwnerThread<H> {
    /// Spawn the owner thread and build the host on it with `init`.
    ///
    /// The host never leaves that thread, so it does not need to be `Send`.
    pub fn spawn<F>(name: &str, init: F) -> Result<Self, DaemonError>
    where
        F: FnOnce() -> Result<H, DaemonError> + Send + 'static,
    {
        let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel::<Job<H>>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), DaemonError>>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut host = match init() {
                    Ok(host) => {
                        let _ = ready_tx.send(Ok(()));
                        host
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                while let Some(job) = jobs_rx.blocking_recv() {
                    job(&mut host);
                }
                tracing::debug!("owner thread exiting");
            })
            .map_err(|e| io_err(format!("thread:{name}"), e))?;

        let thread_id = handle.thread().id();
        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = handle.join();
                return Err(err);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(DaemonError::ChannelClosed("owner thread init"));
            }
        }

        Ok(Self {
            name: name.to_string(),
            jobs: Some(jobs_tx),
            handle: Some(handle),
            thread_id,
        })
    }

    /// True when the current thread is the owner thread.
    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn submit(&self, job: Job<H>) -> Result<(), DaemonError> {
        self.jobs
            .as_ref()
            .ok_or(DaemonError::ChannelClosed("owner thread"))?
            .send(job)
            .map_err(|_| DaemonError::ChannelClosed("owner thread"))
    }

    /// Run `f` on the owner thread and block until it returns.
    ///
    /// Must not be called from inside an async task; use [`Self::call_async`].
    pub fn call<R, F>(&self, f: F) -> Result<R, DaemonError>
    where
        R: Send + 'static,
        F: FnOnce(&mut H) -> R + Send + 'static,
    {
        if self.is_owner() {
            return Err(DaemonError::ReentrantCall(self.name.clone()));
        }
        let (tx, rx) = oneshot::channel();
        self.submit(Box::new(move |host| {
            let _ = tx.send(f(host));
        }))?;
        rx.blocking_recv()
            .map_err(|_| DaemonError::ChannelClosed("owner thread response"))
    }

    /// Run `f` on the owner thread and await its result.
    pub async fn call_async<R, F>(&self, f: F) -> Result<R, DaemonError>
    where
        R: Send + 'static,
        F: FnOnce(&mut H) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(Box::new(move |host| {
            let _ = tx.send(f(host));
        }))?;
        rx.await
            .map_err(|_| DaemonError::ChannelClosed("owner thread response"))
    }

    /// Stop accepting jobs, drain the queue and join the thread.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl<H> Drop for OwnerThread<H> {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if thread::current().id() != self.thread_id && handle.join().is_err() {
                tracing::error!("owner thread '{}' panicked", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Deliberately `!Send`: only usable on the owner thread.
    struct Host {
        log: Rc<RefCell<Vec<u32>>>,
    }

    fn spawn_host() -> OwnerThread<Host> {
        OwnerThread::spawn("test-owner", || {
            Ok(Host {
                log: Rc::new(RefCell::new(Vec::new())),
            })
        })
        .expect("spawn")
    }

    #[test]
    fn jobs_run_in_order_on_one_thread() {
        let owner = spawn_host();
        let caller = thread::current().id();

        for i in 0..5 {
            owner
                .call(move |host| host.log.borrow_mut().push(i))
                .expect("call");
        }
        let (log, ran_on) = owner
            .call(|host| (host.log.borrow().clone(), thread::current().id()))
            .expect("call");
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert_ne!(ran_on, caller);
        owner.shutdown();
    }

    #[test]
    fn failed_init_is_reported() {
        let result = OwnerThread::<Host>::spawn("bad-owner", || {
            Err(DaemonError::Protocol("no solution".to_string()))
        });
        assert!(matches!(result, Err(DaemonError::Protocol(_))));
    }

    #[test]
    fn concurrent_callers_are_serialized() {
        let owner = std::sync::Arc::new(spawn_host());
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let owner = owner.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        owner
                            .call(move |host| host.log.borrow_mut().push(t * 100 + i))
                            .expect("call");
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().expect("join");
        }
        let len = owner.call(|host| host.log.borrow().len()).expect("len");
        assert_eq!(len, 40);
    }

    #[test]
    fn call_async_awaits_result() {
        let owner = spawn_host();
        let value = tokio_test::block_on(owner.call_async(|host| {
            host.log.borrow_mut().push(7);
            host.log.borrow().len()
        }))
        .expect("call_async");
        assert_eq!(value, 1);
    }

    #[test]
    fn call_from_owner_thread_is_rejected() {
        let owner = std::sync::Arc::new(spawn_host());
        let inner = owner.clone();
        let nested = owner
            .call(move |_| inner.call(|_| ()))
            .expect("outer call");
        assert!(matches!(nested, Err(DaemonError::ReentrantCall(name)) if name == "test-owner"));
    }
}
