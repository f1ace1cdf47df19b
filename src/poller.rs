use anyhow::Result;
use log::{debug, info};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum Signal<C> {
    Run(C),
    Stop,
}

/// A job that runs on its own thread: once at start, then every `interval`,
/// and early whenever it is triggered. Stopping cancels the schedule; a job
/// already running finishes but no new one starts.
pub struct Poller<C: Send + 'static> {
    name: String,
    control: Sender<Signal<C>>,
    handle: Option<JoinHandle<()>>,
}

impl<C: Clone + Send + 'static> Poller<C> {
    /// `tick` is the command used for scheduled runs.
    pub fn spawn<F>(name: &str, interval: Duration, tick: C, mut job: F) -> Result<Self>
    where
        F: FnMut(C) + Send + 'static,
    {
        let (control, rx) = mpsc::channel::<Signal<C>>();
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(format!("poll-{name}"))
            .spawn(move || {
                job(tick.clone());
                loop {
                    match rx.recv_timeout(interval) {
                        Ok(Signal::Run(cmd)) => job(cmd),
                        Err(RecvTimeoutError::Timeout) => job(tick.clone()),
                        Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("poller {thread_name} exited");
            })?;

        info!("started poller {name} every {}s", interval.as_secs());
        Ok(Self {
            name: name.to_string(),
            control,
            handle: Some(handle),
        })
    }
}

impl<C: Send + 'static> Poller<C> {
    /// Run the job now instead of waiting for the next tick.
    pub fn trigger(&self, cmd: C) {
        let _ = self.control.send(Signal::Run(cmd));
    }

    /// Cancel the schedule without waiting for an in-flight job.
    pub fn stop(&mut self) {
        if self.handle.take().is_some() {
            let _ = self.control.send(Signal::Stop);
            debug!("stopped poller {}", self.name);
        }
    }

    /// Cancel and wait for the worker thread to exit.
    pub fn shutdown(mut self) {
        if let Some(h) = self.handle.take() {
            let _ = self.control.send(Signal::Stop);
            let _ = h.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<C: Send + 'static> Drop for Poller<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn runs_on_start_and_on_trigger() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s2 = seen.clone();
        let poller = Poller::spawn("t1", Duration::from_secs(3600), "tick", move |c| {
            s2.lock().unwrap().push(c);
        })
        .unwrap();

        poller.trigger("manual");
        poller.shutdown();

        assert_eq!(*seen.lock().unwrap(), vec!["tick", "manual"]);
    }

    #[test]
    fn ticks_on_interval_until_stopped() {
        let (tx, rx) = mpsc::channel();
        let mut poller = Poller::spawn("t2", Duration::from_millis(10), (), move |_| {
            let _ = tx.send(());
        })
        .unwrap();

        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        poller.stop();
        assert!(!poller.is_running());
    }

    #[test]
    fn drop_cancels_schedule() {
        let (tx, rx) = mpsc::channel();
        {
            let _poller = Poller::spawn("t3", Duration::from_millis(5), (), move |_| {
                let _ = tx.send(());
            })
            .unwrap();
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        // worker exits and drops its sender, which disconnects the channel
        loop {
            match rx.recv_timeout(Duration::from_secs(5)) {
                Ok(()) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => panic!("worker still alive"),
            }
        }
    }
}
