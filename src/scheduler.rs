use log::error;
use std::thread;

const DEFAULT_TASK_NAME: &str = "blemetronome-worker";

pub trait Scheduler {
    /// Runs `f` on a context identifiable by `name`.
    fn spawn_named<F>(&self, name: &str, f: F)
    where
        F: FnOnce() + Send + 'static;

    fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.spawn_named(DEFAULT_TASK_NAME, f);
    }
}

pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn_named<F>(&self, name: &str, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(e) = thread::Builder::new().name(name.to_string()).spawn(f) {
            error!("Failed to spawn thread '{}': {}", name, e);
        }
    }
}

pub fn create_scheduler() -> ThreadScheduler {
    ThreadScheduler::new()
}
