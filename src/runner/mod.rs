//! Runners implement threading strategies for Servers.
use std::io;
use std::thread;

use log::error;

use threadpool::ThreadPool;

mod threadpool;

/// Runs each job inline, on the calling thread.
pub struct SimpleRunner;

impl SimpleRunner {
    pub fn run<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        f();
    }
}

/// Runs each job on a thread of its own.
pub struct ThreadRunner {
    threads: Vec<thread::JoinHandle<()>>,
}

impl Default for ThreadRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadRunner {
    pub fn new() -> Self {
        Self { threads: vec![] }
    }

    pub fn run<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.threads.retain(|t| !t.is_finished());
        match thread::Builder::new().spawn(f) {
            Ok(thread) => self.threads.push(thread),
            Err(e) => error!("failed to spawn thread: {}", e),
        }
    }
}

impl Drop for ThreadRunner {
    fn drop(&mut self) {
        for thread in self.threads.drain(..) {
            if let Err(e) = thread.join() {
                error!("Error joining thread: {:?}", e);
            }
        }
    }
}

/// Runs jobs on a fixed set of worker threads.
pub struct ThreadPoolRunner {
    threadpool: ThreadPool,
}

impl ThreadPoolRunner {
    pub fn new(pool_size: usize) -> io::Result<Self> {
        Ok(Self {
            threadpool: ThreadPool::new(pool_size)?,
        })
    }
    pub fn run<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(e) = self.threadpool.execute(f) {
            error!("thread pool error: {}", e);
        }
    }
}

pub enum Runner {
    Simple(SimpleRunner),
    Thread(ThreadRunner),
    ThreadPool(ThreadPoolRunner),
}

impl Runner {
    pub fn run<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Simple(runner) => runner.run(f),
            Self::Thread(runner) => runner.run(f),
            Self::ThreadPool(runner) => runner.run(f),
        }
    }

    /// Create a new runner using the specified number of threads.
    /// 0 is unbounded, a new thread will be created for each job.
    /// 1 runs in the calling thread.
    /// Any other number creates a thread pool of the specified size.
    pub fn new(n_threads: usize) -> io::Result<Self> {
        Ok(match n_threads {
            0 => Self::Thread(ThreadRunner::new()),
            1 => Self::Simple(SimpleRunner),
            n => Self::ThreadPool(ThreadPoolRunner::new(n)?),
        })
    }
}
