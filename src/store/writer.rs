//! Background writer for store snapshots.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;

use log::{debug, error, trace};

use crate::store::StoreError;

enum Message {
    Write(Vec<u8>),
    Flush(mpsc::Sender<Result<(), StoreError>>),
    Terminate,
}

/// Owns the backing file and rewrites it, one snapshot at a time, on a
/// dedicated thread. Snapshots are written in the order they were queued.
pub struct Writer {
    path: PathBuf,
    sender: Mutex<mpsc::Sender<Message>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Writer {
    pub fn spawn(path: PathBuf) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let thread_path = path.clone();
        let thread = thread::Builder::new()
            .name("store-writer".to_string())
            .spawn(move || run(&thread_path, receiver))?;
        Ok(Self {
            path,
            sender: Mutex::new(sender),
            thread: Some(thread),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn send(&self, message: Message) -> Result<(), StoreError> {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        sender.send(message).map_err(|_| StoreError::WriterGone)
    }

    /// Queue a full snapshot; returns without waiting for the write.
    pub fn write(&self, snapshot: Vec<u8>) -> Result<(), StoreError> {
        self.send(Message::Write(snapshot))
    }

    /// Wait until every snapshot queued so far has been written. Returns
    /// the last write error seen since the previous flush, if any.
    pub fn flush(&self) -> Result<(), StoreError> {
        let (sender, receiver) = mpsc::channel();
        self.send(Message::Flush(sender))?;
        receiver.recv().map_err(|_| StoreError::WriterGone)?
    }
}

fn run(path: &Path, receiver: mpsc::Receiver<Message>) {
    let mut last_error: Option<io::Error> = None;
    // Ends on Terminate or when every sender is gone.
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Write(snapshot) => match fs::write(path, &snapshot) {
                Ok(()) => trace!("wrote {} bytes to {}", snapshot.len(), path.display()),
                Err(e) => {
                    error!("failed to persist store to {}: {}", path.display(), e);
                    last_error = Some(e);
                }
            },
            Message::Flush(reply) => {
                let result = match last_error.take() {
                    Some(e) => Err(StoreError::Io(e)),
                    None => Ok(()),
                };
                // The caller may have stopped waiting.
                let _ = reply.send(result);
            }
            Message::Terminate => break,
        }
    }
    debug!("store writer for {} stopped", path.display());
}

impl Drop for Writer {
    fn drop(&mut self) {
        // Queued snapshots are written before Terminate is handled.
        if self.send(Message::Terminate).is_err() {
            error!("store writer for {} already stopped", self.path.display());
        }
        if let Some(thread) = self.thread.take() {
            if let Err(e) = thread.join() {
                error!("error joining store writer: {:?}", e);
            }
        }
    }
}
