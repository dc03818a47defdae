//! TCP HTTP server.
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::*;

use crate::{
    handler::Handler,
    runner::Runner,
    server::{exchange, Server, ServerError},
};

/// A single or multi-threaded TCP server.
pub struct TcpServer<H> {
    listener: TcpListener,
    runner: Runner,
    handler: Arc<H>,
    timeout: Option<Duration>,
}

impl<H> TcpServer<H> {
    /// Create a new TCP server
    ///
    /// # Arguments
    /// * `bind_addr`: Address to listen on, such as "0.0.0.0:3333"
    /// * `n_threads`: Number of threads.
    ///   - 0: create a new thread for each connection
    ///   - 1: single-threaded, connections are served one after the other
    ///   - 2+: threadpool with n threads
    /// * `timeout`: network socket timeout, None to wait forever
    /// * `handler`: request handler
    pub fn new(
        bind_addr: &str,
        n_threads: usize,
        timeout: Option<Duration>,
        handler: H,
    ) -> Result<Self, std::io::Error> {
        Ok(Self {
            listener: TcpListener::bind(bind_addr)?,
            runner: Runner::new(n_threads)?,
            timeout,
            handler: Arc::new(handler),
        })
    }
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }
}

impl<H> Server for TcpServer<H>
where
    H: 'static + Handler,
{
    /// Accept one connection and hand its exchange to the runner.
    fn serve_one(&mut self) -> Result<(), ServerError> {
        let (mut stream, addr) = self.listener.accept()?;
        debug!("accepted connection from {:?}", addr);
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        let handler = self.handler.clone();
        self.runner.run(move || {
            let start = Instant::now();
            match exchange(&mut stream, &*handler, "barehttp::TcpServer") {
                Ok(summary) => info!(
                    "{:?} - {}ms - {} {}",
                    std::thread::current().id(),
                    start.elapsed().as_millis(),
                    addr,
                    summary,
                ),
                Err(e) => error!("{} - {}", addr, e),
            }
        });
        Ok(())
    }
}
