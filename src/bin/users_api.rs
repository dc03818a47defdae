use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use log::*;
use structopt::StructOpt;

use barehttp::prelude::*;
use barehttp::server::TcpServer;
use barehttp::users;

#[derive(Debug, StructOpt)]
#[structopt(name = "users-api", about = "Users REST API backed by a JSON file.")]
struct Opt {
    #[structopt(short, long, default_value = "0.0.0.0")]
    bind: String,
    #[structopt(short, long, default_value = "3333")]
    port: u16,
    #[structopt(short, long, parse(from_os_str), default_value = "db.json")]
    db: PathBuf,
    /// 0 spawns a thread per connection, 1 serves inline, n > 1 uses a pool
    #[structopt(long, default_value = "0")]
    threads: usize,
    #[structopt(long, default_value = "0")]
    timeout: u64,
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,
}

fn timeout(seconds: u64) -> Option<Duration> {
    if seconds == 0 {
        None
    } else {
        Some(Duration::from_secs(seconds))
    }
}

fn setup_logging(verbosity: usize) {
    let result = stderrlog::new()
        .module(module_path!())
        .module("barehttp")
        .verbosity(verbosity)
        .timestamp(stderrlog::Timestamp::Millisecond)
        .init();
    if let Err(e) = result {
        eprintln!("failed to set up logging: {}", e);
    }
}

fn main() {
    let opt = Opt::from_args();
    setup_logging(opt.verbose);

    let store = match Store::open(&opt.db) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("cannot open {}: {}", opt.db.display(), e);
            process::exit(1);
        }
    };

    let bind = format!("{}:{}", opt.bind, opt.port);
    let mut server = match TcpServer::new(&bind, opt.threads, timeout(opt.timeout), users::routes(store)) {
        Ok(server) => server,
        Err(e) => {
            error!("cannot listen on {}: {}", &bind, e);
            process::exit(1);
        }
    };
    info!("listening on {}, data in {}", &bind, opt.db.display());
    server.serve_forever();
}
