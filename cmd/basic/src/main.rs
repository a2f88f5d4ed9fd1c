//! Basic taskio example
//!
//! Posts handlers from several producer threads onto a service driven by
//! a worker pool, and shows that `dispatch` from inside a handler runs
//! inline while `post` is deferred.
//!
//! # Environment Variables
//!
//! - `TASKIO_FLUSH_EPRINT=1` - Flush debug output immediately (useful for crash debugging)
//! - `TASKIO_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `TASKIO_TASK=condvar` - Pick the task adapter

use taskio::{Runtime, ServiceConfig};
use taskio::{kinfo, kdebug, current_worker_id};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
// TASKIO_LOG_LEVEL=debug TASKIO_FLUSH_EPRINT=1 cargo run -p taskio-basic
fn main() {
    println!("=== taskio Basic Example ===\n");

    let config = ServiceConfig::from_env()
        .num_workers(4)
        .debug_logging(true);

    let mut runtime = match Runtime::new(config) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create runtime: {}", e);
            std::process::exit(1);
        }
    };

    let completed = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));

    let result = runtime.block_on(|service| {
        kinfo!("Posting handlers from 3 producer threads...");

        let producers: Vec<_> = (1..=3)
            .map(|p| {
                let service = service.clone();
                let completed = completed.clone();
                thread::spawn(move || {
                    for j in 0..5 {
                        let c = completed.clone();
                        service.post(move || {
                            kdebug!("[producer {}] handler {} on worker {:?}", p, j, current_worker_id());
                            c.fetch_add(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();
        for p in producers {
            let _ = p.join();
        }

        // dispatch inside a handler runs before the handler returns;
        // post inside a handler runs later
        let s = service.clone();
        let o = order.clone();
        service.post(move || {
            o.lock().unwrap().push("outer-begin");
            let o2 = o.clone();
            s.dispatch(move || o2.lock().unwrap().push("dispatched"));
            let o3 = o.clone();
            s.post(move || o3.lock().unwrap().push("posted"));
            o.lock().unwrap().push("outer-end");
        });
    });

    match result {
        Ok((_, executed)) => {
            println!("Handlers executed: {}", executed);
            println!("Producer handlers: {}", completed.load(Ordering::SeqCst));
            println!("Nested order:      {:?}", order.lock().unwrap());
        }
        Err(e) => {
            eprintln!("run failed: {}", e);
            std::process::exit(1);
        }
    }

    println!("\n=== Example Complete ===");
}
