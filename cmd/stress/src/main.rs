//! Stress test - many handlers
//!
//! Posts a large number of handlers from several producers onto a worker
//! pool and reports throughput.
//!
//! Usage: stress [HANDLERS] [WORKERS] [PRODUCERS]
//!
//! `TASKIO_STRESS_HANDLERS` sets the handler count when no argument is given.

use taskio::{env_get, Runtime, ServiceConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn main() {
    println!("=== taskio Stress Test ===\n");

    let mut args = std::env::args().skip(1);
    let num_handlers: usize = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| env_get("TASKIO_STRESS_HANDLERS", 1_000_000));
    let num_workers: usize = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    let num_producers: usize = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4)
        .max(1);

    println!(
        "Posting {} handlers from {} producers onto {} workers...",
        num_handlers, num_producers, num_workers
    );

    let config = ServiceConfig::from_env().num_workers(num_workers);
    let mut runtime = match Runtime::new(config) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create runtime: {}", e);
            std::process::exit(1);
        }
    };

    let completed = Arc::new(AtomicU64::new(0));
    let start = Instant::now();

    let result = runtime.block_on(|service| {
        let per_producer = num_handlers / num_producers;
        let remainder = num_handlers % num_producers;

        let producers: Vec<_> = (0..num_producers)
            .map(|p| {
                let service = service.clone();
                let completed = completed.clone();
                let count = per_producer + usize::from(p < remainder);
                thread::spawn(move || {
                    for _ in 0..count {
                        let c = completed.clone();
                        service.post(move || {
                            c.fetch_add(1, Ordering::Relaxed);
                        });
                    }
                })
            })
            .collect();
        for p in producers {
            let _ = p.join();
        }
        start.elapsed()
    });

    let total_time = start.elapsed();
    let (post_time, executed) = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("run failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n=== Results ===");
    println!("Total handlers:  {}", num_handlers);
    println!("Executed:        {}", executed);
    println!("Completed:       {}", completed.load(Ordering::Relaxed));
    println!("Post time:       {:?}", post_time);
    println!("Total time:      {:?}", total_time);
    println!("Throughput:      {:.0} handlers/sec",
        num_handlers as f64 / total_time.as_secs_f64());

    println!("\n=== Stress Test Complete ===");
}
