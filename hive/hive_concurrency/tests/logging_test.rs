//! Tests for the installed log sink.
//!
//! The global logger can only be installed once per process, so everything
//! that needs it lives in this one test binary.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hive_concurrency::{logging, Antagonist, HiveConfig, HiveError, LogSink, PoolCoordinator};
use log::LevelFilter;
use parking_lot::Mutex;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_exploit_outcomes_reach_log_sink() {
    let buffer = SharedBuffer::default();
    logging::init(LogSink::new(Box::new(buffer.clone()), LevelFilter::Info)).unwrap();

    // Only one logger per process
    let again = logging::init(LogSink::new(Box::new(io::sink()), LevelFilter::Info));
    assert!(matches!(again, Err(HiveError::Logger(_))));

    let hive = Arc::new(
        PoolCoordinator::new(HiveConfig {
            workers: 4,
            exploit_trigger: 2,
            yield_cap: 5,
            penalty_ms: 60_000,
            seed: Some(17),
            ..Default::default()
        })
        .unwrap(),
    );

    // Two hunts come home with the whole pool at home: the first exploit fails
    for _ in 0..2 {
        let id = hive.release_one().unwrap();
        let worker = Arc::clone(&hive.workers()[id]);
        hive.return_worker(&worker);
    }

    let repelled = Arc::new(Antagonist::new(Arc::clone(&hive)));
    let handle = repelled.start().unwrap();
    assert!(wait_for(Duration::from_secs(2), || {
        repelled.stats().failures == 1
    }));
    repelled.stop();
    handle.join().unwrap();

    // Two workers out leaves a pool of two, below the threshold of three
    hive.release_one().unwrap();
    hive.release_one().unwrap();
    assert_eq!(hive.size(), 2);

    let raider = Arc::new(Antagonist::new(Arc::clone(&hive)));
    let handle = raider.start().unwrap();
    assert!(wait_for(Duration::from_secs(2), || {
        raider.stats().successes == 1
    }));
    raider.stop();
    handle.join().unwrap();

    assert_eq!(hive.yield_count(), 0);
    log::logger().flush();

    let output = buffer.contents();
    assert!(output.contains("released for"));
    assert!(output.contains("returned, yield count 2/5"));
    assert!(
        output.contains("Exploit failed against a pool of 4 (yield 2), recovering for 60000ms"),
        "{}",
        output
    );
    assert!(
        output.contains("Exploit succeeded: took 2 yield from a pool of 2"),
        "{}",
        output
    );
    assert_eq!(output.matches("Antagonist shutting down").count(), 2);
    assert!(output.lines().all(|line| line.contains(" - ")));
}
