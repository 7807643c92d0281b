//! Producer/consumer stages joined by a bounded pipe.
//!
//! A producer thread generates records, a consumer thread counts them, and a
//! watchdog closes the pipe with an error if the pair runs too long.
//!
//! Run with:
//!     cargo run --example producer_consumer

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ringpipe::{BufferPool, PipeConfig, pipe_with_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pool = Arc::new(BufferPool::default());
    let (reader, mut writer) = pipe_with_config(PipeConfig::new(8 * 1024)?, pool.clone())?;

    // Cancel the producer if the consumer stalls
    let closer = reader.closer();
    let deadline = Duration::from_secs(5);
    let watchdog = thread::spawn(move || {
        thread::sleep(deadline);
        // Errors here only mean the pipe already closed
        let _ = closer.close_with_error("deadline exceeded");
    });

    let producer = thread::spawn(move || -> Result<usize, ringpipe::PipeError> {
        let mut sent = 0;
        for i in 0..50_000 {
            let line = format!("record {:05} payload {}\n", i, "x".repeat(i % 40));
            writer.write_all(line.as_bytes())?;
            sent += line.len();
        }
        writer.flush()?;
        writer.close()?;
        Ok(sent)
    });

    let start = Instant::now();
    let mut lines = 0usize;
    let mut received = 0usize;
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    while reader.read_line(&mut line)? > 0 {
        lines += 1;
        received += line.len();
        line.clear();
    }

    let sent = producer.join().map_err(|_| "producer panicked")??;
    println!(
        "Received {} lines ({} bytes, {} sent) in {:?}",
        lines,
        received,
        sent,
        start.elapsed()
    );

    reader.into_inner().recycle();
    println!("Pooled buffers after recycle: {}", pool.pooled());

    // The watchdog is left sleeping; the process exit ends it
    drop(watchdog);
    Ok(())
}
