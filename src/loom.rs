#[cfg(all(test, feature = "loom"))]
mod tests {
    use crate::{PipeError, pipe_with_capacity};
    use loom::{model::Builder, thread};

    fn builder() -> Builder {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }
        builder
    }

    #[test]
    fn test_backpressure_round_trip() {
        builder().check(|| {
            let (mut reader, mut writer) = pipe_with_capacity(2).unwrap();

            let producer = thread::spawn(move || {
                assert_eq!(writer.write(b"abc").unwrap(), 3);
                writer.close().unwrap();
            });

            let mut out = Vec::new();
            let mut buf = [0u8; 2];
            loop {
                let n = reader.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                out.extend_from_slice(&buf[..n]);
            }

            producer.join().unwrap();
            assert_eq!(out, b"abc");
        });
    }

    #[test]
    fn test_close_wakes_blocked_reader() {
        builder().check(|| {
            let (mut reader, writer) = pipe_with_capacity(1).unwrap();
            let closer = writer.closer();

            let watchdog = thread::spawn(move || {
                closer.close_with_error("cancelled").unwrap();
            });

            let mut buf = [0u8; 1];
            match reader.read(&mut buf) {
                Err(PipeError::ClosedWith(e)) => assert_eq!(e.to_string(), "cancelled"),
                other => panic!("unexpected: {:?}", other),
            }

            watchdog.join().unwrap();
            drop(writer);
        });
    }

    #[test]
    fn test_reader_close_wakes_blocked_writer() {
        builder().check(|| {
            let (reader, mut writer) = pipe_with_capacity(1).unwrap();

            let producer = thread::spawn(move || {
                // Either the second byte is refused outright or the
                // first write reports the partial count
                match writer.write(b"xy") {
                    Ok(n) => assert!(n < 2),
                    Err(e) => assert!(e.is_closed()),
                }
            });

            let _ = reader.close();
            producer.join().unwrap();
        });
    }

    #[test]
    fn test_flush_returns_after_drain() {
        builder().check(|| {
            let (mut reader, mut writer) = pipe_with_capacity(2).unwrap();

            let producer = thread::spawn(move || {
                writer.write(b"ab").unwrap();
                writer.flush().unwrap();
                assert_eq!(writer.buffered(), 0);
            });

            let mut buf = [0u8; 2];
            let mut got = 0;
            while got < 2 {
                got += reader.read(&mut buf[got..]).unwrap();
            }
            assert_eq!(&buf, b"ab");
            producer.join().unwrap();
        });
    }

    #[test]
    fn test_write_to_with_concurrent_close() {
        builder().check(|| {
            let (mut reader, mut writer) = pipe_with_capacity(2).unwrap();

            let producer = thread::spawn(move || {
                // Whatever was accepted before the close reaches the sink
                let n = writer.write(b"xyz").unwrap_or(0);
                writer.close_with_error("stop").unwrap();
                n
            });

            let mut sink: Vec<u8> = Vec::new();
            let moved = loop {
                match reader.write_to(&mut sink) {
                    Ok(0) => panic!("error close reported as end-of-stream"),
                    Ok(_) => continue,
                    Err(PipeError::ClosedWith(_)) => break sink.len(),
                    Err(e) => panic!("unexpected: {:?}", e),
                }
            };

            let sent = producer.join().unwrap();
            assert_eq!(moved, sent);
            assert_eq!(&sink[..], &b"xyz"[..sent]);
        });
    }
}
