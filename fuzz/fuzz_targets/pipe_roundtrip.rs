#![no_main]

use std::thread;

use libfuzzer_sys::fuzz_target;
use ringpipe::pipe_with_capacity;

fuzz_target!(|input: &[u8]| {
    // First bytes pick the shape, the rest is the payload
    if input.len() < 3 {
        return;
    }
    let capacity = usize::from(input[0]) + 1;
    let write_size = usize::from(input[1]) + 1;
    let read_size = usize::from(input[2]) + 1;
    let data = input[3..].to_vec();

    let (mut reader, mut writer) = pipe_with_capacity(capacity).unwrap();

    let source = data.clone();
    let producer = thread::spawn(move || {
        for (i, chunk) in source.chunks(write_size).enumerate() {
            let n = if i % 2 == 0 {
                writer.write(chunk).unwrap()
            } else {
                writer.write_direct(chunk).unwrap()
            };
            assert_eq!(n, chunk.len());
        }
        writer.flush().unwrap();
    });

    // Verify: bytes arrive in order, whichever read path is used
    let mut out = Vec::with_capacity(data.len());
    let mut buf = vec![0u8; read_size];
    let mut turn = 0usize;
    loop {
        let n = match turn % 3 {
            0 => reader.read(&mut buf).unwrap(),
            1 => reader.read_direct(&mut buf).unwrap(),
            _ => match reader.read_byte().unwrap() {
                Some(b) => {
                    buf[0] = b;
                    1
                }
                None => 0,
            },
        };
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
        turn += 1;
    }

    producer.join().unwrap();
    assert_eq!(out, data);
});
