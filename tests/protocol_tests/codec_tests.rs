//! Codec Tests
//!
//! Tests for frame encoding/decoding over in-memory streams.

use std::io::{Cursor, ErrorKind, Read};

use bytes::BytesMut;
use framelink::protocol::{
    decode_header, encode_batch, encode_frame, encode_header, read_frame, write_batch,
    write_frame, DEFAULT_MAX_MESSAGE_SIZE, HEADER_SIZE,
};
use framelink::TransportError;

/// Reader that counts how many bytes were pulled from it
struct CountingReader<R> {
    inner: R,
    consumed: usize,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n;
        Ok(n)
    }
}

// =============================================================================
// Header Tests
// =============================================================================

#[test]
fn test_header_is_big_endian() {
    assert_eq!(encode_header(0x0102_0304), [0x01, 0x02, 0x03, 0x04]);
    assert_eq!(decode_header([0x00, 0x00, 0x01, 0x00]), 256);
}

#[test]
fn test_encode_frame_layout() {
    let frame = encode_frame(b"abc");

    assert_eq!(frame.len(), HEADER_SIZE + 3);
    assert_eq!(&frame[..], &[0, 0, 0, 3, b'a', b'b', b'c']);
}

#[test]
fn test_encode_empty_frame_is_header_only() {
    let frame = encode_frame(b"");
    assert_eq!(&frame[..], &[0, 0, 0, 0]);
}

// =============================================================================
// Stream Round-Trip Tests
// =============================================================================

#[test]
fn test_read_frame_boundary_lengths() {
    // Empty, one byte, and exactly the limit
    for len in [0usize, 1, DEFAULT_MAX_MESSAGE_SIZE] {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();

        let mut wire = Vec::new();
        write_frame(&mut wire, &payload).unwrap();

        let mut cursor = Cursor::new(wire);
        let decoded = read_frame(&mut cursor, DEFAULT_MAX_MESSAGE_SIZE).unwrap();
        assert_eq!(&decoded[..], &payload[..], "length {}", len);
    }
}

#[test]
fn test_read_consecutive_frames() {
    let mut wire = Vec::new();
    write_frame(&mut wire, b"first").unwrap();
    write_frame(&mut wire, b"").unwrap();
    write_frame(&mut wire, b"third").unwrap();

    let mut cursor = Cursor::new(wire);
    assert_eq!(&read_frame(&mut cursor, 64).unwrap()[..], b"first");
    assert_eq!(&read_frame(&mut cursor, 64).unwrap()[..], b"");
    assert_eq!(&read_frame(&mut cursor, 64).unwrap()[..], b"third");
}

#[test]
fn test_write_batch_is_concatenated_frames() {
    let payloads = vec![b"one".to_vec(), Vec::new(), b"three".to_vec()];

    let mut wire = Vec::new();
    let mut scratch = BytesMut::new();
    write_batch(&mut wire, &payloads, &mut scratch).unwrap();

    let mut expected = Vec::new();
    for p in &payloads {
        expected.extend_from_slice(&encode_frame(p));
    }
    assert_eq!(wire, expected);

    let mut cursor = Cursor::new(wire);
    for p in &payloads {
        assert_eq!(&read_frame(&mut cursor, 64).unwrap()[..], &p[..]);
    }
}

#[test]
fn test_write_batch_reuses_scratch() {
    let mut scratch = BytesMut::new();
    let mut wire = Vec::new();

    write_batch(&mut wire, &[b"aaaa".to_vec()], &mut scratch).unwrap();
    write_batch(&mut wire, &[b"bb".to_vec()], &mut scratch).unwrap();

    // Second batch must not carry bytes of the first
    assert_eq!(&scratch[..], &encode_frame(b"bb")[..]);
    assert_eq!(wire.len(), (HEADER_SIZE + 4) + (HEADER_SIZE + 2));
}

#[test]
fn test_encode_batch_appends() {
    let mut buf = BytesMut::from(&b"xx"[..]);
    encode_batch(&mut buf, &[b"a"]);
    assert_eq!(&buf[..], &[b'x', b'x', 0, 0, 0, 1, b'a']);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_oversize_header_rejected_before_body() {
    let mut wire = encode_header(1025).to_vec();
    wire.extend_from_slice(&[0u8; 2048]);

    let mut reader = CountingReader {
        inner: Cursor::new(wire),
        consumed: 0,
    };
    let result = read_frame(&mut reader, 1024);

    match result {
        Err(TransportError::FrameTooLarge { size, max }) => {
            assert_eq!(size, 1025);
            assert_eq!(max, 1024);
        }
        other => panic!("Expected FrameTooLarge, got {:?}", other),
    }
    // Only the header was consumed
    assert_eq!(reader.consumed, HEADER_SIZE);
}

#[test]
fn test_huge_header_rejected() {
    // Would be negative as a signed 32-bit length
    let wire = encode_header(u32::MAX).to_vec();
    let result = read_frame(&mut Cursor::new(wire), DEFAULT_MAX_MESSAGE_SIZE);

    assert!(matches!(
        result,
        Err(TransportError::FrameTooLarge { size: u32::MAX, .. })
    ));
}

#[test]
fn test_truncated_header_is_eof() {
    let result = read_frame(&mut Cursor::new(vec![0u8, 0]), 64);

    match result {
        Err(TransportError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("Expected UnexpectedEof, got {:?}", other),
    }
}

#[test]
fn test_truncated_body_is_eof() {
    let mut wire = encode_header(10).to_vec();
    wire.extend_from_slice(b"short");

    let err = read_frame(&mut Cursor::new(wire), 64).unwrap_err();
    assert!(err.is_disconnect());
}

#[test]
fn test_empty_stream_is_disconnect() {
    let err = read_frame(&mut Cursor::new(Vec::new()), 64).unwrap_err();
    assert!(err.is_disconnect());
}
