//! Tests for stream framing

use tokio::io::BufReader;

use crate::frame::{read_line_frame, read_octet_frame, FrameError, LineFrame, MAX_FRAME_SIZE};

// =============================================================================
// Non-transparent (newline) framing
// =============================================================================

#[tokio::test]
async fn test_line_frames_back_to_back() {
    let input: &[u8] = b"<13>first\n<13>second\n";
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();

    assert_eq!(
        read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
            .await
            .unwrap(),
        LineFrame::Complete(9)
    );
    assert_eq!(buf, b"<13>first");

    read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
        .await
        .unwrap();
    assert_eq!(buf, b"<13>second");

    assert_eq!(
        read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
            .await
            .unwrap(),
        LineFrame::Eof
    );
}

#[tokio::test]
async fn test_line_crlf_trimmed() {
    let input: &[u8] = b"<13>windows line\r\n";
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();

    read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
        .await
        .unwrap();
    assert_eq!(buf, b"<13>windows line");
}

#[tokio::test]
async fn test_line_unterminated_final_frame() {
    let input: &[u8] = b"no newline at all";
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();

    assert_eq!(
        read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
            .await
            .unwrap(),
        LineFrame::Complete(17)
    );
    assert_eq!(buf, b"no newline at all");
}

#[tokio::test]
async fn test_line_truncation_yields_one_record() {
    // A newline-free input larger than the cap: one truncated frame, then EOF.
    let big = vec![b'x'; MAX_FRAME_SIZE + 1000];
    let mut reader = BufReader::new(big.as_slice());
    let mut buf = Vec::new();

    assert_eq!(
        read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
            .await
            .unwrap(),
        LineFrame::Truncated(MAX_FRAME_SIZE)
    );
    assert_eq!(buf.len(), MAX_FRAME_SIZE);

    assert_eq!(
        read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
            .await
            .unwrap(),
        LineFrame::Eof
    );
}

#[tokio::test]
async fn test_line_truncation_resumes_on_boundary() {
    // Oversized line, then a normal one: the overflow is consumed, not
    // misread as the next frame.
    let mut input = vec![b'x'; 100];
    input.push(b'\n');
    input.extend_from_slice(b"next\n");
    let mut reader = BufReader::new(input.as_slice());
    let mut buf = Vec::new();

    assert_eq!(
        read_line_frame(&mut reader, &mut buf, 10).await.unwrap(),
        LineFrame::Truncated(10)
    );

    read_line_frame(&mut reader, &mut buf, 10).await.unwrap();
    assert_eq!(buf, b"next");
}

#[tokio::test]
async fn test_line_empty_line() {
    let input: &[u8] = b"\n<13>after\n";
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();

    assert_eq!(
        read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
            .await
            .unwrap(),
        LineFrame::Complete(0)
    );

    read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE)
        .await
        .unwrap();
    assert_eq!(buf, b"<13>after");
}

// =============================================================================
// Octet-counting framing
// =============================================================================

#[tokio::test]
async fn test_octet_single_frame() {
    let input: &[u8] = b"11 <13>1 - h a";
    let mut reader = BufReader::new(input);

    let frame = read_octet_frame(&mut reader, MAX_FRAME_SIZE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame, b"<13>1 - h a");

    assert!(read_octet_frame(&mut reader, MAX_FRAME_SIZE)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_octet_two_frames_in_order() {
    let input: &[u8] = b"5 first6 second";
    let mut reader = BufReader::new(input);

    let one = read_octet_frame(&mut reader, MAX_FRAME_SIZE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(one, b"first");

    let two = read_octet_frame(&mut reader, MAX_FRAME_SIZE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(two, b"second");
}

#[tokio::test]
async fn test_octet_payload_may_contain_newlines() {
    let input: &[u8] = b"9 a\nb\nc\nd";
    let mut reader = BufReader::new(input);

    let frame = read_octet_frame(&mut reader, MAX_FRAME_SIZE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame, b"a\nb\nc\nd");
}

#[tokio::test]
async fn test_octet_truncated_payload_errors() {
    // Declares 55 bytes, stream ends early: the connection ends cleanly
    // with an error and no partial frame.
    let input: &[u8] = b"55 <13>1 2024-01-01T00:00:00Z h a";
    let mut reader = BufReader::new(input);

    match read_octet_frame(&mut reader, MAX_FRAME_SIZE).await {
        Err(FrameError::Truncated { expected: 55, .. }) => {}
        other => panic!("expected truncation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_octet_oversized_declaration() {
    let input: &[u8] = b"99999 x";
    let mut reader = BufReader::new(input);

    match read_octet_frame(&mut reader, 1024).await {
        Err(FrameError::Oversized {
            declared: 99999,
            max: 1024,
        }) => {}
        other => panic!("expected oversized error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_octet_malformed_prefix() {
    let input: &[u8] = b"abc def";
    let mut reader = BufReader::new(input);

    assert!(matches!(
        read_octet_frame(&mut reader, MAX_FRAME_SIZE).await,
        Err(FrameError::InvalidLength)
    ));
}

#[tokio::test]
async fn test_octet_prefix_too_long() {
    let input: &[u8] = b"123456 x";
    let mut reader = BufReader::new(input);

    assert!(matches!(
        read_octet_frame(&mut reader, MAX_FRAME_SIZE).await,
        Err(FrameError::InvalidLength)
    ));
}

#[tokio::test]
async fn test_octet_eof_mid_prefix() {
    let input: &[u8] = b"12";
    let mut reader = BufReader::new(input);

    assert!(matches!(
        read_octet_frame(&mut reader, MAX_FRAME_SIZE).await,
        Err(FrameError::InvalidLength)
    ));
}
