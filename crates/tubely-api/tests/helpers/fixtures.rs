//! Synthetic media payloads.

fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

/// A minimal MP4 laid out the way a plain muxer writes it: `ftyp`, `mdat`, `moov`.
pub fn mp4_with_trailing_moov(payload_len: usize) -> Vec<u8> {
    let payload: Vec<u8> = (0..payload_len).map(|i| (i % 251) as u8).collect();
    [
        mp4_box(b"ftyp", b"isom\0\0\x02\0isomiso2mp41"),
        mp4_box(b"mdat", &payload),
        mp4_box(b"moov", &[7u8; 96]),
    ]
    .concat()
}

/// PNG signature followed by filler; enough for content-type driven tests.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    out.resize(len.max(8), 0x42);
    out
}
