//! Top-level ISO BMFF (MP4) box scanning.
//!
//! Only box headers are read; payloads are skipped with seeks, so scanning a
//! multi-gigabyte file costs a handful of small reads.

use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub kind: [u8; 4],
    pub offset: u64,
    pub size: u64,
}

impl BoxHeader {
    pub fn is(&self, kind: &[u8; 4]) -> bool {
        &self.kind == kind
    }
}

/// List the top-level boxes of the file at `path`.
///
/// Handles 64-bit `largesize` headers and a final box of size 0 ("to end of file").
pub async fn scan_top_level(path: &Path) -> io::Result<Vec<BoxHeader>> {
    let mut file = tokio::fs::File::open(path).await?;
    let file_len = file.metadata().await?.len();

    let mut boxes = Vec::new();
    let mut offset = 0u64;

    while offset + 8 <= file_len {
        file.seek(SeekFrom::Start(offset)).await?;

        let mut header = [0u8; 8];
        file.read_exact(&mut header).await?;

        let small_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let kind = [header[4], header[5], header[6], header[7]];

        let size = match small_size {
            0 => file_len - offset,
            1 => {
                let mut large = [0u8; 8];
                file.read_exact(&mut large).await?;
                u64::from_be_bytes(large)
            }
            n => u64::from(n),
        };

        if size < 8 || offset.checked_add(size).map_or(true, |end| end > file_len) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "box {:?} at offset {} has invalid size {}",
                    String::from_utf8_lossy(&kind),
                    offset,
                    size
                ),
            ));
        }

        boxes.push(BoxHeader { kind, offset, size });
        offset += size;
    }

    Ok(boxes)
}

/// True when a `moov` box exists and precedes every `mdat` box.
pub async fn is_fast_start(path: &Path) -> io::Result<bool> {
    let boxes = scan_top_level(path).await?;

    let moov = boxes.iter().position(|b| b.is(b"moov"));
    let mdat = boxes.iter().position(|b| b.is(b"mdat"));

    Ok(match (moov, mdat) {
        (Some(moov), Some(mdat)) => moov < mdat,
        (Some(_), None) => true,
        (None, _) => false,
    })
}
