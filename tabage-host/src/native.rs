//! Native messaging framing
//!
//! Every message in either direction is a 4-byte length in native byte
//! order followed by that many bytes of UTF-8 JSON.
//!
//! ```text
//! [u32 native-endian: len][JSON bytes of len]
//! ```

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Largest frame accepted in either direction (1 MiB)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Message size {0} exceeds maximum {MAX_MESSAGE_SIZE}")]
    TooLarge(usize),
}

/// Read one frame. Returns `None` on clean EOF.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Option<Vec<u8>>, FrameError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_ne_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(FrameError::TooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Some(payload))
}

pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), FrameError> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(FrameError::TooLarge(payload.len()));
    }

    let len = payload.len() as u32;
    writer.write_all(&len.to_ne_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_back_to_back() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        write_frame(&mut client, br#"{"action":"getTabAges"}"#)
            .await
            .unwrap();
        write_frame(&mut client, b"{}").await.unwrap();
        drop(client);

        let first = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(first, br#"{"action":"getTabAges"}"#);
        let second = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(second, b"{}");
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let len = (MAX_MESSAGE_SIZE as u32 + 1).to_ne_bytes();
        client.write_all(&len).await.unwrap();

        match read_frame(&mut server).await {
            Err(FrameError::TooLarge(size)) => assert_eq!(size, MAX_MESSAGE_SIZE + 1),
            other => panic!("expected TooLarge, got {other:?}"),
        }

        let big = vec![b' '; MAX_MESSAGE_SIZE + 1];
        assert!(matches!(
            write_frame(&mut client, &big).await,
            Err(FrameError::TooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&10u32.to_ne_bytes()).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        drop(client);

        assert!(matches!(
            read_frame(&mut server).await,
            Err(FrameError::Io(_))
        ));
    }
}
