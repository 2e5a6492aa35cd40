//! Length-prefixed JSON framing over async streams.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{ProtoError, Result};

/// Upper bound on a single frame body (4 MiB).
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Serialize `message` and write it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtoError::FrameTooLarge {
            len: body.len(),
            max: MAX_FRAME_LEN,
        });
    }
    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    trace!(len = body.len(), "frame written");
    Ok(())
}

/// Read one frame and decode its body.
///
/// A stream that ends before the length prefix maps to
/// [`ProtoError::ConnectionClosed`]; ending mid-frame surfaces as an IO
/// error because the peer quit in the middle of a message.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    if let Err(err) = reader.read_exact(&mut len_buf).await {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            return Err(ProtoError::ConnectionClosed);
        }
        return Err(ProtoError::Io(err));
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtoError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    trace!(len, "frame read");
    Ok(serde_json::from_slice(&body)?)
}
