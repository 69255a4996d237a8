//! Line codec for the MCPL stdio stream.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a fixed maximum line length
//! to prevent memory exhaustion from an unterminated or runaway line on the
//! child's stdout.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::{ClientError, Result};

/// Maximum inbound line length accepted by the codec: 1 MiB.
///
/// Longer lines cause [`McplCodec::decode`] to return [`ClientError::Parse`]
/// with `"line too long"` instead of allocating without bound.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Newline-delimited codec for the MCPL stdio stream.
///
/// Each `\n`-terminated UTF-8 string is one complete JSON-RPC envelope.
/// Delegates framing to [`LinesCodec`] with the [`MAX_LINE_BYTES`] limit;
/// the limit is a decoder-side concern and is not enforced when encoding.
#[derive(Debug)]
pub struct McplCodec(LinesCodec);

impl McplCodec {
    /// Create a codec with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for McplCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for McplCodec {
    type Item = String;
    type Error = ClientError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

impl Encoder<String> for McplCodec {
    type Error = ClientError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

fn map_codec_error(e: LinesCodecError) -> ClientError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            ClientError::Parse(format!("line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) => ClientError::Io(io_err.to_string()),
    }
}
