//! Process transport: spawning, stream framing, and raw stream IO.
//!
//! The transport owns the spawned server process and its three stdio
//! streams. Each stream has one dedicated owner:
//! - `spawner`: launches the child in its own process group and hands out
//!   the stdio handles.
//! - `codec`: [`LinesCodec`](tokio_util::codec::LinesCodec)-based framing
//!   with a per-line size ceiling for the inbound stream.
//! - `writer`: serialized, synchronously flushed line writes to the child's
//!   stdin.
//! - `stderr`: background capture of the diagnostic stream into an ordered
//!   buffer.

pub mod codec;
pub mod spawner;
pub mod stderr;
pub mod writer;
