//! Bounded segmentation of a byte stream into lazily created sink streams.
//!
//! A `ChunkSplitter` decides where chunk boundaries fall; the `Chunkifier`
//! drives one sink stream per chunk index. Concatenating all chunks in order
//! reproduces the input exactly, for any splitter. This primitive underlies
//! any bounded-size persisted artifact, including the rotating breadcrumb
//! log's capacity rule.

mod file_sink;
mod splitters;

pub use file_sink::FileChunkSink;
pub use splitters::{CombinedChunkSplitter, LengthChunkSplitter, LineChunkSplitter};

use std::io;
use std::io::Write;

/// Decides how much of `data` belongs to the current chunk.
///
/// Returns the part that stays in the current chunk and, when a boundary was
/// hit, the remainder that starts a new chunk. Splitters are stateful across
/// calls within one chunk and must reset their own counters when they report
/// a boundary.
pub trait ChunkSplitter: Send {
	fn split(&mut self, data: Vec<u8>) -> (Vec<u8>, Option<Vec<u8>>);
}

/// Creates one output stream per chunk index, lazily, in order.
pub trait ChunkSink: Send {
	type Stream: Write;

	fn create(&mut self, index: usize) -> io::Result<Self::Stream>;
}

pub type SplitterFactory = Box<dyn FnMut() -> Box<dyn ChunkSplitter> + Send>;

struct CurrentChunk<W> {
	stream: W,
	empty: bool,
}

/// Splits incoming data into chunks, writing them to the sink.
///
/// A fresh splitter is requested from the factory for every chunk. Empty
/// chunks are suppressed unless `allow_empty_chunks` is set.
pub struct Chunkifier<S: ChunkSink> {
	sink: S,
	splitter_factory: SplitterFactory,
	allow_empty_chunks: bool,
	chunk_index: usize,
	current: Option<CurrentChunk<S::Stream>>,
	splitter: Option<Box<dyn ChunkSplitter>>,
}

impl<S: ChunkSink> Chunkifier<S> {
	pub fn new(sink: S, splitter_factory: SplitterFactory) -> Self {
		Self {
			sink,
			splitter_factory,
			allow_empty_chunks: false,
			chunk_index: 0,
			current: None,
			splitter: None,
		}
	}

	pub fn allow_empty_chunks(mut self, allow: bool) -> Self {
		self.allow_empty_chunks = allow;
		self
	}

	/// Number of chunks created so far.
	pub fn chunk_count(&self) -> usize {
		self.chunk_index
	}

	pub fn sink(&self) -> &S {
		&self.sink
	}

	pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
		let mut data = data.to_vec();
		loop {
			if data.is_empty() {
				return Ok(());
			}

			if self.splitter.is_none() {
				self.splitter = Some((self.splitter_factory)());
			}
			let Some(splitter) = self.splitter.as_mut() else {
				return Ok(());
			};

			let (head, rest) = splitter.split(data);
			let Some(rest) = rest else {
				// Whole buffer belongs to the current chunk.
				let current = self.current_chunk()?;
				if !head.is_empty() {
					current.empty = false;
				}
				return current.stream.write_all(&head);
			};

			data = rest;

			// A boundary that would close an empty chunk is suppressed; the
			// splitter keeps its state so progress is still made.
			let current_is_empty = self.current.as_ref().map(|c| c.empty).unwrap_or(true);
			if head.is_empty() && current_is_empty && !self.allow_empty_chunks {
				continue;
			}

			let current = self.current_chunk()?;
			current.stream.write_all(&head)?;
			current.stream.flush()?;

			// Closing the stream ends the chunk; the next write (or loop
			// iteration) opens the next one with a fresh splitter.
			self.current = None;
			self.splitter = None;
		}
	}

	/// Flush and close the current chunk, if any.
	pub fn finish(&mut self) -> io::Result<()> {
		if let Some(mut current) = self.current.take() {
			current.stream.flush()?;
		}
		self.splitter = None;
		Ok(())
	}

	fn current_chunk(&mut self) -> io::Result<&mut CurrentChunk<S::Stream>> {
		if self.current.is_none() {
			let stream = self.sink.create(self.chunk_index)?;
			self.chunk_index += 1;
			self.current = Some(CurrentChunk { stream, empty: true });
		}
		match self.current.as_mut() {
			Some(current) => Ok(current),
			None => Err(io::Error::new(io::ErrorKind::Other, "chunk stream unavailable")),
		}
	}
}
