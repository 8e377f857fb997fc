/*!
Bounded chain-of-chunks staging buffer for wire protocol encoders.

Serialize data of initially unknown total length without repeatedly copying
it into one growing allocation: bytes land in a chain of fixed-size chunks,
new chunks are allocated lazily, and a hard cap on the number of chunks
turns oversized messages into a recoverable [`BufferExhausted`](Error::BufferExhausted)
instead of unbounded growth. Every chunk can also reserve a fixed
`headroom` prefix, so a header whose content is only known once the body
length is — a frame header, say — gets written into space that is already
laid out, without a second copy pass.

## Example usage

```
use buf_chain::BufChainBuilder;

# fn main() -> Result<(), buf_chain::Error> {
// up to 2 chunks of 16 bytes, first 4 bytes of each reserved
let mut chain = BufChainBuilder::new()
	.chunk_length(16)
	.max_chunks(2)
	.headroom(4)
	.create()?;

chain.append(b"body of unknown size")?;
assert_eq!(chain.len(), 20);

// one byte whose flag bits are decided incrementally
chain.append_byte_hold(0x40)?;
chain.or_byte(0x01)?;

// drain into a single owned buffer and reuse the chain afterwards
let message = chain.flatten()?;
assert_eq!(&message[..4], b"body");
assert_eq!(message[20], 0x41);
assert_eq!(chain.len(), 0);
# Ok(())
# }
```

Single-threaded by design: a chain is built and drained by one logical
owner at a time, and no operation blocks or performs I/O.
*/

use std::cmp;

use quick_error::quick_error;

mod buffer;
mod chunk;

pub use buffer::Buffer;
use chunk::Chunk;

quick_error! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub enum Error {
		/// Construction parameters violate chain invariants
		/// (no chunks at all, or headroom larger than a chunk).
		InvalidArgument {
			display("invalid chain parameters")
		}
		/// An allocation failed, or growth was requested on a wrapped buffer.
		/// The structure is left in its last valid state.
		OutOfMemory {
			display("buffer allocation failed")
		}
		/// The write does not fit in the remaining chunk budget.
		/// Recoverable: the message is simply too large for this chain.
		BufferExhausted {
			display("chunk budget exhausted")
		}
	}
}

pub struct BufChainBuilder {
	chunk_length: usize,
	max_chunks: usize,
	headroom: usize,
}

impl BufChainBuilder {
	pub fn new() -> Self {
		BufChainBuilder {
			chunk_length: 8192,
			max_chunks: 8,
			headroom: 0,
		}
	}

	/// Capacity of every chunk, reserved prefix included.
	pub fn chunk_length(mut self, chunk_length: usize) -> Self {
		self.chunk_length = chunk_length;
		self
	}

	/// Hard cap on the number of chunks the chain may ever allocate.
	pub fn max_chunks(mut self, max_chunks: usize) -> Self {
		self.max_chunks = max_chunks;
		self
	}

	/// Bytes reserved at the front of every chunk for later prefix insertion.
	pub fn headroom(mut self, headroom: usize) -> Self {
		self.headroom = headroom;
		self
	}

	pub fn create(self) -> Result<BufChain, Error> {
		if self.max_chunks == 0 || self.headroom > self.chunk_length {
			return Err(Error::InvalidArgument);
		}
		// the first chunk comes out of the budget right away
		let head = Chunk::new(self.chunk_length, self.headroom)?;
		Ok(BufChain {
			chunks: vec![head],
			cur: 0,
			chunk_length: self.chunk_length,
			chunk_left: self.max_chunks - 1,
			headroom: self.headroom,
		})
	}
}

impl Default for BufChainBuilder {
	fn default() -> Self {
		Self::new()
	}
}

pub struct BufChain {
	chunks: Vec<Chunk>,
	// index of the chunk being written; only ever moves forward
	// until flatten()/reset() rewind the whole chain
	cur: usize,
	chunk_length: usize,
	// chunks we are still allowed to allocate
	chunk_left: usize,
	headroom: usize,
}

impl BufChain {
	/// Headroom-less convenience form of [`BufChainBuilder`].
	pub fn new(chunk_length: usize, max_chunks: usize) -> Result<Self, Error> {
		BufChainBuilder::new()
			.chunk_length(chunk_length)
			.max_chunks(max_chunks)
			.create()
	}

	/// Total pending content across the whole chain,
	/// no matter which chunk is currently being written.
	pub fn len(&self) -> usize {
		self.chunks.iter().map(|c| c.buf.len()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.iter().all(|c| c.buf.is_empty())
	}

	/**
	Bytes that can still be appended before the chain runs out of budget:
	free room in the current and later chunks, plus what the remaining
	quota can provide once allocated.

	[`append()`](#method.append) checks this up front, so a bulk write
	either fits entirely or leaves the chain untouched.
	*/
	pub fn available(&self) -> usize {
		// chunks before `cur` are never written again
		let allocated: usize = self.chunks[self.cur..].iter()
			.map(|c| c.buf.available())
			.sum();
		allocated + self.chunk_left * (self.chunk_length - self.headroom)
	}

	/**
	Move writes over to the next chunk, allocating one if no chunk was
	ever allocated past the current one.

	Subsequent writes start in a fresh chunk even if the current one still
	has room — e.g. to keep a protocol unit from straddling a chunk
	boundary. Fails with [`BufferExhausted`](Error::BufferExhausted) once
	the chunk budget is spent.
	*/
	pub fn advance(&mut self) -> Result<(), Error> {
		if self.cur + 1 < self.chunks.len() {
			self.cur += 1;
			return Ok(());
		}
		if self.chunk_left == 0 {
			return Err(Error::BufferExhausted);
		}
		let chunk = Chunk::new(self.chunk_length, self.headroom)?;
		self.chunk_left -= 1;
		self.chunks.push(chunk);
		self.cur += 1;
		Ok(())
	}

	/// Append a byte sequence of arbitrary length, spilling into further
	/// chunks as needed. All or nothing: if the chain cannot take the whole
	/// sequence, nothing is written.
	pub fn append(&mut self, data: &[u8]) -> Result<(), Error> {
		if self.available() < data.len() {
			return Err(Error::BufferExhausted);
		}
		let mut rest = data;
		while !rest.is_empty() {
			let buf = &mut self.chunks[self.cur].buf;
			let nwrite = cmp::min(buf.available(), rest.len());
			if nwrite == 0 {
				// pre-check above guarantees this cannot fail
				self.advance()?;
				continue;
			}
			buf.appendable()[..nwrite].copy_from_slice(&rest[..nwrite]);
			buf.mark_appended(nwrite);
			rest = &rest[nwrite..];
		}
		Ok(())
	}

	// make sure the write cursor points at a slot with room for one byte
	fn ensure_byte_room(&mut self) -> Result<(), Error> {
		if self.chunks[self.cur].buf.available() > 0 {
			return Ok(());
		}
		self.advance()?;
		if self.chunks[self.cur].buf.available() == 0 {
			// headroom can eat a whole chunk
			return Err(Error::BufferExhausted);
		}
		Ok(())
	}

	/// Append a single byte.
	pub fn append_byte(&mut self, b: u8) -> Result<(), Error> {
		self.ensure_byte_room()?;
		let buf = &mut self.chunks[self.cur].buf;
		buf.appendable()[0] = b;
		buf.mark_appended(1);
		Ok(())
	}

	/// Write a byte at the current position but keep the slot re-writable:
	/// the write cursor does not move, and chain length does not change
	/// until a non-hold byte operation commits the slot.
	pub fn append_byte_hold(&mut self, b: u8) -> Result<(), Error> {
		self.ensure_byte_room()?;
		self.chunks[self.cur].buf.appendable()[0] = b;
		Ok(())
	}

	/// Bitwise-OR `b` into the byte at the current position and commit it.
	/// Pairs with the hold operations to assemble flag bits incrementally.
	pub fn or_byte(&mut self, b: u8) -> Result<(), Error> {
		self.ensure_byte_room()?;
		let buf = &mut self.chunks[self.cur].buf;
		buf.appendable()[0] |= b;
		buf.mark_appended(1);
		Ok(())
	}

	/// Bitwise-OR `b` into the byte at the current position, keeping
	/// the slot re-writable like [`append_byte_hold()`](#method.append_byte_hold).
	pub fn or_byte_hold(&mut self, b: u8) -> Result<(), Error> {
		self.ensure_byte_room()?;
		self.chunks[self.cur].buf.appendable()[0] |= b;
		Ok(())
	}

	/// Resynchronize the write position after out-of-band writes placed
	/// data ahead of it: move forward through chunks that already hold
	/// data, stopping at the first empty chunk or at the last chunk.
	pub fn seek_last_present(&mut self) {
		for i in self.cur..self.chunks.len() {
			if self.chunks[i].buf.is_empty() {
				return;
			}
			self.cur = i;
		}
	}

	/// Whether a chunk past the current one exists and already holds data.
	/// Pure lookahead, nothing moves.
	pub fn next_present(&self) -> bool {
		match self.chunks.get(self.cur + 1) {
			Some(next) => !next.buf.is_empty(),
			None => false,
		}
	}

	/**
	Copy the pending content of every chunk, in chain order, into one
	owned contiguous buffer, then rewind the whole chain (headroom
	reservation reapplied) for the next message.

	The result is reserved up front, so an allocation failure leaves
	every chunk untouched.
	*/
	pub fn flatten(&mut self) -> Result<Vec<u8>, Error> {
		let total = self.len();
		let mut out = Vec::new();
		out.try_reserve_exact(total).map_err(|_| Error::OutOfMemory)?;
		for chunk in &mut self.chunks {
			out.extend_from_slice(chunk.buf.filled());
			chunk.reset();
		}
		self.cur = 0;
		Ok(out)
	}

	/// Rewind the whole chain for the next message without producing a
	/// contiguous copy. Chunks that were already allocated stay allocated,
	/// so a message no larger than the previous one allocates nothing.
	pub fn reset(&mut self) {
		for chunk in &mut self.chunks {
			chunk.reset();
		}
		self.cur = 0;
	}

	/// Pending span of every chunk in chain order, for transports that
	/// take scatter/gather writes instead of one contiguous buffer.
	pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
		self.chunks.iter().map(|c| c.buf.filled())
	}
}
