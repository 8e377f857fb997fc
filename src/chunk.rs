use crate::Error;
use crate::buffer::Buffer;

// one allocation unit of a chain: a buffer whose cursors start `headroom`
// bytes in, leaving room for a prefix that is written after the fact
// (pos == last == mark == headroom right after new() and reset())
pub(crate) struct Chunk {
	pub(crate) buf: Buffer,
	headroom: usize,
}

impl Chunk {
	pub(crate) fn new(chunk_length: usize, headroom: usize) -> Result<Self, Error> {
		let mut buf = Buffer::with_capacity(chunk_length)?;
		buf.shift_right(headroom);
		Ok(Chunk { buf, headroom })
	}

	// rewind for reuse, keeping the prefix reserved
	pub(crate) fn reset(&mut self) {
		self.buf.reset();
		self.buf.shift_right(self.headroom);
	}
}
