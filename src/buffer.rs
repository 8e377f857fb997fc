use std::cmp;

use crate::Error;

/*
|  xxxyyyy     |
   |  |   |    |capacity (== data.len())
   |  |   |last
   |  |pos
   |mark (wherever the caller last left it)

x: consumed, y: pending output, everything past `last`: appendable
*/
pub struct Buffer {
	data: Vec<u8>,
	// wrapped regions keep their size; ensure_capacity() refuses to grow them
	fixed: bool,
	// cursors are indices into `data` (pos <= last <= data.len()),
	// so growing the allocation never invalidates them
	pos: usize,
	last: usize,
	mark: usize,
}

impl Buffer {
	pub fn with_capacity(cap: usize) -> Result<Self, Error> {
		let mut data = Vec::new();
		data.try_reserve_exact(cap).map_err(|_| Error::OutOfMemory)?;
		// fresh chunks are zero-filled: an or-style write into a slot
		// that was never written still yields a defined value
		data.resize(cap, 0);
		Ok(Buffer {
			data,
			fixed: false,
			pos: 0, last: 0, mark: 0,
		})
	}

	/// Adopt a caller-built region as the whole allocation.
	///
	/// All cursors start at the beginning; the buffer will never grow
	/// past the region's original length.
	pub fn wrap(region: Vec<u8>) -> Self {
		Buffer {
			data: region,
			fixed: true,
			pos: 0, last: 0, mark: 0,
		}
	}

	/// Make sure at least `target` bytes of capacity are allocated.
	///
	/// Grows to `max(target, capacity * 2)` when short. On failure the old
	/// allocation and all cursors are left untouched.
	pub fn ensure_capacity(&mut self, target: usize) -> Result<(), Error> {
		let cap = self.data.len();
		if cap >= target {
			return Ok(());
		}
		if self.fixed {
			return Err(Error::OutOfMemory);
		}
		let new_cap = cmp::max(target, cap * 2);
		self.data.try_reserve_exact(new_cap - cap).map_err(|_| Error::OutOfMemory)?;
		self.data.resize(new_cap, 0);
		Ok(())
	}

	/// `ensure_capacity()` for `extra` more bytes counted from the read cursor.
	pub fn ensure_capacity_from_pos(&mut self, extra: usize) -> Result<(), Error> {
		self.ensure_capacity(self.pos + extra)
	}

	/// `ensure_capacity()` for `extra` more bytes counted from the write cursor.
	pub fn ensure_capacity_from_last(&mut self, extra: usize) -> Result<(), Error> {
		self.ensure_capacity(self.last + extra)
	}

	// rewind all cursors; the allocation is kept for reuse
	pub fn reset(&mut self) {
		self.pos = 0;
		self.last = 0;
		self.mark = 0;
	}

	// reserve a prefix: advance every cursor past the first `amount` bytes
	pub(crate) fn shift_right(&mut self, amount: usize) {
		self.pos += amount;
		self.last += amount;
		self.mark += amount;
	}

	/// Size of the pending (written but not consumed) part of the buffer.
	pub fn len(&self) -> usize {
		self.last - self.pos
	}

	pub fn is_empty(&self) -> bool {
		self.pos == self.last
	}

	/// Room left past the write cursor.
	pub fn available(&self) -> usize {
		self.data.len() - self.last
	}

	pub fn capacity(&self) -> usize {
		self.data.len()
	}

	/// Pending part of the buffer.
	pub fn filled(&self) -> &[u8] {
		&self.data[ self.pos .. self.last ]
	}

	/**
	Part of the buffer next to [`filled()`](#method.filled) that can be used to append data.

	Use [`mark_appended()`](#method.mark_appended) to actually append data written to this slice;
	bytes written here but never marked stay re-writable (that is what the
	`*_hold` operations of the chain rely on).
	*/
	pub fn appendable(&mut self) -> &mut [u8] {
		&mut self.data[ self.last .. ]
	}

	/// Attaches `amount` bytes of [`appendable()`](#method.appendable)
	/// to the [`filled()`](#method.filled) part of the buffer.
	pub fn mark_appended(&mut self, amount: usize) {
		debug_assert!(self.last + amount <= self.data.len());
		self.last += amount;
	}

	/*
	before:
	|  xxxyyy |
	   |    |last
	   |pos

	after:
	|  xxxyyy |
	   | || |last
	   | ||pos
	   |-|return value
	*/
	pub fn consume(&mut self, amount: usize) -> &[u8] {
		let amount = cmp::min(amount, self.len());
		let pos = self.pos;
		self.pos += amount;
		&self.data[ pos .. pos + amount ]
	}

	pub fn pos(&self) -> usize {
		self.pos
	}

	pub fn last(&self) -> usize {
		self.last
	}

	pub fn mark(&self) -> usize {
		self.mark
	}

	/// Remember an arbitrary position within the allocation,
	/// e.g. a write position to revisit after more data went in.
	pub fn set_mark(&mut self, at: usize) {
		debug_assert!(at <= self.data.len());
		self.mark = at;
	}
}
