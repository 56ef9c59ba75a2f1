use super::ChunkSplitter;

/// Splits data into chunks holding at most `max_lines` newline-terminated
/// lines.
pub struct LineChunkSplitter {
	max_lines: usize,
	seen: usize,
}

impl LineChunkSplitter {
	pub fn new(max_lines: usize) -> Self {
		Self { max_lines: max_lines.max(1), seen: 0 }
	}

	fn find_nth_newline(data: &[u8], n: usize) -> (Option<usize>, usize) {
		let mut count = 0;
		for (index, byte) in data.iter().enumerate() {
			if *byte != b'\n' {
				continue;
			}
			count += 1;
			if count == n {
				return (Some(index + 1), count);
			}
		}
		(None, count)
	}
}

impl ChunkSplitter for LineChunkSplitter {
	fn split(&mut self, data: Vec<u8>) -> (Vec<u8>, Option<Vec<u8>>) {
		let remaining = self.max_lines - self.seen;
		let (boundary, count) = Self::find_nth_newline(&data, remaining);
		match boundary {
			None => {
				self.seen += count;
				(data, None)
			}
			Some(index) => {
				self.seen = 0;
				let rest = data[index..].to_vec();
				let mut head = data;
				head.truncate(index);
				(head, Some(rest))
			}
		}
	}
}

/// Splits data into chunks of at most `max_length` bytes.
pub struct LengthChunkSplitter {
	max_length: usize,
	seen: usize,
}

impl LengthChunkSplitter {
	pub fn new(max_length: usize) -> Self {
		Self { max_length: max_length.max(1), seen: 0 }
	}
}

impl ChunkSplitter for LengthChunkSplitter {
	fn split(&mut self, data: Vec<u8>) -> (Vec<u8>, Option<Vec<u8>>) {
		let remaining = self.max_length - self.seen;
		if data.len() <= remaining {
			self.seen += data.len();
			return (data, None);
		}

		self.seen = 0;
		let rest = data[remaining..].to_vec();
		let mut head = data;
		head.truncate(remaining);
		(head, Some(rest))
	}
}

/// Combines several splitters; the first rule to trigger decides the
/// boundary.
///
/// Each splitter always receives the head produced by the previous one, and
/// the cut-off remainders are re-prepended in order, so no byte is dropped or
/// reordered.
pub struct CombinedChunkSplitter {
	splitters: Vec<Box<dyn ChunkSplitter>>,
}

impl CombinedChunkSplitter {
	pub fn new(splitters: Vec<Box<dyn ChunkSplitter>>) -> Self {
		Self { splitters }
	}
}

impl ChunkSplitter for CombinedChunkSplitter {
	fn split(&mut self, data: Vec<u8>) -> (Vec<u8>, Option<Vec<u8>>) {
		let mut head = data;
		let mut rest_parts: Vec<Vec<u8>> = Vec::new();

		for splitter in &mut self.splitters {
			let (current, rest) = splitter.split(head);
			head = current;
			if let Some(rest) = rest {
				rest_parts.insert(0, rest);
			}
		}

		if rest_parts.is_empty() {
			(head, None)
		} else {
			(head, Some(rest_parts.concat()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_line_splitter_counts_across_calls() {
		let mut splitter = LineChunkSplitter::new(3);

		let (head, rest) = splitter.split(b"a\nb\n".to_vec());
		assert_eq!(head, b"a\nb\n");
		assert!(rest.is_none());

		// Third newline closes the chunk.
		let (head, rest) = splitter.split(b"c\nd\n".to_vec());
		assert_eq!(head, b"c\n");
		assert_eq!(rest.unwrap(), b"d\n");
	}

	#[test]
	fn test_line_splitter_resets_after_boundary() {
		let mut splitter = LineChunkSplitter::new(1);
		let (head, rest) = splitter.split(b"x\ny\n".to_vec());
		assert_eq!(head, b"x\n");
		assert_eq!(rest.unwrap(), b"y\n");

		let (head, rest) = splitter.split(b"z\n".to_vec());
		assert_eq!(head, b"z\n");
		assert_eq!(rest.unwrap(), b"");
	}

	#[test]
	fn test_length_splitter_exact_fit_has_no_boundary() {
		let mut splitter = LengthChunkSplitter::new(4);
		let (head, rest) = splitter.split(b"abcd".to_vec());
		assert_eq!(head, b"abcd");
		assert!(rest.is_none());
	}

	#[test]
	fn test_length_splitter_overflow_splits() {
		let mut splitter = LengthChunkSplitter::new(4);
		splitter.split(b"abc".to_vec());
		let (head, rest) = splitter.split(b"defg".to_vec());
		assert_eq!(head, b"d");
		assert_eq!(rest.unwrap(), b"efg");
	}

	#[test]
	fn test_combined_preserves_all_bytes() {
		let mut combined = CombinedChunkSplitter::new(vec![
			Box::new(LineChunkSplitter::new(2)),
			Box::new(LengthChunkSplitter::new(100)),
		]);
		let input = b"1\n2\n3\n".to_vec();
		let (head, rest) = combined.split(input.clone());

		let mut joined = head.clone();
		joined.extend(rest.unwrap_or_default());
		assert_eq!(joined, input);
		assert_eq!(head, b"1\n2\n");
	}
}
