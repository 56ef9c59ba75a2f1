//! Cancellation primitive threaded through delivery attempts.
//!
//! A `CancelSource` owns the signal; any number of `CancelToken` clones
//! observe it. Cancelling a delivery attempt must leave the record unlocked
//! for a later retry, so transports treat a fired token as an abandoned
//! attempt, never as a delivered one.

use tokio::sync::watch;

#[derive(Debug)]
pub struct CancelSource {
	sender: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct CancelToken {
	receiver: watch::Receiver<bool>,
}

impl CancelSource {
	pub fn new() -> Self {
		let (sender, _) = watch::channel(false);
		Self { sender }
	}

	pub fn token(&self) -> CancelToken {
		CancelToken { receiver: self.sender.subscribe() }
	}

	pub fn cancel(&self) {
		let _ = self.sender.send(true);
	}

	pub fn is_cancelled(&self) -> bool {
		*self.sender.borrow()
	}
}

impl Default for CancelSource {
	fn default() -> Self {
		Self::new()
	}
}

impl CancelToken {
	pub fn is_cancelled(&self) -> bool {
		*self.receiver.borrow()
	}

	/// Resolves once the source fires. If the source is dropped without
	/// firing, the future never resolves; callers race it against the actual
	/// work with `tokio::select!`.
	pub async fn cancelled(&mut self) {
		if *self.receiver.borrow() {
			return;
		}
		while self.receiver.changed().await.is_ok() {
			if *self.receiver.borrow() {
				return;
			}
		}
		std::future::pending::<()>().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_token_observes_cancel() {
		let source = CancelSource::new();
		let token = source.token();
		assert!(!token.is_cancelled());

		source.cancel();
		assert!(token.is_cancelled());
		assert!(source.is_cancelled());
	}

	#[test]
	fn test_cancelled_future_resolves() {
		let source = CancelSource::new();
		let mut token = source.token();
		source.cancel();
		tokio_test::block_on(token.cancelled());
	}

	#[test]
	fn test_tokens_created_after_cancel_are_cancelled() {
		let source = CancelSource::new();
		source.cancel();
		assert!(source.token().is_cancelled());
	}
}
