//! Buffered supply of random alphanumeric identifiers.
//!
//! Request ids and session nonces are drawn on the request path. A producer
//! thread owns the PRNG and keeps a bounded multi-consumer channel topped up;
//! consumers only wait on the channel.

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, select_biased};
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::thread;

/// Generates a random string of `length` characters from `[a-zA-Z0-9]`
///
/// # Examples
///
/// ```
/// use websrv_utils::random::random_alphanumeric;
///
/// let mut rng = rand::rng();
/// let id = random_alphanumeric(&mut rng, 12);
/// assert_eq!(id.len(), 12);
/// assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn random_alphanumeric<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
	rng.sample_iter(&Alphanumeric)
		.take(length)
		.map(char::from)
		.collect()
}

/// A bounded buffer of pre-generated random identifiers.
///
/// One producer thread owns a PRNG seeded from the operating system when the
/// generator is created and keeps up to `capacity` identifiers queued. Any
/// number of consumers may call [`get`](Self::get) concurrently; each takes
/// from the shared channel without further locking.
///
/// Dropping the generator stops the producer.
pub struct BufferedRandomIdGenerator {
	receiver: Receiver<String>,
	stop: Sender<()>,
	id_length: usize,
}

impl BufferedRandomIdGenerator {
	/// Create a generator and start its producer thread
	///
	/// A `capacity` of zero is treated as one. If the thread cannot be
	/// spawned the generator starts closed.
	///
	/// # Examples
	///
	/// ```
	/// use websrv_utils::random::BufferedRandomIdGenerator;
	///
	/// # #[tokio::main]
	/// # async fn main() {
	/// let generator = BufferedRandomIdGenerator::new(32, 16);
	/// let id = generator.get().await.unwrap();
	/// assert_eq!(id.len(), 32);
	/// # }
	/// ```
	pub fn new(id_length: usize, capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity.max(1));
		let (stop, stopped) = bounded(1);
		let rng = StdRng::from_os_rng();

		let spawned = thread::Builder::new()
			.name("websrv-random-ids".to_string())
			.spawn(move || produce(rng, id_length, sender, stopped));
		if let Err(error) = spawned {
			tracing::error!(error = %error, "could not start random id producer");
		}

		Self {
			receiver,
			stop,
			id_length,
		}
	}

	/// Length of every identifier this generator yields
	pub fn id_length(&self) -> usize {
		self.id_length
	}

	/// Take the next identifier, waiting for the producer if the buffer is empty
	///
	/// Returns `None` once the generator is closed and the buffer is drained.
	/// Must be awaited inside a Tokio runtime.
	pub async fn get(&self) -> Option<String> {
		match self.receiver.try_recv() {
			Ok(id) => Some(id),
			Err(TryRecvError::Disconnected) => None,
			Err(TryRecvError::Empty) => {
				let receiver = self.receiver.clone();
				tokio::task::spawn_blocking(move || receiver.recv().ok())
					.await
					.ok()
					.flatten()
			}
		}
	}

	/// Stop the producer
	///
	/// Identifiers already buffered can still be taken. Calling this more than
	/// once has no further effect.
	pub fn close(&self) {
		// A full or disconnected stop channel means the producer is already stopping
		self.stop.try_send(()).ok();
	}
}

/// Producer loop: generate, then block until there is room or a stop request
fn produce(mut rng: StdRng, id_length: usize, sender: Sender<String>, stopped: Receiver<()>) {
	loop {
		let id = random_alphanumeric(&mut rng, id_length);
		select_biased! {
			recv(stopped) -> _ => break,
			send(sender, id) -> sent => {
				if sent.is_err() {
					break;
				}
			}
		}
	}
	tracing::debug!(id_length, "random id producer stopped");
}

impl std::fmt::Debug for BufferedRandomIdGenerator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BufferedRandomIdGenerator")
			.field("id_length", &self.id_length)
			.field("buffered", &self.receiver.len())
			.finish_non_exhaustive()
	}
}
