//! Precompiled placeholder substitution
//!
//! A file is split once on every occurrence of the placeholder. The resulting
//! [`ReplacerPlan`] alternates static byte runs with nonce markers and is
//! replayed for each request, so the file is never searched again.

use bytes::{Bytes, BytesMut};
use regex::bytes::Regex;

/// One step of a [`ReplacerPlan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// Bytes copied verbatim
	Static(Bytes),
	/// Position where the nonce is written
	Nonce,
}

/// A file split on its placeholder
///
/// For `k` occurrences the plan holds `2k + 1` segments: `k + 1` static runs
/// with a nonce marker between each pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacerPlan {
	segments: Vec<Segment>,
	static_len: usize,
}

impl ReplacerPlan {
	/// Replay the plan with `nonce` in place of every marker
	///
	/// # Examples
	///
	/// ```
	/// use websrv_middleware::replacer::Placeholder;
	///
	/// let plan = Placeholder::new("[[X]]").compile("a[[X]]b[[X]]c".into());
	///
	/// assert_eq!(plan.render("N"), "aNbNc");
	/// assert_eq!(plan.render("MM"), "aMMbMMc");
	/// ```
	pub fn render(&self, nonce: &str) -> Bytes {
		let mut out = BytesMut::with_capacity(self.static_len + self.nonce_count() * nonce.len());
		for segment in &self.segments {
			match segment {
				Segment::Static(data) => out.extend_from_slice(data),
				Segment::Nonce => out.extend_from_slice(nonce.as_bytes()),
			}
		}
		out.freeze()
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Number of nonce markers
	pub fn nonce_count(&self) -> usize {
		self.segments
			.iter()
			.filter(|segment| matches!(segment, Segment::Nonce))
			.count()
	}
}

/// The placeholder token searched for in templated files
#[derive(Debug, Clone)]
pub struct Placeholder {
	token: String,
	pattern: Option<Regex>,
}

impl Placeholder {
	/// An empty token never matches
	pub fn new(token: impl Into<String>) -> Self {
		let token = token.into();
		let pattern = (!token.is_empty())
			.then(|| Regex::new(&regex::escape(&token)))
			.and_then(|compiled| compiled.ok());
		Self { token, pattern }
	}

	pub fn token(&self) -> &str {
		&self.token
	}

	/// Split `data` into a [`ReplacerPlan`]
	///
	/// Static runs share the buffer of `data`.
	pub fn compile(&self, data: Bytes) -> ReplacerPlan {
		let static_len = data.len();
		let Some(pattern) = &self.pattern else {
			return ReplacerPlan {
				segments: vec![Segment::Static(data)],
				static_len,
			};
		};

		let mut segments = Vec::new();
		let mut static_len = 0;
		let mut start = 0;
		for found in pattern.find_iter(&data) {
			segments.push(Segment::Static(data.slice(start..found.start())));
			segments.push(Segment::Nonce);
			static_len += found.start() - start;
			start = found.end();
		}
		segments.push(Segment::Static(data.slice(start..)));
		static_len += data.len() - start;

		ReplacerPlan {
			segments,
			static_len,
		}
	}
}
