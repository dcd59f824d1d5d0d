use logos::Logos;

/// Raw tokens produced by logos for flat tokenization of effect code.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
	#[token("$$")]
	EscapedDollar,
	#[token("${")]
	FormulaOpen,
	#[token("$")]
	Dollar,
	#[token("}")]
	BraceClose,
	#[regex(r"[^$}]+")]
	Text,
}

/// A region of effect code as split by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
	/// Literal text with `$$` escapes already resolved.
	Text(String),
	/// The raw body of a `${...}` formula.
	Formula {
		body: String,
		/// Byte offset of the `${` that opened the formula.
		offset: usize,
	},
}

/// Context states for the two-state scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanContext {
	/// Outside of any formula.
	Text,
	/// Between `${` and the next `}`.
	Formula { offset: usize },
}

/// Walks the logos token stream, switching between text and formula
/// handling.
struct SnippetScanner<'a> {
	source: &'a str,
	raw_tokens: Vec<(Result<RawToken, ()>, std::ops::Range<usize>)>,
	cursor: usize,
	context: ScanContext,
	/// Text or formula body accumulated since the last flush.
	buffer: String,
	segments: Vec<Segment>,
}

impl<'a> SnippetScanner<'a> {
	fn new(source: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
			context: ScanContext::Text,
			buffer: String::new(),
			segments: vec![],
		}
	}

	fn current_slice(&self) -> &'a str {
		let (_, span) = &self.raw_tokens[self.cursor];
		&self.source[span.clone()]
	}

	/// Push the accumulated text as a segment, skipping empty runs.
	fn flush_text(&mut self) {
		if !self.buffer.is_empty() {
			let text = std::mem::take(&mut self.buffer);
			self.segments.push(Segment::Text(text));
		}
	}

	fn process(&mut self) {
		while self.cursor < self.raw_tokens.len() {
			let (result, span) = &self.raw_tokens[self.cursor];
			let start = span.start;
			// Every byte is covered by some token, so errors cannot occur; keep
			// the slice verbatim if they ever do.
			let raw = result.unwrap_or(RawToken::Text);

			match self.context {
				ScanContext::Text => {
					match raw {
						RawToken::EscapedDollar => self.buffer.push('$'),
						RawToken::FormulaOpen => {
							self.flush_text();
							self.context = ScanContext::Formula { offset: start };
						}
						RawToken::Dollar | RawToken::BraceClose | RawToken::Text => {
							let slice = self.current_slice();
							self.buffer.push_str(slice);
						}
					}
				}
				ScanContext::Formula { offset } => {
					match raw {
						RawToken::BraceClose => {
							let body = std::mem::take(&mut self.buffer);
							self.segments.push(Segment::Formula { body, offset });
							self.context = ScanContext::Text;
						}
						_ => {
							let slice = self.current_slice();
							self.buffer.push_str(slice);
						}
					}
				}
			}

			self.cursor += 1;
		}

		match self.context {
			ScanContext::Text => {
				if !self.buffer.is_empty() || self.segments.is_empty() {
					let text = std::mem::take(&mut self.buffer);
					self.segments.push(Segment::Text(text));
				}
			}
			ScanContext::Formula { offset } => {
				tracing::debug!(offset, "dropping unterminated formula at end of input");
				self.buffer.clear();
			}
		}
	}
}

/// Split effect code into literal text and raw formula bodies.
///
/// Outside a formula `$$` is a literal `$`, `${` opens a formula and every
/// other character (including a lone `$` or `}`) is literal. Inside a formula
/// everything up to the next `}` is the raw body. Text left over at the end
/// of input becomes a final text segment, while an unterminated formula is
/// dropped without producing any segment.
pub(crate) fn scan(source: &str) -> Vec<Segment> {
	let mut scanner = SnippetScanner::new(source);
	scanner.process();
	scanner.segments
}
