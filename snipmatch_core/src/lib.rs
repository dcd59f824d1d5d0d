//! `snipmatch_core` is the matching and synthesis core of snipmatch, a
//! snippet engine that turns a short free text query into code. Effects
//! (parameterized code templates) are matched against the query, the
//! candidate matches are held in match trees, and a match environment turns a
//! chosen tree into finished text and hands it to a document.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Effect code
//!   -> Lexer (splits code into text runs and raw `${...}` formula bodies)
//!   -> Parser (formula grammar, produces text and formula snippet nodes)
//!   -> SnippetMatchEnvironment (caches nodes per effect, walks them with variables)
//!   -> MatchEnvironment (evaluates the match tree bottom up, applies the result)
//! ```
//!
//! ## Effect Code
//!
//! - `${name}` invokes a formula without arguments.
//! - `${name(a,b)}` invokes a formula with raw comma separated arguments.
//! - `${var:name}` and `${var:name(a,b)}` also capture the value as `var` for
//!   later formulas.
//! - `$$` is a literal `$`.
//!
//! ## Key Types
//!
//! - [`Effect`]: a reusable code template with typed [`EffectParameter`]s.
//! - [`MatchTree`]: arena of effect and argument match nodes addressed by
//!   [`NodeId`].
//! - [`MatchEnvironment`]: the orchestrator trait that evaluates and applies
//!   matches.
//! - [`SnippetMatchEnvironment`]: text synthesis over a [`SnippetEvaluator`].
//! - [`DocumentEnvironment`]: a concrete evaluator over an in-memory document.
//! - [`SnipmatchConfig`]: configuration loaded from `snipmatch.toml`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use snipmatch_core::DocumentEnvironment;
//! use snipmatch_core::Effect;
//! use snipmatch_core::EffectParameter;
//! use snipmatch_core::MatchEnvironment;
//! use snipmatch_core::MatchTree;
//! use snipmatch_core::SnippetMatchEnvironment;
//!
//! let effect = Rc::new(
//! 	Effect::new("list-add")
//! 		.with_pattern("add $elem to $coll")
//! 		.with_parameter(EffectParameter::new("coll", "expr", "java.util.List"))
//! 		.with_parameter(EffectParameter::new("elem", "expr", ""))
//! 		.with_code("${coll}.add(${elem});"),
//! );
//!
//! let mut tree = MatchTree::new();
//! let coll = tree.add_argument(effect.parameter(0).cloned(), Some("names".into()));
//! let elem = tree.add_argument(effect.parameter(1).cloned(), Some("name".into()));
//! let root = tree.add_effect(effect, "add $elem to $coll", vec![coll, elem])?;
//!
//! let document = DocumentEnvironment::new("");
//! let mut env = SnippetMatchEnvironment::new(document);
//! env.apply_match(&tree, root)?;
//!
//! assert_eq!(env.evaluator().text(), "names.add(name);");
//! # Ok::<(), snipmatch_core::SnipError>(())
//! ```

pub use compatibility::*;
pub use config::*;
pub use document::*;
pub use effect::*;
pub use environment::*;
pub use error::*;
pub use match_node::*;
pub use parser::*;
pub use snippet::*;

mod compatibility;
pub mod config;
mod document;
mod effect;
mod environment;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
mod match_node;
mod parser;
mod snippet;

#[cfg(test)]
mod __fixtures;
