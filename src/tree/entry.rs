use crate::error::{ConfigError, Result};
use crate::tree::ConfigTree;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// A leaf value stored in a configuration tree.
#[derive(Debug, Clone)]
pub enum Scalar {
	Null,
	Bool(bool),
	Integer(i64),
	Float(f64),
	String(String),
}

impl Scalar {
	/// Short type name used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Scalar::Null => "null",
			Scalar::Bool(_) => "boolean",
			Scalar::Integer(_) => "integer",
			Scalar::Float(_) => "float",
			Scalar::String(_) => "string",
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Scalar::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Scalar::Null)
	}
}

// Floats compare by bit pattern so a NaN equals its own copy.
impl PartialEq for Scalar {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Scalar::Null, Scalar::Null) => true,
			(Scalar::Bool(a), Scalar::Bool(b)) => a == b,
			(Scalar::Integer(a), Scalar::Integer(b)) => a == b,
			(Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
			(Scalar::String(a), Scalar::String(b)) => a == b,
			_ => false,
		}
	}
}

impl fmt::Display for Scalar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Scalar::Null => write!(f, "null"),
			Scalar::Bool(b) => write!(f, "{}", b),
			Scalar::Integer(i) => write!(f, "{}", i),
			Scalar::Float(x) => write!(f, "{}", x),
			Scalar::String(s) => write!(f, "{}", s),
		}
	}
}

impl From<&str> for Scalar {
	fn from(value: &str) -> Self {
		Scalar::String(value.to_string())
	}
}

impl From<String> for Scalar {
	fn from(value: String) -> Self {
		Scalar::String(value)
	}
}

impl From<bool> for Scalar {
	fn from(value: bool) -> Self {
		Scalar::Bool(value)
	}
}

impl From<i64> for Scalar {
	fn from(value: i64) -> Self {
		Scalar::Integer(value)
	}
}

impl From<i32> for Scalar {
	fn from(value: i32) -> Self {
		Scalar::Integer(value.into())
	}
}

impl From<f64> for Scalar {
	fn from(value: f64) -> Self {
		Scalar::Float(value)
	}
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
	fn from(value: Option<T>) -> Self {
		value.map_or(Scalar::Null, Into::into)
	}
}

/// Number of positional arguments a deferred entry accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
	Exact(usize),
	AtLeast(usize),
}

impl Arity {
	pub fn accepts(&self, given: usize) -> bool {
		match *self {
			Arity::Exact(n) => given == n,
			Arity::AtLeast(n) => given >= n,
		}
	}
}

impl fmt::Display for Arity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Arity::Exact(n) => write!(f, "{}", n),
			Arity::AtLeast(n) => write!(f, "at least {}", n),
		}
	}
}

type DeferredFn = dyn Fn(&[Entry]) -> Result<Entry> + Send + Sync;

/// A configuration value computed on lookup from caller-supplied arguments.
///
/// Clones share the underlying callable, and two deferred entries compare
/// equal only when they share it.
#[derive(Clone)]
pub struct Deferred {
	arity: Arity,
	func: Arc<DeferredFn>,
}

impl Deferred {
	pub fn new<F>(arity: Arity, func: F) -> Self
	where
		F: Fn(&[Entry]) -> Result<Entry> + Send + Sync + 'static,
	{
		Deferred {
			arity,
			func: Arc::new(func),
		}
	}

	/// Build a deferred string from a template with `{}` placeholders.
	///
	/// Each placeholder consumes one scalar argument, so the arity is the
	/// number of placeholders.
	pub fn template(text: impl Into<String>) -> Self {
		let text = text.into();
		let pieces: Vec<String> = text.split("{}").map(str::to_string).collect();
		let arity = Arity::Exact(pieces.len() - 1);

		Deferred::new(arity, move |args| {
			let mut rendered = pieces[0].clone();
			for (arg, piece) in args.iter().zip(&pieces[1..]) {
				let scalar = arg.as_scalar().ok_or_else(|| {
					ConfigError::invalid_argument(format!(
						"template argument must be a scalar, found {}",
						arg.kind()
					))
				})?;
				rendered.push_str(&scalar.to_string());
				rendered.push_str(piece);
			}
			Ok(Entry::Scalar(Scalar::String(rendered)))
		})
	}

	pub fn arity(&self) -> Arity {
		self.arity
	}

	/// Invoke the callable after checking the argument count.
	///
	/// `key` is only used to label an arity error.
	pub fn call(&self, key: &str, args: &[Entry]) -> Result<Entry> {
		if !self.arity.accepts(args.len()) {
			return Err(ConfigError::ArityMismatch {
				key: key.to_string(),
				expected: self.arity.to_string(),
				given: args.len(),
			});
		}
		(self.func)(args)
	}
}

impl fmt::Debug for Deferred {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Deferred")
			.field("arity", &self.arity)
			.finish_non_exhaustive()
	}
}

impl PartialEq for Deferred {
	fn eq(&self, other: &Self) -> bool {
		self.arity == other.arity && Arc::ptr_eq(&self.func, &other.func)
	}
}

/// A single value stored under a key of a [`ConfigTree`].
///
/// Mapping-shaped inputs only ever become [`Entry::Section`], so a tree never
/// holds a raw nested map at any depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
	Scalar(Scalar),
	Sequence(Vec<Scalar>),
	Deferred(Deferred),
	Section(ConfigTree),
}

impl Entry {
	pub fn null() -> Self {
		Entry::Scalar(Scalar::Null)
	}

	/// Short type name used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Entry::Scalar(s) => s.kind(),
			Entry::Sequence(_) => "sequence",
			Entry::Deferred(_) => "deferred",
			Entry::Section(_) => "section",
		}
	}

	pub fn is_section(&self) -> bool {
		matches!(self, Entry::Section(_))
	}

	pub fn is_deferred(&self) -> bool {
		matches!(self, Entry::Deferred(_))
	}

	pub fn as_scalar(&self) -> Option<&Scalar> {
		match self {
			Entry::Scalar(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		self.as_scalar().and_then(Scalar::as_str)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Entry::Scalar(Scalar::Bool(b)) => Some(*b),
			_ => None,
		}
	}

	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Entry::Scalar(Scalar::Integer(i)) => Some(*i),
			_ => None,
		}
	}

	/// Integers widen to floats here.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			Entry::Scalar(Scalar::Float(x)) => Some(*x),
			Entry::Scalar(Scalar::Integer(i)) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn as_sequence(&self) -> Option<&[Scalar]> {
		match self {
			Entry::Sequence(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_section(&self) -> Option<&ConfigTree> {
		match self {
			Entry::Section(tree) => Some(tree),
			_ => None,
		}
	}

	pub fn as_section_mut(&mut self) -> Option<&mut ConfigTree> {
		match self {
			Entry::Section(tree) => Some(tree),
			_ => None,
		}
	}
}

impl From<Scalar> for Entry {
	fn from(value: Scalar) -> Self {
		Entry::Scalar(value)
	}
}

impl From<&str> for Entry {
	fn from(value: &str) -> Self {
		Entry::Scalar(value.into())
	}
}

impl From<String> for Entry {
	fn from(value: String) -> Self {
		Entry::Scalar(value.into())
	}
}

impl From<bool> for Entry {
	fn from(value: bool) -> Self {
		Entry::Scalar(value.into())
	}
}

impl From<i64> for Entry {
	fn from(value: i64) -> Self {
		Entry::Scalar(value.into())
	}
}

impl From<i32> for Entry {
	fn from(value: i32) -> Self {
		Entry::Scalar(value.into())
	}
}

impl From<f64> for Entry {
	fn from(value: f64) -> Self {
		Entry::Scalar(value.into())
	}
}

impl<T: Into<Scalar>> From<Vec<T>> for Entry {
	fn from(value: Vec<T>) -> Self {
		Entry::Sequence(value.into_iter().map(Into::into).collect())
	}
}

impl From<Deferred> for Entry {
	fn from(value: Deferred) -> Self {
		Entry::Deferred(value)
	}
}

impl From<ConfigTree> for Entry {
	fn from(value: ConfigTree) -> Self {
		Entry::Section(value)
	}
}

// Plain mappings are promoted to sections on the way in.

impl<K: Into<String>, V: Into<Entry>> From<IndexMap<K, V>> for Entry {
	fn from(value: IndexMap<K, V>) -> Self {
		Entry::Section(value.into_iter().collect())
	}
}

impl<K: Into<String>, V: Into<Entry>> From<BTreeMap<K, V>> for Entry {
	fn from(value: BTreeMap<K, V>) -> Self {
		Entry::Section(value.into_iter().collect())
	}
}

impl<K: Into<String>, V: Into<Entry>> From<HashMap<K, V>> for Entry {
	fn from(value: HashMap<K, V>) -> Self {
		Entry::Section(value.into_iter().collect())
	}
}
