/// Build a [`ConfigTree`](crate::ConfigTree) from a literal.
///
/// Braces nest a section, brackets make a sequence of scalars, and anything
/// else goes through `Entry::from`. Values must be a single token tree, so
/// wrap longer expressions in parentheses.
///
/// ```
/// use cfgtree::config_tree;
///
/// let tree = config_tree! {
///     "foo" => "bar",
///     "bar" => { "foo" => "foobar", "threads" => 4 },
///     "keys" => ["id", "sample"],
/// };
/// assert_eq!(tree.sections(), vec!["bar"]);
/// ```
#[macro_export]
macro_rules! config_tree {
	(@entry { $($inner:tt)* }) => {
		$crate::Entry::Section($crate::config_tree!($($inner)*))
	};
	(@entry [ $($item:expr),* $(,)? ]) => {
		$crate::Entry::Sequence(vec![$($crate::Scalar::from($item)),*])
	};
	(@entry $value:expr) => {
		$crate::Entry::from($value)
	};
	() => {
		$crate::ConfigTree::new()
	};
	($($key:expr => $value:tt),+ $(,)?) => {{
		let mut tree = $crate::ConfigTree::new();
		$( tree.set($key, $crate::config_tree!(@entry $value)); )+
		tree
	}};
}
