use std::slice::Iter;

/// A key/value pair attached to a metric instance.
///
/// Labels distinguish instances of the same metric from one another. A
/// `requests_total` counter might carry a `method` label, producing one
/// instance (and one exposition line) per method observed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Label(String, String);

impl Label {
    /// Creates a [`Label`] from a key and value.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Label(key.into(), value.into())
    }

    /// Key of this label.
    pub fn key(&self) -> &str {
        self.0.as_ref()
    }

    /// Value of this label.
    pub fn value(&self) -> &str {
        self.1.as_ref()
    }

    /// Consumes this [`Label`], returning the key and value.
    pub fn into_parts(self) -> (String, String) {
        (self.0, self.1)
    }
}

impl<K, V> From<&(K, V)> for Label
where
    K: Into<String> + Clone,
    V: Into<String> + Clone,
{
    fn from(pair: &(K, V)) -> Label {
        Label::new(pair.0.clone(), pair.1.clone())
    }
}

/// A value that can be converted to [`Label`]s.
pub trait IntoLabels {
    /// Consumes this value, turning it into a vector of [`Label`]s.
    fn into_labels(self) -> Vec<Label>;
}

impl IntoLabels for Vec<Label> {
    fn into_labels(self) -> Vec<Label> {
        self
    }
}

impl<T, L> IntoLabels for &T
where
    Self: IntoIterator<Item = L>,
    L: Into<Label>,
{
    fn into_labels(self) -> Vec<Label> {
        self.into_iter().map(|l| l.into()).collect()
    }
}

/// The ordered set of labels identifying one metric instance.
///
/// Rendering preserves the stored order, but identity does not: two sets
/// carrying the same key/value pairs in different orders address the same
/// instance.
#[derive(Clone, Debug)]
pub struct LabelSet(Vec<Label>);

impl LabelSet {
    pub(crate) fn new(labels: Vec<Label>) -> Self {
        LabelSet(labels)
    }

    /// Whether this set contains no labels at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of labels in this set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the labels in their stored (rendering) order.
    pub fn iter(&self) -> Iter<'_, Label> {
        self.0.iter()
    }

    /// Order-independent comparison against a candidate label list.
    ///
    /// Duplicate keys are compared as a multiset, so `[a=1, a=2]` matches
    /// `[a=2, a=1]` but not `[a=1, a=1]`.
    pub(crate) fn matches(&self, other: &[Label]) -> bool {
        if self.0.len() != other.len() {
            return false;
        }
        let mut ours: Vec<(&str, &str)> = self.0.iter().map(|l| (l.key(), l.value())).collect();
        let mut theirs: Vec<(&str, &str)> = other.iter().map(|l| (l.key(), l.value())).collect();
        ours.sort_unstable();
        theirs.sort_unstable();
        ours == theirs
    }
}

impl PartialEq for LabelSet {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for LabelSet {}

#[cfg(test)]
mod tests {
    use super::{IntoLabels, Label, LabelSet};

    #[test]
    fn into_labels_conversions() {
        let from_tuples = (&[("foo", "bar"), ("baz", "quux")]).into_labels();
        let from_vec =
            vec![Label::new("foo", "bar"), Label::new("baz", "quux")].into_labels();
        assert_eq!(from_tuples, from_vec);
    }

    #[test]
    fn equality_ignores_order() {
        let a = LabelSet::new(vec![Label::new("foo", "bar"), Label::new("baz", "quux")]);
        let b = LabelSet::new(vec![Label::new("baz", "quux"), Label::new("foo", "bar")]);
        assert_eq!(a, b);
    }

    #[test]
    fn equality_respects_values_and_arity() {
        let a = LabelSet::new(vec![Label::new("foo", "bar")]);
        assert_ne!(a, LabelSet::new(vec![Label::new("foo", "baz")]));
        assert_ne!(a, LabelSet::new(vec![]));
        assert_ne!(
            a,
            LabelSet::new(vec![Label::new("foo", "bar"), Label::new("foo", "bar")])
        );
    }

    #[test]
    fn duplicate_keys_compare_as_multiset() {
        let a = LabelSet::new(vec![Label::new("a", "1"), Label::new("a", "2")]);
        let b = LabelSet::new(vec![Label::new("a", "2"), Label::new("a", "1")]);
        let c = LabelSet::new(vec![Label::new("a", "1"), Label::new("a", "1")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
