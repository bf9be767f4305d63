use std::collections::{BTreeMap, HashMap};

/// Query string parameters, kept in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(pub Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.push((key.into(), value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<()> for Query {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Vec<(String, String)>> for Query {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Query {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for Query {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl From<HashMap<String, String>> for Query {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::Query;

    #[test]
    fn unit_is_empty() {
        let query: Query = ().into();
        assert!(query.is_empty());
    }

    #[test]
    fn array_keeps_order() {
        let query: Query = [("q", "cats"), ("page", "2")].into();
        assert_eq!(
            query.0,
            vec![
                ("q".to_owned(), "cats".to_owned()),
                ("page".to_owned(), "2".to_owned())
            ]
        );
    }

    #[test]
    fn builder_stringifies_values() {
        let query = Query::new().with("limit", 10).with("safe", true);
        assert_eq!(query.0[0].1, "10");
        assert_eq!(query.0[1].1, "true");
    }
}
