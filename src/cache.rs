use std::collections::BTreeMap;

use crate::instantiator::Instance;

/// Built instances of cached scopes, by object name
#[derive(Clone, Default)]
pub(crate) struct Cache {
    map: Option<BTreeMap<String, Instance>>,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self { map: None }
    }

    #[inline]
    pub(crate) fn insert(&mut self, name: impl Into<String>, instance: Instance) -> Option<Instance> {
        self.map.get_or_insert_with(BTreeMap::new).insert(name.into(), instance)
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, name: &str) -> Option<Instance> {
        self.map.as_ref().and_then(|map| map.get(name)).cloned()
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.map.as_ref().is_some_and(|map| map.contains_key(name))
    }

    #[inline]
    pub(crate) fn remove(&mut self, name: &str) -> Option<Instance> {
        self.map.as_mut().and_then(|map| map.remove(name))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> + '_ {
        self.map
            .iter()
            .flat_map(|map| map.iter().map(|(name, instance)| (name.as_str(), instance)))
    }
}

#[cfg(test)]
mod tests {
    use super::Cache;
    use crate::instantiator::Instance;

    use std::sync::Arc;

    #[test]
    fn test_cache() {
        let mut cache = Cache::new();
        assert!(cache.get("Acme.Shop.Cart").is_none());
        assert_eq!(cache.iter().count(), 0);

        let cart: Instance = Arc::new(1u8);
        assert!(cache.insert("Acme.Shop.Cart", cart.clone()).is_none());
        assert!(cache.contains("Acme.Shop.Cart"));
        assert!(Arc::ptr_eq(&cache.get("Acme.Shop.Cart").unwrap(), &cart));

        assert!(cache.remove("Acme.Shop.Cart").is_some());
        assert!(!cache.contains("Acme.Shop.Cart"));
        assert_eq!(cache.iter().count(), 0);
    }
}
