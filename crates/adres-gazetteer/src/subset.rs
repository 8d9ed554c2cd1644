use std::ops::Deref;

use crate::GazetteerTree;

/// Provinces selected when a subset is requested without naming any.
pub const DEFAULT_SUBSET: [&str; 5] = ["İzmir", "Aydın", "Manisa", "Muğla", "Denizli"];

/// A read-only tree restricted to some provinces.
///
/// Derefs to [`GazetteerTree`], so every query works on the view; the view
/// has no `insert` because it hands out only shared access.
#[derive(Clone, Debug)]
pub struct SubsetView {
    requested: Vec<String>,
    tree: GazetteerTree,
}

impl SubsetView {
    pub(crate) fn new(requested: Vec<String>, tree: GazetteerTree) -> Self {
        Self { requested, tree }
    }

    /// Canonical keys of the requested provinces.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Requested provinces absent from the source tree.
    pub fn missing(&self) -> Vec<&str> {
        self.requested
            .iter()
            .filter(|key| !key.is_empty() && self.tree.to_plain().get(*key).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Detach the restricted tree, e.g. to serve it on its own.
    pub fn into_inner(self) -> GazetteerTree {
        self.tree
    }
}

impl Deref for SubsetView {
    type Target = GazetteerTree;

    fn deref(&self) -> &GazetteerTree {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use adres_types::GazetteerRow;

    use crate::GazetteerTree;

    fn tree() -> GazetteerTree {
        GazetteerTree::build(
            [
                ("İZMİR", "KONAK", "ALSANCAK MAH"),
                ("AYDIN", "DİDİM", "ALTINKUM MAH"),
                ("İSTANBUL", "KADIKÖY", "CAFERAĞA MAH"),
                ("ANKARA", "MERKEZ", "KIZILAY MAH"),
                ("DENİZLİ", "MERKEZ", "BAYRAMYERİ MAH"),
            ]
            .into_iter()
            .filter_map(|(p, d, n)| GazetteerRow::new(p, d, n)),
        )
    }

    #[test]
    fn default_subset_keeps_aegean_provinces() {
        let full = tree();
        let view = full.subset_view::<&str>(&[]);
        assert_eq!(view.provinces().collect::<Vec<_>>(), vec!["aydin", "denizli", "izmir"]);
        assert_eq!(view.missing(), vec!["manisa", "mugla"]);
        assert!(view.duplicate_districts_across_provinces().is_empty());
        assert_eq!(full.province_count(), 5);
    }

    #[test]
    fn explicit_subset_rebuilds_indices() {
        let full = tree();
        let view = full.subset_view(&["Ankara", "İstanbul"]);
        assert_eq!(view.neighbourhoods_of(None, Some("merkez")), vec!["kizilay"]);
        assert_eq!(view.province_names_of("merkez"), vec!["ankara"]);
        assert!(view.missing().is_empty());
        let detached = view.into_inner();
        assert_eq!(detached.stats().provinces, 2);
    }
}
