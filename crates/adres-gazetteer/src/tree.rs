use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

use adres_normalize::Normalizer;
use adres_types::GazetteerRow;
use tracing::debug;

use crate::subset::{DEFAULT_SUBSET, SubsetView};

/// Neighbourhood names under one district.
pub type NeighbourhoodSet = BTreeSet<String>;
/// District name → neighbourhoods.
pub type DistrictMap = BTreeMap<String, NeighbourhoodSet>;
/// Province name → districts. The plain nested form persisted in caches.
pub type ProvinceMap = BTreeMap<String, DistrictMap>;
/// `(province, district)` → neighbourhoods.
pub type DistrictIndex = HashMap<(String, String), NeighbourhoodSet>;
/// District → province → neighbourhoods, for district names shared across provinces.
pub type DistrictUnion = HashMap<String, BTreeMap<String, NeighbourhoodSet>>;

/// Row accounting for a single build pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BuildReport {
    pub rows_seen: usize,
    pub rows_kept: usize,
    pub rows_skipped: usize,
}

/// Aggregate sizes of a tree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GazetteerStats {
    pub provinces: usize,
    pub districts: usize,
    pub neighbourhoods: usize,
    pub shared_district_names: usize,
}

/// Province → district → neighbourhood hierarchy keyed by canonical names.
///
/// Query methods accept raw names and canonicalize them, so `"İSTANBUL"`
/// and `"istanbul"` address the same province. Methods documented as taking
/// keys skip that step and expect already-canonical input.
#[derive(Clone, Debug, Default)]
pub struct GazetteerTree {
    normalizer: Normalizer,
    tree: ProvinceMap,
    district_index: DistrictIndex,
    district_union: DistrictUnion,
}

impl GazetteerTree {
    /// Build from rows in a single pass into a fresh structure.
    pub fn build<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = GazetteerRow>,
    {
        Self::build_with_report(rows).0
    }

    pub fn build_with_report<I>(rows: I) -> (Self, BuildReport)
    where
        I: IntoIterator<Item = GazetteerRow>,
    {
        let mut tree = Self::default();
        let mut report = BuildReport::default();
        for row in rows {
            report.rows_seen += 1;
            if tree.insert(&row.province, &row.district, &row.neighbourhood) {
                report.rows_kept += 1;
            } else {
                report.rows_skipped += 1;
            }
        }
        debug!(
            "built tree from {} rows ({} kept, {} skipped or duplicate)",
            report.rows_seen, report.rows_kept, report.rows_skipped
        );
        (tree, report)
    }

    /// Wrap an already-canonical nested mapping, deriving both indices.
    pub fn from_plain(tree: ProvinceMap) -> Self {
        let (district_index, district_union) = derive_indices(&tree);
        Self {
            normalizer: Normalizer::default(),
            tree,
            district_index,
            district_union,
        }
    }

    pub(crate) fn from_parts(
        tree: ProvinceMap,
        district_index: DistrictIndex,
        district_union: DistrictUnion,
    ) -> Self {
        Self {
            normalizer: Normalizer::default(),
            tree,
            district_index,
            district_union,
        }
    }

    /// Canonicalize and add one path. Returns `false` when any part is empty
    /// after canonicalization or the path already exists.
    pub fn insert(&mut self, province: &str, district: &str, neighbourhood: &str) -> bool {
        let p = self.key(province);
        let d = self.key(district);
        let n = self.neighbourhood_key(neighbourhood);
        if p.is_empty() || d.is_empty() || n.is_empty() {
            return false;
        }

        self.district_index
            .entry((p.clone(), d.clone()))
            .or_default()
            .insert(n.clone());
        self.district_union
            .entry(d.clone())
            .or_default()
            .entry(p.clone())
            .or_default()
            .insert(n.clone());
        self.tree.entry(p).or_default().entry(d).or_default().insert(n)
    }

    /// Canonical key for a province or district name.
    pub fn key(&self, raw: &str) -> String {
        self.normalizer.normalize_static_parser(raw)
    }

    /// Canonical key for a neighbourhood name: the static key with any
    /// standalone `mah` token removed ("CAFERAĞA MAH" → `caferaga`).
    /// Fuller forms such as `mahallesi` are kept.
    pub fn neighbourhood_key(&self, raw: &str) -> String {
        strip_standalone_mah(&self.key(raw))
    }

    pub fn provinces(&self) -> impl Iterator<Item = &str> + '_ {
        self.tree.keys().map(String::as_str)
    }

    pub fn province_count(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn districts_of(&self, province: &str) -> Vec<&str> {
        self.tree
            .get(&self.key(province))
            .map(|districts| districts.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Sorted neighbourhood names for any combination of filters:
    /// both → that pair; province only → every district in it; district
    /// only → that district name under every province; neither → all.
    pub fn neighbourhoods_of(&self, province: Option<&str>, district: Option<&str>) -> Vec<&str> {
        let province = province.map(|p| self.key(p)).filter(|p| !p.is_empty());
        let district = district.map(|d| self.key(d)).filter(|d| !d.is_empty());
        match (province, district) {
            (Some(p), Some(d)) => self
                .district_index
                .get(&(p, d))
                .map(|set| set.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            (Some(p), None) => sorted_union(self.tree.get(&p).into_iter().flat_map(|m| m.values())),
            (None, Some(d)) => {
                sorted_union(self.district_union.get(&d).into_iter().flat_map(|m| m.values()))
            }
            (None, None) => sorted_union(self.tree.values().flat_map(|m| m.values())),
        }
    }

    pub fn district_count(&self, province: &str) -> usize {
        self.tree.get(&self.key(province)).map_or(0, BTreeMap::len)
    }

    pub fn neighbourhood_count(&self, province: &str) -> usize {
        self.tree
            .get(&self.key(province))
            .map_or(0, |districts| districts.values().map(BTreeSet::len).sum())
    }

    /// District names that occur under more than one province, each with
    /// the sorted provinces it occurs under.
    pub fn duplicate_districts_across_provinces(&self) -> BTreeMap<String, Vec<String>> {
        self.district_union
            .iter()
            .filter(|(_, provinces)| provinces.len() > 1)
            .map(|(district, provinces)| (district.clone(), provinces.keys().cloned().collect()))
            .collect()
    }

    /// Sorted provinces containing a district of this name.
    pub fn province_names_of(&self, district: &str) -> Vec<&str> {
        self.district_union
            .get(&self.key(district))
            .map(|provinces| provinces.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every distinct district name across all provinces.
    pub fn all_district_names(&self) -> BTreeSet<&str> {
        self.district_union.keys().map(String::as_str).collect()
    }

    /// Whether `district` lies under `province`. Takes keys.
    pub fn contains_district(&self, province: &str, district: &str) -> bool {
        self.tree
            .get(province)
            .is_some_and(|districts| districts.contains_key(district))
    }

    /// Whether the `(province, district)` pair holds `neighbourhood`. Takes keys.
    pub fn contains_neighbourhood(&self, province: &str, district: &str, neighbourhood: &str) -> bool {
        self.tree
            .get(province)
            .and_then(|districts| districts.get(district))
            .is_some_and(|set| set.contains(neighbourhood))
    }

    /// Whether a district of this name holds `neighbourhood` under any
    /// province. Takes keys.
    pub fn district_name_contains(&self, district: &str, neighbourhood: &str) -> bool {
        self.district_union
            .get(district)
            .is_some_and(|provinces| provinces.values().any(|set| set.contains(neighbourhood)))
    }

    /// First province, in ascending key order, that has this district.
    ///
    /// When the district name is shared by several provinces (see
    /// [`duplicate_districts_across_provinces`](Self::duplicate_districts_across_provinces))
    /// the answer is stable for a given gazetteer but carries no meaning
    /// beyond that ordering.
    pub fn province_of_district(&self, district: &str) -> Option<&str> {
        let district = self.key(district);
        self.tree
            .iter()
            .find(|(_, districts)| districts.contains_key(&district))
            .map(|(province, _)| province.as_str())
    }

    /// The nested mapping itself.
    pub fn to_plain(&self) -> &ProvinceMap {
        &self.tree
    }

    pub(crate) fn district_index(&self) -> &DistrictIndex {
        &self.district_index
    }

    pub(crate) fn district_union(&self) -> &DistrictUnion {
        &self.district_union
    }

    pub fn stats(&self) -> GazetteerStats {
        GazetteerStats {
            provinces: self.tree.len(),
            districts: self.district_index.len(),
            neighbourhoods: self.district_index.values().map(BTreeSet::len).sum(),
            shared_district_names: self
                .district_union
                .values()
                .filter(|provinces| provinces.len() > 1)
                .count(),
        }
    }

    /// Indented outline of the whole tree or of one province.
    pub fn render_tree(&self, province: Option<&str>) -> String {
        let mut out = String::new();
        let render_districts = |out: &mut String, districts: &DistrictMap, indent: usize| {
            for (district, neighbourhoods) in districts {
                let _ = writeln!(out, "{}- {district}", "  ".repeat(indent));
                for neighbourhood in neighbourhoods {
                    let _ = writeln!(out, "{}- {neighbourhood}", "  ".repeat(indent + 1));
                }
            }
        };
        match province {
            Some(raw) => {
                if let Some(districts) = self.tree.get(&self.key(raw)) {
                    render_districts(&mut out, districts, 0);
                }
            }
            None => {
                for (province, districts) in &self.tree {
                    let _ = writeln!(out, "- {province}");
                    render_districts(&mut out, districts, 1);
                }
            }
        }
        out
    }

    /// Read-only restriction to the given provinces, with its own indices.
    /// An empty list selects the default five-province subset.
    pub fn subset_view<S: AsRef<str>>(&self, provinces: &[S]) -> SubsetView {
        let requested: Vec<String> = if provinces.is_empty() {
            DEFAULT_SUBSET.iter().map(|p| self.key(p)).collect()
        } else {
            provinces.iter().map(|p| self.key(p.as_ref())).collect()
        };
        let filtered: ProvinceMap = self
            .tree
            .iter()
            .filter(|(province, _)| requested.contains(province))
            .map(|(province, districts)| (province.clone(), districts.clone()))
            .collect();
        SubsetView::new(requested, Self::from_plain(filtered))
    }
}

/// Recompute both derived indices from a nested mapping. Districts with no
/// neighbourhoods contribute nothing.
pub(crate) fn derive_indices(tree: &ProvinceMap) -> (DistrictIndex, DistrictUnion) {
    let mut district_index = DistrictIndex::new();
    let mut district_union = DistrictUnion::new();
    for (province, districts) in tree {
        for (district, neighbourhoods) in districts {
            if neighbourhoods.is_empty() {
                continue;
            }
            district_index
                .entry((province.clone(), district.clone()))
                .or_default()
                .extend(neighbourhoods.iter().cloned());
            district_union
                .entry(district.clone())
                .or_default()
                .entry(province.clone())
                .or_default()
                .extend(neighbourhoods.iter().cloned());
        }
    }
    (district_index, district_union)
}

pub fn strip_standalone_mah(key: &str) -> String {
    key.split_whitespace()
        .filter(|token| *token != "mah")
        .collect::<Vec<_>>()
        .join(" ")
}

fn sorted_union<'a, I>(sets: I) -> Vec<&'a str>
where
    I: Iterator<Item = &'a NeighbourhoodSet>,
{
    let union: BTreeSet<&str> = sets.flat_map(|set| set.iter().map(String::as_str)).collect();
    union.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(p: &str, d: &str, n: &str) -> GazetteerRow {
        GazetteerRow::new(p, d, n).expect("non-blank row")
    }

    fn sample() -> GazetteerTree {
        GazetteerTree::build(vec![
            row("İSTANBUL", "KADIKÖY", "CAFERAĞA MAH"),
            row("İSTANBUL", "KADIKÖY", "ACIBADEM MAH"),
            row("İSTANBUL", "BEŞİKTAŞ", "ETİLER MAH"),
            row("ANKARA", "KEÇİÖREN", "ETLİK MAH"),
            row("ANKARA", "MERKEZ", "KIZILAY MAH"),
            row("DENİZLİ", "MERKEZ", "BAYRAMYERİ MAH"),
        ])
    }

    #[test]
    fn keys_are_canonical() {
        let tree = sample();
        assert_eq!(tree.provinces().collect::<Vec<_>>(), vec!["ankara", "denizli", "istanbul"]);
        assert_eq!(tree.districts_of("İstanbul"), vec!["besiktas", "kadikoy"]);
        assert_eq!(tree.neighbourhoods_of(Some("istanbul"), Some("Kadıköy")), vec!["acibadem", "caferaga"]);
    }

    #[test]
    fn strips_only_standalone_mah() {
        assert_eq!(strip_standalone_mah("caferaga mah"), "caferaga");
        assert_eq!(strip_standalone_mah("mah"), "");
        assert_eq!(strip_standalone_mah("yeni mahalle"), "yeni mahalle");
        assert_eq!(strip_standalone_mah("mahmutbey mah"), "mahmutbey");
    }

    #[test]
    fn duplicate_inserts_are_no_ops() {
        let mut tree = sample();
        let before = tree.stats();
        assert!(!tree.insert("istanbul", "kadikoy", "Caferağa MAH"));
        assert!(!tree.insert("", "kadikoy", "caferaga"));
        assert!(!tree.insert("ankara", "cankaya", "mah"));
        assert_eq!(tree.stats(), before);
        assert!(tree.insert("ankara", "çankaya", "kızılay"));
        assert_eq!(tree.district_count("ankara"), 3);
    }

    #[test]
    fn four_way_neighbourhood_queries() {
        let tree = sample();
        assert_eq!(tree.neighbourhoods_of(Some("ankara"), None), vec!["etlik", "kizilay"]);
        assert_eq!(tree.neighbourhoods_of(None, Some("merkez")), vec!["bayramyeri", "kizilay"]);
        assert_eq!(tree.neighbourhoods_of(None, None).len(), 6);
        assert!(tree.neighbourhoods_of(Some("izmir"), Some("konak")).is_empty());
        assert_eq!(tree.neighbourhoods_of(Some(""), None).len(), 6);
    }

    #[test]
    fn counts_and_duplicates() {
        let tree = sample();
        assert_eq!(tree.district_count("İSTANBUL"), 2);
        assert_eq!(tree.neighbourhood_count("istanbul"), 3);
        assert_eq!(tree.district_count("izmir"), 0);
        let dups = tree.duplicate_districts_across_provinces();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups["merkez"], vec!["ankara".to_string(), "denizli".to_string()]);
        assert_eq!(tree.province_names_of("MERKEZ"), vec!["ankara", "denizli"]);
        assert_eq!(
            tree.stats(),
            GazetteerStats {
                provinces: 3,
                districts: 5,
                neighbourhoods: 6,
                shared_district_names: 1
            }
        );
    }

    #[test]
    fn indices_mirror_tree() {
        let tree = sample();
        let (index, union) = derive_indices(tree.to_plain());
        assert_eq!(&index, tree.district_index());
        assert_eq!(&union, tree.district_union());
        for (province, districts) in tree.to_plain() {
            for (district, neighbourhoods) in districts {
                assert_eq!(&tree.district_index()[&(province.clone(), district.clone())], neighbourhoods);
            }
        }
    }

    #[test]
    fn key_level_lookups() {
        let tree = sample();
        assert!(tree.contains_district("ankara", "kecioren"));
        assert!(!tree.contains_district("istanbul", "kecioren"));
        assert!(tree.contains_neighbourhood("ankara", "kecioren", "etlik"));
        assert!(tree.district_name_contains("merkez", "bayramyeri"));
        assert!(!tree.district_name_contains("merkez", "etlik"));
        assert_eq!(tree.province_of_district("MERKEZ"), Some("ankara"));
        assert_eq!(tree.province_of_district("konak"), None);
    }

    #[test]
    fn renders_outline() {
        let tree = sample();
        let ankara = tree.render_tree(Some("Ankara"));
        assert!(ankara.starts_with("- kecioren\n  - etlik\n"));
        assert!(tree.render_tree(None).contains("- istanbul\n  - besiktas\n    - etiler\n"));
        assert!(tree.render_tree(Some("izmir")).is_empty());
    }
}
