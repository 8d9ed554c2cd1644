use std::sync::Arc;

use adres_gazetteer::GazetteerTree;
use adres_normalize::Normalizer;
use adres_types::{AdminLevel, Address};
use serde::Serialize;

use crate::index::{TokenIndex, TokenMatch};

/// Token range `[start, end)` a name was matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

/// One resolved level. `span` is `None` when the name was not read from the
/// text but inferred, which only happens for a province implied by its district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelMatch {
    pub name: String,
    pub span: Option<TokenSpan>,
}

impl LevelMatch {
    fn found(m: TokenMatch<'_>) -> Self {
        Self {
            name: m.name.to_string(),
            span: Some(TokenSpan {
                start: m.start,
                end: m.end,
            }),
        }
    }

    fn inferred(name: &str) -> Self {
        Self {
            name: name.to_string(),
            span: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelMatches {
    pub province: Option<LevelMatch>,
    pub district: Option<LevelMatch>,
    pub neighbourhood: Option<LevelMatch>,
}

/// Everything a parse saw and decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTrace {
    pub original_text: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    pub matches: LevelMatches,
}

impl ParseTrace {
    pub fn to_address(&self) -> Address {
        let mut address = Address::unresolved(self.original_text.clone());
        for (level, m) in [
            (AdminLevel::Province, &self.matches.province),
            (AdminLevel::District, &self.matches.district),
            (AdminLevel::Neighbourhood, &self.matches.neighbourhood),
        ] {
            address.set(level, m.as_ref().map(|m| m.name.clone()));
        }
        address
    }

    pub fn into_address(self) -> Address {
        let LevelMatches {
            province,
            district,
            neighbourhood,
        } = self.matches;
        Address {
            province: province.map(|m| m.name),
            district: district.map(|m| m.name),
            neighbourhood: neighbourhood.map(|m| m.name),
            original_text: self.original_text,
        }
    }
}

/// Deterministic resolver that only knows the names in a [`GazetteerTree`].
///
/// Text is canonicalized with the same mode the gazetteer keys use, then each
/// level is found by longest exact token match, narrowing the candidates as
/// higher levels resolve:
///
/// 1. province, over every province;
/// 2. district, over the districts of the province if one was found;
/// 3. with no province but a district, the province is inferred from it;
/// 4. neighbourhood, over the `(province, district)` pair, or over every
///    province's district of that name, or over everything when no
///    district was found.
///
/// Step 3 is ambiguous for district names that exist under several
/// provinces (see [`GazetteerTree::duplicate_districts_across_provinces`]):
/// it takes the first such province in ascending key order. The answer is
/// stable for a given gazetteer but does not reflect anything in the text.
///
/// The parser is immutable after construction and can be shared across
/// threads behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct StaticParser {
    tree: Arc<GazetteerTree>,
    normalizer: Normalizer,
    provinces: TokenIndex,
    districts: TokenIndex,
    neighbourhoods: TokenIndex,
}

impl StaticParser {
    pub fn new(tree: Arc<GazetteerTree>) -> Self {
        let provinces = TokenIndex::build(tree.provinces());
        let districts = TokenIndex::build(tree.all_district_names());
        let neighbourhoods = TokenIndex::build(tree.neighbourhoods_of(None, None));
        Self {
            tree,
            normalizer: Normalizer::default(),
            provinces,
            districts,
            neighbourhoods,
        }
    }

    pub fn tree(&self) -> &GazetteerTree {
        &self.tree
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Resolve whatever levels the text names. Never fails; an empty or
    /// unrecognised input yields an address with every level absent.
    pub fn parse(&self, text: &str) -> Address {
        self.trace(text).into_address()
    }

    pub fn trace(&self, text: &str) -> ParseTrace {
        let normalized = self.normalizer.normalize_static_parser(text);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        let tree = self.tree.as_ref();

        let mut province = self.provinces.best_match_any(&tokens).map(LevelMatch::found);

        let district = match &province {
            Some(p) => self
                .districts
                .best_match(&tokens, |d| tree.contains_district(&p.name, d)),
            None => self.districts.best_match_any(&tokens),
        }
        .map(LevelMatch::found);

        if province.is_none()
            && let Some(d) = &district
        {
            province = tree.province_of_district(&d.name).map(LevelMatch::inferred);
        }

        let neighbourhood = match (&province, &district) {
            (Some(p), Some(d)) => self
                .neighbourhoods
                .best_match(&tokens, |n| tree.contains_neighbourhood(&p.name, &d.name, n)),
            (None, Some(d)) => self
                .neighbourhoods
                .best_match(&tokens, |n| tree.district_name_contains(&d.name, n)),
            (_, None) => self.neighbourhoods.best_match_any(&tokens),
        }
        .map(LevelMatch::found);

        ParseTrace {
            original_text: text.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            normalized,
            matches: LevelMatches {
                province,
                district,
                neighbourhood,
            },
        }
    }

    /// Sizes of the province, district and neighbourhood indices.
    pub fn index_sizes(&self) -> (usize, usize, usize) {
        (
            self.provinces.len(),
            self.districts.len(),
            self.neighbourhoods.len(),
        )
    }
}
