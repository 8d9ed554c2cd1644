//! Indicator-word rule table.
//!
//! Each indicator kind owns one anchored pattern listing every surface form
//! that collapses to its canonical token. Patterns are matched against whole
//! whitespace-separated tokens, which is what keeps proper nouns such as
//! "Mahmudiye", "Caddebostan" or "Sokullu" intact.

use std::sync::LazyLock;

use regex::Regex;

/// The three indicator families folded by full normalization.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Indicator {
    Neighbourhood,
    Avenue,
    Street,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Indicator::Neighbourhood, Indicator::Avenue, Indicator::Street];

    /// Canonical token emitted when no override is configured.
    pub fn default_token(self) -> &'static str {
        match self {
            Indicator::Neighbourhood => "mah",
            Indicator::Avenue => "cad",
            Indicator::Street => "sk",
        }
    }

    /// Surface forms, lowercase, as a regex alternation.
    fn surface_forms(self) -> &'static [&'static str] {
        match self {
            Indicator::Neighbourhood => &[
                "mahal{1,3}es{1,2}[iı]",
                "mahal{1,3}e",
                "mahal",
                "mahl",
                "mah",
                "mhl",
                "mh",
            ],
            Indicator::Avenue => &["cad{1,3}es{1,2}[iı]", "cad{1,3}e", "cadd", "cad", "cd"],
            Indicator::Street => &[
                "sokağı(?:n|nın|nda|na)?",
                "soka[ğg][aeıiuüi]",
                "soka[ğg]",
                "sok{1,2}ak",
                "sokak(?:lar[ıi]?)?",
                "sok",
                "sk",
            ],
        }
    }

    /// Bare stem that may be followed by a detached possessive suffix
    /// ("mahalle si", "cadde - si").
    fn split_stem(self) -> Option<&'static str> {
        match self {
            Indicator::Neighbourhood => Some("mahal{1,3}e"),
            Indicator::Avenue => Some("cad{1,3}e"),
            Indicator::Street => None,
        }
    }
}

struct CompiledRule {
    indicator: Indicator,
    whole: Regex,
    stem: Option<Regex>,
}

static RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    Indicator::ALL
        .into_iter()
        .map(|indicator| CompiledRule {
            indicator,
            whole: anchored(&indicator.surface_forms().join("|")),
            stem: indicator.split_stem().map(anchored),
        })
        .collect()
});

static DETACHED_SUFFIX: LazyLock<Regex> = LazyLock::new(|| anchored("s{1,2}[iı]"));

fn anchored(alternation: &str) -> Regex {
    Regex::new(&format!("^(?:{alternation})$")).expect("indicator patterns are valid")
}

fn is_joiner(token: &str) -> bool {
    matches!(token, "_" | "-")
}

/// Classify a single token.
pub fn classify(token: &str) -> Option<Indicator> {
    RULES
        .iter()
        .find(|rule| rule.whole.is_match(token))
        .map(|rule| rule.indicator)
}

/// Match an indicator starting at `tokens[start]`, returning the kind and
/// how many tokens it spans.
pub fn match_at(tokens: &[&str], start: usize) -> Option<(Indicator, usize)> {
    let first = *tokens.get(start)?;
    for rule in RULES.iter() {
        if let Some(stem) = &rule.stem
            && stem.is_match(first)
        {
            let mut next = start + 1;
            while tokens.get(next).is_some_and(|t| is_joiner(t)) {
                next += 1;
            }
            if tokens
                .get(next)
                .is_some_and(|t| DETACHED_SUFFIX.is_match(t))
            {
                return Some((rule.indicator, next + 1 - start));
            }
        }
        if rule.whole.is_match(first) {
            return Some((rule.indicator, 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_surface_forms() {
        for form in ["mahallesi", "mahallesı", "mahalesi", "mahalle", "mahal", "mahl", "mhl", "mh"] {
            assert_eq!(classify(form), Some(Indicator::Neighbourhood), "{form}");
        }
        for form in ["caddesi", "caddesı", "cadde", "cadd", "cad", "cd"] {
            assert_eq!(classify(form), Some(Indicator::Avenue), "{form}");
        }
        for form in ["sokağı", "sokağında", "sokagi", "sokağa", "sokak", "sokaklari", "sok", "sk"] {
            assert_eq!(classify(form), Some(Indicator::Street), "{form}");
        }
    }

    #[test]
    fn leaves_proper_nouns_alone() {
        for word in ["mahmudiye", "caddebostan", "sokullu", "sokrates", "mahalleci", "skala"] {
            assert_eq!(classify(word), None, "{word}");
        }
    }

    #[test]
    fn joins_detached_suffix() {
        let tokens = ["mahalle", "-", "si", "12"];
        assert_eq!(match_at(&tokens, 0), Some((Indicator::Neighbourhood, 3)));
        let tokens = ["cadde", "si"];
        assert_eq!(match_at(&tokens, 0), Some((Indicator::Avenue, 2)));
        let tokens = ["mahalle", "-", "5"];
        assert_eq!(match_at(&tokens, 0), Some((Indicator::Neighbourhood, 1)));
    }
}
