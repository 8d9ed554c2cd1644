//! Idempotent normalization of Turkish address text.
//!
//! Three modes share one pipeline and differ only in which stages run:
//!
//! | stage                               | `normalize` | `normalize_static_parser` | `normalize_punctuation_only` |
//! |-------------------------------------|:-----------:|:-------------------------:|:----------------------------:|
//! | NFKC                                | x           | x                         | x                            |
//! | drop `.` `,`, isolate other punct.  | x           | x                         | x                            |
//! | Turkish lowercase (`I`→`ı`, `İ`→`i`)| x           | x                         |                              |
//! | split letter/digit boundaries       | x           | x                         | x                            |
//! | indicator folding (`mah/cad/sk`)    | x           |                           |                              |
//! | extra user rules                    | x           |                           |                              |
//! | ASCII folding (`ı ö ü ğ ş ç`)       |             | x                         |                              |
//!
//! Every mode ends with whitespace collapse, and every mode is idempotent:
//! running it on its own output changes nothing.
//!
//! # Example
//! ```rust
//! use adres_normalize::Normalizer;
//!
//! let n = Normalizer::default();
//! assert_eq!(n.normalize("Atatürk Mahallesi 123. Sok No:5"), "atatürk mah 123 sk no : 5");
//! assert_eq!(n.normalize_static_parser("Kadıköy / İSTANBUL"), "kadikoy / istanbul");
//! ```

pub mod rules;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

pub use rules::Indicator;

/// Bumped whenever a change here alters the canonical form of any input.
/// Persisted caches keyed on normalized names embed it.
pub const RULES_VERSION: &str = "v2";

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{P}").expect("punctuation class is valid"));

/// Which pipeline to run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NormalizeMode {
    Full,
    Static,
    PunctuationOnly,
}

impl NormalizeMode {
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "full" => Some(NormalizeMode::Full),
            "static" | "static_parser" | "key" => Some(NormalizeMode::Static),
            "punctuation" | "punctuation_only" => Some(NormalizeMode::PunctuationOnly),
            _ => None,
        }
    }
}

/// Address normalizer with configurable canonical tokens and extra rules.
#[derive(Clone, Debug)]
pub struct Normalizer {
    canon_neighbourhood: String,
    canon_avenue: String,
    canon_street: String,
    extra_rules: Vec<(Regex, String)>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            canon_neighbourhood: Indicator::Neighbourhood.default_token().to_string(),
            canon_avenue: Indicator::Avenue.default_token().to_string(),
            canon_street: Indicator::Street.default_token().to_string(),
            extra_rules: Vec::new(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tokens indicator words collapse to.
    pub fn with_canonical_tokens(
        mut self,
        neighbourhood: impl Into<String>,
        avenue: impl Into<String>,
        street: impl Into<String>,
    ) -> Self {
        self.canon_neighbourhood = neighbourhood.into();
        self.canon_avenue = avenue.into();
        self.canon_street = street.into();
        self
    }

    /// Append a rule applied after indicator folding, in insertion order.
    pub fn with_extra_rule(mut self, pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        self.extra_rules
            .push((Regex::new(pattern)?, replacement.to_string()));
        Ok(self)
    }

    /// Append extra rules read from a `pattern<TAB>replacement` file.
    pub fn with_rules_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.extra_rules.extend(load_rules(path.as_ref())?);
        Ok(self)
    }

    pub fn extra_rule_count(&self) -> usize {
        self.extra_rules.len()
    }

    pub fn canonical_token(&self, indicator: Indicator) -> &str {
        match indicator {
            Indicator::Neighbourhood => &self.canon_neighbourhood,
            Indicator::Avenue => &self.canon_avenue,
            Indicator::Street => &self.canon_street,
        }
    }

    /// Full pipeline: canonical lowercase text with indicator words folded.
    pub fn normalize(&self, text: &str) -> String {
        let s = isolate_punctuation(&pre_normalize(text));
        let s = split_digits(&tr_lowercase(&s));
        let mut s = self.fold_indicators(&s);
        for (pattern, replacement) in &self.extra_rules {
            s = pattern.replace_all(&s, replacement.as_str()).into_owned();
        }
        collapse_whitespace(&s)
    }

    /// Canonical-key pipeline shared by gazetteer keys and parser tokens.
    ///
    /// No indicator folding; Turkish letters are folded to ASCII so that
    /// diacritic variance never causes a lookup miss.
    pub fn normalize_static_parser(&self, text: &str) -> String {
        let s = isolate_punctuation(&pre_normalize(text));
        let s = split_digits(&tr_lowercase(&s));
        collapse_whitespace(&fold_turkish(&s))
    }

    /// Keeps casing and spelling; only punctuation and digit boundaries change.
    pub fn normalize_punctuation_only(&self, text: &str) -> String {
        let s = isolate_punctuation(&pre_normalize(text));
        collapse_whitespace(&split_digits(&s))
    }

    pub fn normalize_with(&self, mode: NormalizeMode, text: &str) -> String {
        match mode {
            NormalizeMode::Full => self.normalize(text),
            NormalizeMode::Static => self.normalize_static_parser(text),
            NormalizeMode::PunctuationOnly => self.normalize_punctuation_only(text),
        }
    }

    /// `normalize(normalize(x)) == normalize(x)` for this input.
    pub fn is_idempotent(&self, text: &str) -> bool {
        let once = self.normalize(text);
        self.normalize(&once) == once
    }

    fn fold_indicators(&self, text: &str) -> String {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut out: Vec<&str> = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            match rules::match_at(&tokens, i) {
                Some((indicator, span)) => {
                    out.push(self.canonical_token(indicator));
                    i += span;
                }
                None => {
                    out.push(tokens[i]);
                    i += 1;
                }
            }
        }
        out.join(" ")
    }
}

/// NFKC plus whitespace collapse.
pub fn pre_normalize(text: &str) -> String {
    let composed: String = text.nfkc().collect();
    collapse_whitespace(&composed)
}

/// Drop `.` and `,`; surround every other punctuation character with spaces.
pub fn isolate_punctuation(text: &str) -> String {
    let spaced = PUNCTUATION.replace_all(text, |caps: &regex::Captures<'_>| match &caps[0] {
        "." | "," => " ".to_string(),
        other => format!(" {other} "),
    });
    collapse_whitespace(&spaced)
}

/// Lowercase with Turkish dotted/dotless `i` handling.
pub fn tr_lowercase(text: &str) -> String {
    text.replace('İ', "i").replace('I', "ı").to_lowercase()
}

/// Turkish letters used to decide where a letter/digit boundary lies.
fn is_tr_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || "ÇĞİÖŞÜçğıöşü".contains(c)
}

/// Insert a space at every letter→digit and digit→letter transition.
pub fn split_digits(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(p) = prev
            && ((is_tr_alpha(p) && c.is_numeric()) || (p.is_numeric() && is_tr_alpha(c)))
        {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    collapse_whitespace(&out)
}

/// Fold Turkish-specific lowercase letters to plain ASCII.
pub fn fold_turkish(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ı' => 'i',
            'ö' => 'o',
            'ü' => 'u',
            'ğ' => 'g',
            'ş' => 's',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn load_rules(path: &Path) -> Result<Vec<(Regex, String)>> {
    let file = File::open(path).with_context(|| format!("open rules file {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut rules = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line =
            line.with_context(|| format!("read line {} in {}", lineno + 1, path.display()))?;
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('#') {
            continue;
        }
        let (pattern, replacement) = trimmed.split_once('\t').with_context(|| {
            format!("{}:{} expected pattern<TAB>replacement", path.display(), lineno + 1)
        })?;
        let regex = Regex::new(pattern)
            .with_context(|| format!("{}:{} invalid pattern", path.display(), lineno + 1))?;
        rules.push((regex, replacement.to_string()));
    }
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolates_and_drops_punctuation() {
        assert_eq!(isolate_punctuation("No:49/13"), "No : 49 / 13");
        assert_eq!(isolate_punctuation("1445.sokak"), "1445 sokak");
        assert_eq!(isolate_punctuation("Aydın, Didim"), "Aydın Didim");
        assert_eq!(isolate_punctuation("Turgutreis-bodrum"), "Turgutreis - bodrum");
    }

    #[test]
    fn splits_letter_digit_boundaries() {
        assert_eq!(split_digits("izmir2"), "izmir 2");
        assert_eq!(split_digits("3atatürk"), "3 atatürk");
        assert_eq!(split_digits("4mustafa5"), "4 mustafa 5");
        assert_eq!(split_digits("B3Blok"), "B 3 Blok");
    }

    #[test]
    fn turkish_lowercase_keeps_dots_straight() {
        assert_eq!(tr_lowercase("IŞIK İNCİRLİ"), "ışık incirli");
        assert_eq!(fold_turkish("ışık çağlayan göçük"), "isik caglayan gocuk");
    }

    #[test]
    fn extra_rules_run_after_indicators() {
        let n = Normalizer::default()
            .with_extra_rule(r"\bapt\b", "apartmani")
            .unwrap();
        assert_eq!(n.normalize("Yeni Apt. Mahallesi"), "yeni apartmani mah");
        assert_eq!(n.extra_rule_count(), 1);
    }

    #[test]
    fn custom_canonical_tokens() {
        let n = Normalizer::default().with_canonical_tokens("mahalle", "cadde", "sokak");
        assert_eq!(n.normalize("Gazi Mh. 5 Sk."), "gazi mahalle 5 sokak");
        assert!(n.is_idempotent("Gazi Mh. 5 Sk."));
    }

    #[test]
    fn mode_names() {
        assert_eq!(NormalizeMode::from_name("FULL"), Some(NormalizeMode::Full));
        assert_eq!(NormalizeMode::from_name("punctuation"), Some(NormalizeMode::PunctuationOnly));
        assert_eq!(NormalizeMode::from_name("fuzzy"), None);
    }
}
