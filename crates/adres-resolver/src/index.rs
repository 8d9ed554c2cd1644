use std::collections::HashMap;

/// One indexed name split into its tokens.
#[derive(Debug, Clone)]
struct Candidate {
    tokens: Vec<String>,
    name: String,
}

/// Names keyed by their first token, for longest-match scanning over a
/// token sequence. Names must already be in canonical form.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    by_first: HashMap<String, Vec<Candidate>>,
    names: usize,
}

/// A name found in a token sequence at `tokens[start..end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch<'a> {
    pub name: &'a str,
    pub start: usize,
    pub end: usize,
}

impl TokenMatch<'_> {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl TokenIndex {
    pub fn build<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_first: HashMap<String, Vec<Candidate>> = HashMap::new();
        let mut count = 0usize;
        for name in names {
            let name = name.as_ref();
            let tokens: Vec<String> = name.split_whitespace().map(str::to_string).collect();
            let Some(first) = tokens.first().cloned() else {
                continue;
            };
            let bucket = by_first.entry(first).or_default();
            if bucket.iter().any(|c| c.name == name) {
                continue;
            }
            bucket.push(Candidate {
                tokens,
                name: name.to_string(),
            });
            count += 1;
        }
        for bucket in by_first.values_mut() {
            bucket.sort_by(|a, b| {
                b.tokens
                    .len()
                    .cmp(&a.tokens.len())
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        Self {
            by_first,
            names: count,
        }
    }

    pub fn len(&self) -> usize {
        self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names == 0
    }

    /// Best exact contiguous match of any allowed name within `tokens`.
    ///
    /// Ranking is by token length, longest first, then by earliest start.
    /// `allowed` filters candidate names before they are compared.
    pub fn best_match<S, F>(&self, tokens: &[S], allowed: F) -> Option<TokenMatch<'_>>
    where
        S: AsRef<str>,
        F: Fn(&str) -> bool,
    {
        let mut best: Option<TokenMatch<'_>> = None;
        for (start, first) in tokens.iter().enumerate() {
            let Some(bucket) = self.by_first.get(first.as_ref()) else {
                continue;
            };
            // Buckets are longest-first, so the first hit is the best at `start`.
            let hit = bucket.iter().find(|c| {
                let end = start + c.tokens.len();
                end <= tokens.len()
                    && c
                        .tokens
                        .iter()
                        .zip(&tokens[start..end])
                        .all(|(want, got)| want == got.as_ref())
                    && allowed(c.name.as_str())
            });
            if let Some(c) = hit
                && best.is_none_or(|b| c.tokens.len() > b.len())
            {
                best = Some(TokenMatch {
                    name: &c.name,
                    start,
                    end: start + c.tokens.len(),
                });
            }
        }
        best
    }

    /// [`best_match`](Self::best_match) with no restriction.
    pub fn best_match_any<S: AsRef<str>>(&self, tokens: &[S]) -> Option<TokenMatch<'_>> {
        self.best_match(tokens, |_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn prefers_longer_name_at_same_start() {
        let index = TokenIndex::build(["bostanli", "bostanli mah", "karsiyaka"]);
        let m = index
            .best_match_any(&toks("izmir karsiyaka bostanli mah 1771 sk"))
            .unwrap();
        assert_eq!(m.name, "bostanli mah");
        assert_eq!((m.start, m.end), (2, 4));
    }

    #[test]
    fn prefers_longer_name_over_earlier_one() {
        let index = TokenIndex::build(["yeni", "yeni mahalle"]);
        let m = index.best_match_any(&toks("yeni sk yeni mahalle")).unwrap();
        assert_eq!(m.name, "yeni mahalle");
        assert_eq!(m.start, 2);
    }

    #[test]
    fn equal_length_ties_go_to_earliest() {
        let index = TokenIndex::build(["konak", "buca"]);
        let m = index.best_match_any(&toks("buca konak")).unwrap();
        assert_eq!(m.name, "buca");
        assert_eq!(m.start, 0);
    }

    #[test]
    fn match_must_be_contiguous() {
        let index = TokenIndex::build(["ali riza"]);
        assert!(index.best_match_any(&toks("ali veli riza")).is_none());
        assert!(index.best_match_any(&toks("ali")).is_none());
    }

    #[test]
    fn restriction_filters_candidates() {
        let index = TokenIndex::build(["merkez", "merkez efendi"]);
        let tokens = toks("merkez efendi");
        let m = index.best_match(&tokens, |name| name == "merkez").unwrap();
        assert_eq!(m.name, "merkez");
        assert_eq!(m.len(), 1);
        assert!(index.best_match(&tokens, |_| false).is_none());
    }

    #[test]
    fn skips_blank_and_duplicate_names() {
        let index = TokenIndex::build(["", "  ", "konak", "konak"]);
        assert_eq!(index.len(), 1);
        assert!(TokenIndex::default().is_empty());
        assert!(index.best_match_any::<&str>(&[]).is_none());
    }
}
