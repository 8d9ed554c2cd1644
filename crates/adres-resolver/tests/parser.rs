use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use adres_gazetteer::{GazetteerTree, LoadOptions};
use adres_normalize::Normalizer;
use adres_resolver::StaticParser;
use adres_types::{Address, GazetteerRow};

fn fixture_parser() -> StaticParser {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("gazetteer.csv");
    let opts = LoadOptions {
        use_cache: false,
        ..LoadOptions::default()
    };
    let (tree, _) = GazetteerTree::load_with(path, &opts).expect("load fixture gazetteer");
    StaticParser::new(Arc::new(tree))
}

fn parser_from(rows: &[(&str, &str, &str)]) -> StaticParser {
    let tree = GazetteerTree::build(
        rows.iter()
            .filter_map(|(p, d, n)| GazetteerRow::new(p, d, n)),
    );
    StaticParser::new(Arc::new(tree))
}

fn levels(address: &Address) -> (Option<&str>, Option<&str>, Option<&str>) {
    (
        address.province.as_deref(),
        address.district.as_deref(),
        address.neighbourhood.as_deref(),
    )
}

#[test]
fn resolves_all_three_levels() {
    let parser = fixture_parser();
    let text = "Caferağa Mah., Kadıköy / İstanbul No:12 D:5";
    let address = parser.parse(text);
    assert_eq!(
        levels(&address),
        (Some("istanbul"), Some("kadikoy"), Some("caferaga"))
    );
    assert_eq!(address.original_text, text);
}

#[test]
fn infers_province_from_unique_district() {
    let parser = fixture_parser();
    let address = parser.parse("Etlik mh. Keçiören no:10");
    assert_eq!(
        levels(&address),
        (Some("ankara"), Some("kecioren"), Some("etlik"))
    );

    let parser = parser_from(&[
        ("ANKARA", "ETLİK", "AŞAĞI EĞLENCE MAH"),
        ("ANKARA", "ÇANKAYA", "KIZILAY MAH"),
        ("İZMİR", "KONAK", "ALSANCAK MAH"),
    ]);
    let address = parser.parse("Aşağı Eğlence, Etlik 06010");
    assert_eq!(
        levels(&address),
        (Some("ankara"), Some("etlik"), Some("asagi eglence"))
    );
}

#[test]
fn empty_and_unknown_text_resolve_nothing() {
    let parser = fixture_parser();
    let address = parser.parse("");
    assert!(address.is_unresolved());
    assert_eq!(address.original_text, "");

    for text in ["   ", ".,;:", "Bilinmeyen Sokak No 5", "12345"] {
        let address = parser.parse(text);
        assert!(address.is_unresolved(), "{text:?} -> {address:?}");
        assert_eq!(address.original_text, text);
    }
}

#[test]
fn longest_neighbourhood_name_wins() {
    let parser = parser_from(&[
        ("İZMİR", "KARŞIYAKA", "BOSTANLI"),
        ("İZMİR", "KARŞIYAKA", "BOSTANLI MERKEZ"),
    ]);
    let address = parser.parse("Bostanlı Merkez 1771 Sk. Karşıyaka İzmir");
    assert_eq!(address.neighbourhood.as_deref(), Some("bostanli merkez"));

    let address = parser.parse("Bostanlı 1771 Sk. Karşıyaka İzmir");
    assert_eq!(address.neighbourhood.as_deref(), Some("bostanli"));
}

#[test]
fn district_is_restricted_to_resolved_province() {
    let parser = parser_from(&[
        ("İZMİR", "KONAK", "ALSANCAK MAH"),
        ("İSTANBUL", "KADIKÖY", "CAFERAĞA MAH"),
    ]);
    let address = parser.parse("Konak İstanbul");
    assert_eq!(levels(&address), (Some("istanbul"), None, None));
}

#[test]
fn neighbourhood_is_restricted_to_resolved_district() {
    let parser = fixture_parser();
    // Acıbadem is in Kadıköy, not Beşiktaş.
    let address = parser.parse("Acıbadem Beşiktaş İstanbul");
    assert_eq!(levels(&address), (Some("istanbul"), Some("besiktas"), None));
}

#[test]
fn neighbourhood_alone_is_matched_nationwide() {
    let parser = fixture_parser();
    let address = parser.parse("alsancak");
    assert_eq!(levels(&address), (None, None, Some("alsancak")));
}

#[test]
fn shared_district_name_takes_first_province() {
    let parser = fixture_parser();
    assert_eq!(
        parser.tree().duplicate_districts_across_provinces()["yenisehir"],
        vec!["bursa".to_string(), "mersin".to_string()]
    );

    // Without a province the first province by key is taken, and the
    // neighbourhood is then looked up under that pair only.
    let address = parser.parse("Barbaros Mah. Yenişehir");
    assert_eq!(levels(&address), (Some("bursa"), Some("yenisehir"), None));
    let address = parser.parse("Kayapa Mah. Yenişehir");
    assert_eq!(levels(&address), (Some("bursa"), Some("yenisehir"), Some("kayapa")));

    let address = parser.parse("Barbaros Mah. Yenişehir Mersin");
    assert_eq!(levels(&address), (Some("mersin"), Some("yenisehir"), Some("barbaros")));
}

#[test]
fn parser_keys_align_with_gazetteer_keys() {
    let parser = fixture_parser();
    let normalizer = Normalizer::default();
    for province in parser.tree().provinces() {
        assert_eq!(normalizer.normalize_static_parser(province), province);
    }
    for raw in ["İSTANBUL", "istanbul", "Istanbul"] {
        let key = normalizer.normalize_static_parser(raw);
        assert!(!parser.tree().districts_of(&key).is_empty(), "{raw} -> {key}");
    }
    for raw in ["KADIKÖY", "Kadıköy", "kadikoy"] {
        assert_eq!(parser.parse(raw).district.as_deref(), Some("kadikoy"));
    }
}

#[test]
fn spans_point_at_matched_tokens() {
    let parser = fixture_parser();
    let trace = parser.trace("Turgutreis Mah, Bodrum-Muğla");
    assert_eq!(trace.tokens, vec!["turgutreis", "mah", "bodrum", "-", "mugla"]);
    let span = |m: &Option<adres_resolver::LevelMatch>| m.as_ref().and_then(|m| m.span);
    assert_eq!(span(&trace.matches.province).map(|s| (s.start, s.end)), Some((4, 5)));
    assert_eq!(span(&trace.matches.district).map(|s| (s.start, s.end)), Some((2, 3)));
    assert_eq!(span(&trace.matches.neighbourhood).map(|s| (s.start, s.end)), Some((0, 1)));
}

#[test]
fn concurrent_parses_share_one_parser() {
    let parser = Arc::new(fixture_parser());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let parser = Arc::clone(&parser);
            thread::spawn(move || parser.parse("Kızılay Çankaya Ankara"))
        })
        .collect();
    for handle in handles {
        let address = handle.join().expect("parse thread");
        assert_eq!(
            levels(&address),
            (Some("ankara"), Some("cankaya"), Some("kizilay"))
        );
    }
}
