use std::env;

use anyhow::{Context, Result, bail};
use adres_normalize::{NormalizeMode, Normalizer};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let first = args.next().context(
        "usage: cargo run -p adres-normalize --example normalize -- [--rules <file>] (--demo | <text>)",
    )?;

    let mut normalizer = Normalizer::default();
    let target = if first == "--rules" {
        let path = args.next().context("--rules needs a file path")?;
        normalizer = normalizer
            .with_rules_file(&path)
            .with_context(|| format!("loading rules from {path}"))?;
        args.next()
            .context("missing text after --rules <file>")?
    } else {
        first
    };
    if args.next().is_some() {
        bail!("too many arguments");
    }

    let inputs: Vec<String> = if target == "--demo" {
        vec![
            "Atatürk MAHALLESİ: 10 sk. / cd. 5 sokagi-3".into(),
            "Caferağa Mah., Kadıköy / İstanbul No:12 D:5".into(),
            "Etlik mh keçiören ankara no:10".into(),
        ]
    } else {
        vec![target]
    };

    for text in inputs {
        println!("\nInput: {text}");
        for mode in [
            NormalizeMode::Full,
            NormalizeMode::Static,
            NormalizeMode::PunctuationOnly,
        ] {
            println!("  {:<16} {}", format!("{mode:?}"), normalizer.normalize_with(mode, &text));
        }
    }

    Ok(())
}
