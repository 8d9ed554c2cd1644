use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use adres_gazetteer::{GazetteerTree, LoadOptions};
use adres_resolver::StaticParser;
use anyhow::{Context, Result};

/// Resolve addresses given as arguments, or one per line on stdin.
fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let table = args.next().map(PathBuf::from).context(
        "usage: cargo run -p adres-resolver --example parse -- <gazetteer.csv> [address ...]",
    )?;
    let (tree, _) = GazetteerTree::load_with(&table, &LoadOptions::default())
        .with_context(|| format!("loading gazetteer from {}", table.display()))?;
    let parser = StaticParser::new(Arc::new(tree));

    let inputs: Vec<String> = args.collect();
    if inputs.is_empty() {
        for line in io::stdin().lock().lines() {
            print_trace(&parser, &line?)?;
        }
    } else {
        for text in &inputs {
            print_trace(&parser, text)?;
        }
    }
    Ok(())
}

fn print_trace(parser: &StaticParser, text: &str) -> Result<()> {
    let trace = parser.trace(text);
    println!("{}", serde_json::to_string(&trace)?);
    Ok(())
}
