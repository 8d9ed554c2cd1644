use std::env;
use std::path::PathBuf;

use adres_gazetteer::{GazetteerTree, LoadOptions};
use anyhow::{Context, Result};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let table = args.next().map(PathBuf::from).context(
        "usage: cargo run -p adres-gazetteer --example stats -- <table.csv|table.tsv> [province]",
    )?;
    let province = args.next();

    let (tree, origin) = GazetteerTree::load_with(&table, &LoadOptions::default())
        .with_context(|| format!("loading gazetteer from {}", table.display()))?;

    let stats = tree.stats();
    println!("Table        : {}", table.display());
    println!("Loaded from  : {origin:?}");
    println!("Provinces    : {}", stats.provinces);
    println!("Districts    : {}", stats.districts);
    println!("Neighbourhoods: {}", stats.neighbourhoods);

    let dups = tree.duplicate_districts_across_provinces();
    println!("District names shared across provinces: {}", dups.len());
    for (district, provinces) in dups.iter().take(10) {
        println!("  {district}: {}", provinces.join(", "));
    }

    if let Some(province) = province {
        println!(
            "\n{province}: {} districts, {} neighbourhoods",
            tree.district_count(&province),
            tree.neighbourhood_count(&province)
        );
        print!("{}", tree.render_tree(Some(&province)));
    }

    Ok(())
}
