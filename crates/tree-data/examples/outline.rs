//! Loads a dataset, repairs its ids and prints the visible outline
//!
//! Usage:
//!   cargo run --example outline [path] [expanded-id...]
//!
//! If no path is provided, the bundled showcase fixture is used. Every branch
//! is expanded unless expanded ids are given.

use anyhow::{Context, Result};
use log::info;
use std::collections::HashSet;
use std::{env, fs};
use tree_data::tree::prelude::*;

const SHOWCASE: &str = include_str!("../fixtures/showcase.json");

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let json = match args.next() {
        Some(path) => {
            fs::read_to_string(&path).with_context(|| format!("Failed to read dataset {path}"))?
        }
        None => SHOWCASE.to_string(),
    };
    let mut expanded: Vec<String> = args.collect();

    let mut dataset = Dataset::from_json(&json).context("Failed to parse dataset")?;
    info!("Loaded {} nodes", dataset.node_count());

    let remap = sanitize_ids(&mut dataset, expanded.clone(), &SanitizeOptions::default());
    remap.apply(&mut expanded);
    for change in &remap {
        println!("fixed {} id {:?} -> {:?}", change.reason, change.old, change.new);
    }

    let expanded: HashSet<&str> = expanded.iter().map(String::as_str).collect();
    let visible = dataset
        .traverse_visible(|node| expanded.is_empty() || expanded.contains(node.id.as_str()));

    println!();
    for node in visible {
        let depth = dataset.depth(&node.id).unwrap_or(0);
        let marker = if node.is_branch() { "+" } else { "-" };
        println!("{:indent$}{} {} [{}]", "", marker, node.label(), node.id, indent = depth * 2);
    }

    Ok(())
}
