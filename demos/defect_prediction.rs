//! Grow a cost-sensitive tree on the `LOC_SDP` defect dataset and print its rules.
use std::env;
use std::error::Error;
use wattle::{cost_matrix, Criterion, Frame, TreeConfig};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let criterion = match args.get(1) {
        Some(c) => c.parse::<Criterion>()?,
        None => Criterion::Cost,
    };

    let data = Frame::from_csv_path("resources/LOC_SDP.csv")?;

    // Missing a defect costs five times a false alarm.
    let mut config = TreeConfig::cost_sensitive("Defective", "1", cost_matrix(1., 0., 1., 5.));
    config.criterion = criterion;
    config.prune = true;

    let tree = config.build_tree(&data)?;
    println!("{} nodes, {} leaves, depth {}", tree.num_nodes(), tree.num_leaves(), tree.depth());
    for rule in tree.rules() {
        let leaf = &tree.nodes[&rule.leaf];
        let label = leaf.label(true, config.cost_matrix.as_ref(), config.positive_class.as_deref())?;
        println!("{} => {}", rule, label.unwrap_or_else(|| "?".to_string()));
    }
    Ok(())
}
