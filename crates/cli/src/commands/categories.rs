use panier_core::catalog::Catalog;

pub fn run() -> String {
    let list = Catalog::seed().categories();

    let mut lines = vec![format!("{} categories:", list.categories.len())];
    for category in &list.categories {
        lines.push(format!("- {category}"));
    }

    lines.join("\n")
}
