use panier_core::catalog::Catalog;

pub fn run(query: &str) -> String {
    let catalog = Catalog::seed();
    let results = catalog.search(query);

    if results.count == 0 {
        return format!("no products match `{query}`");
    }

    let mut lines = vec![format!("{} product(s) match `{query}`:", results.count)];
    for product in &results.products {
        lines.push(format!(
            "- {} {} ({}) {} per {}, {} in stock",
            product.id, product.name, product.category, product.price, product.unit, product.stock
        ));
    }

    lines.join("\n")
}
