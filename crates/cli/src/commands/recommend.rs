use panier_core::catalog::Catalog;
use panier_core::storefront::Storefront;

/// Recommendations against a fresh storefront: category neighbours when a
/// reference product is given, the popular list otherwise.
pub fn run(product_id: Option<&str>) -> String {
    let storefront = Storefront::new(Catalog::seed());
    let result = storefront.recommendations(product_id, None);

    if result.recommendations.is_empty() {
        return match product_id {
            Some(id) => format!("no recommendations for `{id}`"),
            None => "no recommendations available".to_string(),
        };
    }

    let mut lines = vec![format!("{} recommendation(s):", result.recommendations.len())];
    for rec in &result.recommendations {
        lines.push(format!("- {} {} ({}) {} [{}]", rec.id, rec.name, rec.category, rec.price, rec.reason));
    }

    lines.join("\n")
}
