//! Text helpers for identifiers and display strings.

/// `fungal_leaf_spot` -> `Fungal Leaf Spot`
pub fn title_case(identifier: &str) -> String {
    identifier
        .split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase identifier with runs of non-alphanumerics collapsed to `_`.
///
/// `shepherd's crook` -> `shepherd_s_crook`, `water-soaked` -> `water_soaked`
pub fn slugify(phrase: &str) -> String {
    let mut slug = String::with_capacity(phrase.len());
    let mut pending_sep = false;
    for c in phrase.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// `0.853` -> `85%`
pub fn percent(value: f64) -> String {
    format!("{:.0}%", (value * 100.0).clamp(0.0, 100.0))
}
