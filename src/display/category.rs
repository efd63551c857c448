//! Category display formatting

use crate::models::Category;

/// Format categories as a table, in the order given
pub fn format_category_list(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nRun 'expense category add <name>' to create one.\n"
            .to_string();
    }

    let name_width = categories
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<8}  {}\n",
        "Name",
        "ID",
        "Created",
        name_width = name_width
    ));
    output.push_str(&"-".repeat(name_width + 24));
    output.push('\n');

    for category in categories {
        output.push_str(&format!(
            "{:<name_width$}  {:<8}  {}\n",
            category.name,
            category.id.short(),
            category.created_at.format("%Y-%m-%d"),
            name_width = name_width
        ));
    }

    output
}
