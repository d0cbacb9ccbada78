use sqlx::{QueryBuilder, Sqlite};

use super::schema::{Edge, Id};

/// Narrowing applied to the recipe list. Every field is optional; an empty filter matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Vec<String>,
    pub author: Option<Id>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

/// `1`/`true` and `0`/`false`; anything else is not a flag.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

impl RecipeFilter {
    /// Appends ` AND ...` conditions on the alias `r`. Edge flags apply only with a `viewer`.
    pub fn push_conditions<'a>(&'a self, builder: &mut QueryBuilder<'a, Sqlite>, viewer: Option<Id>) {
        if !self.tags.is_empty() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug IN (",
            );
            let mut slugs = builder.separated(", ");
            for slug in &self.tags {
                slugs.push_bind(slug.as_str());
            }
            slugs.push_unseparated("))");
        }

        if let Some(author) = self.author {
            builder.push(" AND r.author_id = ").push_bind(author);
        }

        let Some(viewer) = viewer else {
            return;
        };

        for (flag, edge) in [
            (self.is_favorited, Edge::Favorite),
            (self.is_in_shopping_cart, Edge::ShoppingCart),
        ] {
            let operator = match flag {
                Some(true) => "IN",
                Some(false) => "NOT IN",
                None => continue,
            };

            builder
                .push(format!(
                    " AND r.id {operator} (SELECT recipe_id FROM {} WHERE user_id = ",
                    edge.table()
                ))
                .push_bind(viewer)
                .push(")");
        }
    }
}
