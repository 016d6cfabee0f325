// Category form

use serde::Deserialize;

use super::{check_max_len, FormErrors, REQUIRED};
use crate::store::{slugify, Store};

pub const CATEGORY_NAME_MAX_LEN: usize = 128;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(skip)]
    pub errors: FormErrors,
}

impl CategoryForm {
    /// Validate the submission, including name and slug uniqueness
    pub async fn is_valid(&mut self, store: &Store) -> bool {
        self.name = self.name.trim().to_string();

        if self.name.is_empty() {
            self.errors.add("name", REQUIRED);
            return false;
        }
        check_max_len(&mut self.errors, "name", &self.name, CATEGORY_NAME_MAX_LEN);

        let slug = slugify(&self.name);
        if slug.is_empty() {
            self.errors
                .add("name", "Enter a name containing letters or numbers.");
        } else if store.category_exists(&self.name, &slug).await {
            self.errors
                .add("name", "Category with this Name already exists.");
        }

        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str) -> CategoryForm {
        CategoryForm {
            name: name.to_string(),
            ..CategoryForm::default()
        }
    }

    #[tokio::test]
    async fn test_valid_name_trimmed() {
        let store = Store::in_memory();
        let mut form = form("  Python  ");
        assert!(form.is_valid(&store).await);
        assert_eq!(form.name, "Python");
    }

    #[tokio::test]
    async fn test_blank_name_required() {
        let store = Store::in_memory();
        let mut form = form("   ");
        assert!(!form.is_valid(&store).await);
        assert_eq!(form.errors.for_field("name"), [REQUIRED.to_string()]);
    }

    #[tokio::test]
    async fn test_name_too_long() {
        let store = Store::in_memory();
        let mut form = form(&"a".repeat(CATEGORY_NAME_MAX_LEN + 1));
        assert!(!form.is_valid(&store).await);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let store = Store::in_memory();
        store.add_category("Other Frameworks").await.unwrap();
        let mut form = form("other_frameworks");
        assert!(!form.is_valid(&store).await);
        assert_eq!(
            form.errors.for_field("name"),
            ["Category with this Name already exists.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unsluggable_name() {
        let store = Store::in_memory();
        let mut form = form("!!!");
        assert!(!form.is_valid(&store).await);
    }
}
