// Page form

use serde::Deserialize;

use super::{check_max_len, is_valid_url, normalize_url, FormErrors, INVALID_URL, REQUIRED};

pub const PAGE_TITLE_MAX_LEN: usize = 128;
pub const PAGE_URL_MAX_LEN: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(skip)]
    pub errors: FormErrors,
}

impl PageForm {
    pub fn is_valid(&mut self) -> bool {
        self.title = self.title.trim().to_string();
        self.url = normalize_url(&self.url);

        if self.title.is_empty() {
            self.errors.add("title", REQUIRED);
        } else {
            check_max_len(&mut self.errors, "title", &self.title, PAGE_TITLE_MAX_LEN);
        }

        if self.url.is_empty() {
            self.errors.add("url", REQUIRED);
        } else {
            check_max_len(&mut self.errors, "url", &self.url, PAGE_URL_MAX_LEN);
            if !is_valid_url(&self.url) {
                self.errors.add("url", INVALID_URL);
            }
        }

        self.errors.is_empty()
    }
}
