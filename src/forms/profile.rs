// User profile form

use serde::Deserialize;

use super::{check_max_len, is_valid_url, normalize_url, FormErrors, INVALID_URL};
use crate::store::UserProfile;

pub const WEBSITE_MAX_LEN: usize = 200;
pub const PICTURE_MAX_LEN: usize = 255;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// Both fields are optional; blank means absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub picture: String,
    #[serde(skip)]
    pub errors: FormErrors,
}

impl ProfileForm {
    /// Form prefilled from a stored profile
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            website: profile.website.clone().unwrap_or_default(),
            picture: profile.picture.clone().unwrap_or_default(),
            errors: FormErrors::default(),
        }
    }

    pub fn is_valid(&mut self) -> bool {
        self.website = normalize_url(&self.website);
        self.picture = self.picture.trim().to_string();

        if !self.website.is_empty() {
            check_max_len(&mut self.errors, "website", &self.website, WEBSITE_MAX_LEN);
            if !is_valid_url(&self.website) {
                self.errors.add("website", INVALID_URL);
            }
        }

        if !self.picture.is_empty() {
            check_max_len(&mut self.errors, "picture", &self.picture, PICTURE_MAX_LEN);
            if !has_image_extension(&self.picture) {
                self.errors.add(
                    "picture",
                    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
                );
            }
        }

        self.errors.is_empty()
    }

    /// Apply the cleaned fields to a user's profile
    pub fn to_profile(&self, user_id: u64) -> UserProfile {
        UserProfile {
            user_id,
            website: non_empty(&self.website),
            picture: non_empty(&self.picture),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn has_image_extension(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
