//! Data store module
//!
//! Holds categories, pages, users and profiles behind a single lock and
//! writes a TOML snapshot after every mutation when a data file is set.

mod models;
mod persist;

pub use models::{is_valid_username, slugify, Category, Page, User, UserProfile};
use persist::{Snapshot, SnapshotFile};

use std::cmp::Reverse;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Errors raised by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("category '{0}' already exists")]
    DuplicateCategory(String),
    #[error("category {0} does not exist")]
    CategoryNotFound(u64),
    #[error("no category with slug '{0}'")]
    SlugNotFound(String),
    #[error("page {0} does not exist")]
    PageNotFound(u64),
    #[error("user {0} does not exist")]
    UserNotFound(u64),
    #[error("failed to serialize data snapshot: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to parse data snapshot: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("data snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Wrapper for `Arc<Store>`
pub type SharedStore = Arc<Store>;

/// Store for all persistent entities
pub struct Store {
    data: RwLock<Snapshot>,
    file: SnapshotFile,
    // Serializes snapshot writes so the newest state lands last
    writer: Mutex<()>,
}

impl Store {
    /// Open the store, loading the snapshot at `data_file` if present.
    /// An unreadable or corrupt data file is an error.
    pub fn open(data_file: Option<&str>) -> Result<Self, StoreError> {
        let file = SnapshotFile::new(data_file);
        Ok(Self {
            data: RwLock::new(file.load()?),
            file,
            writer: Mutex::new(()),
        })
    }

    /// Memory-only store
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(Snapshot::default()),
            file: SnapshotFile::new(None),
            writer: Mutex::new(()),
        }
    }

    async fn save(&self) -> Result<(), StoreError> {
        if self.file.path().is_none() {
            return Ok(());
        }
        let _writer = self.writer.lock().await;
        let snapshot = self.data.read().await.clone();
        self.file.save(&snapshot).await
    }

    // ---- categories ----

    /// Categories ordered by likes, most liked first
    pub async fn top_categories(&self, limit: usize) -> Vec<Category> {
        let data = self.data.read().await;
        let mut categories = data.categories.clone();
        categories.sort_by_key(|c| (Reverse(c.likes), c.id));
        categories.truncate(limit);
        categories
    }

    pub async fn category_by_slug(&self, slug: &str) -> Option<Category> {
        let data = self.data.read().await;
        data.categories.iter().find(|c| c.slug == slug).cloned()
    }

    /// Whether a category with this name or slug exists
    pub async fn category_exists(&self, name: &str, slug: &str) -> bool {
        let data = self.data.read().await;
        data.categories
            .iter()
            .any(|c| c.slug == slug || c.name.eq_ignore_ascii_case(name))
    }

    pub async fn add_category(&self, name: &str) -> Result<Category, StoreError> {
        let category = {
            let mut data = self.data.write().await;
            let slug = slugify(name);
            if data
                .categories
                .iter()
                .any(|c| c.slug == slug || c.name.eq_ignore_ascii_case(name))
            {
                return Err(StoreError::DuplicateCategory(name.to_string()));
            }
            let category = Category {
                id: data.next_id(),
                name: name.to_string(),
                slug,
                likes: 0,
            };
            data.categories.push(category.clone());
            category
        };
        self.save().await?;
        Ok(category)
    }

    /// Increment a category's likes, returning the new count
    pub async fn like_category(&self, slug: &str) -> Result<u32, StoreError> {
        let likes = {
            let mut data = self.data.write().await;
            let category = data
                .categories
                .iter_mut()
                .find(|c| c.slug == slug)
                .ok_or_else(|| StoreError::SlugNotFound(slug.to_string()))?;
            category.likes = category.likes.saturating_add(1);
            category.likes
        };
        self.save().await?;
        Ok(likes)
    }

    // ---- pages ----

    /// Pages ordered by views, most viewed first
    pub async fn top_pages(&self, limit: usize) -> Vec<Page> {
        let data = self.data.read().await;
        let mut pages = data.pages.clone();
        pages.sort_by_key(|p| (Reverse(p.views), p.id));
        pages.truncate(limit);
        pages
    }

    pub async fn pages_in(&self, category_id: u64) -> Vec<Page> {
        let data = self.data.read().await;
        data.pages
            .iter()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect()
    }

    pub async fn add_page(
        &self,
        category_id: u64,
        title: &str,
        url: &str,
    ) -> Result<Page, StoreError> {
        let page = {
            let mut data = self.data.write().await;
            if !data.categories.iter().any(|c| c.id == category_id) {
                return Err(StoreError::CategoryNotFound(category_id));
            }
            let page = Page {
                id: data.next_id(),
                category_id,
                title: title.to_string(),
                url: url.to_string(),
                views: 0,
            };
            data.pages.push(page.clone());
            page
        };
        self.save().await?;
        Ok(page)
    }

    /// Count a click-through on a page
    pub async fn record_page_view(&self, page_id: u64) -> Result<Page, StoreError> {
        let page = {
            let mut data = self.data.write().await;
            let page = data
                .pages
                .iter_mut()
                .find(|p| p.id == page_id)
                .ok_or(StoreError::PageNotFound(page_id))?;
            page.views = page.views.saturating_add(1);
            page.clone()
        };
        self.save().await?;
        Ok(page)
    }

    // ---- users and profiles ----

    pub async fn user_by_username(&self, username: &str) -> Option<User> {
        let data = self.data.read().await;
        data.users.iter().find(|u| u.username == username).cloned()
    }

    /// Fetch a user, recording it first if the store has not seen it
    pub async fn ensure_user(&self, username: &str) -> Result<User, StoreError> {
        if let Some(user) = self.user_by_username(username).await {
            return Ok(user);
        }
        let user = {
            let mut data = self.data.write().await;
            // Another request may have recorded it between the two locks
            if let Some(user) = data.users.iter().find(|u| u.username == username) {
                return Ok(user.clone());
            }
            let user = User {
                id: data.next_id(),
                username: username.to_string(),
            };
            data.users.push(user.clone());
            user
        };
        self.save().await?;
        Ok(user)
    }

    pub async fn profile_for(&self, user_id: u64) -> Option<UserProfile> {
        let data = self.data.read().await;
        data.profiles.iter().find(|p| p.user_id == user_id).cloned()
    }

    /// Fetch a user's profile, creating an empty one if absent
    ///
    /// The flag is true when the profile was created by this call.
    pub async fn get_or_create_profile(
        &self,
        user_id: u64,
    ) -> Result<(UserProfile, bool), StoreError> {
        let profile = {
            let mut data = self.data.write().await;
            if !data.users.iter().any(|u| u.id == user_id) {
                return Err(StoreError::UserNotFound(user_id));
            }
            if let Some(profile) = data.profiles.iter().find(|p| p.user_id == user_id) {
                return Ok((profile.clone(), false));
            }
            let profile = UserProfile::empty(user_id);
            data.profiles.push(profile.clone());
            profile
        };
        self.save().await?;
        Ok((profile, true))
    }

    /// Insert or replace the profile of `profile.user_id`
    pub async fn save_profile(&self, profile: UserProfile) -> Result<UserProfile, StoreError> {
        {
            let mut data = self.data.write().await;
            if !data.users.iter().any(|u| u.id == profile.user_id) {
                return Err(StoreError::UserNotFound(profile.user_id));
            }
            match data
                .profiles
                .iter_mut()
                .find(|p| p.user_id == profile.user_id)
            {
                Some(existing) => *existing = profile.clone(),
                None => data.profiles.push(profile.clone()),
            }
        }
        self.save().await?;
        Ok(profile)
    }

    /// All profiles paired with their users, ordered by username
    pub async fn profiles(&self) -> Vec<(User, UserProfile)> {
        let data = self.data.read().await;
        let mut listed: Vec<(User, UserProfile)> = data
            .profiles
            .iter()
            .filter_map(|profile| {
                data.users
                    .iter()
                    .find(|u| u.id == profile.user_id)
                    .map(|user| (user.clone(), profile.clone()))
            })
            .collect();
        listed.sort_by(|a, b| a.0.username.cmp(&b.0.username));
        listed
    }
}
