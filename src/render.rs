//! Template rendering
//!
//! One askama context struct per page under `templates/`.

use askama::Template;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::forms::{CategoryForm, PageForm, ProfileForm};
use crate::http;
use crate::logger;
use crate::store::{Category, Page, User, UserProfile};

/// Navigation state shared by every page
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub user: Option<String>,
    pub login_url: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub boldmessage: &'static str,
    pub categories: Vec<Category>,
    pub pages: Vec<Page>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
    pub visits: u32,
}

#[derive(Template)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub nav: Nav,
    pub category: Option<Category>,
    pub pages: Option<Vec<Page>>,
}

#[derive(Template)]
#[template(path = "add_category.html")]
pub struct AddCategoryTemplate {
    pub nav: Nav,
    pub form: CategoryForm,
}

#[derive(Template)]
#[template(path = "add_page.html")]
pub struct AddPageTemplate {
    pub nav: Nav,
    pub category: Category,
    pub form: PageForm,
}

#[derive(Template)]
#[template(path = "restricted.html")]
pub struct RestrictedTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "profile_registration.html")]
pub struct RegisterProfileTemplate {
    pub nav: Nav,
    pub form: ProfileForm,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub selected_user: User,
    pub user_profile: UserProfile,
    pub form: ProfileForm,
    /// Only the owner sees the edit form
    pub is_owner: bool,
}

#[derive(Template)]
#[template(path = "list_profiles.html")]
pub struct ListProfilesTemplate {
    pub nav: Nav,
    pub profiles: Vec<(User, UserProfile)>,
}

/// Render a template into a 200 response, or a 500 if rendering fails
pub fn render<T: Template>(template: &T) -> Response<Full<Bytes>> {
    match template.render() {
        Ok(html) => http::build_html_response(StatusCode::OK, html),
        Err(e) => {
            logger::log_error(&format!("Failed to render template: {e}"));
            http::build_500_response()
        }
    }
}
