//! Views module
//!
//! Request handlers for categories, pages and profiles, plus the
//! login-required and category-lookup guards that wrap them.

mod category;
mod index;
mod profile;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};

use crate::config::{AppState, AuthConfig};
use crate::http;
use crate::logger;
use crate::render::Nav;
use crate::routing::Route;
use crate::session::Session;
use crate::store::{Category, Store, StoreError, User};

/// Everything a view needs from the incoming request
#[derive(Debug, Default)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
    /// User asserted by the authentication proxy
    pub user: Option<User>,
    pub session: Session,
}

impl RequestContext {
    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    fn nav(&self, auth: &AuthConfig) -> Nav {
        Nav {
            user: self.user.as_ref().map(|u| u.username.clone()),
            login_url: auth.login_url.clone(),
        }
    }
}

impl Route {
    /// Routes only available to authenticated users
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::AddCategory
                | Self::AddPage { .. }
                | Self::LikeCategory { .. }
                | Self::Restricted
                | Self::RegisterProfile
                | Self::Profile { .. }
                | Self::ListProfiles
        )
    }
}

/// Require an authenticated user, redirecting to the login page otherwise
pub fn login_required<'a>(
    ctx: &'a RequestContext,
    auth: &AuthConfig,
) -> Result<&'a User, Response<Full<Bytes>>> {
    ctx.user.as_ref().ok_or_else(|| {
        let next = match &ctx.query {
            Some(q) => format!("{}?{q}", ctx.path),
            None => ctx.path.clone(),
        };
        http::build_redirect_response(&http::with_query_param(&auth.login_url, "next", &next))
    })
}

/// Look up a category by slug, redirecting to the index if it is missing
pub async fn with_category(store: &Store, slug: &str) -> Result<Category, Response<Full<Bytes>>> {
    store
        .category_by_slug(slug)
        .await
        .ok_or_else(|| http::build_redirect_response("/"))
}

/// Log a store failure and answer 500
fn store_failure(err: &StoreError) -> Response<Full<Bytes>> {
    logger::log_error(&format!("Store operation failed: {err}"));
    http::build_500_response()
}

/// Dispatch a resolved route to its view
pub async fn dispatch(route: Route, ctx: &mut RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    if route.requires_login() {
        if let Err(redirect) = login_required(ctx, &state.config.auth) {
            return redirect;
        }
    }

    match route {
        Route::Index => index::index(ctx, state).await,
        Route::About => index::about(ctx, state),
        Route::Restricted => index::restricted(ctx, state),
        Route::ShowCategory { slug } => category::show_category(ctx, state, &slug).await,
        Route::AddCategory => category::add_category(ctx, state).await,
        Route::AddPage { slug } => match with_category(&state.store, &slug).await {
            Ok(category) => category::add_page(ctx, state, category).await,
            Err(redirect) => redirect,
        },
        Route::LikeCategory { slug } => category::like_category(state, &slug).await,
        Route::Goto => category::goto(ctx, state).await,
        Route::RegisterProfile => profile::register_profile(ctx, state).await,
        Route::Profile { username } => profile::profile(ctx, state, &username).await,
        Route::ListProfiles => profile::list_profiles(ctx, state).await,
    }
}
