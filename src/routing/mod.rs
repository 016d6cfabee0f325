//! Routing module
//!
//! Maps request method and path to a [`Route`], with trailing-slash
//! redirects and 404/405 resolution.

mod matcher;

pub use matcher::match_path;

use hyper::Method;

/// Application routes with their path parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    About,
    ShowCategory { slug: String },
    AddCategory,
    AddPage { slug: String },
    LikeCategory { slug: String },
    Goto,
    Restricted,
    RegisterProfile,
    Profile { username: String },
    ListProfiles,
}

/// Methods a route answers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Allowed {
    Get,
    GetPost,
    Post,
}

impl Allowed {
    fn permits(self, method: &Method) -> bool {
        let is_get = *method == Method::GET || *method == Method::HEAD;
        let is_post = *method == Method::POST;
        match self {
            Self::Get => is_get,
            Self::GetPost => is_get || is_post,
            Self::Post => is_post,
        }
    }

    const fn header_value(self) -> &'static str {
        match self {
            Self::Get => "GET, HEAD",
            Self::GetPost => "GET, HEAD, POST",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RouteName {
    Index,
    About,
    ShowCategory,
    AddCategory,
    AddPage,
    LikeCategory,
    Goto,
    Restricted,
    RegisterProfile,
    Profile,
    ListProfiles,
}

const ROUTES: &[(&str, Allowed, RouteName)] = &[
    ("/", Allowed::Get, RouteName::Index),
    ("/about/", Allowed::Get, RouteName::About),
    ("/category/<slug:category>/", Allowed::Get, RouteName::ShowCategory),
    ("/add_category/", Allowed::GetPost, RouteName::AddCategory),
    ("/category/<slug:category>/add_page/", Allowed::GetPost, RouteName::AddPage),
    ("/category/<slug:category>/like/", Allowed::Post, RouteName::LikeCategory),
    ("/goto/", Allowed::Get, RouteName::Goto),
    ("/restricted/", Allowed::Get, RouteName::Restricted),
    ("/register_profile/", Allowed::GetPost, RouteName::RegisterProfile),
    ("/profile/<username>/", Allowed::GetPost, RouteName::Profile),
    ("/profiles/", Allowed::Get, RouteName::ListProfiles),
];

/// Outcome of route resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched(Route),
    /// Path exists but not for this method; carries the `Allow` value
    MethodNotAllowed(&'static str),
    /// Path only matches with a trailing slash appended
    AppendSlash(String),
    NotFound,
}

fn build_route(name: RouteName, mut params: Vec<String>) -> Route {
    let mut param = || params.pop().unwrap_or_default();
    match name {
        RouteName::Index => Route::Index,
        RouteName::About => Route::About,
        RouteName::ShowCategory => Route::ShowCategory { slug: param() },
        RouteName::AddCategory => Route::AddCategory,
        RouteName::AddPage => Route::AddPage { slug: param() },
        RouteName::LikeCategory => Route::LikeCategory { slug: param() },
        RouteName::Goto => Route::Goto,
        RouteName::Restricted => Route::Restricted,
        RouteName::RegisterProfile => Route::RegisterProfile,
        RouteName::Profile => Route::Profile { username: param() },
        RouteName::ListProfiles => Route::ListProfiles,
    }
}

fn find(path: &str) -> Option<(Allowed, RouteName, Vec<String>)> {
    ROUTES.iter().find_map(|(pattern, allowed, name)| {
        match_path(pattern, path).map(|params| (*allowed, *name, params))
    })
}

/// Resolve a request to a route
pub fn resolve(method: &Method, path: &str) -> Resolution {
    if let Some((allowed, name, params)) = find(path) {
        if !allowed.permits(method) {
            return Resolution::MethodNotAllowed(allowed.header_value());
        }
        return Resolution::Matched(build_route(name, params));
    }

    if !path.ends_with('/') {
        let slashed = format!("{path}/");
        if find(&slashed).is_some() {
            return Resolution::AppendSlash(slashed);
        }
    }

    Resolution::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_static_routes() {
        assert_eq!(
            resolve(&Method::GET, "/"),
            Resolution::Matched(Route::Index)
        );
        assert_eq!(
            resolve(&Method::HEAD, "/about/"),
            Resolution::Matched(Route::About)
        );
        assert_eq!(
            resolve(&Method::POST, "/add_category/"),
            Resolution::Matched(Route::AddCategory)
        );
    }

    #[test]
    fn test_resolve_params() {
        assert_eq!(
            resolve(&Method::GET, "/category/python/"),
            Resolution::Matched(Route::ShowCategory {
                slug: "python".to_string()
            })
        );
        assert_eq!(
            resolve(&Method::POST, "/category/python/add_page/"),
            Resolution::Matched(Route::AddPage {
                slug: "python".to_string()
            })
        );
        assert_eq!(
            resolve(&Method::GET, "/profile/leifos/"),
            Resolution::Matched(Route::Profile {
                username: "leifos".to_string()
            })
        );
    }

    #[test]
    fn test_resolve_method_not_allowed() {
        assert_eq!(
            resolve(&Method::POST, "/about/"),
            Resolution::MethodNotAllowed("GET, HEAD")
        );
        assert_eq!(
            resolve(&Method::GET, "/category/python/like/"),
            Resolution::MethodNotAllowed("POST")
        );
        assert_eq!(
            resolve(&Method::DELETE, "/profile/bob/"),
            Resolution::MethodNotAllowed("GET, HEAD, POST")
        );
    }

    #[test]
    fn test_resolve_append_slash() {
        assert_eq!(
            resolve(&Method::GET, "/about"),
            Resolution::AppendSlash("/about/".to_string())
        );
        assert_eq!(
            resolve(&Method::GET, "/category/python/add_page"),
            Resolution::AppendSlash("/category/python/add_page/".to_string())
        );
    }

    #[test]
    fn test_resolve_not_found() {
        assert_eq!(resolve(&Method::GET, "/nope/"), Resolution::NotFound);
        assert_eq!(resolve(&Method::GET, "/nope"), Resolution::NotFound);
        assert_eq!(
            resolve(&Method::GET, "/category/bad slug/"),
            Resolution::NotFound
        );
    }
}
