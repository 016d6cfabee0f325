// Category and page views

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Deserialize;

use super::{store_failure, RequestContext};
use crate::config::AppState;
use crate::forms::{CategoryForm, PageForm};
use crate::http;
use crate::logger;
use crate::render::{self, AddCategoryTemplate, AddPageTemplate, CategoryTemplate};
use crate::store::{Category, StoreError};

pub async fn show_category(
    ctx: &RequestContext,
    state: &AppState,
    slug: &str,
) -> Response<Full<Bytes>> {
    let category = state.store.category_by_slug(slug).await;
    let pages = match &category {
        Some(c) => Some(state.store.pages_in(c.id).await),
        None => None,
    };

    render::render(&CategoryTemplate {
        nav: ctx.nav(&state.config.auth),
        category,
        pages,
    })
}

pub async fn add_category(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    if !ctx.is_post() {
        return render::render(&AddCategoryTemplate {
            nav: ctx.nav(&state.config.auth),
            form: CategoryForm::default(),
        });
    }

    let mut form: CategoryForm = http::parse_form(&ctx.body);
    if form.is_valid(&state.store).await {
        match state.store.add_category(&form.name).await {
            Ok(category) => {
                logger::log_info(&format!("Category added: {}", category.slug));
                return http::build_redirect_response("/");
            }
            // Lost a race with a concurrent submission of the same name
            Err(StoreError::DuplicateCategory(_)) => {
                form.errors
                    .add("name", "Category with this Name already exists.");
            }
            Err(e) => return store_failure(&e),
        }
    }

    logger::log_form_errors("CategoryForm", &form.errors);
    render::render(&AddCategoryTemplate {
        nav: ctx.nav(&state.config.auth),
        form,
    })
}

pub async fn add_page(
    ctx: &RequestContext,
    state: &AppState,
    category: Category,
) -> Response<Full<Bytes>> {
    if !ctx.is_post() {
        return render::render(&AddPageTemplate {
            nav: ctx.nav(&state.config.auth),
            category,
            form: PageForm::default(),
        });
    }

    let mut form: PageForm = http::parse_form(&ctx.body);
    if form.is_valid() {
        return match state
            .store
            .add_page(category.id, &form.title, &form.url)
            .await
        {
            Ok(_) => http::build_redirect_response(&format!("/category/{}/", category.slug)),
            Err(e) => store_failure(&e),
        };
    }

    logger::log_form_errors("PageForm", &form.errors);
    render::render(&AddPageTemplate {
        nav: ctx.nav(&state.config.auth),
        category,
        form,
    })
}

pub async fn like_category(state: &AppState, slug: &str) -> Response<Full<Bytes>> {
    match state.store.like_category(slug).await {
        Ok(likes) => http::build_text_response(StatusCode::OK, likes.to_string()),
        Err(StoreError::SlugNotFound(_)) => http::build_404_response(),
        Err(e) => store_failure(&e),
    }
}

#[derive(Debug, Default, Deserialize)]
struct GotoQuery {
    page_id: Option<String>,
}

/// Count a click-through and send the client on to the page
pub async fn goto(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let query: GotoQuery = http::parse_query(ctx.query.as_deref());
    let Some(page_id) = query.page_id.and_then(|id| id.trim().parse::<u64>().ok()) else {
        return http::build_redirect_response("/");
    };

    match state.store.record_page_view(page_id).await {
        Ok(page) => http::build_redirect_response(&page.url),
        Err(StoreError::PageNotFound(_)) => http::build_redirect_response("/"),
        Err(e) => store_failure(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_show_category_with_pages() {
        let state = state();
        let python = state.store.add_category("Python").await.unwrap();
        state
            .store
            .add_page(python.id, "Official Tutorial", "http://docs.python.org/3/tutorial/")
            .await
            .unwrap();

        let ctx = get("/category/python/");
        let resp = show_category(&ctx, &state, "python").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("Official Tutorial"));
        // Anonymous visitors get no like button
        assert!(!html.contains("Like</button>"));
    }

    #[tokio::test]
    async fn test_show_unknown_category() {
        let state = state();
        let resp = show_category(&get("/category/nope/"), &state, "nope").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp)
            .await
            .contains("The specified category does not exist."));
    }

    #[tokio::test]
    async fn test_add_category_redirects_to_index() {
        let state = state();
        let ctx = login(&state, post("/add_category/", "name=Other+Frameworks"), "leifos").await;
        let resp = add_category(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/");
        assert!(state
            .store
            .category_by_slug("other-frameworks")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_add_category_rejects_duplicate() {
        let state = state();
        state.store.add_category("Python").await.unwrap();
        let ctx = login(&state, post("/add_category/", "name=python"), "leifos").await;
        let resp = add_category(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp)
            .await
            .contains("Category with this Name already exists."));
        assert_eq!(state.store.top_categories(10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_category_get_renders_form() {
        let state = state();
        let ctx = login(&state, get("/add_category/"), "leifos").await;
        let html = body_string(add_category(&ctx, &state).await).await;
        assert!(html.contains("name=\"name\""));
    }

    #[tokio::test]
    async fn test_add_page_normalizes_url() {
        let state = state();
        let python = state.store.add_category("Python").await.unwrap();
        let ctx = login(
            &state,
            post("/category/python/add_page/", "title=Docs&url=docs.python.org"),
            "leifos",
        )
        .await;

        let resp = add_page(&ctx, &state, python.clone()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/category/python/");

        let pages = state.store.pages_in(python.id).await;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "http://docs.python.org");
        assert_eq!(pages[0].views, 0);
    }

    #[tokio::test]
    async fn test_add_page_invalid_keeps_input() {
        let state = state();
        let python = state.store.add_category("Python").await.unwrap();
        let ctx = login(
            &state,
            post("/category/python/add_page/", "title=&url=not+a+url"),
            "leifos",
        )
        .await;

        let resp = add_page(&ctx, &state, python.clone()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("This field is required."));
        assert!(html.contains("Add a Page to Python"));
        assert!(state.store.pages_in(python.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_like_category() {
        let state = state();
        state.store.add_category("Python").await.unwrap();
        state.store.like_category("python").await.unwrap();

        let resp = like_category(&state, "python").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "2");

        let resp = like_category(&state, "missing").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_goto_counts_view() {
        let state = state();
        let python = state.store.add_category("Python").await.unwrap();
        let page = state
            .store
            .add_page(python.id, "Docs", "http://docs.python.org")
            .await
            .unwrap();

        let mut ctx = get("/goto/");
        ctx.query = Some(format!("page_id={}", page.id));
        let resp = goto(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "http://docs.python.org");
        assert_eq!(state.store.pages_in(python.id).await[0].views, 1);
    }

    #[tokio::test]
    async fn test_goto_without_page_redirects_home() {
        let state = state();
        for query in [None, Some("page_id=abc"), Some("page_id=999")] {
            let mut ctx = get("/goto/");
            ctx.query = query.map(str::to_string);
            let resp = goto(&ctx, &state).await;
            assert_eq!(resp.status(), StatusCode::FOUND);
            assert_eq!(location(&resp), "/");
        }
    }
}
