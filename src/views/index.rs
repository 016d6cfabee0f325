// Index, about and restricted pages

use chrono::Utc;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::RequestContext;
use crate::config::AppState;
use crate::render::{self, AboutTemplate, IndexTemplate, RestrictedTemplate};
use crate::session::record_visit;

const TOP_LIMIT: usize = 5;
const BOLD_MESSAGE: &str = "Crunchy, creamy, cookie, candy, cupcake!";

pub async fn index(ctx: &mut RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    record_visit(
        &mut ctx.session,
        Utc::now(),
        state.config.session.visit_interval(),
    );

    let template = IndexTemplate {
        nav: ctx.nav(&state.config.auth),
        boldmessage: BOLD_MESSAGE,
        categories: state.store.top_categories(TOP_LIMIT).await,
        pages: state.store.top_pages(TOP_LIMIT).await,
    };
    render::render(&template)
}

pub fn about(ctx: &mut RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let visits = record_visit(
        &mut ctx.session,
        Utc::now(),
        state.config.session.visit_interval(),
    );

    render::render(&AboutTemplate {
        nav: ctx.nav(&state.config.auth),
        visits,
    })
}

pub fn restricted(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    render::render(&RestrictedTemplate {
        nav: ctx.nav(&state.config.auth),
    })
}
