// User profile views

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::{login_required, store_failure, RequestContext};
use crate::config::AppState;
use crate::forms::ProfileForm;
use crate::http;
use crate::logger;
use crate::render::{self, ListProfilesTemplate, ProfileTemplate, RegisterProfileTemplate};

pub async fn register_profile(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let user = match login_required(ctx, &state.config.auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    if !ctx.is_post() {
        let form = state
            .store
            .profile_for(user.id)
            .await
            .map_or_else(ProfileForm::default, |p| ProfileForm::from_profile(&p));
        return render::render(&RegisterProfileTemplate {
            nav: ctx.nav(&state.config.auth),
            form,
        });
    }

    let mut form: ProfileForm = http::parse_form(&ctx.body);
    if form.is_valid() {
        return match state.store.save_profile(form.to_profile(user.id)).await {
            Ok(_) => http::build_redirect_response("/"),
            Err(e) => store_failure(&e),
        };
    }

    logger::log_form_errors("ProfileForm", &form.errors);
    render::render(&RegisterProfileTemplate {
        nav: ctx.nav(&state.config.auth),
        form,
    })
}

/// Show a user's profile; its owner may also update it
pub async fn profile(ctx: &RequestContext, state: &AppState, username: &str) -> Response<Full<Bytes>> {
    let user = match login_required(ctx, &state.config.auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let Some(selected_user) = state.store.user_by_username(username).await else {
        return http::build_redirect_response("/");
    };
    let user_profile = match state.store.get_or_create_profile(selected_user.id).await {
        Ok((profile, _)) => profile,
        Err(e) => return store_failure(&e),
    };
    let is_owner = selected_user.id == user.id;

    let form = if ctx.is_post() {
        if !is_owner {
            logger::log_warning(&format!(
                "{} attempted to edit the profile of {}",
                user.username, selected_user.username
            ));
            return http::build_403_response();
        }
        let mut form: ProfileForm = http::parse_form(&ctx.body);
        if form.is_valid() {
            return match state
                .store
                .save_profile(form.to_profile(selected_user.id))
                .await
            {
                Ok(_) => http::build_redirect_response(&format!(
                    "/profile/{}/",
                    selected_user.username
                )),
                Err(e) => store_failure(&e),
            };
        }
        logger::log_form_errors("ProfileForm", &form.errors);
        form
    } else {
        ProfileForm::from_profile(&user_profile)
    };

    render::render(&ProfileTemplate {
        nav: ctx.nav(&state.config.auth),
        selected_user,
        user_profile,
        form,
        is_owner,
    })
}

pub async fn list_profiles(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    render::render(&ListProfilesTemplate {
        nav: ctx.nav(&state.config.auth),
        profiles: state.store.profiles().await,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use hyper::StatusCode;

    #[tokio::test]
    async fn test_register_profile_saves_and_redirects() {
        let state = state();
        let ctx = login(
            &state,
            post("/register_profile/", "website=leifos.com&picture=me.png"),
            "leifos",
        )
        .await;
        let user_id = ctx.user.as_ref().unwrap().id;

        let resp = register_profile(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/");

        let profile = state.store.profile_for(user_id).await.unwrap();
        assert_eq!(profile.website.as_deref(), Some("http://leifos.com"));
        assert_eq!(profile.picture.as_deref(), Some("me.png"));
    }

    #[tokio::test]
    async fn test_register_profile_rejects_bad_picture() {
        let state = state();
        let ctx = login(&state, post("/register_profile/", "picture=notes.txt"), "leifos").await;
        let user_id = ctx.user.as_ref().unwrap().id;

        let resp = register_profile(&ctx, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Upload a valid image."));
        assert!(state.store.profile_for(user_id).await.is_none());
    }

    #[tokio::test]
    async fn test_profile_unknown_user_redirects() {
        let state = state();
        let ctx = login(&state, get("/profile/ghost/"), "leifos").await;
        let resp = profile(&ctx, &state, "ghost").await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/");
    }

    #[tokio::test]
    async fn test_profile_created_on_first_view() {
        let state = state();
        let ctx = login(&state, get("/profile/leifos/"), "leifos").await;
        let user_id = ctx.user.as_ref().unwrap().id;
        assert!(state.store.profile_for(user_id).await.is_none());

        let resp = profile(&ctx, &state, "leifos").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("leifos's Profile") || html.contains("leifos&#x27;s Profile"));
        assert!(html.contains("name=\"website\""));
        assert!(state.store.profile_for(user_id).await.is_some());
    }

    #[tokio::test]
    async fn test_profile_owner_updates() {
        let state = state();
        let ctx = login(&state, post("/profile/leifos/", "website=example.org"), "leifos").await;
        let user_id = ctx.user.as_ref().unwrap().id;

        let resp = profile(&ctx, &state, "leifos").await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/profile/leifos/");
        assert_eq!(
            state.store.profile_for(user_id).await.unwrap().website.as_deref(),
            Some("http://example.org")
        );
    }

    #[tokio::test]
    async fn test_profile_invalid_update_rerenders() {
        let state = state();
        let owner = state.store.ensure_user("leifos").await.unwrap();
        let (before, _) = state.store.get_or_create_profile(owner.id).await.unwrap();
        let ctx = login(&state, post("/profile/leifos/", "picture=notes.txt"), "leifos").await;

        let resp = profile(&ctx, &state, "leifos").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Upload a valid image."));
        assert_eq!(state.store.profile_for(owner.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_profile_other_user_cannot_update() {
        let state = state();
        let owner = state.store.ensure_user("leifos").await.unwrap();
        let ctx = login(&state, post("/profile/leifos/", "website=evil.com"), "mallory").await;

        let resp = profile(&ctx, &state, "leifos").await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(state.store.profile_for(owner.id).await.unwrap().website, None);
    }

    #[tokio::test]
    async fn test_list_profiles_ordered() {
        let state = state();
        for name in ["zed", "amy"] {
            let user = state.store.ensure_user(name).await.unwrap();
            state.store.get_or_create_profile(user.id).await.unwrap();
        }
        let ctx = login(&state, get("/profiles/"), "leifos").await;
        let html = body_string(list_profiles(&ctx, &state).await).await;
        let amy = html.find(">amy<").unwrap();
        let zed = html.find(">zed<").unwrap();
        assert!(amy < zed);
    }
}
