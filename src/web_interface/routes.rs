use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;
use warp::filters::body::BodyDeserializeError;
use warp::filters::cors::CorsForbidden;
use warp::http::StatusCode;
use warp::reject::{MethodNotAllowed, UnsupportedMediaType};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use super::token_issuer::TokenIssuer;
use super::types::{
    envelope_reply, failure, refusal, success, BatchDeleteRequest, ListParams,
    LoginRequest, StatusRequest,
};
use super::user_directory::UserDirectory;
use crate::api_client::envelope::Envelope;
use crate::error_handling::types::DirectoryError;
use crate::models::{NewUser, UserUpdate};

fn with_directory(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Arc<UserDirectory>,), Error = Infallible> + Clone {
    warp::any().map(move || directory.clone())
}

fn with_issuer(
    issuer: TokenIssuer,
) -> impl Filter<Extract = (TokenIssuer,), Error = Infallible> + Clone {
    warp::any().map(move || issuer.clone())
}

fn authorization() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
}

/// Every `/api` route, with rejections turned into envelopes.
pub fn api_routes(
    directory: Arc<UserDirectory>,
    issuer: TokenIssuer,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]);

    let users = list_users_route(directory.clone())
        .or(user_stats_route(directory.clone()))
        .unify()
        .or(get_user_route(directory.clone()))
        .unify()
        .or(create_user_route(directory.clone()))
        .unify()
        .or(update_user_route(directory.clone()))
        .unify()
        .or(delete_user_route(directory.clone()))
        .unify()
        .or(set_status_route(directory.clone()))
        .unify()
        .or(reset_password_route(directory.clone()))
        .unify()
        .or(batch_delete_route(directory.clone()))
        .unify();

    let auth = login_route(directory.clone(), issuer.clone())
        .or(refresh_token_route(issuer.clone()))
        .unify()
        .or(user_info_route(directory, issuer))
        .unify();

    warp::path("api")
        .and(users.or(auth).unify())
        .with(warp::log("yunmeng::mock"))
        .with(cors)
        .recover(handle_rejection)
}

/// GET /api/users
pub fn list_users_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_directory(directory))
        .and_then(|query: HashMap<String, String>, directory: Arc<UserDirectory>| async move {
            let params = ListParams::from_query(&query);
            let page = directory.list(&params);
            Ok::<_, Rejection>(success("OK", page))
        })
}

/// GET /api/users/stats
pub fn user_stats_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / "stats")
        .and(warp::get())
        .and(with_directory(directory))
        .and_then(|directory: Arc<UserDirectory>| async move {
            Ok::<_, Rejection>(success("User statistics", directory.stats()))
        })
}

/// GET /api/users/:id
pub fn get_user_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / u64)
        .and(warp::get())
        .and(with_directory(directory))
        .and_then(|id: u64, directory: Arc<UserDirectory>| async move {
            let res = match directory.get(id) {
                Ok(user) => success("User details", user),
                Err(e) => refusal(&e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// POST /api/users
pub fn create_user_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users")
        .and(warp::post())
        .and(warp::body::json::<NewUser>())
        .and(with_directory(directory))
        .and_then(|new_user: NewUser, directory: Arc<UserDirectory>| async move {
            let res = match directory.create(new_user) {
                Ok(user) => envelope_reply(
                    StatusCode::CREATED,
                    &Envelope::new(201, "User created", Some(user)),
                ),
                Err(e) => {
                    debug!("User creation refused: {}", e);
                    refusal(&e)
                }
            };
            Ok::<_, Rejection>(res)
        })
}

/// PUT /api/users/:id
pub fn update_user_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / u64)
        .and(warp::put())
        .and(warp::body::json::<UserUpdate>())
        .and(with_directory(directory))
        .and_then(
            |id: u64, update: UserUpdate, directory: Arc<UserDirectory>| async move {
                let res = match directory.update(id, update) {
                    Ok(user) => success("User updated", user),
                    Err(e) => refusal(&e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// DELETE /api/users/:id
pub fn delete_user_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / u64)
        .and(warp::delete())
        .and(with_directory(directory))
        .and_then(|id: u64, directory: Arc<UserDirectory>| async move {
            let res = match directory.delete(id) {
                Ok(()) => envelope_reply(
                    StatusCode::OK,
                    &Envelope::<Value>::new(200, "User deleted", None),
                ),
                Err(e) => refusal(&e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// PATCH /api/users/:id/status
pub fn set_status_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / u64 / "status")
        .and(warp::patch())
        .and(warp::body::json::<StatusRequest>())
        .and(with_directory(directory))
        .and_then(
            |id: u64, request: StatusRequest, directory: Arc<UserDirectory>| async move {
                let res = match directory.set_status(id, request.status.as_deref()) {
                    Ok(change) => success("User status updated", change),
                    Err(e) => refusal(&e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// POST /api/users/:id/reset-password
pub fn reset_password_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / u64 / "reset-password")
        .and(warp::post())
        .and(with_directory(directory))
        .and_then(|id: u64, directory: Arc<UserDirectory>| async move {
            let res = match directory.reset_password(id) {
                Ok(reset) => success("Password reset, new password sent by email", reset),
                Err(e) => refusal(&e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// POST /api/users/batch-delete
pub fn batch_delete_route(
    directory: Arc<UserDirectory>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / "batch-delete")
        .and(warp::post())
        .and(warp::body::json::<BatchDeleteRequest>())
        .and(with_directory(directory))
        .and_then(
            |request: BatchDeleteRequest, directory: Arc<UserDirectory>| async move {
                let res = match directory.batch_delete(request.user_ids.as_ref()) {
                    Ok(result) => success("Users deleted", result),
                    Err(e) => refusal(&e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// POST /api/login
///
/// Refusals are reported in the envelope `code` under HTTP 200.
pub fn login_route(
    directory: Arc<UserDirectory>,
    issuer: TokenIssuer,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("login")
        .and(warp::post())
        .and(warp::body::json::<LoginRequest>())
        .and(with_directory(directory))
        .and(with_issuer(issuer))
        .and_then(
            |request: LoginRequest, directory: Arc<UserDirectory>, issuer: TokenIssuer| async move {
                let res = match directory.login(&request) {
                    Ok(user) => {
                        info!("User {} logged in as {}", user.username, user.role);
                        let token = issuer.issue(&user);
                        envelope_reply(
                            StatusCode::OK,
                            &Envelope::ok("Login successful", user).with_token(token),
                        )
                    }
                    Err(e) => {
                        warn!("Login refused for {:?}: {}", request.username, e);
                        envelope_reply(
                            StatusCode::OK,
                            &Envelope::<Value>::failure(i64::from(e.status()), e.to_string()),
                        )
                    }
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// POST /api/refresh-token
pub fn refresh_token_route(
    issuer: TokenIssuer,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("refresh-token")
        .and(warp::post())
        .and(authorization())
        .and(with_issuer(issuer))
        .and_then(|header: Option<String>, issuer: TokenIssuer| async move {
            let res = match issuer.verify(header.as_deref()) {
                Ok(claims) => {
                    debug!("Refreshing token for {:?}", claims.username);
                    let envelope = Envelope::<Value>::new(200, "Token refreshed", None)
                        .with_token(issuer.reissue(&claims));
                    envelope_reply(StatusCode::OK, &envelope)
                }
                Err(e) => refusal(&e),
            };
            Ok::<_, Rejection>(res)
        })
}

/// GET /api/auth/user-info
pub fn user_info_route(
    directory: Arc<UserDirectory>,
    issuer: TokenIssuer,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("auth" / "user-info")
        .and(warp::get())
        .and(authorization())
        .and(with_directory(directory))
        .and(with_issuer(issuer))
        .and_then(
            |header: Option<String>, directory: Arc<UserDirectory>, issuer: TokenIssuer| async move {
                let user = issuer.verify(header.as_deref()).and_then(|claims| {
                    let id = claims.sub.as_ref().and_then(Value::as_u64);
                    id.and_then(|id| directory.get(id).ok()).ok_or_else(|| {
                        DirectoryError::Unauthorized("User no longer exists".to_string())
                    })
                });
                let res = match user {
                    Ok(user) => success("User info", user),
                    Err(e) => refusal(&e),
                };
                Ok::<_, Rejection>(res)
            },
        )
}

/// Turns warp rejections into the same envelope every handler replies with.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Route not found".to_string())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Malformed JSON body: {}", e))
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected an application/json body".to_string(),
        )
    } else if let Some(e) = err.find::<CorsForbidden>() {
        (StatusCode::FORBIDDEN, e.to_string())
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };
    Ok(failure(status, message))
}
