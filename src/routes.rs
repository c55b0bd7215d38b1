//! The routes module contains all the tide routes and the logic to fulfill the responses for each
//! route.
//!
//! Modules are nested for cleaner organization here
use log::*;
use tide::{Request, StatusCode};

use crate::error::VoteError;
use crate::AppState;

/**
 * Convert a store or validation failure into a response error
 *
 * Storage failures are logged and replaced with `failure`, so driver details
 * never reach the client.
 */
fn reject(err: VoteError, failure: &'static str) -> tide::Error {
    match err {
        VoteError::Storage(cause) => {
            error!("{}: {:?}", failure, cause);
            tide::Error::from_str(StatusCode::InternalServerError, failure)
        }
        other => tide::Error::from_str(other.status(), other.to_string()),
    }
}

/**
 *  GET /healthz
 */
pub async fn healthz(_req: Request<AppState>) -> tide::Result<String> {
    Ok("ok".to_string())
}

pub mod trips {
    use tide::{Body, Request};

    use crate::AppState;

    /**
     *  GET /trip-options
     */
    pub async fn list(req: Request<AppState>) -> tide::Result<Body> {
        Body::from_json(&req.state().trips.options())
    }
}

pub mod votes {
    use log::*;
    use tide::{Body, Request, Response, StatusCode};

    use super::reject;
    use crate::api_models::Ballot;
    use crate::AppState;

    /**
     *  POST /votes
     */
    pub async fn create(mut req: Request<AppState>) -> tide::Result<Response> {
        let ballot: Ballot = req.body_json().await.map_err(|err| {
            debug!("Unreadable ballot: {:?}", err);
            tide::Error::from_str(StatusCode::BadRequest, "Malformed vote submission")
        })?;

        let new_vote = ballot
            .validate(&req.state().trips)
            .map_err(|err| reject(err.into(), "Failed to submit vote"))?;
        debug!("Ballot received: {:?}", new_vote);

        let vote = req
            .state()
            .store
            .submit(new_vote)
            .await
            .map_err(|err| reject(err, "Failed to submit vote"))?;
        info!("Vote recorded for {:?}", vote.name);

        Ok(Response::builder(StatusCode::Created)
            .body(Body::from_json(&vote)?)
            .build())
    }

    /**
     *  GET /votes
     */
    pub async fn list(req: Request<AppState>) -> tide::Result<Body> {
        let votes = req
            .state()
            .store
            .list_all()
            .await
            .map_err(|err| reject(err, "Failed to fetch votes"))?;
        Body::from_json(&votes)
    }
}

pub mod results {
    use tide::{Body, Request};

    use super::reject;
    use crate::tally::compute_results;
    use crate::AppState;

    /**
     *  GET /results
     */
    pub async fn get(req: Request<AppState>) -> tide::Result<Body> {
        let votes = req
            .state()
            .store
            .list_all()
            .await
            .map_err(|err| reject(err, "Failed to calculate results"))?;
        let results = compute_results(votes, req.state().trips.options());
        Body::from_json(&results)
    }
}

pub mod admin {
    use log::*;
    use tide::{Body, Middleware, Next, Request, StatusCode};

    use super::reject;
    use crate::api_models::ClearedVotes;
    use crate::AppState;

    pub const PASSWORD_HEADER: &str = "X-Admin-Password";

    /**
     * Middleware guarding the administrative routes with a shared password
     */
    #[derive(Clone, Debug)]
    pub struct AdminGuard {
        password: String,
    }

    impl AdminGuard {
        pub fn new(password: impl Into<String>) -> Self {
            Self {
                password: password.into(),
            }
        }
    }

    #[tide::utils::async_trait]
    impl<State: Clone + Send + Sync + 'static> Middleware<State> for AdminGuard {
        async fn handle(&self, req: Request<State>, next: Next<'_, State>) -> tide::Result {
            let matches = req
                .header(PASSWORD_HEADER)
                .map(|values| values.last().as_str() == self.password);

            match matches {
                Some(true) => Ok(next.run(req).await),
                Some(false) => {
                    warn!("Rejected admin request to {} with a wrong password", req.url().path());
                    Err(tide::Error::from_str(
                        StatusCode::Forbidden,
                        "Invalid admin password",
                    ))
                }
                None => Err(tide::Error::from_str(
                    StatusCode::Unauthorized,
                    "Admin password required",
                )),
            }
        }
    }

    /**
     *  DELETE /admin/clear-votes
     */
    pub async fn clear_votes(req: Request<AppState>) -> tide::Result<Body> {
        let deleted = req
            .state()
            .store
            .clear_all()
            .await
            .map_err(|err| reject(err, "Failed to clear votes"))?;
        info!("Admin cleared {} votes", deleted);
        Body::from_json(&ClearedVotes { deleted })
    }
}
