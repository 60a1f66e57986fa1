use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::user;

use super::{into_reply, Client, Error};

const TOKEN: &str = "/auth/v1/token";
const SIGNUP: &str = "/auth/v1/signup";
const LOGOUT: &str = "/auth/v1/logout";
const USER: &str = "/auth/v1/user";

/// Authenticated session issued by the hosted auth service.
#[derive(Clone, Debug)]
pub struct Session {
    pub access_token: String,
    pub user: user::User,
}

impl Client {
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, Error> {
        let remote = self.remote().ok_or(Error::Unconfigured)?;
        let session = into_reply(
            remote
                .request(Method::POST, TOKEN)
                .query(&[("grant_type", "password")])
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?,
        )
        .await?
        .json::<WireSession>()
        .await?;
        Ok(session.into())
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Session, Error> {
        let remote = self.remote().ok_or(Error::Unconfigured)?;
        let session = into_reply(
            remote
                .request(Method::POST, SIGNUP)
                .json(&json!({
                    "email": email,
                    "password": password,
                    "data": { "full_name": full_name },
                }))
                .send()
                .await?,
        )
        .await?
        .json::<WireSession>()
        .await?;
        Ok(session.into())
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), Error> {
        let remote = self.remote().ok_or(Error::Unconfigured)?;
        into_reply(
            remote
                .request_as(Method::POST, LOGOUT, token)
                .send()
                .await?,
        )
        .await
        .map(drop)
    }

    /// Account behind the given access token. Degrades to `None` when the
    /// token is rejected or the store is unreachable.
    pub async fn get_current_user(&self, token: &str) -> Option<user::User> {
        let remote = self.remote()?;
        let lookup = async {
            Ok::<_, Error>(
                into_reply(
                    remote.request_as(Method::GET, USER, token).send().await?,
                )
                .await?
                .json::<WireUser>()
                .await?,
            )
        };
        match lookup.await {
            Ok(user) => Some(user.into()),
            Err(e) => {
                tracing::warn!("failed to fetch current user: {e}");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    user: WireUser,
}

impl From<WireSession> for Session {
    fn from(session: WireSession) -> Self {
        Self {
            access_token: session.access_token,
            user: session.user.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: user::Id,
    email: String,
    #[serde(default)]
    user_metadata: WireUserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WireUserMetadata {
    full_name: Option<String>,
}

impl From<WireUser> for user::User {
    fn from(user: WireUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.user_metadata.full_name,
        }
    }
}
