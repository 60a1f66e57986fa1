use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account registered with the hosted auth service.
///
/// The gateway never stores users itself; this is the identity attached to
/// an access token.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}
