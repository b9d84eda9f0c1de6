use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Account role carried in every credential.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Regular storefront customer
    #[default]
    User,
    /// Store administrator (catalog, orders, users)
    Admin,
    Sysadmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Sysadmin];
}
