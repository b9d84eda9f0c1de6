use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::{
    app_error::{AppError, AppResult},
    entities::role::Role,
};

/// Immutable set of roles allowed past a route guard.
///
/// Nested lists flatten on construction, so a guard only ever holds one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct RoleSet(u8);

const fn bit(role: Role) -> u8 {
    1 << role as u8
}

impl RoleSet {
    pub const fn empty() -> Self {
        RoleSet(0)
    }

    pub fn of(roles: impl IntoIterator<Item = Role>) -> Self {
        roles.into_iter().collect()
    }

    pub const fn with(self, role: Role) -> Self {
        RoleSet(self.0 | bit(role))
    }

    pub const fn union(self, other: RoleSet) -> Self {
        RoleSet(self.0 | other.0)
    }

    pub const fn contains(&self, role: Role) -> bool {
        self.0 & bit(role) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|role| self.contains(*role))
    }

    /// Passes members through; anyone else gets a 403 naming their role.
    pub fn check(&self, role: Role) -> AppResult<()> {
        if self.contains(role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{role} is not authorized to perform this action"
            )))
        }
    }
}

impl From<Role> for RoleSet {
    fn from(role: Role) -> Self {
        RoleSet::empty().with(role)
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        RoleSet::of(roles)
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(RoleSet::empty(), RoleSet::with)
    }
}

impl FromIterator<RoleSet> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleSet>>(iter: I) -> Self {
        iter.into_iter().fold(RoleSet::empty(), RoleSet::union)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role `{0}` in role list")]
pub struct InvalidRoleList(pub String);

impl FromStr for RoleSet {
    type Err = InvalidRoleList;

    /// Parses a comma-separated list such as `admin, sysadmin`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Role::from_str(name).map_err(|_| InvalidRoleList(name.to_string())))
            .collect()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.iter().map(<&'static str>::from).collect();
        write!(f, "{}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn members_pass_and_others_are_forbidden_by_name() {
        let admins = RoleSet::from(Role::Admin);

        assert!(admins.check(Role::Admin).is_ok());

        let err = admins.check(Role::User).unwrap_err();
        let outcome = err.outcome();
        assert_eq!(outcome.status, StatusCode::FORBIDDEN);
        assert_eq!(outcome.message, "user is not authorized to perform this action");
    }

    #[test]
    fn nested_role_lists_flatten_into_one_set() {
        let nested = vec![
            RoleSet::from([Role::Admin]),
            RoleSet::from([Role::Sysadmin, Role::Admin]),
        ];
        let flat: RoleSet = nested.into_iter().collect();

        assert_eq!(flat, RoleSet::from([Role::Admin, Role::Sysadmin]));
        assert_eq!(flat.iter().collect::<Vec<_>>(), vec![Role::Admin, Role::Sysadmin]);
    }

    #[test]
    fn every_role_is_checked_against_membership() {
        for allowed in [
            RoleSet::empty(),
            RoleSet::from(Role::User),
            RoleSet::from([Role::Admin, Role::Sysadmin]),
            RoleSet::of(Role::ALL),
        ] {
            for role in Role::ALL {
                assert_eq!(allowed.check(role).is_ok(), allowed.contains(role));
            }
        }
        assert!(RoleSet::empty().is_empty());
    }

    #[test]
    fn role_lists_parse_from_config_text() {
        let parsed: RoleSet = " admin, sysadmin ,".parse().unwrap();
        assert_eq!(parsed, RoleSet::from([Role::Admin, Role::Sysadmin]));
        assert_eq!(parsed.to_string(), "admin, sysadmin");

        let err = "admin,root".parse::<RoleSet>().unwrap_err();
        assert_eq!(err, InvalidRoleList("root".into()));
    }
}
