//! Role-keyed profile requirements for portal user accounts.
//!
//! Which profile fields a user record must carry depends on the role it is
//! created with. The mapping lives in a single table so that adding a role
//! means adding a row, not another branch at every call site.

use serde::{Deserialize, Serialize};

use crate::domain::SubcommitteeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Secretary,
    Chairperson,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    Email,
    Phone,
    Subcommittee,
    Position,
}

const BASE_FIELDS: &[ProfileField] = &[ProfileField::FullName, ProfileField::Email];

const ROLE_REQUIREMENTS: &[(Role, &[ProfileField])] = &[
    (Role::Admin, BASE_FIELDS),
    (
        Role::Secretary,
        &[
            ProfileField::FullName,
            ProfileField::Email,
            ProfileField::Phone,
        ],
    ),
    (
        Role::Chairperson,
        &[
            ProfileField::FullName,
            ProfileField::Email,
            ProfileField::Subcommittee,
            ProfileField::Position,
        ],
    ),
    (
        Role::Member,
        &[
            ProfileField::FullName,
            ProfileField::Email,
            ProfileField::Subcommittee,
        ],
    ),
];

pub fn required_profile_fields(role: Role) -> &'static [ProfileField] {
    ROLE_REQUIREMENTS
        .iter()
        .find(|(candidate, _)| *candidate == role)
        .map(|(_, fields)| *fields)
        .unwrap_or(BASE_FIELDS)
}

/// A user record as typed into the management form, before it is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subcommittee_id: Option<SubcommitteeId>,
    pub position: Option<String>,
}

impl ProfileDraft {
    fn has(&self, field: ProfileField) -> bool {
        let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        match field {
            ProfileField::FullName => filled(&self.full_name),
            ProfileField::Email => filled(&self.email),
            ProfileField::Phone => filled(&self.phone),
            ProfileField::Subcommittee => self.subcommittee_id.is_some(),
            ProfileField::Position => filled(&self.position),
        }
    }
}

/// Required fields for `role` that `draft` leaves empty, in table order.
pub fn missing_profile_fields(role: Role, draft: &ProfileDraft) -> Vec<ProfileField> {
    required_profile_fields(role)
        .iter()
        .copied()
        .filter(|field| !draft.has(*field))
        .collect()
}

#[cfg(test)]
#[path = "tests/roles_tests.rs"]
mod tests;
