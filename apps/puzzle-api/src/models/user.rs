use chrono::{DateTime, Utc};
use diesel::prelude::*;
use puzzle_common::PrefixedId;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::users;

/// A puzzle author. Created or refreshed whenever the user publishes a puzzle.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = users)]
pub struct User {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl PrefixedId for User {
    const PREFIX: &'static str = puzzle_common::id::prefix::USER;
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub avatar: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Author identity as known at request time (token claims or seed data).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorProfile {
    pub id: String,
    pub name: String,
    pub avatar: String,
}
