use chrono::{DateTime, Utc};
use diesel::prelude::*;
use puzzle_common::PrefixedId;
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use super::user::User;
use crate::db::schema::puzzles;

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Upper bound of the decorative attendance figure.
const MAX_ATTENDANCE: u32 = 10;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = puzzles)]
pub struct Puzzle {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub created_at: DateTime<Utc>,
}

impl PrefixedId for Puzzle {
    const PREFIX: &'static str = puzzle_common::id::prefix::PUZZLE;
}

#[derive(Debug, Insertable)]
#[diesel(table_name = puzzles)]
pub struct NewPuzzle<'a> {
    pub id: &'a str,
    pub author_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub tags: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleDraft {
    pub title: String,
    pub description: String,
    pub tags: String,
}

/// A puzzle joined with its author.
#[derive(Debug, Clone)]
pub struct PuzzleRecord {
    pub puzzle: Puzzle,
    pub author: User,
}

/// List item shown on the puzzle board.
#[derive(Debug, Serialize, ToSchema)]
pub struct PuzzleResponse {
    pub id: String,
    pub title: String,
    pub avatar: String,
    /// Display string such as `"3人"`.
    pub attendance: String,
    pub tags: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PuzzleDetailResponse {
    pub id: String,
    pub avatar: String,
    pub author: String,
    pub title: String,
    pub description: String,
    pub tags: String,
}

impl PuzzleResponse {
    pub fn new(record: PuzzleRecord, attendance: u32) -> Self {
        Self {
            id: record.puzzle.id,
            title: record.puzzle.title,
            avatar: record.author.avatar,
            attendance: format!("{attendance}人"),
            tags: record.puzzle.tags,
        }
    }
}

impl From<PuzzleRecord> for PuzzleDetailResponse {
    fn from(record: PuzzleRecord) -> Self {
        Self {
            id: record.puzzle.id,
            avatar: record.author.avatar,
            author: record.author.name,
            title: record.puzzle.title,
            description: record.puzzle.description,
            tags: record.puzzle.tags,
        }
    }
}

/// Random attendance figure in `0..=10`.
pub fn random_attendance() -> u32 {
    rand::thread_rng().gen_range(0..=MAX_ATTENDANCE)
}
