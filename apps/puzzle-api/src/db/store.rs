use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use puzzle_common::PrefixedId;

use crate::error::ApiError;
use crate::models::puzzle::{Puzzle, PuzzleDraft, PuzzleRecord};
use crate::models::user::{AuthorProfile, User};

/// Abstraction over puzzle persistence.
///
/// Backed by PostgreSQL in production and an in-memory map in tests.
#[async_trait]
pub trait PuzzleStore: Send + Sync {
    /// All puzzles with their authors, oldest first.
    async fn list_puzzles(&self) -> Result<Vec<PuzzleRecord>, ApiError>;

    /// Upsert `author` and insert the puzzle as one unit.
    async fn create_puzzle(
        &self,
        author: &AuthorProfile,
        draft: &PuzzleDraft,
    ) -> Result<PuzzleRecord, ApiError>;

    async fn find_puzzle(&self, id: &str) -> Result<Option<PuzzleRecord>, ApiError>;

    /// Returns whether a puzzle was deleted.
    async fn delete_puzzle(&self, id: &str) -> Result<bool, ApiError>;

    async fn count_puzzles(&self) -> Result<i64, ApiError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation (for tests and database-less runs)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    // Kept in insertion order, which is also creation order.
    puzzles: Vec<Puzzle>,
}

impl MemoryState {
    fn record(&self, puzzle: &Puzzle) -> Result<PuzzleRecord, ApiError> {
        let author = self.users.get(&puzzle.author_id).cloned().ok_or_else(|| {
            tracing::error!(puzzle_id = %puzzle.id, "puzzle author missing from memory store");
            ApiError::internal("An internal error occurred")
        })?;
        Ok(PuzzleRecord {
            puzzle: puzzle.clone(),
            author,
        })
    }
}

#[derive(Default)]
pub struct MemoryPuzzleStore {
    state: RwLock<MemoryState>,
}

impl MemoryPuzzleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PuzzleStore for MemoryPuzzleStore {
    async fn list_puzzles(&self) -> Result<Vec<PuzzleRecord>, ApiError> {
        let state = self.state.read();
        state.puzzles.iter().map(|p| state.record(p)).collect()
    }

    async fn create_puzzle(
        &self,
        author: &AuthorProfile,
        draft: &PuzzleDraft,
    ) -> Result<PuzzleRecord, ApiError> {
        let now = Utc::now();
        let mut state = self.state.write();

        let user = state
            .users
            .entry(author.id.clone())
            .and_modify(|u| {
                u.name = author.name.clone();
                u.avatar = author.avatar.clone();
            })
            .or_insert_with(|| User {
                id: author.id.clone(),
                name: author.name.clone(),
                avatar: author.avatar.clone(),
                created_at: now,
            })
            .clone();

        let puzzle = Puzzle {
            id: Puzzle::generate(),
            author_id: author.id.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            tags: draft.tags.clone(),
            created_at: now,
        };
        state.puzzles.push(puzzle.clone());

        Ok(PuzzleRecord {
            puzzle,
            author: user,
        })
    }

    async fn find_puzzle(&self, id: &str) -> Result<Option<PuzzleRecord>, ApiError> {
        let state = self.state.read();
        state
            .puzzles
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.record(p))
            .transpose()
    }

    async fn delete_puzzle(&self, id: &str) -> Result<bool, ApiError> {
        let mut state = self.state.write();
        let before = state.puzzles.len();
        state.puzzles.retain(|p| p.id != id);
        Ok(state.puzzles.len() != before)
    }

    async fn count_puzzles(&self) -> Result<i64, ApiError> {
        Ok(self.state.read().puzzles.len() as i64)
    }
}
