use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel::upsert::excluded;
use diesel_async::AsyncConnection;
use puzzle_common::PrefixedId;
use scoped_futures::ScopedFutureExt;

use super::pool::DbPool;
use super::schema::{puzzles, users};
use super::store::PuzzleStore;
use crate::error::ApiError;
use crate::models::puzzle::{NewPuzzle, Puzzle, PuzzleDraft, PuzzleRecord};
use crate::models::user::{AuthorProfile, NewUser, User};

/// PostgreSQL-backed puzzle store.
#[derive(Clone)]
pub struct PgPuzzleStore {
    pool: DbPool,
}

impl PgPuzzleStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_record((puzzle, author): (Puzzle, User)) -> PuzzleRecord {
    PuzzleRecord { puzzle, author }
}

#[async_trait]
impl PuzzleStore for PgPuzzleStore {
    async fn list_puzzles(&self) -> Result<Vec<PuzzleRecord>, ApiError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(Puzzle, User)> = diesel_async::RunQueryDsl::load(
            puzzles::table
                .inner_join(users::table)
                .order(puzzles::created_at.asc())
                .select((Puzzle::as_select(), User::as_select())),
            &mut conn,
        )
        .await?;

        Ok(rows.into_iter().map(into_record).collect())
    }

    async fn create_puzzle(
        &self,
        author: &AuthorProfile,
        draft: &PuzzleDraft,
    ) -> Result<PuzzleRecord, ApiError> {
        let now = Utc::now();
        let puzzle_id = Puzzle::generate();
        let mut conn = self.pool.get().await?;

        let (puzzle, user) = conn
            .transaction::<_, ApiError, _>(|conn| {
                async move {
                    // 1. Upsert the author.
                    let user: User = diesel_async::RunQueryDsl::get_result(
                        diesel::insert_into(users::table)
                            .values(NewUser {
                                id: &author.id,
                                name: &author.name,
                                avatar: &author.avatar,
                                created_at: now,
                            })
                            .on_conflict(users::id)
                            .do_update()
                            .set((
                                users::name.eq(excluded(users::name)),
                                users::avatar.eq(excluded(users::avatar)),
                            ))
                            .returning(User::as_returning()),
                        conn,
                    )
                    .await?;

                    // 2. Insert the puzzle.
                    let puzzle: Puzzle = diesel_async::RunQueryDsl::get_result(
                        diesel::insert_into(puzzles::table)
                            .values(NewPuzzle {
                                id: &puzzle_id,
                                author_id: &author.id,
                                title: &draft.title,
                                description: &draft.description,
                                tags: &draft.tags,
                                created_at: now,
                            })
                            .returning(Puzzle::as_returning()),
                        conn,
                    )
                    .await?;

                    Ok((puzzle, user))
                }
                .scope_boxed()
            })
            .await?;

        Ok(PuzzleRecord {
            puzzle,
            author: user,
        })
    }

    async fn find_puzzle(&self, id: &str) -> Result<Option<PuzzleRecord>, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: Option<(Puzzle, User)> = diesel_async::RunQueryDsl::get_result(
            puzzles::table
                .inner_join(users::table)
                .filter(puzzles::id.eq(id))
                .select((Puzzle::as_select(), User::as_select())),
            &mut conn,
        )
        .await
        .optional()?;

        Ok(row.map(into_record))
    }

    async fn delete_puzzle(&self, id: &str) -> Result<bool, ApiError> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel_async::RunQueryDsl::execute(
            diesel::delete(puzzles::table.find(id)),
            &mut conn,
        )
        .await?;

        Ok(deleted > 0)
    }

    async fn count_puzzles(&self) -> Result<i64, ApiError> {
        let mut conn = self.pool.get().await?;

        let count: i64 =
            diesel_async::RunQueryDsl::get_result(puzzles::table.count(), &mut conn).await?;

        Ok(count)
    }
}
