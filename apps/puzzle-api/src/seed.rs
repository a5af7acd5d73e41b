//! Demo data for local runs (`SEED_DEMO_DATA=true`).

use puzzle_common::PrefixedId;
use rand::seq::SliceRandom;

use crate::db::PuzzleStore;
use crate::error::ApiError;
use crate::models::puzzle::PuzzleDraft;
use crate::models::user::{AuthorProfile, User};

const DEMO_PUZZLE_COUNT: usize = 11;
const DEMO_AUTHOR_NAME: &str = "Kate";
const DEMO_AUTHOR_AVATAR: &str = "https://imgur.com/l0swFL1.jpg";
const TITLE_STEM: &str = "從前從前有碗";
const SOUPS: [&str; 4] = ["海龜湯", "孟婆湯", "玉米湯", "南瓜湯"];
const TAGS: [&str; 4] = ["原創", "動漫小說戲劇衍生", "驚悚", "生活"];
const DESCRIPTION: &str = "世界......\n需要更多力量......";

fn demo_drafts() -> Vec<PuzzleDraft> {
    let mut rng = rand::thread_rng();
    (0..DEMO_PUZZLE_COUNT)
        .map(|_| PuzzleDraft {
            title: format!("{TITLE_STEM}{}", SOUPS.choose(&mut rng).copied().unwrap_or(SOUPS[0])),
            description: DESCRIPTION.to_string(),
            tags: TAGS.choose(&mut rng).copied().unwrap_or(TAGS[0]).to_string(),
        })
        .collect()
}

/// Insert a demo author and puzzles if the store holds no puzzles yet.
/// Returns the number of puzzles inserted.
pub async fn seed_demo_data(store: &dyn PuzzleStore) -> Result<usize, ApiError> {
    let existing = store.count_puzzles().await?;
    if existing > 0 {
        tracing::info!(existing, "puzzles already present, skipping demo seed");
        return Ok(0);
    }

    let author = AuthorProfile {
        id: User::generate(),
        name: DEMO_AUTHOR_NAME.to_string(),
        avatar: DEMO_AUTHOR_AVATAR.to_string(),
    };

    let drafts = demo_drafts();
    for draft in &drafts {
        store.create_puzzle(&author, draft).await?;
    }

    tracing::info!(count = drafts.len(), author_id = %author.id, "seeded demo puzzles");
    Ok(drafts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryPuzzleStore;

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryPuzzleStore::new();
        assert_eq!(seed_demo_data(&store).await.unwrap(), DEMO_PUZZLE_COUNT);
        assert_eq!(seed_demo_data(&store).await.unwrap(), 0);

        let records = store.list_puzzles().await.unwrap();
        assert_eq!(records.len(), DEMO_PUZZLE_COUNT);
        for record in records {
            assert!(record.puzzle.title.starts_with(TITLE_STEM));
            assert!(TAGS.contains(&record.puzzle.tags.as_str()));
            assert_eq!(record.author.name, DEMO_AUTHOR_NAME);
            assert!(User::is_valid(&record.author.id));
        }
    }
}
