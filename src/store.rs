use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
    sea_query::LikeExpr,
};
use tracing::debug;

use crate::{
    entities::{movie, session},
    error::{AppError, AppResult},
    models::MovieInput,
    schedule,
    sessions::SessionRecord,
};

// Keeps each bulk insert well under SQLite's bound-parameter limit.
const SESSION_BATCH: usize = 500;

// SQLite binds LIMIT/OFFSET as signed 64-bit integers.
const MAX_ROW_BOUND: u64 = i64::MAX as u64;

#[derive(Clone, Debug, Default)]
pub struct ListFilter {
    pub title_prefix: Option<String>,
    pub start_date_prefix: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug)]
pub struct MoviePage {
    pub movies: Vec<movie::Model>,
    pub has_more: bool,
}

/// Movie and session persistence. Multi-row writes run in a single
/// transaction; dropping an uncommitted transaction rolls it back.
#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Inserts the movie and its generated sessions atomically.
    pub async fn create(
        &self,
        id: i32,
        input: &MovieInput,
        sessions: &[SessionRecord],
    ) -> AppResult<movie::Model> {
        let now = now_rfc3339();
        let txn = self.db.begin().await?;

        if movie::Entity::find_by_id(id).one(&txn).await?.is_some() {
            return Err(AppError::DuplicateIdentifier(id));
        }

        let model = movie::ActiveModel {
            id: Set(id),
            title: Set(input.title.clone()),
            title_search: Set(search_key(&input.title)),
            description: Set(input.description.clone()),
            start_date: Set(input.start_date.to_string()),
            end_date: Set(input.end_date.to_string()),
            schedules: Set(movie::Schedules(input.schedules.clone())),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        };
        let movie = model.insert(&txn).await.map_err(|e| duplicate_or_db(e, id))?;

        insert_sessions(&txn, sessions, &now).await?;
        txn.commit().await?;

        debug!(movie_id = id, sessions = sessions.len(), "stored movie");
        Ok(movie)
    }

    pub async fn find(&self, id: i32) -> AppResult<movie::Model> {
        movie::Entity::find_by_id(id).one(&self.db).await?.ok_or(AppError::NotFound(id))
    }

    pub async fn list(&self, filter: &ListFilter) -> AppResult<MoviePage> {
        if filter.offset > MAX_ROW_BOUND {
            return Err(AppError::BadRequest(format!(
                "page must be at most {MAX_ROW_BOUND}, got {}",
                filter.offset
            )));
        }
        if filter.limit >= MAX_ROW_BOUND {
            return Err(AppError::BadRequest(format!(
                "limit must be below {MAX_ROW_BOUND}, got {}",
                filter.limit
            )));
        }

        let mut query = movie::Entity::find().order_by_asc(movie::Column::Id);

        if let Some(title) = &filter.title_prefix {
            query =
                query.filter(movie::Column::TitleSearch.like(prefix_pattern(&search_key(title))));
        }
        if let Some(start_date) = &filter.start_date_prefix {
            query = query.filter(movie::Column::StartDate.like(prefix_pattern(start_date)));
        }

        let mut movies =
            query.offset(filter.offset).limit(filter.limit.saturating_add(1)).all(&self.db).await?;

        let has_more = movies.len() as u64 > filter.limit;
        movies.truncate(filter.limit as usize);

        Ok(MoviePage { movies, has_more })
    }

    /// Overwrites every mutable field. When `sessions` is given, the movie's
    /// existing sessions are replaced by it in the same transaction.
    pub async fn update(
        &self,
        id: i32,
        input: &MovieInput,
        sessions: Option<&[SessionRecord]>,
    ) -> AppResult<movie::Model> {
        let now = now_rfc3339();
        let txn = self.db.begin().await?;

        let existing =
            movie::Entity::find_by_id(id).one(&txn).await?.ok_or(AppError::NotFound(id))?;

        let mut model: movie::ActiveModel = existing.into();
        model.title = Set(input.title.clone());
        model.title_search = Set(search_key(&input.title));
        model.description = Set(input.description.clone());
        model.start_date = Set(input.start_date.to_string());
        model.end_date = Set(input.end_date.to_string());
        model.schedules = Set(movie::Schedules(input.schedules.clone()));
        model.updated_at = Set(now.clone());
        let movie = model.update(&txn).await?;

        if let Some(sessions) = sessions {
            let removed = delete_sessions(&txn, id).await?;
            insert_sessions(&txn, sessions, &now).await?;
            debug!(movie_id = id, removed, inserted = sessions.len(), "regenerated sessions");
        }

        txn.commit().await?;
        Ok(movie)
    }

    /// Removes the movie together with all of its sessions.
    pub async fn delete(&self, id: i32) -> AppResult<u64> {
        let txn = self.db.begin().await?;

        if movie::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(AppError::NotFound(id));
        }

        let removed = delete_sessions(&txn, id).await?;
        movie::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        debug!(movie_id = id, sessions = removed, "deleted movie");
        Ok(removed)
    }

    pub async fn sessions(&self, movie_id: i32) -> AppResult<Vec<session::Model>> {
        self.find(movie_id).await?;

        let rows = session::Entity::find()
            .filter(session::Column::MovieId.eq(movie_id))
            .order_by_asc(session::Column::Date)
            .order_by_asc(session::Column::Time)
            .order_by_asc(session::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}

async fn insert_sessions<C: ConnectionTrait>(
    conn: &C,
    sessions: &[SessionRecord],
    now: &str,
) -> AppResult<()> {
    for batch in sessions.chunks(SESSION_BATCH) {
        let rows = batch.iter().map(|s| session::ActiveModel {
            id: Default::default(),
            movie_id: Set(s.movie_id),
            date: Set(s.date.to_string()),
            time: Set(schedule::hhmm(s.time)),
            created_at: Set(now.to_string()),
        });
        session::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

async fn delete_sessions<C: ConnectionTrait>(conn: &C, movie_id: i32) -> AppResult<u64> {
    let res = session::Entity::delete_many()
        .filter(session::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

fn duplicate_or_db(err: DbErr, id: i32) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateIdentifier(id),
        _ => err.into(),
    }
}

/// Case-folded form of a title. Folding happens here rather than in SQL
/// because SQLite's `LOWER` only handles ASCII.
fn search_key(title: &str) -> String {
    title.to_lowercase()
}

fn prefix_pattern(prefix: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

fn now_rfc3339() -> String {
    jiff::Timestamp::now().to_string()
}
