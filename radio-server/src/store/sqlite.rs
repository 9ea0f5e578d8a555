//! SQLite-backed store.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info};

use crate::domain::{
    FAVOURITE_LIMIT, Favourite, FavouriteError, FavouriteStation, Place, Station, StationRecord,
    User,
};
use crate::query::{Predicate, StationSort};

use super::StationRepository;
use super::error::{SaveFavouriteError, StoreError};

/// Stations joined with places. Every station query starts here.
const SELECT_STATIONS: &str = "SELECT s.id AS station_id, s.name, s.\"call\" AS \"call\", \
     s.place_id, s.url_stream, s.url_site, s.freq, s.power, \
     p.id AS joined_place_id, p.city, p.state, p.lat, p.lng \
     FROM stations s LEFT JOIN places p ON p.id = s.place_id";

/// Message raised by the `favourites_limit` trigger.
const LIMIT_TRIGGER_MESSAGE: &str = "favourite limit exceeded";

/// Attempts at a check-then-insert transaction that keeps losing the write
/// lock to a concurrent writer.
const WRITE_ATTEMPTS: u32 = 5;

/// Wait before the first retry; doubled after each one.
const RETRY_DELAY: Duration = Duration::from_millis(10);

/// Flat row of [`SELECT_STATIONS`].
#[derive(Debug, sqlx::FromRow)]
struct StationRow {
    station_id: i64,
    name: String,
    call: String,
    place_id: Option<i64>,
    url_stream: Option<String>,
    url_site: Option<String>,
    freq: Option<String>,
    power: Option<i64>,
    joined_place_id: Option<i64>,
    city: Option<String>,
    state: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
}

impl From<StationRow> for StationRecord {
    fn from(row: StationRow) -> Self {
        let place = match (row.joined_place_id, row.city, row.state, row.lat, row.lng) {
            (Some(id), Some(city), Some(state), Some(lat), Some(lng)) => Some(Place {
                id,
                city,
                state,
                lat,
                lng,
            }),
            _ => None,
        };

        let station = Station {
            id: row.station_id,
            name: row.name,
            call: row.call,
            place_id: row.place_id,
            url_stream: row.url_stream,
            url_site: row.url_site,
            freq: row.freq,
            power: row.power,
        };

        StationRecord::new(station, place)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FavouriteRow {
    favourite_id: i64,
    #[sqlx(flatten)]
    station: StationRow,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password: row.password,
        }
    }
}

/// Connection pool over the directory database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and run migrations.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        info!(url, "connected to database");

        Self::migrate(pool).await
    }

    /// A private in-memory database, for tests.
    ///
    /// Every connection to `sqlite::memory:` sees its own database, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    // Reference data

    pub async fn insert_place(&self, place: &Place) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO places (id, city, state, lat, lng) VALUES (?, ?, ?, ?, ?)")
            .bind(place.id)
            .bind(&place.city)
            .bind(&place.state)
            .bind(place.lat)
            .bind(place.lng)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_station(&self, station: &Station) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO stations (id, name, \"call\", place_id, url_stream, url_site, freq, power) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(station.id)
        .bind(&station.name)
        .bind(&station.call)
        .bind(station.place_id)
        .bind(&station.url_stream)
        .bind(&station.url_site)
        .bind(&station.freq)
        .bind(station.power)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // Users

    /// Create a user, or return `None` if the username is taken.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        retry_busy(StoreError::is_busy, move || {
            self.try_create_user(username, password_hash)
        })
        .await
    }

    async fn try_create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await?;
        if taken.is_some() {
            return Ok(None);
        }

        let inserted = sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&mut *tx)
            .await;

        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        debug!(user_id = id, "created user");

        Ok(Some(User {
            id,
            username: username.to_string(),
            password: password_hash.to_string(),
        }))
    }

    pub async fn user_by_name(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, password FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, password FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    // Favourites

    /// Save a favourite.
    ///
    /// The limit, duplicate and existence checks run in the same transaction
    /// as the insert. A transaction that loses the write lock to a concurrent
    /// add is retried, so its checks see the other write. The schema
    /// enforces the limit and uniqueness too, and those violations map to
    /// the matching [`FavouriteError`].
    pub async fn add_favourite(
        &self,
        user_id: i64,
        station_id: i64,
    ) -> Result<Favourite, SaveFavouriteError> {
        retry_busy(SaveFavouriteError::is_busy, move || {
            self.try_add_favourite(user_id, station_id)
        })
        .await
    }

    async fn try_add_favourite(
        &self,
        user_id: i64,
        station_id: i64,
    ) -> Result<Favourite, SaveFavouriteError> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favourites WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= FAVOURITE_LIMIT as i64 {
            return Err(FavouriteError::LimitExceeded.into());
        }

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM favourites WHERE user_id = ? AND station_id = ?")
                .bind(user_id)
                .bind(station_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(FavouriteError::AlreadyExists(station_id).into());
        }

        let station: Option<i64> = sqlx::query_scalar("SELECT id FROM stations WHERE id = ?")
            .bind(station_id)
            .fetch_optional(&mut *tx)
            .await?;
        if station.is_none() {
            return Err(FavouriteError::UnknownStation(station_id).into());
        }

        let result = sqlx::query("INSERT INTO favourites (user_id, station_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(station_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify_favourite_error(e, station_id))?;

        tx.commit().await?;

        Ok(Favourite {
            id: result.last_insert_rowid(),
            user_id,
            station_id,
        })
    }

    /// Remove a favourite. Returns whether a row was deleted.
    pub async fn remove_favourite(&self, user_id: i64, station_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM favourites WHERE user_id = ? AND station_id = ?")
            .bind(user_id)
            .bind(station_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// A user's favourites with their stations, oldest first.
    pub async fn favourites(&self, user_id: i64) -> Result<Vec<FavouriteStation>, StoreError> {
        let sql = format!(
            "SELECT f.id AS favourite_id, sp.* FROM favourites f \
             JOIN ({SELECT_STATIONS}) sp ON sp.station_id = f.station_id \
             WHERE f.user_id = ? ORDER BY f.id"
        );

        let rows: Vec<FavouriteRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| FavouriteStation {
                favourite_id: row.favourite_id,
                record: row.station.into(),
            })
            .collect())
    }
}

/// Run a write transaction, retrying while SQLite reports the database busy.
///
/// A deferred transaction that has already read fails at once when another
/// connection holds the write lock. The whole transaction is rerun so its
/// reads see the other write.
async fn retry_busy<T, E, F, Fut>(is_busy: impl Fn(&E) -> bool, mut attempt: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = RETRY_DELAY;
    for n in 1..WRITE_ATTEMPTS {
        match attempt().await {
            Err(e) if is_busy(&e) => {
                debug!(attempt = n, ?delay, "database busy, retrying write");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            result => return result,
        }
    }
    attempt().await
}

/// Map constraint violations raised by the schema to model errors.
fn classify_favourite_error(e: sqlx::Error, station_id: i64) -> SaveFavouriteError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return FavouriteError::AlreadyExists(station_id).into();
        }
        if db.is_foreign_key_violation() {
            return FavouriteError::UnknownStation(station_id).into();
        }
        if db.message().contains(LIMIT_TRIGGER_MESSAGE) {
            return FavouriteError::LimitExceeded.into();
        }
    }
    e.into()
}

/// Render a predicate as a SQL boolean expression with bound parameters.
fn push_predicate(builder: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    match predicate {
        Predicate::Like(field, pattern) => {
            builder
                .push(field.column())
                .push(" LIKE ")
                .push_bind(pattern.to_like());
        }
        Predicate::Equals(field, value) => {
            builder
                .push(field.column())
                .push(" = ")
                .push_bind(value.clone());
        }
        Predicate::AtLeast(field, bound) => {
            builder.push(field.column()).push(" >= ").push_bind(*bound);
        }
        Predicate::AtMost(field, bound) => {
            builder.push(field.column()).push(" <= ").push_bind(*bound);
        }
        Predicate::HasPlace => {
            builder.push("p.id IS NOT NULL");
        }
        Predicate::And(parts) => push_joined(builder, parts, " AND ", "1"),
        Predicate::Or(parts) => push_joined(builder, parts, " OR ", "0"),
    }
}

fn push_joined(
    builder: &mut QueryBuilder<'_, Sqlite>,
    parts: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        builder.push(empty);
        return;
    }

    builder.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_predicate(builder, part);
    }
    builder.push(")");
}

impl StationRepository for SqliteStore {
    async fn find(&self, predicate: &Predicate) -> Result<Vec<StationRecord>, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_STATIONS);
        builder.push(" WHERE ");
        push_predicate(&mut builder, predicate);
        builder.push(" ORDER BY s.id");

        let rows: Vec<StationRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(StationRecord::from).collect())
    }

    async fn list(&self, sort: StationSort) -> Result<Vec<StationRecord>, StoreError> {
        let sql = format!("{SELECT_STATIONS} ORDER BY {}", sort.order_by());

        let rows: Vec<StationRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(StationRecord::from).collect())
    }
}
