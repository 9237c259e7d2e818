use std::{collections::BTreeSet, str::FromStr, time::Duration};

use {
    sqlx::{
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
        FromRow, SqliteConnection, SqlitePool,
    },
    tracing::{debug, warn},
    uuid::Uuid,
};

use bookshelf_config::DatabaseConfig;

use crate::{model::User, util::slugify, Error};

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    slug: String,
    login: String,
    roles: String,
    access_token: String,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles: BTreeSet<String> =
            serde_json::from_str(&row.roles).map_err(|inner| Error::InvalidStoredRoles {
                user_id: row.id.clone(),
                inner,
            })?;

        Ok(Self {
            id: row.id,
            slug: row.slug,
            login: row.login,
            roles,
            access_token: row.access_token,
        })
    }
}

/// Persists users so the session can reload them on every request.
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Opens the database and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Fails on an invalid URL, a connection failure or a failed migration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        // Each connection to an in-memory database sees its own empty
        // database, and it lives exactly as long as that connection.
        let max_connections = if is_in_memory(&config.url) {
            if config.max_connections > 1 {
                warn!(
                    "In-memory database {} is limited to one connection, ignoring max_connections = {}",
                    config.url, config.max_connections
                );
            }
            1
        } else {
            config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        sqlx::migrate!().run(&pool).await?;

        debug!("User store ready at {}", config.url);
        Ok(Self { pool })
    }

    /// Records a sign-in for `account` at `provider`.
    ///
    /// A first sign-in creates the user with a new id, a unique slug and the
    /// given roles. Later sign-ins only refresh the access token.
    ///
    /// # Errors
    ///
    /// Fails on any database error.
    pub async fn upsert(
        &self,
        provider: &str,
        account: &str,
        access_token: &str,
        default_roles: &[String],
    ) -> Result<User, Error> {
        let login = format!("{provider}:{account}");
        let mut tx = self.pool.begin().await?;

        // Writing first takes the database write lock, so no other sign-in can
        // claim the slug chosen below before this transaction commits.
        let existing: Option<UserRow> = sqlx::query_as(
            r"
            update users set access_token = ?
            where login = ?
            returning id, slug, login, roles, access_token
            ",
        )
        .bind(access_token)
        .bind(&login)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match existing {
            Some(row) => row,
            None => {
                let slug = unique_slug(&mut tx, &slugify(account)).await?;
                let roles: BTreeSet<&String> = default_roles.iter().collect();

                sqlx::query_as(
                    r"
                    insert into users (id, slug, login, roles, access_token)
                    values (?, ?, ?, ?, ?)
                    returning id, slug, login, roles, access_token
                    ",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&slug)
                .bind(&login)
                .bind(serde_json::to_string(&roles)?)
                .bind(access_token)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        row.try_into()
    }

    /// # Errors
    ///
    /// Fails on a database error or unreadable stored roles.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, UserRow>("select * from users where id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// # Errors
    ///
    /// Fails on a database error or unreadable stored roles.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, UserRow>("select * from users where slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

async fn unique_slug(conn: &mut SqliteConnection, base: &str) -> Result<String, Error> {
    let mut candidate = base.to_string();
    let mut suffix = 1_u32;

    loop {
        let taken: Option<(i64,)> = sqlx::query_as("select 1 from users where slug = ?")
            .bind(&candidate)
            .fetch_optional(&mut *conn)
            .await?;

        if taken.is_none() {
            return Ok(candidate);
        }

        suffix += 1;
        candidate = format!("{base}-{suffix}");
    }
}
