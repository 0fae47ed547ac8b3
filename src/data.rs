use crate::{meeting::Meeting, utils, Sink, SpiderError};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::fmt::Display;
use std::io::Write;
use std::sync::Mutex;
use tracing::debug;

#[async_trait::async_trait]
pub trait Table {
    type Record<'a>;

    fn get_name(&self) -> &str;
    fn get_pool(&self) -> &SqlitePool;

    async fn create(&self) -> Result<(), sqlx::Error>;
    async fn insert<'a>(&self, record: Self::Record<'a>) -> Result<(), sqlx::Error>;

    async fn is_exist<I: AsRef<str> + Display + Send + Sync>(
        &self,
        id: I,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("SELECT id FROM {} WHERE id = ?", self.get_name());
        Ok(sqlx::query(&query)
            .bind(id.as_ref())
            .fetch_optional(self.get_pool())
            .await?
            .is_some())
    }

    async fn count(&self) -> Result<u32, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", self.get_name());
        Ok(sqlx::query(&query)
            .fetch_one(self.get_pool())
            .await?
            .try_get(0)?)
    }
}

/// A meeting with its links already encoded for the `links` column.
pub struct MeetingRow<'a> {
    pub meeting: &'a Meeting,
    pub links: String,
}

impl<'a> MeetingRow<'a> {
    pub fn new(meeting: &'a Meeting) -> Result<MeetingRow<'a>, serde_json::Error> {
        Ok(MeetingRow {
            meeting,
            links: serde_json::to_string(&meeting.links)?,
        })
    }
}

/// Meetings of one spider, keyed by record id.
///
/// A later crawl overwrites every column of a stored meeting except
/// `created_at`, so status and links follow the site.
pub struct MeetingTable {
    name: String,
    pool: SqlitePool,
}

impl MeetingTable {
    /// Opens (or creates) `<spider>_meetings` in the SQLite file at `path`.
    pub async fn connect(path: &str, spider: &str) -> Result<MeetingTable, SpiderError> {
        let opt = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        MeetingTable::with_pool(pool, spider).await
    }

    pub async fn with_pool(pool: SqlitePool, spider: &str) -> Result<MeetingTable, SpiderError> {
        let table = MeetingTable {
            name: format!("{}_meetings", spider),
            pool,
        };
        table.create().await?;
        Ok(table)
    }
}

#[async_trait::async_trait]
impl Table for MeetingTable {
    type Record<'a> = MeetingRow<'a>;

    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create(&self) -> Result<(), sqlx::Error> {
        if !utils::is_table_exists(self.get_pool(), &self.name).await? {
            let query = format!(
                r#"
                        CREATE TABLE {} (
                            id TEXT PRIMARY KEY,
                            created_at DATETIME,
                            title TEXT,
                            description TEXT,
                            classification TEXT,
                            status TEXT,
                            start_at DATETIME,
                            end_at DATETIME,
                            all_day BOOLEAN,
                            time_notes TEXT,
                            location_name TEXT,
                            location_address TEXT,
                            links TEXT,
                            source TEXT
                        )
                    "#,
                &self.name
            );
            sqlx::query(query.as_str()).execute(self.get_pool()).await?;
        }
        Ok(())
    }

    async fn insert<'a>(&self, record: Self::Record<'a>) -> Result<(), sqlx::Error> {
        let MeetingRow { meeting, links } = record;

        let mut tx = self.get_pool().begin().await?;
        let query = format!(
            r#"INSERT INTO {} (
                id,
                title,
                description,
                classification,
                status,
                start_at,
                end_at,
                all_day,
                time_notes,
                location_name,
                location_address,
                links,
                source,
                created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                classification = excluded.classification,
                status = excluded.status,
                start_at = excluded.start_at,
                end_at = excluded.end_at,
                all_day = excluded.all_day,
                time_notes = excluded.time_notes,
                location_name = excluded.location_name,
                location_address = excluded.location_address,
                links = excluded.links,
                source = excluded.source"#,
            self.name
        );
        sqlx::query(&query)
            .bind(meeting.id.to_string())
            .bind(meeting.title.as_str())
            .bind(meeting.description.as_str())
            .bind(meeting.classification.as_str())
            .bind(meeting.status.as_str())
            .bind(meeting.start)
            .bind(meeting.end)
            .bind(meeting.all_day)
            .bind(meeting.time_notes.as_str())
            .bind(meeting.location.name.as_str())
            .bind(meeting.location.address.as_str())
            .bind(links)
            .bind(meeting.source.as_str())
            .bind(utils::get_now())
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink for MeetingTable {
    async fn insert(&self, meeting: &Meeting) -> Result<(), SpiderError> {
        let id = meeting.id.to_string();
        if self.is_exist(&id).await? {
            debug!("Update {} in {}", id, self.name);
        }
        let row = MeetingRow::new(meeting)?;
        Ok(Table::insert(self, row).await?)
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> Sink for JsonLinesSink<W> {
    async fn insert(&self, meeting: &Meeting) -> Result<(), SpiderError> {
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        serde_json::to_writer(&mut *writer, meeting)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
