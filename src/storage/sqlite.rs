use crate::model::{LegSnapshot, SavedFlight, StorageError, TrendPoint, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

const SELECT_FLIGHT: &str = "SELECT id, user_id, airline, price, currency,
        depart_time, depart_arrive, depart_duration, depart_from, depart_to,
        return_time, return_arrive, return_duration, return_from, return_to,
        trend, notifications, created_at
    FROM saved_flights";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Открывает файл БД и приводит схему к актуальному виду
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::init(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS saved_flights (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                airline TEXT NOT NULL,
                price REAL NOT NULL,
                depart_time TEXT NOT NULL,
                depart_arrive TEXT NOT NULL,
                depart_duration TEXT,
                depart_from TEXT NOT NULL,
                depart_to TEXT NOT NULL,
                return_time TEXT,
                return_arrive TEXT,
                return_duration TEXT,
                return_from TEXT,
                return_to TEXT,
                trend TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_saved_flights_user ON saved_flights(user_id);
            ",
        )?;

        Self::migrate_add_column_if_missing(&conn, "saved_flights", "currency", "TEXT NOT NULL DEFAULT 'GBP'")?;
        Self::migrate_add_column_if_missing(&conn, "saved_flights", "notifications", "INTEGER NOT NULL DEFAULT 0")?;

        Ok(Self { conn })
    }

    /// Проверяет наличие столбца и в случае отсутствия добавляет его в таблицу
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            debug!("Adding column {}.{}", table, column);
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    pub fn insert_flight(&self, flight: &SavedFlight) -> Result<(), StorageError> {
        let trend = serde_json::to_string(&flight.trend)?;
        let ret = flight.return_leg.as_ref();
        self.conn.execute(
            "INSERT INTO saved_flights (
                id, user_id, airline, price, currency,
                depart_time, depart_arrive, depart_duration, depart_from, depart_to,
                return_time, return_arrive, return_duration, return_from, return_to,
                trend, notifications, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                &flight.id,
                flight.user.as_str(),
                &flight.airline,
                flight.price,
                &flight.currency,
                &flight.depart.time,
                &flight.depart.arrive,
                &flight.depart.duration,
                &flight.depart.from,
                &flight.depart.to,
                ret.map(|l| &l.time),
                ret.map(|l| &l.arrive),
                ret.and_then(|l| l.duration.as_ref()),
                ret.map(|l| &l.from),
                ret.map(|l| &l.to),
                trend,
                flight.notifications,
                flight.created_at,
            ],
        )?;
        Ok(())
    }

    /// Все сохранённые рейсы пользователя, сначала новые
    pub fn find_all_by_user(&self, user: &UserId) -> Result<Vec<SavedFlight>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_FLIGHT} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"))?;
        let rows = stmt.query_map(params![user.as_str()], Self::map_flight)?;

        let mut flights = Vec::new();
        for flight in rows {
            flights.push(flight?);
        }
        Ok(flights)
    }

    pub fn find_by_id(&self, user: &UserId, id: &str) -> Result<Option<SavedFlight>, StorageError> {
        let flight = self
            .conn
            .query_row(
                &format!("{SELECT_FLIGHT} WHERE id = ?1 AND user_id = ?2"),
                params![id, user.as_str()],
                Self::map_flight,
            )
            .optional()?;
        Ok(flight)
    }

    /// Записывает флаг уведомлений; `None`, если рейса нет
    pub fn set_notifications(
        &self,
        user: &UserId,
        id: &str,
        enabled: bool,
    ) -> Result<Option<SavedFlight>, StorageError> {
        let changed = self.conn.execute(
            "UPDATE saved_flights SET notifications = ?1 WHERE id = ?2 AND user_id = ?3",
            params![enabled, id, user.as_str()],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_by_id(user, id)
    }

    /// Возвращает true, если строка была удалена
    pub fn delete_flight(&self, user: &UserId, id: &str) -> Result<bool, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM saved_flights WHERE id = ?1 AND user_id = ?2",
            params![id, user.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn map_flight(row: &Row) -> Result<SavedFlight, rusqlite::Error> {
        let trend_json: String = row.get(15)?;
        let trend: Vec<TrendPoint> = serde_json::from_str(&trend_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(15, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let return_leg = match (row.get::<_, Option<String>>(10)?, row.get::<_, Option<String>>(11)?) {
            (Some(time), Some(arrive)) => Some(LegSnapshot {
                time,
                arrive,
                duration: row.get(12)?,
                from: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
                to: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(SavedFlight {
            id: row.get(0)?,
            user: UserId::new(row.get::<_, String>(1)?),
            airline: row.get(2)?,
            price: row.get(3)?,
            currency: row.get(4)?,
            depart: LegSnapshot {
                time: row.get(5)?,
                arrive: row.get(6)?,
                duration: row.get(7)?,
                from: row.get(8)?,
                to: row.get(9)?,
            },
            return_leg,
            trend,
            notifications: row.get(16)?,
            created_at: row.get(17)?,
        })
    }
}
