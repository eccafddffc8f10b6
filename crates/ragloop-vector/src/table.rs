//! LanceDB connection and table helpers.

use lancedb::{connect, Connection, Table};

use ragloop_core::error::{Error, Result};

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(Error::store)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(Error::store)?;
    Ok(names.iter().any(|n| n == name))
}

/// Open `name` if it was created already.
pub async fn open_existing(conn: &Connection, name: &str) -> Result<Option<Table>> {
    if !table_exists(conn, name).await? {
        return Ok(None);
    }
    let table = conn.open_table(name).execute().await.map_err(Error::store)?;
    Ok(Some(table))
}
