use std::time::Duration;

use redis_timer::TimerError;

/// Opens one blocking connection for the shared sample store.
///
/// Commands on it inherit `timeout` for reads and writes as well as for
/// connecting; nothing above this layer retries.
pub fn connect(url: &str, timeout: Duration) -> Result<redis::Connection, TimerError> {
    let client = redis::Client::open(url)?;
    let conn = client.get_connection_with_timeout(timeout)?;
    conn.set_read_timeout(Some(timeout))?;
    conn.set_write_timeout(Some(timeout))?;
    Ok(conn)
}
