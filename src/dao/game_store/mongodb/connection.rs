use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const APP_NAME: &str = "mission-control-back";
const CONNECT_ATTEMPTS: u32 = 3;
const RETRY_STEP: Duration = Duration::from_millis(500);
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a client for `database_name` and wait until the server answers a ping.
///
/// Only a short retry happens here; the storage supervisor owns the long backoff.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let mut options = options.clone();
    options.app_name.get_or_insert_with(|| APP_NAME.to_owned());
    options
        .server_selection_timeout
        .get_or_insert(SERVER_SELECTION_TIMEOUT);

    let client = Client::with_options(options)
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempt = 1;
    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                debug!(attempt, database = database_name, "MongoDB answered ping");
                return Ok((client, database));
            }
            Err(source) if attempt >= CONNECT_ATTEMPTS => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                debug!(attempt, error = %err, "MongoDB ping failed; retrying");
                sleep(RETRY_STEP * attempt).await;
                attempt += 1;
            }
        }
    }
}
