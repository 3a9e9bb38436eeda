//! Test configuration helpers pointing a registrar at a mock service

use std::path::Path;
use std::time::Duration;
use nlm_ingest::Config;
use wiremock::MockServer;

/// Configuration for a registrar talking to `server`
///
/// Pacing is shortened so full runs finish in milliseconds.
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.service.base_url = format!("{}/", server.uri());
    config.service.request_timeout = Duration::from_secs(5);
    config.submission.request_delay = Duration::from_millis(1);
    config.poll.delay = Duration::from_millis(10);
    config
}

/// Same as [`test_config`] with the SQLite recovery store at `db_path`
pub fn test_config_with_db(server: &MockServer, db_path: &Path) -> Config {
    let mut config = test_config(server);
    config.recovery.database_path = Some(db_path.to_path_buf());
    config
}
