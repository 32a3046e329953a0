use std::time::Duration;

pub const TEST_CASE_API_PATH: &str = "test_case";
pub const DEFAULT_TABLE_NAME: &str = "parameters";

/// Column holding the JSON-serialized parameters of a test case.
pub const PARAMS_COLUMN: &str = "params";

/// How long startup keeps probing the database before giving up.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(60);
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const LOCAL_DEFAULT_PORT: u16 = 5432;
pub const REMOTE_DEFAULT_PORT: u16 = 17494;
