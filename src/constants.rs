pub mod hosts {
    pub const FABRIC_API: &str = "https://api.fabric.microsoft.com/v1";
    pub const POWERBI_API: &str = "https://api.powerbi.com/v1.0/myorg";
}

pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
    pub const USER_AGENT: &str = "fabricops/0.4";
}

pub mod transport_status {
    pub const TIMEOUT: u16 = 408;
    pub const CONNECTION: u16 = 503;
    pub const OTHER: u16 = 500;
}

pub mod lro {
    pub const POLL_INTERVAL_MS: u64 = 5_000;
    pub const MAX_ATTEMPTS: usize = 10;
    pub const LOCATION_HEADER: &str = "location";
    pub const RESULT_SUFFIX: &str = "/result";
    pub const STATUS_FIELD: &str = "status";
}

pub mod pagination {
    pub const MAX_PAGES: usize = 1_000;
    pub const TOKEN_FIELD: &str = "continuationToken";
    pub const VALUE_FIELD: &str = "value";
}

pub mod limits {
    pub const LOG_BODY_LENGTH: usize = 512;
    pub const SUGGESTION_LIMIT: usize = 5;
}
