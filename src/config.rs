use dotenv::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub app_id: String,
    pub access_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn init() -> Config {
        dotenv().ok();

        let app_id = std::env::var("APPSHEET_APP_ID").expect("APPSHEET_APP_ID must be set");
        let access_key =
            std::env::var("APPSHEET_ACCESS_KEY").expect("APPSHEET_ACCESS_KEY must be set");

        // Gateway endpoint configuration (with defaults)
        let base_url = std::env::var("APPSHEET_BASE_URL")
            .unwrap_or_else(|_| "https://www.appsheet.com/api/v2/apps/".to_string());
        let timeout_secs = std::env::var("APPSHEET_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Config {
            app_id,
            access_key,
            base_url,
            timeout_secs,
        }
    }

    /// Constructor for embedding hosts and tests that do not read the
    /// environment.
    pub fn new(app_id: impl Into<String>, access_key: impl Into<String>) -> Config {
        Config {
            app_id: app_id.into(),
            access_key: access_key.into(),
            base_url: "https://www.appsheet.com/api/v2/apps/".to_string(),
            timeout_secs: 30,
        }
    }
}
