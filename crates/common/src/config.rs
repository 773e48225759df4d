/// Runtime settings loaded from environment variables at startup.
///
/// Every value is optional; the command line may override any of them.
#[derive(Debug, Clone)]
pub struct Config {
    // Input / output
    pub input_path: Option<String>,
    pub output_path: Option<String>,

    // Database
    pub database_url: Option<String>,

    // Signal parameter file path
    pub signal_config_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            input_path: optional_env("INPUT_CSV"),
            output_path: optional_env("OUTPUT_CSV"),
            database_url: optional_env("DATABASE_URL"),
            signal_config_path: optional_env("SIGNAL_CONFIG_PATH")
                .unwrap_or_else(|| "config/signals.toml".to_string()),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
