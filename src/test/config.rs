#[cfg(test)]
mod tests {
    use serial_test::serial;

    use crate::config::{AppConfig, DEFAULT_DATABASE_URL, figment};
    use crate::env::{env_files, load_env_file};

    #[test]
    #[serial]
    fn test_defaults_without_environment() {
        temp_env::with_vars_unset(["DATABASE_URL", "ROCKET_DEFAULT_USER_ID"], || {
            let config = AppConfig::from_figment(&figment()).expect("Config should extract");

            assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
            assert_eq!(config.default_user_id, 1);
            assert_eq!(config.static_dir, "public");
        });
    }

    #[test]
    #[serial]
    fn test_database_url_from_environment() {
        temp_env::with_var("DATABASE_URL", Some("sqlite://elsewhere.db"), || {
            let config = AppConfig::from_figment(&figment()).expect("Config should extract");

            assert_eq!(config.database_url, "sqlite://elsewhere.db");
        });
    }

    #[test]
    #[serial]
    fn test_rocket_env_overrides_default_user() {
        temp_env::with_var("ROCKET_DEFAULT_USER_ID", Some("7"), || {
            let config = AppConfig::from_figment(&figment()).expect("Config should extract");

            assert_eq!(config.default_user_id, 7);
        });
    }

    #[test]
    fn test_env_files_per_profile() {
        assert_eq!(
            env_files(false),
            vec!["config/common.env", "config/dev.env", ".secrets.env"]
        );
        assert_eq!(
            env_files(true),
            vec!["config/common.env", "config/prod.env", ".secrets.env"]
        );
    }

    #[test]
    fn test_missing_env_file_is_skipped() {
        let loaded = load_env_file("config/does-not-exist.env").expect("Missing file is not an error");
        assert!(!loaded);
    }
}
