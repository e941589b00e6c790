use std::path::Path;

pub fn is_production() -> bool {
    let profile = dotenvy::var("ROCKET_PROFILE")
        .unwrap_or_else(|_| rocket::Config::DEFAULT_PROFILE.to_string());

    profile.eq_ignore_ascii_case("release")
}

pub fn env_files(production: bool) -> Vec<&'static str> {
    if production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    }
}

/// Loads the profile's env files in order, later files overriding earlier ones.
///
/// Runs before tracing is initialised (the telemetry settings live in these
/// files), so it returns the files it loaded and lets the caller log them.
pub fn load_environment() -> Result<Vec<&'static str>, dotenvy::Error> {
    let mut loaded = Vec::new();

    for env_file in env_files(is_production()) {
        if load_env_file(env_file)? {
            loaded.push(env_file);
        }
    }

    Ok(loaded)
}

/// Missing files are skipped.
pub fn load_env_file(path: &str) -> Result<bool, dotenvy::Error> {
    if !Path::new(path).exists() {
        return Ok(false);
    }

    dotenvy::from_filename_override(path)?;
    Ok(true)
}
