use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::Result;

/// Typed configuration for the relay.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory the receiving daemon writes one file per inbound segment
    /// into. Read-only from our side; files are never deleted or moved.
    pub spool_dir: PathBuf,
    /// Quiet period after the most recent segment before a group is
    /// considered complete.
    pub assemble_timeout: Duration,
    /// Default number of messages returned by an inbox scan.
    pub scan_limit: usize,

    // Bark push notifications
    pub bark_url: Option<String>,
    pub bark_group: String,
    pub bark_level: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let spool_dir = env_path("GAMMU_INBOX_PATH")
            .unwrap_or_else(|| PathBuf::from("/var/spool/gammu/inbox"));
        let assemble_timeout =
            Duration::from_millis(env_u64("SMS_ASSEMBLE_TIMEOUT_MS").unwrap_or(5000));
        let scan_limit = env_usize("SMS_SCAN_LIMIT").unwrap_or(5);

        // BARK_URL unset means delivery degrades to warn-and-skip.
        let bark_url = env_str("BARK_URL").and_then(non_empty);
        let bark_group = env_str("BARK_GROUP").unwrap_or_else(|| "sms".to_string());
        let bark_level = env_str("BARK_LEVEL").unwrap_or_else(|| "timeSensitive".to_string());

        Ok(Self {
            spool_dir,
            assemble_timeout,
            scan_limit,
            bark_url,
            bark_group,
            bark_level,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env is process-global, so defaults and overrides live in one test.
    #[test]
    fn loads_defaults_and_env_overrides() {
        for key in [
            "GAMMU_INBOX_PATH",
            "SMS_ASSEMBLE_TIMEOUT_MS",
            "SMS_SCAN_LIMIT",
            "BARK_URL",
            "BARK_GROUP",
            "BARK_LEVEL",
        ] {
            env::remove_var(key);
        }

        let cfg = Config::load().unwrap();
        assert_eq!(cfg.spool_dir, PathBuf::from("/var/spool/gammu/inbox"));
        assert_eq!(cfg.assemble_timeout, Duration::from_millis(5000));
        assert_eq!(cfg.scan_limit, 5);
        assert_eq!(cfg.bark_url, None);
        assert_eq!(cfg.bark_group, "sms");
        assert_eq!(cfg.bark_level, "timeSensitive");

        env::set_var("GAMMU_INBOX_PATH", "/tmp/spool");
        env::set_var("SMS_ASSEMBLE_TIMEOUT_MS", "250");
        env::set_var("SMS_SCAN_LIMIT", "10");
        env::set_var("BARK_URL", "https://api.day.app/KEY");

        let cfg = Config::load().unwrap();
        assert_eq!(cfg.spool_dir, PathBuf::from("/tmp/spool"));
        assert_eq!(cfg.assemble_timeout, Duration::from_millis(250));
        assert_eq!(cfg.scan_limit, 10);
        assert_eq!(cfg.bark_url.as_deref(), Some("https://api.day.app/KEY"));
    }

    #[test]
    fn dotenv_does_not_override_existing_env() {
        let dir = tempfile::tempdir().unwrap();
        let dotenv = dir.path().join(".env");
        fs::write(&dotenv, "SMSRELAY_TEST_A=\"from file\"\n# comment\nSMSRELAY_TEST_B=plain\n")
            .unwrap();

        env::set_var("SMSRELAY_TEST_B", "preset");
        load_dotenv_if_present(&dotenv);

        assert_eq!(env::var("SMSRELAY_TEST_A").unwrap(), "from file");
        assert_eq!(env::var("SMSRELAY_TEST_B").unwrap(), "preset");
    }
}
