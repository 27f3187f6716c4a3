/* Copyright (c) Fortanix, Inc.
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::client::{CommandClient, DEFAULT_ENDPOINT, REPLY_BUFFER_SIZE};
use crate::error::{Error, Result};

/// Client settings as read from a TOML file. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClientConfig {
    pub endpoint: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
    pub reply_buffer_size: Option<usize>,
}

impl ClientConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("unable to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e: toml::de::Error| Error::config(format!("{}: {}", path.display(), e)))
    }

    pub fn into_client(self) -> Result<CommandClient> {
        let reply_buffer_size = self.reply_buffer_size.unwrap_or(REPLY_BUFFER_SIZE);
        if reply_buffer_size == 0 {
            return Err(Error::config("reply-buffer-size must be non-zero"));
        }

        Ok(CommandClient::new(self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()))
            .connect_timeout(millis("connect-timeout-ms", self.connect_timeout_ms)?)
            .read_timeout(millis("read-timeout-ms", self.read_timeout_ms)?)
            .write_timeout(millis("write-timeout-ms", self.write_timeout_ms)?)
            .reply_buffer_size(reply_buffer_size))
    }
}

// Sockets reject a zero timeout, so refuse it here rather than at connect time.
fn millis(key: &str, value: Option<u64>) -> Result<Option<Duration>> {
    match value {
        Some(0) => Err(Error::config(format!("{} must be non-zero", key))),
        other => Ok(other.map(Duration::from_millis)),
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use std::time::Duration;

    use tempfile::NamedTempFile;

    use super::ClientConfig;
    use crate::client::DEFAULT_ENDPOINT;
    use crate::error::ErrorKind;

    #[test]
    fn empty_config_gives_reference_client() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());

        let client = config.into_client().unwrap();
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn full_config() {
        let config = ClientConfig::from_toml_str(
            r#"
            endpoint = "10.0.0.5:2300"
            connect-timeout-ms = 250
            read-timeout-ms = 5000
            write-timeout-ms = 1000
            reply-buffer-size = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.as_deref(), Some("10.0.0.5:2300"));
        assert_eq!(config.connect_timeout_ms, Some(250));
        assert_eq!(config.read_timeout_ms, Some(5000));
        assert_eq!(config.write_timeout_ms, Some(1000));
        assert_eq!(config.reply_buffer_size, Some(4096));
        assert_eq!(config.clone().into_client().unwrap().endpoint(), "10.0.0.5:2300");
        assert_eq!(super::millis("read-timeout-ms", config.read_timeout_ms).unwrap(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_unknown_keys_and_zero_values() {
        let err = ClientConfig::from_toml_str("port = 2222").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ClientConfig::from_toml_str("reply-buffer-size = 0").unwrap().into_client().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ClientConfig::from_toml_str("read-timeout-ms = 0").unwrap().into_client().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("read-timeout-ms"));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = \"localhost:4000\"").unwrap();
        file.flush().unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("localhost:4000"));

        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "reply-buffer-size = \"big\"").unwrap();
        bad.flush().unwrap();
        let err = ClientConfig::load(bad.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let msg = err.to_string();
        assert_eq!(msg.matches("invalid client configuration").count(), 1, "{}", msg);
        assert!(msg.contains(&bad.path().display().to_string()), "{}", msg);

        let missing = file.path().with_extension("missing");
        let err = ClientConfig::load(&missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
