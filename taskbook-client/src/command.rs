/* Copyright (c) Fortanix, Inc.
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const PING: &str = "ping";

/// A command for the taskbook server.
///
/// Both sequences are always serialized, as `[]` when empty. On the wire
/// `items` is named `itemIds`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    command: String,
    #[serde(rename = "itemIds", default)]
    items: Vec<String>,
    #[serde(default)]
    arguments: Vec<String>,
}

impl CommandRecord {
    pub fn new<C: Into<String>>(command: C) -> Self {
        CommandRecord {
            command: command.into(),
            items: Vec::new(),
            arguments: Vec::new(),
        }
    }

    pub fn ping() -> Self {
        Self::new(PING)
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Compact JSON, no trailing newline.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
