/* Copyright (c) Fortanix, Inc.
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */
//! Client for the taskbook command server.
//!
//! Each exchange opens a TCP connection, writes one JSON-encoded
//! [`CommandRecord`], performs a single read of up to
//! [`REPLY_BUFFER_SIZE`] bytes and closes the connection. The reply is
//! opaque text; there is no framing, so a reply longer than the buffer is
//! truncated and a reply split across several segments may arrive partially.
//!
//! ```no_run
//! let reply = taskbook_client::send_ping("127.0.0.1:2222")?;
//! println!("status: {}", reply.bytes_written());
//! println!("reply from server= {}", reply.text());
//! # Ok::<(), taskbook_client::Error>(())
//! ```

#![deny(warnings)]

mod client;
mod command;
mod config;
mod error;

pub use client::{send_ping, CommandClient, Reply, DEFAULT_ENDPOINT, REPLY_BUFFER_SIZE};
pub use command::{CommandRecord, PING};
pub use config::ClientConfig;
pub use error::{Error, ErrorKind, Result, Stage};
