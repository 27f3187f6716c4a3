/* Copyright (c) Fortanix, Inc.
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::borrow::Cow;
use std::io::{ErrorKind as IoErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info};

use crate::command::CommandRecord;
use crate::error::{Error, Result, Stage};

/// Where the reference server listens.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:2222";

/// The reply is whatever a single read of this many bytes returns.
pub const REPLY_BUFFER_SIZE: usize = 1024;

/// The outcome of one exchange. The body holds at least one byte when it
/// comes from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    bytes_written: usize,
    body: Vec<u8>,
}

impl Reply {
    pub fn new<T: Into<Vec<u8>>>(bytes_written: usize, body: T) -> Self {
        Reply {
            bytes_written,
            body: body.into(),
        }
    }

    /// Length of the encoded command record sent to the server.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The reply as text. Invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Client for the taskbook command server.
///
/// The server handles one command per connection, so every call opens a
/// fresh connection and closes it before returning. Without a read timeout a
/// server that never answers blocks the caller indefinitely.
#[derive(Clone, Debug)]
pub struct CommandClient {
    endpoint: String,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    reply_buffer_size: usize,
}

impl Default for CommandClient {
    fn default() -> Self {
        CommandClient::new(DEFAULT_ENDPOINT)
    }
}

impl CommandClient {
    pub fn new<E: Into<String>>(endpoint: E) -> Self {
        CommandClient {
            endpoint: endpoint.into(),
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            reply_buffer_size: REPLY_BUFFER_SIZE,
        }
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// A size of zero is reported as `Error::Config` by the next exchange.
    pub fn reply_buffer_size(mut self, size: usize) -> Self {
        self.reply_buffer_size = size;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn open_socket(&self) -> Result<TcpStream> {
        let conn_err = |e: std::io::Error| Error::connection(self.endpoint.as_str(), e);

        let sock = match self.connect_timeout {
            None => TcpStream::connect(self.endpoint.as_str()).map_err(conn_err)?,
            Some(timeout) => {
                // `connect_timeout` takes a single address, so try each
                // resolved address in turn like `connect` does.
                let mut last_err = None;
                let mut sock = None;
                for addr in self.endpoint.as_str().to_socket_addrs().map_err(conn_err)? {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(s) => {
                            sock = Some(s);
                            break;
                        }
                        Err(e) => {
                            debug!("connecting to {} failed: {}", addr, e);
                            last_err = Some(e);
                        }
                    }
                }
                match (sock, last_err) {
                    (Some(sock), _) => sock,
                    (None, Some(e)) => return Err(conn_err(e)),
                    (None, None) => {
                        return Err(conn_err(std::io::Error::new(
                            IoErrorKind::InvalidInput,
                            "endpoint did not resolve to any address",
                        )))
                    }
                }
            }
        };

        sock.set_read_timeout(self.read_timeout).map_err(conn_err)?;
        sock.set_write_timeout(self.write_timeout).map_err(conn_err)?;
        debug!("connected to {}", self.endpoint);
        Ok(sock)
    }

    /// Test the connection with the server.
    ///
    /// Opens a connection and closes it again without sending anything.
    pub fn try_connect(&self) -> Result<()> {
        self.open_socket().map(|_| ())
    }

    /// Send `ping` and return the server's reply.
    pub fn ping(&self) -> Result<Reply> {
        self.send(&CommandRecord::ping())
    }

    /// Send one command and return whatever the server writes back in a
    /// single read.
    ///
    /// A server that closes the connection without writing anything back
    /// fails the exchange with `Error::Transport` at the read stage.
    pub fn send(&self, record: &CommandRecord) -> Result<Reply> {
        self.check()?;
        let mut sock = self.open_socket()?;
        let payload = record.encode()?;
        let reply = self.transact(&mut sock, &payload)?;
        info!(
            "sent {:?} ({} bytes) to {}, got {} byte reply",
            record.command(),
            reply.bytes_written(),
            self.endpoint,
            reply.body().len()
        );
        Ok(reply)
    }

    fn check(&self) -> Result<()> {
        if self.reply_buffer_size == 0 {
            return Err(Error::config("reply buffer size must be non-zero"));
        }
        Ok(())
    }

    fn transact<S: Read + Write>(&self, sock: &mut S, payload: &[u8]) -> Result<Reply> {
        // `write_all` keeps going after short writes and on `Interrupted`.
        sock.write_all(payload)
            .and_then(|()| sock.flush())
            .map_err(|e| Error::transport(Stage::Write, e))?;
        debug!("wrote {} bytes", payload.len());

        let mut buf = vec![0u8; self.reply_buffer_size];
        let n = read_once(sock, &mut buf).map_err(|e| Error::transport(Stage::Read, e))?;
        if n == 0 {
            return Err(Error::transport(
                Stage::Read,
                std::io::Error::new(IoErrorKind::UnexpectedEof, "connection closed without a reply"),
            ));
        }
        buf.truncate(n);
        debug!("read {} bytes", n);

        Ok(Reply::new(payload.len(), buf))
    }
}

/// One `read` call, retried only when interrupted.
fn read_once<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(ref e) if e.kind() == IoErrorKind::Interrupted => continue,
            res => return res,
        }
    }
}

/// Send `ping` to `endpoint` with default options.
pub fn send_ping(endpoint: &str) -> Result<Reply> {
    CommandClient::new(endpoint).ping()
}
