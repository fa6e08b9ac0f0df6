use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

/// Supplies interactive queries one line at a time.
#[async_trait]
pub trait QuerySource: Send {
    /// Next raw input line, or `None` at end of input.
    async fn next_query(&mut self) -> io::Result<Option<String>>;
}

/// Reads queries from any buffered async reader.
pub struct LineSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> QuerySource for LineSource<R> {
    async fn next_query(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// Standard input, where Ctrl-C while waiting counts as end of input.
pub struct StdinSource {
    inner: LineSource<BufReader<Stdin>>,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            inner: LineSource::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuerySource for StdinSource {
    async fn next_query(&mut self) -> io::Result<Option<String>> {
        tokio::select! {
            line = self.inner.next_query() => line,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted while waiting for input");
                Ok(None)
            }
        }
    }
}
