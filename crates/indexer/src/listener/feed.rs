//! Newline-delimited JSON block feed.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::event::BlockEvents;

/// Reads one [`BlockEvents`] per line. Blank lines are ignored.
pub struct BlockFeed<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl BlockFeed<BufReader<File>> {
    /// Open a feed file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open event feed: {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> BlockFeed<R> {
    /// Wrap any buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Next block, or `None` at end of input.
    pub async fn next_block(&mut self) -> Result<Option<BlockEvents>> {
        loop {
            let Some(line) = self
                .lines
                .next_line()
                .await
                .with_context(|| format!("Failed to read feed line {}", self.line_number + 1))?
            else {
                return Ok(None);
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let block = serde_json::from_str(&line)
                .with_context(|| format!("Malformed block at feed line {}", self.line_number))?;
            return Ok(Some(block));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_blocks_and_skips_blank_lines() {
        let input = concat!(
            r#"{"block_number": 1, "block_timestamp": 1000, "events": []}"#,
            "\n\n",
            r#"{"block_number": 2, "block_timestamp": 2000}"#,
            "\n",
        );
        let mut feed = BlockFeed::new(input.as_bytes());

        assert_eq!(feed.next_block().await.unwrap().unwrap().block_number, 1);
        let second = feed.next_block().await.unwrap().unwrap();
        assert_eq!(second.block_number, 2);
        assert!(second.events.is_empty());
        assert!(feed.next_block().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_reports_line_number() {
        let input = "{\"block_number\": 1, \"block_timestamp\": 0}\nnot json\n";
        let mut feed = BlockFeed::new(input.as_bytes());

        feed.next_block().await.unwrap();
        let err = feed.next_block().await.unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
