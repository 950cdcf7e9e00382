use std::io::Write;
use std::path::PathBuf;

use newswatch_core::error::SinkError;
use newswatch_core::models::ScrapedArticle;
use newswatch_core::traits::ArticleSink;

/// Writes each scraped article as one JSON object per line, either to
/// stdout or appended to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    target: Target,
}

#[derive(Debug, Clone)]
enum Target {
    Stdout,
    File(PathBuf),
}

impl JsonLinesSink {
    pub fn stdout() -> Self {
        Self {
            target: Target::Stdout,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
        }
    }

    fn encode(batch: &[ScrapedArticle]) -> Result<Vec<u8>, SinkError> {
        let mut buf = Vec::new();
        for article in batch {
            serde_json::to_writer(&mut buf, article)
                .map_err(|e| SinkError::Ingest(e.to_string()))?;
            buf.push(b'\n');
        }
        Ok(buf)
    }
}

impl ArticleSink for JsonLinesSink {
    async fn ingest(&self, batch: Vec<ScrapedArticle>) -> Result<(), SinkError> {
        let buf = Self::encode(&batch)?;
        match &self.target {
            Target::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(&buf)
                    .and_then(|_| out.flush())
                    .map_err(|e| SinkError::Ingest(e.to_string()))?;
            }
            Target::File(path) => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| SinkError::Ingest(e.to_string()))?;
                file.write_all(&buf)
                    .map_err(|e| SinkError::Ingest(e.to_string()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(url: &str) -> ScrapedArticle {
        ScrapedArticle {
            source_name: "verge".into(),
            url: url.into(),
            heading: "Heading".into(),
            content: "Body text".into(),
            discovered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn file_sink_appends_one_line_per_article() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.jsonl");
        let sink = JsonLinesSink::file(&path);

        sink.ingest(vec![article("https://a.test/1")]).await.unwrap();
        sink.ingest(vec![article("https://a.test/2"), article("https://a.test/3")])
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["source_name"], "verge");
            assert!(value["url"].as_str().unwrap().starts_with("https://a.test/"));
        }
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.jsonl");
        let sink = JsonLinesSink::file(&path);

        sink.ingest(Vec::new()).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.is_empty());
    }
}
