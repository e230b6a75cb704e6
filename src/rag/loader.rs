// file: src/rag/loader.rs
// description: loads plain text from URLs, markdown files, text files and directories
// reference: https://docs.rs/pulldown-cmark, https://docs.rs/walkdir

use crate::error::{Result, ToolkitError};
use crate::filesystem::decode_with_fallback;
use crate::models::Document;
use crate::utils::Validator;
use lazy_static::lazy_static;
use pulldown_cmark::{Event, Parser, TagEnd};
use regex::Regex;
use reqwest::Client;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions picked up when a directory is given as a source
const TEXT_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "rst", "html", "htm", "json", "toml", "yaml", "yml", "csv", "rs",
    "py", "js", "ts",
];

lazy_static! {
    static ref SCRIPT_STYLE: Regex =
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"(?s)<[^>]+>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"[ \t\r\f\v]+").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n+").unwrap();
}

pub struct DocumentLoader {
    client: Client,
}

impl DocumentLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolves a source string to documents; directories yield one per file
    pub async fn load(&self, source: &str) -> Result<Vec<Document>> {
        if Validator::is_http_url(source) {
            return Ok(vec![self.load_url(source).await?]);
        }

        let path = Path::new(source);
        if path.is_dir() {
            return load_directory(path);
        }
        if path.is_file() {
            return Ok(vec![load_file(path)?]);
        }

        Err(ToolkitError::NotFound(format!("Source not found: {}", source)))
    }

    async fn load_url(&self, url: &str) -> Result<Document> {
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolkitError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let html = response.text().await?;
        Ok(Document::new(url.to_string(), html_to_text(&html)))
    }
}

fn load_directory(root: &Path) -> Result<Vec<Document>> {
    info!("Loading documents from {}", root.display());
    let mut documents = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() || !is_text_like(entry.path()) {
            continue;
        }

        match load_file(entry.path()) {
            Ok(doc) if !doc.is_empty() => documents.push(doc),
            Ok(_) => debug!("Skipping empty file: {}", entry.path().display()),
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    info!("Loaded {} documents", documents.len());
    Ok(documents)
}

fn load_file(path: &Path) -> Result<Document> {
    let (text, _) = decode_with_fallback(std::fs::read(path)?);
    let source = path.display().to_string();

    let content = match extension(path).as_deref() {
        Some("md") | Some("markdown") => markdown_to_text(&text),
        Some("html") | Some("htm") => html_to_text(&text),
        _ => text,
    };

    Ok(Document::new(source, content))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_text_like(path: &Path) -> bool {
    extension(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

/// Drops scripts, styles and tags, then collapses runs of whitespace
pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE.replace_all(html, " ");
    let without_tags = HTML_TAG.replace_all(&without_scripts, "\n");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let spaced = WHITESPACE.replace_all(&decoded, " ");
    let lines: Vec<&str> = spaced.lines().map(str::trim).collect();
    BLANK_LINES
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

/// Renders markdown to plain text, one paragraph per block
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::CodeBlock)
            | Event::End(TagEnd::Item) => text.push_str("\n\n"),
            _ => {}
        }
    }

    BLANK_LINES.replace_all(&text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_html_to_text() {
        let html = "<html><head><style>p { color: red; }</style><script>alert('x')</script></head>\
                    <body><h1>Title</h1><p>Fish &amp; chips</p></body></html>";
        assert_eq!(html_to_text(html), "Title\n\nFish & chips");
    }

    #[test]
    fn test_markdown_to_text() {
        let md = "# Heading\n\nSome *emphasis* and `code`.\n\n- one\n- two\n";
        assert_eq!(
            markdown_to_text(md),
            "Heading\n\nSome emphasis and code.\n\none\n\ntwo"
        );
    }

    #[tokio::test]
    async fn test_load_directory_filters_and_orders() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.md"), "# B\n\nbeta").unwrap();
        std::fs::write(temp.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(temp.path().join("empty.txt"), "   ").unwrap();
        std::fs::write(temp.path().join("image.png"), [0u8, 1, 2]).unwrap();

        let loader = DocumentLoader::new(Client::new());
        let docs = loader
            .load(temp.path().to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].source.ends_with("a.txt"));
        assert_eq!(docs[0].content, "alpha");
        assert!(docs[1].source.ends_with("b.md"));
        assert_eq!(docs[1].content, "B\n\nbeta");
    }

    #[tokio::test]
    async fn test_missing_source() {
        let loader = DocumentLoader::new(Client::new());
        let err = loader.load("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, ToolkitError::NotFound(_)));
    }
}
