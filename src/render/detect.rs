//! File-type detection from the upstream URL path. Matching is
//! case-insensitive and purely syntactic; the upstream Content-Type header
//! is deliberately ignored (raw-file hosts routinely serve everything as
//! text/plain or application/octet-stream).

/// Detected class of an upstream file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Mdx,
    Code,
    Plaintext,
    Asciidoc,
    Org,
    Unsupported,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Markdown => "markdown",
            ContentType::Mdx => "mdx",
            ContentType::Code => "code",
            ContentType::Plaintext => "plaintext",
            ContentType::Asciidoc => "asciidoc",
            ContentType::Org => "org",
            ContentType::Unsupported => "unsupported",
        }
    }
}

/// Detection result: class plus the highlighter language token and a
/// human-readable label for the header badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub content_type: ContentType,
    pub language: &'static str,
    pub label: &'static str,
}

impl FileInfo {
    fn new(content_type: ContentType, language: &'static str, label: &'static str) -> Self {
        Self {
            content_type,
            language,
            label,
        }
    }
}

/// Exact filenames (case-insensitive) that identify a language without an
/// extension.
fn special_name(name: &str) -> Option<(&'static str, &'static str)> {
    Some(match name {
        "dockerfile" => ("docker", "Dockerfile"),
        "makefile" => ("makefile", "Makefile"),
        "jenkinsfile" => ("groovy", "Jenkinsfile"),
        _ => return None,
    })
}

fn code_ext(ext: &str) -> Option<(&'static str, &'static str)> {
    Some(match ext {
        ".py" => ("python", "Python"),
        ".go" => ("go", "Go"),
        ".js" => ("javascript", "JavaScript"),
        ".ts" => ("typescript", "TypeScript"),
        ".rs" => ("rust", "Rust"),
        ".c" => ("c", "C"),
        ".h" => ("c", "C Header"),
        ".cpp" => ("cpp", "C++"),
        ".hpp" => ("cpp", "C++ Header"),
        ".java" => ("java", "Java"),
        ".rb" => ("ruby", "Ruby"),
        ".lua" => ("lua", "Lua"),
        ".pl" => ("perl", "Perl"),
        ".sh" => ("bash", "Shell"),
        ".bash" => ("bash", "Bash"),
        ".zsh" => ("zsh", "Zsh"),
        ".fish" => ("fish", "Fish"),
        ".yaml" => ("yaml", "YAML"),
        ".yml" => ("yaml", "YAML"),
        ".json" => ("json", "JSON"),
        ".toml" => ("toml", "TOML"),
        ".xml" => ("xml", "XML"),
        ".csv" => ("csv", "CSV"),
        ".sql" => ("sql", "SQL"),
        ".graphql" => ("graphql", "GraphQL"),
        ".tf" => ("hcl", "Terraform"),
        ".hcl" => ("hcl", "HCL"),
        ".diff" => ("diff", "Diff"),
        ".patch" => ("diff", "Patch"),
        ".dockerfile" => ("docker", "Dockerfile"),
        _ => return None,
    })
}

fn is_plaintext_ext(ext: &str) -> bool {
    matches!(
        ext,
        ".txt" | ".text" | ".log" | ".conf" | ".cfg" | ".ini" | ".env"
    )
}

/// Extension including the leading dot, from the last dot in the name.
/// Unlike `Path::extension` this treats dotfiles like `.env` as having an
/// extension, matching how raw-file hosts name them.
fn file_ext(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) => &name[i..],
        None => "",
    }
}

/// Classifies a URL path into a content type, language, and label.
pub fn detect_file(url_path: &str) -> FileInfo {
    let filename = url_path.rsplit('/').next().unwrap_or("");
    if filename.is_empty() {
        return FileInfo::new(ContentType::Unsupported, "", "Unknown");
    }

    let lower = filename.to_ascii_lowercase();
    if let Some((language, label)) = special_name(&lower) {
        return FileInfo::new(ContentType::Code, language, label);
    }

    let ext = file_ext(&lower);
    match ext {
        ".mdx" => FileInfo::new(ContentType::Mdx, "", "MDX"),
        ".md" | ".markdown" | ".mdown" | ".mkd" => {
            FileInfo::new(ContentType::Markdown, "", "Markdown")
        }
        ".adoc" | ".asciidoc" => FileInfo::new(ContentType::Asciidoc, "", "AsciiDoc"),
        ".org" => FileInfo::new(ContentType::Org, "", "Org"),
        _ => {
            if let Some((language, label)) = code_ext(ext) {
                FileInfo::new(ContentType::Code, language, label)
            } else if is_plaintext_ext(ext) {
                FileInfo::new(ContentType::Plaintext, "", "Plain Text")
            } else {
                FileInfo::new(ContentType::Unsupported, "", "Unknown")
            }
        }
    }
}

/// True for paths the URL rewriter should route back through the proxy.
pub fn is_markdown_link(url_path: &str) -> bool {
    let filename = url_path.rsplit('/').next().unwrap_or("");
    matches!(
        file_ext(&filename.to_ascii_lowercase()),
        ".md" | ".markdown" | ".mdown" | ".mkd" | ".mdx"
    )
}
