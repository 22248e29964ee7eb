//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use leafmark_core::models::format_timestamp;
use leafmark_core::{Bookmark, Notification, RecentFileItem};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print the list of recently opened documents
    pub fn print_recent(&self, items: &[RecentFileItem]) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("No recent files.");
                    return;
                }
                for item in items {
                    println!(
                        "{} | {} | {}",
                        format_timestamp(item.last_accessed),
                        truncate(&item.display_name, 35),
                        item.reference
                    );
                }
                println!("\n{} recent file(s)", items.len());
            }
            OutputFormat::Json => print_json(items),
            OutputFormat::Quiet => {
                for item in items {
                    println!("{}", item.reference);
                }
            }
        }
    }

    /// Print a document that finished loading
    pub fn print_opened(&self, item: &RecentFileItem, page_count: u32) {
        match self.format {
            OutputFormat::Human => {
                println!("Name:      {}", item.display_name);
                println!("Reference: {}", item.reference);
                println!("Pages:     {}", page_count);
                println!("Opened:    {}", format_timestamp(item.last_accessed));
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "reference": item.reference,
                        "display_name": item.display_name,
                        "last_accessed": item.last_accessed,
                        "page_count": page_count
                    })
                );
            }
            OutputFormat::Quiet => println!("{}", item.reference),
        }
    }

    /// Print a single bookmark
    pub fn print_bookmark(&self, bookmark: &Bookmark) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", bookmark.id);
                println!("Title:    {}", bookmark.title);
                println!("Page:     {}", bookmark.page_number());
                if !bookmark.summary.is_empty() {
                    println!("Summary:  {}", bookmark.summary);
                }
                println!("Document: {}", bookmark.pdf_uri);
                println!("Created:  {}", format_timestamp(bookmark.creation_date));
            }
            OutputFormat::Json => print_json(bookmark),
            OutputFormat::Quiet => println!("{}", bookmark.id),
        }
    }

    /// Print a list of bookmarks
    pub fn print_bookmarks(&self, bookmarks: &[Bookmark]) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No bookmarks found.");
                    return;
                }
                for bookmark in bookmarks {
                    println!(
                        "{:>5} | p.{:<4} | {}",
                        bookmark.id,
                        bookmark.page_number(),
                        truncate(&bookmark.display_label(), 60)
                    );
                    if !bookmark.summary.is_empty() {
                        println!("      | {}", truncate_line(&bookmark.summary, 60));
                    }
                }
                println!("\n{} bookmark(s)", bookmarks.len());
            }
            OutputFormat::Json => print_json(bookmarks),
            OutputFormat::Quiet => {
                for bookmark in bookmarks {
                    println!("{}", bookmark.id);
                }
            }
        }
    }

    /// Print a message raised by the session controller
    pub fn notify(&self, notification: &Notification) {
        match self.format {
            OutputFormat::Human => {
                if notification.is_error() {
                    eprintln!("⚠ {}", notification);
                } else {
                    println!("{}", notification);
                }
            }
            OutputFormat::Json => {
                let status = if notification.is_error() {
                    "error"
                } else {
                    "info"
                };
                println!(
                    "{}",
                    serde_json::json!({"status": status, "message": notification.to_string()})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
