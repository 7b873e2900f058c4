//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity (tile, comic) leads with its positional index and display
//! name; identifiers, URLs and layout details follow as indented context
//! lines. The output reads as an inventory of what the gallery would show.
//!
//! # Output Format
//!
//! ## Gallery
//!
//! ```text
//! Fan art: 3 of 40 images, newest first (Last updated 2024-05-02)
//! 001 Juju-Dragon
//!     Tile: large x1.12 at row 1, col 1
//!     Id: 5f2c9e...
//! 002 Tortue
//!     Tile: small x1.03 at row 1, col 3
//!     Id: 91ab04...
//!
//! 37 more images (load more, or --all)
//! ```
//!
//! ## Comics
//!
//! ```text
//! 001 Tortueville (12 pages)
//!     Created: 2024-03-09
//!     Cover: https://raw.githubusercontent.com/.../cover.png
//!     Description: The turtles' town.
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::comics::ComicSummary;
use crate::gallery::{EmptyState, GalleryView, LoadStatus, Tile};
use crate::types::SortOrder;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn sort_label(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Newest => "newest first",
        SortOrder::Oldest => "oldest first",
        SortOrder::Alphabetical => "alphabetical",
    }
}

fn tile_lines(index: usize, tile: &Tile) -> Vec<String> {
    let p = &tile.placement;
    let position = match p.cell {
        Some(cell) => format!("at row {}, col {}", cell.row + 1, cell.col + 1),
        None => "unplaced".to_string(),
    };
    vec![
        format!("{} {}", format_index(index), tile.entry.display_name()),
        format!("{}Tile: {} x{:.2} {}", indent(1), p.size, p.zoom, position),
        format!("{}Id: {}", indent(1), tile.entry.content_id),
    ]
}

// ============================================================================
// Gallery
// ============================================================================

/// Format the render-ready gallery view.
pub fn format_gallery_view(view: &GalleryView) -> Vec<String> {
    if let LoadStatus::Failed { message, .. } = &view.status {
        return vec![format!("Error: {message}"), "Retry with `refresh`.".to_string()];
    }

    let mut lines = Vec::new();
    let mut header = if view.search_mode {
        format!(
            "Fan art: {} of {} images match \"{}\", {}",
            view.matching,
            view.total,
            view.query,
            sort_label(view.sort_order)
        )
    } else {
        format!(
            "Fan art: {} of {} images, {}",
            view.shown,
            view.total,
            sort_label(view.sort_order)
        )
    };
    if let Some(label) = view.last_updated_label() {
        header.push_str(&format!(" ({label})"));
    }
    lines.push(header);

    match &view.empty {
        Some(EmptyState::NoMatches { query }) => {
            lines.push(format!("No images match \"{query}\"."));
        }
        Some(EmptyState::EmptyCollection) => {
            lines.push("The gallery is empty.".to_string());
        }
        None => {}
    }

    for (i, tile) in view.tiles.iter().enumerate() {
        lines.extend(tile_lines(i + 1, tile));
    }

    if view.has_more {
        lines.push(String::new());
        lines.push(format!(
            "{} more images (load more, or --all)",
            view.total - view.shown
        ));
    }
    lines
}

/// Print the gallery view to stdout.
pub fn print_gallery_view(view: &GalleryView) {
    for line in format_gallery_view(view) {
        println!("{}", line);
    }
}

// ============================================================================
// Comics
// ============================================================================

/// Format comic summaries.
pub fn format_comics(comics: &[ComicSummary]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, comic) in comics.iter().enumerate() {
        lines.push(format!(
            "{} {} ({} pages)",
            format_index(i + 1),
            comic.name,
            comic.pages.len()
        ));
        lines.push(format!(
            "{}Created: {}",
            indent(1),
            comic.created_at.format("%Y-%m-%d")
        ));
        if let Some(cover) = &comic.cover_image {
            lines.push(format!("{}Cover: {}", indent(1), cover));
        }
        lines.push(format!(
            "{}Description: {}",
            indent(1),
            truncate_desc(&comic.description, 60)
        ));
    }
    if comics.is_empty() {
        lines.push("No comics found.".to_string());
    }
    lines
}

/// Print comic summaries to stdout.
pub fn print_comics(comics: &[ComicSummary]) {
    for line in format_comics(comics) {
        println!("{}", line);
    }
}
