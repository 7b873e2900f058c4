//! Standalone HTML rendering of a [`GalleryView`].
//!
//! Produces one self-contained page: a CSS grid `columns` wide where each
//! tile is pinned to its packed cell and spans its footprint. Styles are
//! inlined so the file can be opened straight from disk.

use crate::gallery::{EmptyState, GalleryView, LoadStatus, Tile};
use crate::layout::Placement;
use maud::{DOCTYPE, Markup, html};

const CSS: &str = r#"
* { box-sizing: border-box; margin: 0; }
body { font-family: system-ui, sans-serif; background: #11111b; color: #e0def4; padding: 1.5rem; }
header { display: flex; justify-content: space-between; align-items: baseline; margin-bottom: 1rem; }
.bento { display: grid; gap: 0.5rem; grid-auto-rows: 10rem; }
.tile { position: relative; overflow: hidden; border-radius: 0.75rem; background: #1e1e2e; }
.tile img { width: 100%; height: 100%; object-fit: cover; display: block; }
.tile figcaption { position: absolute; bottom: 0; left: 0; right: 0; padding: 0.4rem 0.6rem;
  font-size: 0.8rem; background: linear-gradient(transparent, rgba(0,0,0,0.7)); }
.notice { padding: 3rem; text-align: center; opacity: 0.8; }
.error { color: #eb6f92; }
footer { margin-top: 1rem; opacity: 0.7; font-size: 0.85rem; }
"#;

/// Inline style placing a tile on the grid.
pub fn tile_style(placement: &Placement) -> String {
    let (rows, cols) = placement.size.footprint();
    match placement.cell {
        Some(cell) => format!(
            "grid-row: {} / span {rows}; grid-column: {} / span {cols};",
            cell.row + 1,
            cell.col + 1
        ),
        None => format!("grid-row: span {rows}; grid-column: span {cols};"),
    }
}

fn render_tile(tile: &Tile) -> Markup {
    let entry = &tile.entry;
    html! {
        figure.tile.(tile.placement.size.as_str())
            data-id=(entry.content_id)
            style=(tile_style(&tile.placement)) {
            img src=(entry.download_url)
                alt=(entry.display_name())
                loading="lazy"
                style=(format!("transform: scale({:.3});", tile.placement.zoom));
            figcaption { (entry.display_name()) }
        }
    }
}

fn render_notice(view: &GalleryView) -> Option<Markup> {
    if let LoadStatus::Failed { message, .. } = &view.status {
        return Some(html! { p.notice.error { (message) } });
    }
    match &view.empty {
        Some(EmptyState::NoMatches { query }) => {
            Some(html! { p.notice { "No fan art matches \"" (query) "\"." } })
        }
        Some(EmptyState::EmptyCollection) => {
            Some(html! { p.notice { "No fan art has been published yet." } })
        }
        None => None,
    }
}

/// Render the whole gallery page.
pub fn gallery_page(view: &GalleryView, columns: usize) -> Markup {
    let grid_style = format!("grid-template-columns: repeat({columns}, minmax(0, 1fr));");
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "La Grotte de Juju - Fan art" }
                style { (CSS) }
            }
            body {
                header {
                    h1 { "Fan art" }
                    @if let Some(label) = view.last_updated_label() {
                        span.updated { (label) }
                    }
                }
                @if let Some(notice) = render_notice(view) {
                    (notice)
                } @else {
                    section.bento style=(grid_style) {
                        @for tile in &view.tiles {
                            (render_tile(tile))
                        }
                    }
                }
                footer {
                    @if view.search_mode {
                        (view.matching) " of " (view.total) " images match \"" (view.query) "\""
                    } @else {
                        "Showing " (view.shown) " of " (view.total) " images"
                    }
                }
            }
        }
    }
}
