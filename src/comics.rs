//! Comic library: one sub-folder per comic, one image per page.
//!
//! ```text
//! BD/
//! ├── Tortueville/
//! │   ├── cover.png          # Cover (by name), otherwise first page
//! │   ├── page1.png
//! │   ├── page2.png
//! │   ├── page10.png         # Sorted by number: after page2
//! │   └── description.txt    # Optional blurb
//! └── Juju-Origins/
//!     └── ...
//! ```
//!
//! Everything here degrades instead of failing: a folder that can't be
//! listed ends up empty and is dropped, a missing description gets a
//! generated one, and when the top-level listing fails the placeholder
//! library from [`fallback_comics`] is served.

use crate::naming::{is_image_name, last_segment};
use crate::remote::{ContentApi, EntryKind, FetchError, RemoteEntry};
use crate::viewer::sort_pages;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

/// File-name fragments that mark a cover, in priority order.
const COVER_HINTS: &[&str] = &["cover", "couverture", "thumb", "thumbnail", "1", "01", "001"];

/// Summary of one comic, as served by `GET /api/bd-folders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicSummary {
    pub name: String,
    pub path: String,
    pub cover_image: Option<String>,
    pub pages: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Pages of one comic, as served by `POST /api/bd-folders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderPages {
    pub name: String,
    pub pages: Vec<String>,
}

/// Image files of a folder listing as raw URLs, in page order.
pub fn comic_pages(items: &[RemoteEntry], raw_root: &str) -> Vec<String> {
    let root = raw_root.trim_end_matches('/');
    let mut pages: Vec<String> = items
        .iter()
        .filter(|item| item.kind == EntryKind::File && is_image_name(&item.name))
        .map(|item| format!("{root}/{}", item.path))
        .collect();
    sort_pages(&mut pages);
    pages
}

/// Cover page: the first page whose file name contains a cover hint,
/// otherwise the first page.
pub fn pick_cover(pages: &[String]) -> Option<String> {
    COVER_HINTS
        .iter()
        .find_map(|hint| {
            pages
                .iter()
                .find(|url| last_segment(url).to_lowercase().contains(hint))
        })
        .or_else(|| pages.first())
        .cloned()
}

/// `description.txt` or `readme.txt`, any case.
fn description_file(items: &[RemoteEntry]) -> Option<&RemoteEntry> {
    items.iter().find(|item| {
        item.kind == EntryKind::File && {
            let name = item.name.to_lowercase();
            name == "description.txt" || name == "readme.txt"
        }
    })
}

pub fn default_description(name: &str, page_count: usize) -> String {
    format!("Comic \"{name}\" - {page_count} pages")
}

/// Stand-in creation date for a folder without history: 2024-01-01 plus
/// `index` days. Later folders in the listing count as newer.
pub fn synthetic_date(index: usize) -> DateTime<Utc> {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    start + Duration::days(index as i64)
}

async fn summarize(
    api: &dyn ContentApi,
    folder: &RemoteEntry,
    index: usize,
    raw_root: &str,
) -> ComicSummary {
    let items = match api.list(&folder.path).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(folder = %folder.name, error = %e, "comic folder listing failed");
            Vec::new()
        }
    };
    let pages = comic_pages(&items, raw_root);

    let mut description = default_description(&folder.name, pages.len());
    if let Some(file) = description_file(&items) {
        let url = file
            .download_url
            .clone()
            .unwrap_or_else(|| api.raw_url(&file.path));
        match api.fetch_text(&url).await {
            Ok(text) if !text.trim().is_empty() => description = text.trim().to_string(),
            Ok(_) => {}
            Err(e) => tracing::warn!(folder = %folder.name, error = %e, "description fetch failed"),
        }
    }

    let created_at = match api.latest_commit(&folder.path).await {
        Ok(Some(at)) => at,
        _ => synthetic_date(index),
    };

    ComicSummary {
        name: folder.name.clone(),
        path: folder.path.clone(),
        cover_image: pick_cover(&pages),
        pages,
        description,
        created_at,
    }
}

/// Summaries of every non-empty comic under `root`, newest first.
pub async fn list_comics(
    api: &dyn ContentApi,
    root: &str,
) -> Result<Vec<ComicSummary>, FetchError> {
    let listing = api.list(root).await?;
    let raw_root = api.raw_url("");
    let folders: Vec<&RemoteEntry> = listing
        .iter()
        .filter(|e| e.kind == EntryKind::Dir)
        .collect();

    let summaries = join_all(
        folders
            .iter()
            .enumerate()
            .map(|(index, folder)| summarize(api, folder, index, &raw_root)),
    )
    .await;

    let mut comics: Vec<ComicSummary> = summaries
        .into_iter()
        .filter(|comic| !comic.pages.is_empty())
        .collect();
    comics.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tracing::info!(root, comics = comics.len(), "listed comic folders");
    Ok(comics)
}

/// [`list_comics`], or the placeholder library when the listing fails or
/// finds nothing.
pub async fn comics_or_fallback(api: &dyn ContentApi, root: &str) -> Vec<ComicSummary> {
    match list_comics(api, root).await {
        Ok(comics) if !comics.is_empty() => comics,
        Ok(_) => {
            tracing::warn!(root, "no comic folders found, serving placeholders");
            fallback_comics()
        }
        Err(e) => {
            tracing::warn!(root, error = %e, "comic listing failed, serving placeholders");
            fallback_comics()
        }
    }
}

/// Pages of the comic `name` under `root`.
pub async fn folder_pages(
    api: &dyn ContentApi,
    root: &str,
    name: &str,
) -> Result<FolderPages, FetchError> {
    let path = format!("{}/{}", root.trim_end_matches('/'), name);
    let items = api.list(&path).await?;
    Ok(FolderPages {
        name: name.to_string(),
        pages: comic_pages(&items, &api.raw_url("")),
    })
}

/// `page_colors` holds one `(background, text)` hex pair per page.
fn placeholder(
    name: &str,
    slug: &str,
    cover_color: &str,
    page_colors: &[(&str, &str)],
    description: &str,
    day: u32,
) -> ComicSummary {
    let title = name.replace(' ', "+");
    ComicSummary {
        name: name.to_string(),
        path: format!("BD/{slug}"),
        cover_image: Some(format!(
            "https://via.placeholder.com/400x600/{cover_color}/ffffff?text={title}"
        )),
        pages: page_colors
            .iter()
            .enumerate()
            .map(|(i, (background, text))| {
                format!(
                    "https://via.placeholder.com/800x1200/{background}/{text}?text=Page+{}",
                    i + 1
                )
            })
            .collect(),
        description: description.to_string(),
        created_at: Utc
            .with_ymd_and_hms(2024, 1, day, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    }
}

/// Placeholder library served when the host is unreachable.
pub fn fallback_comics() -> Vec<ComicSummary> {
    vec![
        placeholder(
            "Aventure Mystique",
            "Aventure-Mystique",
            "1a1a2e",
            &[
                ("1a1a2e", "ffffff"),
                ("16213e", "ffffff"),
                ("0f3460", "ffffff"),
                ("533483", "ffffff"),
                ("7209b7", "ffffff"),
            ],
            "An epic adventure through a mystical world full of magic and fantastic creatures.",
            15,
        ),
        placeholder(
            "Sci-Fi Chronicles",
            "Sci-Fi-Chronicles",
            "0f4c75",
            &[
                ("0f4c75", "ffffff"),
                ("3282b8", "ffffff"),
                ("bbe1fa", "000000"),
                ("1b262c", "ffffff"),
            ],
            "Space exploration and technological discoveries in a distant future.",
            10,
        ),
        placeholder(
            "Comédie Urbaine",
            "Comedie-Urbaine",
            "ff6b6b",
            &[("ff6b6b", "ffffff"), ("ffa726", "ffffff"), ("66bb6a", "ffffff")],
            "The hilarious adventures of a cast of characters in the modern city.",
            5,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::backend::tests::{MOCK_RAW_ROOT, MockApi};
    use crate::test_helpers::jan;

    fn page(folder: &str, name: &str) -> RemoteEntry {
        RemoteEntry::file(name, &format!("BD/{folder}/{name}"), "sha", None)
    }

    fn raw(folder: &str, name: &str) -> String {
        format!("{MOCK_RAW_ROOT}/BD/{folder}/{name}")
    }

    // =========================================================================
    // comic_pages / pick_cover
    // =========================================================================

    #[test]
    fn pages_filtered_and_sorted_naturally() {
        let items = vec![
            page("X", "page10.png"),
            page("X", "page2.png"),
            page("X", "notes.txt"),
            page("X", "page1.JPG"),
            RemoteEntry::dir("extras", "BD/X/extras"),
        ];
        let pages = comic_pages(&items, "https://raw.test/org/repo/main/");
        assert_eq!(
            pages,
            vec![
                "https://raw.test/org/repo/main/BD/X/page1.JPG",
                "https://raw.test/org/repo/main/BD/X/page2.png",
                "https://raw.test/org/repo/main/BD/X/page10.png",
            ]
        );
    }

    #[test]
    fn cover_by_name_wins() {
        let pages = vec![
            "https://r/BD/Tome2/page0.png".to_string(),
            "https://r/BD/Tome2/page1.png".to_string(),
            "https://r/BD/Tome2/Couverture.png".to_string(),
        ];
        assert_eq!(pick_cover(&pages), Some(pages[2].clone()));
    }

    #[test]
    fn cover_hint_order_respected() {
        let pages = vec![
            "https://r/BD/A/thumb.png".to_string(),
            "https://r/BD/A/cover.png".to_string(),
        ];
        assert_eq!(pick_cover(&pages).as_deref(), Some("https://r/BD/A/cover.png"));
    }

    #[test]
    fn cover_ignores_folder_digits() {
        let pages = vec![
            "https://r/BD/Tome1/a.png".to_string(),
            "https://r/BD/Tome1/b.png".to_string(),
        ];
        assert_eq!(pick_cover(&pages).as_deref(), Some("https://r/BD/Tome1/a.png"));
    }

    #[test]
    fn cover_of_empty_comic_is_none() {
        assert_eq!(pick_cover(&[]), None);
    }

    #[test]
    fn synthetic_dates_step_by_day() {
        assert_eq!(synthetic_date(0), jan(1));
        assert_eq!(synthetic_date(4), jan(5));
    }

    // =========================================================================
    // list_comics
    // =========================================================================

    fn library() -> MockApi {
        MockApi::new()
            .with_listing(
                "BD",
                vec![
                    RemoteEntry::dir("Alpha", "BD/Alpha"),
                    RemoteEntry::dir("Empty", "BD/Empty"),
                    RemoteEntry::dir("Beta", "BD/Beta"),
                    RemoteEntry::file("index.md", "BD/index.md", "sha", None),
                ],
            )
            .with_listing(
                "BD/Alpha",
                vec![
                    page("Alpha", "2.png"),
                    page("Alpha", "1.png"),
                    RemoteEntry::file(
                        "README.txt",
                        "BD/Alpha/README.txt",
                        "sha",
                        Some("https://raw.test/alpha-readme"),
                    ),
                ],
            )
            .with_text("https://raw.test/alpha-readme", "  The first one.\n")
            .with_listing("BD/Empty", vec![page("Empty", "notes.txt")])
            .with_listing("BD/Beta", vec![page("Beta", "cover.webp"), page("Beta", "p1.png")])
            .with_commit("BD/Beta", jan(20))
    }

    #[tokio::test]
    async fn lists_non_empty_comics_newest_first() {
        let api = library();
        let comics = list_comics(&api, "BD").await.unwrap();
        let names: Vec<&str> = comics.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);

        let beta = &comics[0];
        assert_eq!(beta.created_at, jan(20));
        assert_eq!(beta.cover_image, Some(raw("Beta", "cover.webp")));
        assert_eq!(beta.description, "Comic \"Beta\" - 2 pages");

        let alpha = &comics[1];
        assert_eq!(alpha.created_at, synthetic_date(0));
        assert_eq!(alpha.pages, vec![raw("Alpha", "1.png"), raw("Alpha", "2.png")]);
        assert_eq!(alpha.description, "The first one.");
    }

    #[tokio::test]
    async fn failing_folder_is_dropped_not_fatal() {
        let api = MockApi::new()
            .with_listing(
                "BD",
                vec![RemoteEntry::dir("Good", "BD/Good"), RemoteEntry::dir("Bad", "BD/Bad")],
            )
            .with_listing("BD/Good", vec![page("Good", "1.png")])
            .with_listing_error("BD/Bad", FetchError::Network("reset".into()));
        let comics = list_comics(&api, "BD").await.unwrap();
        assert_eq!(comics.len(), 1);
        assert_eq!(comics[0].name, "Good");
    }

    #[tokio::test]
    async fn top_level_failure_serves_placeholders() {
        let api = MockApi::new()
            .with_listing_error("BD", FetchError::RateLimited { reset_at: None });
        assert!(list_comics(&api, "BD").await.is_err());
        let comics = comics_or_fallback(&api, "BD").await;
        assert_eq!(comics, fallback_comics());
    }

    #[tokio::test]
    async fn no_folders_serves_placeholders() {
        let api = MockApi::new().with_listing("BD", vec![]);
        assert_eq!(comics_or_fallback(&api, "BD").await.len(), 3);
    }

    #[tokio::test]
    async fn folder_pages_lists_one_comic() {
        let api = library();
        let pages = folder_pages(&api, "BD/", "Alpha").await.unwrap();
        assert_eq!(pages.name, "Alpha");
        assert_eq!(pages.pages.len(), 2);
        assert!(pages.pages[0].ends_with("/1.png"));
    }

    #[tokio::test]
    async fn folder_pages_propagates_failure() {
        let api = MockApi::new();
        assert!(folder_pages(&api, "BD", "Nope").await.is_err());
    }

    // =========================================================================
    // Fallback data
    // =========================================================================

    #[test]
    fn fallback_has_three_placeholder_comics() {
        let comics = fallback_comics();
        let summary: Vec<(&str, usize)> = comics
            .iter()
            .map(|c| (c.name.as_str(), c.pages.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Aventure Mystique", 5),
                ("Sci-Fi Chronicles", 4),
                ("Comédie Urbaine", 3),
            ]
        );
        assert_eq!(comics[0].path, "BD/Aventure-Mystique");
        assert_eq!(comics[0].created_at, jan(15));
        assert!(comics[2].pages[2].ends_with("text=Page+3"));
    }

    #[test]
    fn light_placeholder_page_uses_dark_text() {
        let comics = fallback_comics();
        assert_eq!(
            comics[1].pages[2],
            "https://via.placeholder.com/800x1200/bbe1fa/000000?text=Page+3"
        );
        assert_eq!(
            comics[1].pages[1],
            "https://via.placeholder.com/800x1200/3282b8/ffffff?text=Page+2"
        );
    }

    #[test]
    fn summary_serializes_camel_case() {
        let json = serde_json::to_value(&fallback_comics()[1]).unwrap();
        assert!(json.get("coverImage").is_some());
        assert_eq!(json["createdAt"], "2024-01-10T00:00:00Z");
    }
}
