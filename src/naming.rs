//! File-name conventions shared by the gallery, the comic routes and the
//! renderer.
//!
//! ## Image filter
//!
//! A listing entry is an image when its extension is one of
//! [`IMAGE_EXTENSIONS`], compared case-insensitively. `Dragon.PNG` is an
//! image; `readme.txt` and `archive.png.zip` are not.
//!
//! ## Page numbers
//!
//! Comic pages carry their position somewhere in the file name, not always
//! as a prefix: `page-12.png`, `12.jpg`, `Tortueville_03.webp`. The page
//! number is the **first** run of ASCII digits in the name; a name without
//! digits is page 0. Sorting by this number is what makes `page10` follow
//! `page9` instead of `page1`.

/// Extensions accepted as gallery images (lowercase, without the dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Whether a file name ends in one of the image extensions.
pub fn is_image_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => IMAGE_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        _ => false,
    }
}

/// Drop a trailing image extension, leaving other names untouched.
///
/// - `"001-dawn.jpg"` → `"001-dawn"`
/// - `"notes.txt"` → `"notes.txt"`
pub fn strip_image_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if is_image_name(name) => stem,
        _ => name,
    }
}

/// First run of ASCII digits in `name`, or 0 when there is none. Runs too
/// long for a `u64` saturate to `u64::MAX`.
///
/// Works on full URLs as well as bare names, since only the first digit
/// run matters: callers pass the last path segment when the host or
/// repository name may contain digits.
pub fn page_number(name: &str) -> u64 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u64::MAX)
}

/// Last `/`-separated segment of a path or URL.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
