//! Translation of raw list entries into normalized catalog entries.

use std::collections::BTreeMap;

use crate::fetch::imdb::RawTitle;
use crate::types::{MediaType, Meta};

/// Translates one raw entry.
///
/// Returns `None` when the raw type tag is not a supported media type;
/// such entries do not appear in any catalog.
pub fn to_meta(raw: &RawTitle, poster_width: u32) -> Option<Meta> {
    let media_type = match raw.kind.as_deref() {
        Some("featureFilm") => MediaType::Movie,
        Some("series") => MediaType::Series,
        _ => return None,
    };

    let primary = raw.primary.as_ref();
    let name = primary.and_then(|primary| {
        let title = primary.title.as_deref()?;
        Some(format!("{title}{}", year_suffix(&primary.year)))
    });
    let poster = raw
        .poster
        .as_ref()
        .and_then(|poster| poster.url.as_deref())
        .map(|url| resize_poster(url, poster_width));

    Some(Meta {
        id: raw.id.clone(),
        name,
        poster,
        media_type,
    })
}

/// Partitions raw entries into per-media-type catalogs, preserving their
/// order and dropping entries with unrecognized type tags.
pub fn partition_titles(titles: &[RawTitle], poster_width: u32) -> BTreeMap<MediaType, Vec<Meta>> {
    let mut by_type: BTreeMap<_, Vec<_>> = MediaType::all()
        .into_iter()
        .map(|media_type| (media_type, Vec::new()))
        .collect();

    for raw in titles {
        if let Some(meta) = to_meta(raw, poster_width) {
            by_type.entry(meta.media_type).or_default().push(meta);
        }
    }

    by_type
}

/// The ` (2001)` / ` (2001-2005)` display suffix, empty when no year is known.
fn year_suffix(years: &[u16]) -> String {
    match years {
        [] => String::new(),
        [year] => format!(" ({year})"),
        [start, rest @ ..] => format!(" ({start}-{})", rest[0]),
    }
}

/// Rewrites a poster URL to request the given width.
///
/// Only URLs from the recognized image hosts carry the `._V1_` rendition
/// marker this relies on; everything else is passed through untouched.
pub fn resize_poster(url: &str, width: u32) -> String {
    if !url.contains("amazon.com") && !url.contains("imdb.com") {
        return url.to_owned();
    }

    if let Some(marker) = url.find("._V1_.") {
        let mut resized = String::with_capacity(url.len() + 6);
        resized.push_str(&url[..marker]);
        resized.push_str(&format!("._V1_SX{width}."));
        resized.push_str(&url[marker + "._V1_.".len()..]);
        resized
    } else if let Some(marker) = url.find("._V1_") {
        let extension = url.rsplit('.').next().unwrap_or_default();
        format!("{}._V1_SX{width}.{extension}", &url[..marker])
    } else {
        url.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use crate::fetch::imdb::{RawPoster, RawPrimary};

    use super::*;

    fn raw(kind: &str, title: &str, year: &[u16]) -> RawTitle {
        RawTitle {
            id: Some("tt0000001".to_owned()),
            kind: Some(kind.to_owned()),
            primary: Some(RawPrimary {
                title: Some(title.to_owned()),
                year: year.to_vec(),
            }),
            poster: None,
        }
    }

    #[test]
    fn test_year_suffixes() {
        let meta = to_meta(&raw("series", "The Wire", &[2002, 2008]), 250).unwrap();
        assert_eq!(meta.name.as_deref(), Some("The Wire (2002-2008)"));

        let meta = to_meta(&raw("featureFilm", "Memento", &[2001]), 250).unwrap();
        assert_eq!(meta.name.as_deref(), Some("Memento (2001)"));

        let meta = to_meta(&raw("featureFilm", "Untitled", &[]), 250).unwrap();
        assert_eq!(meta.name.as_deref(), Some("Untitled"));
    }

    #[test]
    fn test_missing_title_yields_no_name() {
        let mut raw = raw("featureFilm", "", &[2001]);
        raw.primary.as_mut().unwrap().title = None;
        let meta = to_meta(&raw, 250).unwrap();
        assert_eq!(meta.name, None);
    }

    #[test]
    fn test_unrecognized_kinds_are_dropped() {
        assert!(to_meta(&raw("videoGame", "Some Game", &[2001]), 250).is_none());

        let mut untagged = raw("featureFilm", "Untagged", &[]);
        untagged.kind = None;
        assert!(to_meta(&untagged, 250).is_none());
    }

    #[test]
    fn test_poster_resize_with_dotted_marker() {
        let url = "https://m.media-amazon.com/images/M/foo._V1_.jpg";
        assert_eq!(
            resize_poster(url, 250),
            "https://m.media-amazon.com/images/M/foo._V1_SX250.jpg"
        );
    }

    #[test]
    fn test_poster_resize_with_bare_marker() {
        let url = "https://m.media-amazon.com/images/M/foo._V1_UX182_CR0,0,182,268_AL_.jpg";
        assert_eq!(
            resize_poster(url, 250),
            "https://m.media-amazon.com/images/M/foo._V1_SX250.jpg"
        );
    }

    #[test]
    fn test_poster_on_foreign_host_is_untouched() {
        let url = "https://example.com/posters/foo._V1_.jpg";
        assert_eq!(resize_poster(url, 250), url);
    }

    #[test]
    fn test_poster_without_marker_is_untouched() {
        let url = "https://images.imdb.com/posters/foo.jpg";
        assert_eq!(resize_poster(url, 250), url);
    }

    #[test]
    fn test_partitioning() {
        let titles = vec![
            raw("featureFilm", "Movie A", &[2001]),
            raw("series", "Show B", &[2002, 2005]),
            raw("videoGame", "Game C", &[2003]),
            raw("featureFilm", "Movie D", &[]),
        ];

        let by_type = partition_titles(&titles, 250);

        let movies = &by_type[&MediaType::Movie];
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].name.as_deref(), Some("Movie A (2001)"));
        assert_eq!(movies[1].name.as_deref(), Some("Movie D"));

        let series = &by_type[&MediaType::Series];
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name.as_deref(), Some("Show B (2002-2005)"));
    }
}
