// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

//! Turns raw watch-log rows into the newest-first sequence shown on a
//! profile's timeline, annotating each entry with its rewatch ordinal.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::metrics;
use crate::models::timeline::{CatalogRef, Joined, NormalizedEntry, RawTimelineEntry};

/// Flatten a join result that may hold its row directly or in a list
pub fn unwrap_single<T>(value: Option<Joined<T>>) -> Option<T> {
    value.and_then(Joined::into_single)
}

/// Title identity used to group entries for rewatch counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKey {
    Movie(i64),
    Tv(i64),
}

impl MediaKey {
    /// A movie reference takes precedence over a series reference
    pub fn for_entry(movie: Option<&CatalogRef>, series: Option<&CatalogRef>) -> Option<Self> {
        movie
            .map(|m| MediaKey::Movie(m.tmdb_id))
            .or_else(|| series.map(|s| MediaKey::Tv(s.tmdb_id)))
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKey::Movie(id) => write!(f, "movie_{}", id),
            MediaKey::Tv(id) => write!(f, "tv_{}", id),
        }
    }
}

/// Normalize one user's entries.
///
/// `raw` must already be ordered oldest first by `(watched_on, created_at)`;
/// the result has the same length in the exact reverse order.
pub fn normalize_timeline(raw: Vec<RawTimelineEntry>) -> Vec<NormalizedEntry> {
    let mut seen: HashMap<MediaKey, u32> = HashMap::new();
    let mut normalized = Vec::with_capacity(raw.len());

    for entry in raw {
        let movie = unwrap_single(entry.movie);
        let series = unwrap_single(entry.series);
        let key = MediaKey::for_entry(movie.as_ref(), series.as_ref());

        let rewatch_count = match key {
            Some(key) => {
                let count = seen.entry(key).or_insert(0);
                let before = *count;
                *count += 1;
                before
            }
            None => 0,
        };

        let collaborators = entry
            .collaborators
            .into_iter()
            .filter_map(|c| unwrap_single(c.profile))
            .collect();

        trace!(entry_id = %entry.id, media_key = ?key, rewatch_count, "normalized timeline entry");

        normalized.push(NormalizedEntry {
            id: entry.id,
            user_id: entry.user_id,
            watched_on: entry.watched_on,
            created_at: entry.created_at,
            rating: entry.rating,
            notes: entry.notes,
            viewing_context: entry.viewing_context,
            photo_url: entry.photo_url,
            movie,
            series,
            user: unwrap_single(entry.user),
            post: unwrap_single(entry.post),
            collaborators,
            media_key: key.map(|k| k.to_string()),
            is_rewatch: rewatch_count > 0,
            rewatch_count,
        });
    }

    metrics::TIMELINE_ENTRIES_NORMALIZED.inc_by(normalized.len() as u64);

    normalized.reverse();
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ProfileSummary;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn catalog(id: i64) -> CatalogRef {
        CatalogRef {
            tmdb_id: id,
            title: format!("Title {}", id),
            release_date: None,
            poster_url: None,
        }
    }

    fn entry(day: u32, movie: Option<i64>, series: Option<i64>) -> RawTimelineEntry {
        RawTimelineEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            watched_on: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            rating: None,
            notes: None,
            viewing_context: None,
            photo_url: None,
            movie: movie.map(|id| Joined::Many(vec![catalog(id)])),
            series: series.map(|id| Joined::One(catalog(id))),
            user: None,
            post: None,
            collaborators: Vec::new(),
        }
    }

    #[test]
    fn unwrap_single_takes_first_or_value() {
        assert_eq!(unwrap_single(Some(Joined::Many(vec![1, 2]))), Some(1));
        assert_eq!(unwrap_single(Some(Joined::One(7))), Some(7));
        assert_eq!(unwrap_single::<i32>(Some(Joined::Many(vec![]))), None);
        assert_eq!(unwrap_single::<i32>(None), None);
    }

    #[test]
    fn media_key_formats() {
        assert_eq!(MediaKey::Movie(42).to_string(), "movie_42");
        assert_eq!(MediaKey::Tv(7).to_string(), "tv_7");
        assert_eq!(
            MediaKey::for_entry(Some(&catalog(1)), Some(&catalog(2))),
            Some(MediaKey::Movie(1))
        );
        assert_eq!(MediaKey::for_entry(None, None), None);
    }

    #[test]
    fn counts_rewatches_and_reverses() {
        let a = entry(1, Some(42), None);
        let b = entry(2, Some(42), None);
        let c = entry(3, Some(99), None);
        let ids = (a.id, b.id, c.id);

        let out = normalize_timeline(vec![a, b, c]);

        assert_eq!(out.iter().map(|e| e.id).collect::<Vec<_>>(), vec![ids.2, ids.1, ids.0]);
        assert_eq!((out[2].rewatch_count, out[2].is_rewatch), (0, false));
        assert_eq!((out[1].rewatch_count, out[1].is_rewatch), (1, true));
        assert_eq!((out[0].rewatch_count, out[0].is_rewatch), (0, false));
        assert_eq!(out[1].media_key.as_deref(), Some("movie_42"));
    }

    #[test]
    fn movie_and_series_with_same_id_are_distinct_titles() {
        let out = normalize_timeline(vec![entry(1, Some(5), None), entry(2, None, Some(5))]);
        assert!(out.iter().all(|e| !e.is_rewatch));
        assert_eq!(out[0].media_key.as_deref(), Some("tv_5"));
    }

    #[test]
    fn entries_without_media_are_not_counted() {
        let out = normalize_timeline(vec![
            entry(1, Some(42), None),
            entry(2, None, None),
            entry(3, None, None),
            entry(4, Some(42), None),
            entry(5, Some(42), None),
        ]);

        assert_eq!(out.len(), 5);
        let counts: Vec<u32> = out.iter().map(|e| e.rewatch_count).collect();
        assert_eq!(counts, vec![2, 1, 0, 0, 0]);
        assert!(!out[2].is_rewatch && !out[3].is_rewatch);
        assert!(out[2].media_key.is_none());
    }

    #[test]
    fn ties_keep_inverted_input_order() {
        let mut first = entry(1, Some(1), None);
        let mut second = entry(1, Some(2), None);
        second.created_at = first.created_at;
        first.notes = Some("first".into());
        second.notes = Some("second".into());

        let out = normalize_timeline(vec![first, second]);
        assert_eq!(out[0].notes.as_deref(), Some("second"));
        assert_eq!(out[1].notes.as_deref(), Some("first"));
    }

    #[test]
    fn tolerates_array_wrapped_and_malformed_json() {
        let owner = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let raw: Vec<RawTimelineEntry> = serde_json::from_value(json!([
            {
                "id": Uuid::new_v4(),
                "user_id": owner,
                "watched_on": "2024-02-01",
                "created_at": "2024-02-01T10:00:00Z",
                "movies": [{ "tmdb_id": 42, "title": "Heat" }],
                "profiles": [{ "id": owner, "username": "raj" }],
                "timeline_collaborators": [
                    { "profiles": [{ "id": friend, "username": "mina" }] },
                    { "profiles": null }
                ]
            },
            {
                "id": Uuid::new_v4(),
                "user_id": owner,
                "watched_on": "2024-02-02",
                "created_at": "2024-02-02T10:00:00Z",
                "movie": "not a movie",
                "series": []
            }
        ]))
        .unwrap();

        let out = normalize_timeline(raw);

        assert_eq!(out[1].movie.as_ref().map(|m| m.tmdb_id), Some(42));
        assert_eq!(out[1].user.as_ref().map(|u| u.username.as_str()), Some("raj"));
        assert_eq!(
            out[1].collaborators,
            vec![ProfileSummary {
                id: friend,
                username: "mina".into(),
                display_name: None,
                profile_pic_url: None,
            }]
        );
        assert!(out[0].movie.is_none() && out[0].series.is_none());
        assert_eq!((out[0].rewatch_count, out[0].is_rewatch), (0, false));
    }

    #[test]
    fn flat_references_survive_renormalization() {
        let mut raw = entry(1, None, None);
        raw.movie = Some(Joined::One(catalog(42)));
        raw.collaborators = vec![crate::models::timeline::RawCollaborator {
            profile: Some(Joined::One(ProfileSummary {
                id: Uuid::new_v4(),
                username: "mina".into(),
                display_name: Some("Mina".into()),
                profile_pic_url: None,
            })),
        }];

        let once = normalize_timeline(vec![raw]);
        assert_eq!(once[0].movie, Some(catalog(42)));

        let reparsed: Vec<RawTimelineEntry> =
            serde_json::from_value(serde_json::to_value(&once).unwrap()).unwrap();
        let twice = normalize_timeline(reparsed);

        assert_eq!(twice[0].movie, once[0].movie);
        assert_eq!(twice[0].collaborators, once[0].collaborators);
        assert_eq!(twice[0].rewatch_count, once[0].rewatch_count);
    }
}
