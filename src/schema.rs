// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use diesel::allow_tables_to_appear_in_same_query;
use diesel::joinable;
use diesel::table;

table! {
    profiles (id) {
        id -> Uuid,
        username -> Varchar,
        display_name -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        profile_pic_url -> Nullable<Varchar>,
        visibility -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    followers (follower_id, following_id) {
        follower_id -> Uuid,
        following_id -> Uuid,
        status -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    notifications (id) {
        id -> Uuid,
        recipient_id -> Uuid,
        actor_id -> Uuid,
        actor_username -> Varchar,
        kind -> Varchar,
        is_read -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    movies (tmdb_id) {
        tmdb_id -> Int8,
        title -> Varchar,
        release_date -> Nullable<Varchar>,
        poster_url -> Nullable<Varchar>,
    }
}

table! {
    series (tmdb_id) {
        tmdb_id -> Int8,
        title -> Varchar,
        release_date -> Nullable<Varchar>,
        poster_url -> Nullable<Varchar>,
    }
}

table! {
    timeline_entries (id) {
        id -> Uuid,
        user_id -> Uuid,
        movie_tmdb_id -> Nullable<Int8>,
        series_tmdb_id -> Nullable<Int8>,
        watched_on -> Date,
        rating -> Nullable<Float4>,
        notes -> Nullable<Text>,
        viewing_context -> Nullable<Varchar>,
        photo_url -> Nullable<Varchar>,
        post_slug -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

table! {
    timeline_collaborators (entry_id, user_id) {
        entry_id -> Uuid,
        user_id -> Uuid,
    }
}

joinable!(timeline_entries -> profiles (user_id));
joinable!(timeline_collaborators -> timeline_entries (entry_id));
joinable!(notifications -> profiles (recipient_id));

allow_tables_to_appear_in_same_query!(
    profiles,
    followers,
    notifications,
    movies,
    series,
    timeline_entries,
    timeline_collaborators,
);
