// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod follows;
pub mod metrics;
pub mod models;
pub mod optimistic;
pub mod schema;
pub mod store;
pub mod timeline;
pub mod visibility;
