// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

pub mod follow;
pub mod notification;
pub mod profile;
pub mod timeline;
