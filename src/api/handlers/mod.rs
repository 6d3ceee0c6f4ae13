// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

pub mod follows;
pub mod health;
pub mod profiles;
