// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client bookmarks for entities (lanes, tasks, pipelines).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique favourite identifier (`fav-` prefix).
    pub struct FavoriteId("fav-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    /// Entity kind being bookmarked ("lane", "task", "pipeline").
    pub kind: String,
    /// Id of the bookmarked entity, opaque to the store.
    pub ref_id: String,
    pub label: String,
    pub created_at: u64,
}
