//! Community Routes
//!
//! - GET /api/v1/community/posts - List posts (search, category, sort)

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ListParams, ListResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::listing::{parse_facet, CommunityPost, ListQuery, PostCategory, SortKey};

/// GET /api/v1/community/posts
///
/// Sorted by recency unless `sort=popular`; pinned posts lead either way.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse<CommunityPost>>> {
    let category = parse_facet::<PostCategory>(params.category.as_deref())?;
    let sort = match params.sort.as_deref() {
        None | Some("") => SortKey::Recent,
        Some(s) => s.parse()?,
    };

    let query = ListQuery::new()
        .search(params.search.unwrap_or_default())
        .facet_opt(category)
        .sort(sort);

    Ok(Json(query.apply(&state.catalog.posts).into()))
}
