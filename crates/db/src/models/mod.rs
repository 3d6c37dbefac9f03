use sea_orm::sea_query::LikeExpr;

pub mod document;
pub mod pagination;
pub mod subtask;
pub mod task;
pub mod user;

/// Case-insensitive contains pattern for user-supplied search terms. LIKE
/// wildcards in the term are escaped so they match literally.
pub(crate) fn search_pattern(term: &str) -> LikeExpr {
    let escaped = term
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    LikeExpr::new(format!("%{escaped}%")).escape('\\')
}
