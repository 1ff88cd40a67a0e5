use crate::domain::QueryCriteria;

/// Wire parameters for one bounded query. `user` and `app_name` are omitted
/// when empty; `since` travels as epoch seconds.
pub fn build_query_params(
    criteria: &QueryCriteria,
    offset: usize,
    limit: usize,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("limit", limit.to_string()),
        ("offset", offset.to_string()),
        ("since", criteria.since.unix_timestamp().to_string()),
    ];

    if !criteria.user.is_empty() {
        params.push(("user", criteria.user.clone()));
    }
    if !criteria.app_name.is_empty() {
        params.push(("app_name", criteria.app_name.clone()));
    }

    params
}
