use std::borrow::Cow;
use std::collections::HashMap;

use crate::race::types::{ClientId, PlayerProfile};

/// Parse a raw query string into decoded key/value pairs.
/// Later occurrences of a key override earlier ones; undecodable values become empty.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|kv| !kv.is_empty())
        .filter_map(|kv| {
            let mut split = kv.splitn(2, '=');
            let key = split.next()?;
            let value = split.next().unwrap_or("");
            let value = urlencoding::decode(&value.replace('+', " "))
                .unwrap_or_else(|_| Cow::Borrowed(""))
                .into_owned();
            Some((key.to_string(), value))
        })
        .collect()
}

/// Non-empty `client_id` from the query, if present.
pub fn client_id_from_query(params: &HashMap<String, String>) -> Option<ClientId> {
    params
        .get("client_id")
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Build the profile of a queue session from its query parameters.
pub fn profile_from_query(params: &HashMap<String, String>) -> Option<PlayerProfile> {
    let client_id = client_id_from_query(params)?;
    Some(PlayerProfile::new(
        client_id,
        params.get("username").cloned(),
        params.get("icon").cloned(),
        params.get("outfit").cloned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_query() {
        let params = parse_query("client_id=uid42&username=Forest%20Fox&icon=&outfit=arctic");
        let profile = profile_from_query(&params).unwrap();
        assert_eq!(profile.client_id, "uid42");
        assert_eq!(profile.username, "Forest Fox");
        assert_eq!(profile.icon, None);
        assert_eq!(profile.outfit, "arctic");
    }

    #[test]
    fn test_missing_client_id() {
        assert!(profile_from_query(&parse_query("username=abc")).is_none());
        assert!(profile_from_query(&parse_query("client_id=%20&username=abc")).is_none());
        assert!(profile_from_query(&parse_query("")).is_none());
    }
}
