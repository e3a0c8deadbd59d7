use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u64 = 25;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl ListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn new(status: &'static str) -> Self {
        Self { status }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: Uuid,
    pub status: &'static str,
}

impl DeletedResponse {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: "deleted",
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use uuid::Uuid;

    use super::{ListQuery, double_option};

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        owner_id: Option<Option<Uuid>>,
    }

    #[test]
    fn absent_and_null_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").expect("absent should parse");
        let null: Patch = serde_json::from_str(r#"{"owner_id":null}"#).expect("null should parse");

        assert_eq!(absent.owner_id, None);
        assert_eq!(null.owner_id, Some(None));
    }

    #[test]
    fn list_query_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 25);
    }
}
