//! Response `Content-Type` selection.

use crate::adapters::Adapter;
use crate::error::WireResult;
use crate::http::header::CONTENT_TYPE;
use crate::http::negotiate::negotiate;
use crate::http::HeaderData;
use crate::package::Package;

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTypeAdapter;

impl Adapter for ContentTypeAdapter {
    fn name(&self) -> &'static str {
        "content_type"
    }

    fn post_digest(&self, _transaction_id: &str, header: &HeaderData, response: &mut Package) -> WireResult<()> {
        let content_type = negotiate(&header.fields);
        response.header_data_mut().insert(CONTENT_TYPE, content_type);
        Ok(())
    }

    fn pre_respond(&self, _transaction_id: &str, response: &mut Package) -> WireResult<()> {
        response.header_data_mut();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HeaderMap;
    use crate::package::ReturnCode;
    use serde_json::json;

    #[test]
    fn test_post_digest_sets_content_type() {
        let mut fields = HeaderMap::new();
        fields.insert("Content-Type", "application/x-www-form-urlencoded");
        fields.insert("Accept", "text/html, application/json");
        let header = HeaderData {
            fields,
            ..HeaderData::default()
        };

        let mut response = Package::response(json!("ok"), ReturnCode::Ok);
        ContentTypeAdapter.post_digest("tx", &header, &mut response).unwrap();

        let header_data = response.header_data.unwrap();
        assert_eq!(header_data.get(CONTENT_TYPE), Some("text/html"));
    }

    #[test]
    fn test_pre_respond_creates_header_data() {
        let mut response = Package::response(json!("ok"), ReturnCode::Ok);
        assert!(response.header_data.is_none());

        ContentTypeAdapter.pre_respond("tx", &mut response).unwrap();
        assert!(response.header_data.unwrap().is_empty());
    }
}
