//! Keyword relocation between the header slot and the payload.
//!
//! HTTP carries verbs and query parameters next to the header, while
//! commands only take keyword arguments. Inbound, everything is folded into
//! `kwargs`; outbound, `kwargs` are flattened into plain payload fields.

use serde_json::Value;

use crate::adapters::Adapter;
use crate::error::{WireError, WireResult};
use crate::http::HeaderData;
use crate::package::{Kwargs, Package};

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderKwargsAdapter;

impl Adapter for HeaderKwargsAdapter {
    fn name(&self) -> &'static str {
        "header_kwargs"
    }

    fn pre_digest(&self, _transaction_id: &str, header: &mut HeaderData, payload: &mut Kwargs) -> WireResult<()> {
        let body = std::mem::take(payload);

        let mut kwargs = Kwargs::new();
        for (key, value) in body {
            match value {
                // Multipart parts arrive already grouped.
                Value::Object(nested) if key == "kwargs" => kwargs.extend(nested),
                value => {
                    kwargs.insert(key, value);
                }
            }
        }

        if let Some(query) = header.kwargs.take() {
            kwargs.extend(query);
        }

        payload.insert("kwargs".into(), Value::Object(kwargs));

        if let Some(command) = header.command.take() {
            payload.insert("command".into(), Value::String(command));
        }
        Ok(())
    }

    fn pre_encode_package(&self, _transaction_id: &str, package: &mut Package) -> WireResult<()> {
        let args = package.args().len();
        if args > 0 {
            return Err(WireError::UnsupportedArgument(args));
        }
        package.payload.remove("args");

        match package.payload.remove("kwargs") {
            Some(Value::Object(kwargs)) => package.payload.extend(kwargs),
            Some(other) => {
                return Err(WireError::Decode(format!("kwargs is not an object: {}", other)));
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ReturnCode;
    use serde_json::json;

    fn object(value: Value) -> Kwargs {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_pre_digest_moves_everything_into_kwargs() {
        let mut header = HeaderData {
            command: Some("GET".into()),
            path: Some("/items".into()),
            kwargs: Some(object(json!({"limit": "10", "sort": "asc"}))),
            ..HeaderData::default()
        };
        let mut payload = object(json!({"sort": "desc", "name": "x"}));

        HeaderKwargsAdapter.pre_digest("tx", &mut header, &mut payload).unwrap();

        assert_eq!(
            Value::Object(payload),
            json!({
                "command": "GET",
                "kwargs": {"limit": "10", "sort": "asc", "name": "x"}
            })
        );
        assert!(header.kwargs.is_none());
        assert!(header.command.is_none());
        assert_eq!(header.path.as_deref(), Some("/items"));
    }

    #[test]
    fn test_pre_digest_flattens_multipart_kwargs() {
        let mut header = HeaderData {
            command: Some("POST".into()),
            ..HeaderData::default()
        };
        let mut payload = object(json!({
            "command": "upload",
            "kwargs": {"file": "/tmp/x/a.txt"},
            "extra": "1"
        }));

        HeaderKwargsAdapter.pre_digest("tx", &mut header, &mut payload).unwrap();

        assert_eq!(payload["command"], json!("POST"));
        assert_eq!(
            payload["kwargs"],
            json!({"command": "upload", "file": "/tmp/x/a.txt", "extra": "1"})
        );
    }

    #[test]
    fn test_pre_encode_promotes_kwargs() {
        let mut package = Package::question("list", object(json!({"a": 1, "b": "two"})));
        package.payload.insert("args".into(), json!([]));

        HeaderKwargsAdapter.pre_encode_package("tx", &mut package).unwrap();

        assert_eq!(
            Value::Object(package.payload),
            json!({"command": "list", "a": 1, "b": "two"})
        );
    }

    #[test]
    fn test_pre_encode_rejects_positionals() {
        let mut package = Package::question("list", Kwargs::new());
        package.payload.insert("args".into(), json!([1, 2]));

        assert!(matches!(
            HeaderKwargsAdapter.pre_encode_package("tx", &mut package),
            Err(WireError::UnsupportedArgument(2))
        ));
    }

    #[test]
    fn test_pre_encode_leaves_responses_alone() {
        let mut package = Package::response(json!("ok"), ReturnCode::Ok);
        HeaderKwargsAdapter.pre_encode_package("tx", &mut package).unwrap();
        assert_eq!(Value::Object(package.payload), json!({"response": "ok"}));
    }
}
