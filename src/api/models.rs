//! Model listing and version info handlers.

use crate::config::ApiConfig;
use crate::http::HttpResponse;
use serde::Serialize;

/// Models list response in OpenAI format.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub object: &'static str,
    pub data: Vec<ModelObject>,
}

/// Individual model object.
#[derive(Debug, Serialize)]
pub struct ModelObject {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub owned_by: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub object: &'static str,
    pub version: String,
}

/// GET {base}/models - The one configured model.
pub fn list(api: &ApiConfig) -> HttpResponse {
    HttpResponse::json(
        200,
        &ModelsResponse {
            object: "list",
            data: vec![ModelObject {
                id: api.model_name.clone(),
                object: "model",
                created: 0,
                owned_by: "apple",
            }],
        },
    )
}

/// GET {base} - Active API version.
pub fn version(api: &ApiConfig) -> HttpResponse {
    HttpResponse::json(
        200,
        &VersionResponse {
            object: "api.version",
            version: api.version.clone(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_is_byte_stable() {
        let api = ApiConfig::default();
        let first = list(&api);
        assert_eq!(first, list(&api));
        assert_eq!(
            String::from_utf8(first.body).unwrap(),
            r#"{"object":"list","data":[{"id":"apple-foundation-model","object":"model","created":0,"owned_by":"apple"}]}"#
        );
    }

    #[test]
    fn test_version_body() {
        let api = ApiConfig {
            model_name: "m".to_string(),
            version: "v9".to_string(),
        };
        assert_eq!(
            String::from_utf8(version(&api).body).unwrap(),
            r#"{"object":"api.version","version":"v9"}"#
        );
    }
}
