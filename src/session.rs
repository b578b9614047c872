//! Jolokia 원격 세션
//!
//! 원격 JVM의 Jolokia 엔드포인트를 통해 MBean 트리를 탐색하고
//! 속성 값을 조회하는 HTTP 세션입니다.
//!
//! # Example
//!
//! ```ignore
//! use jmxpoller::session::{Credentials, JolokiaSession};
//!
//! let session = JolokiaSession::connect("http://localhost:8778/jolokia", &Credentials::none(), 5000).await?;
//! let names = session.list_objects("*:*").await?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{SessionError, SessionResult};

/// Basic-auth 자격 증명 (비어 있을 수 있음)
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// 자격 증명 없음
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

/// 조회된 속성 값 - 다양한 형태를 지원
///
/// The dynamic run-time type of a fetched attribute is resolved once here,
/// at the parse boundary, rather than inspected throughout the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// 숫자 값
    Number(f64),
    /// 문자열 값
    Text(String),
    /// 불리언 값
    Bool(bool),
    /// Null 값
    Null,
    /// 복합 객체 (CompositeData)
    Composite(HashMap<String, AttrValue>),
    /// 배열
    Array(Vec<AttrValue>),
}

impl AttrValue {
    /// 숫자로 변환 시도
    ///
    /// Numeric strings coerce the same way the raw value coercion does when
    /// string collection is disabled.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// JSON 값을 AttrValue로 변환
pub fn parse_attr_value(value: Value) -> SessionResult<AttrValue> {
    match value {
        Value::Null => Ok(AttrValue::Null),
        Value::Bool(b) => Ok(AttrValue::Bool(b)),
        Value::Number(n) => {
            let f = n.as_f64().ok_or_else(|| {
                SessionError::JsonParse(format!("Number {} cannot be represented as f64", n))
            })?;
            Ok(AttrValue::Number(f))
        }
        Value::String(s) => Ok(AttrValue::Text(s)),
        Value::Array(arr) => {
            let parsed: Vec<AttrValue> = arr
                .into_iter()
                .map(parse_attr_value)
                .collect::<SessionResult<_>>()?;
            Ok(AttrValue::Array(parsed))
        }
        Value::Object(map) => {
            let parsed: HashMap<String, AttrValue> = map
                .into_iter()
                .map(|(k, v)| Ok((k, parse_attr_value(v)?)))
                .collect::<SessionResult<_>>()?;
            Ok(AttrValue::Composite(parsed))
        }
    }
}

/// Jolokia 요청 구조체
#[derive(Debug, Serialize)]
struct JolokiaRequest {
    #[serde(rename = "type")]
    request_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mbean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<AttributeSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AttributeSpec {
    Single(String),
    Multiple(Vec<String>),
}

/// 내부 파싱용 응답 구조체
#[derive(Deserialize)]
struct RawResponse {
    value: Option<Value>,
    status: u16,
    error: Option<String>,
}

/// Jolokia HTTP 세션
///
/// 연결(connect)부터 해제(close)까지 하나의 원격 타깃과의 세션을 나타냅니다.
/// Dropping the session releases the underlying connection pool; per-connection
/// collector caches are reset separately by the connection manager.
#[derive(Clone)]
pub struct JolokiaSession {
    client: Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl JolokiaSession {
    /// 세션 수립
    ///
    /// HTTP 클라이언트를 생성하고 `version` 프로브 요청으로 엔드포인트가
    /// 응답하는지 확인합니다. 프로브가 실패하면 세션은 수립되지 않습니다.
    ///
    /// # Arguments
    /// * `base_url` - Jolokia 엔드포인트 URL (예: "http://localhost:8778/jolokia")
    /// * `credentials` - Basic-auth 자격 증명 (비어 있으면 미사용)
    /// * `timeout_ms` - 요청 타임아웃 (밀리초)
    pub async fn connect(
        base_url: &str,
        credentials: &Credentials,
        timeout_ms: u64,
    ) -> SessionResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(SessionError::HttpClientInit)?;

        let session = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: if credentials.is_empty() {
                None
            } else {
                Some((credentials.username.clone(), credentials.password.clone()))
            },
        };

        // Probe the endpoint; an unanswered probe means no session.
        session.probe_version().await?;

        Ok(session)
    }

    /// `version` 프로브 - 엔드포인트 생존 확인
    async fn probe_version(&self) -> SessionResult<()> {
        let request = JolokiaRequest {
            request_type: "version".to_string(),
            mbean: None,
            attribute: None,
            path: None,
        };

        let raw = self.execute(&request).await?;

        if raw.status == 401 || raw.status == 403 {
            return Err(SessionError::AuthenticationFailed);
        }
        if raw.status != 200 {
            return Err(SessionError::Jolokia {
                status: raw.status,
                message: raw.error.unwrap_or_else(|| "Version probe failed".to_string()),
            });
        }

        debug!("Jolokia version probe succeeded");
        Ok(())
    }

    /// 기존 세션 생존 확인
    ///
    /// 연결이 죽었으면 에러를 반환하며, 호출자는 세션을 폐기하고
    /// 재연결해야 합니다.
    pub async fn ping(&self) -> SessionResult<()> {
        self.probe_version().await
    }

    /// MBean 목록 조회 (Search)
    ///
    /// 패턴에 일치하는 모든 object instance name을 반환합니다.
    pub async fn list_objects(&self, pattern: &str) -> SessionResult<Vec<String>> {
        let request = JolokiaRequest {
            request_type: "search".to_string(),
            mbean: Some(pattern.to_string()),
            attribute: None,
            path: None,
        };

        let raw = self.execute(&request).await?;

        if raw.status != 200 {
            return Err(SessionError::Jolokia {
                status: raw.status,
                message: raw.error.unwrap_or_else(|| "Search failed".to_string()),
            });
        }

        let names: Vec<String> = match raw.value {
            Some(Value::Array(arr)) => arr
                .into_iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => vec![],
        };

        Ok(names)
    }

    /// MBean 메타데이터 조회 (List) - 속성 이름 목록 반환
    pub async fn get_metadata(&self, object_name: &str) -> SessionResult<Vec<String>> {
        let request = JolokiaRequest {
            request_type: "list".to_string(),
            mbean: None,
            attribute: None,
            path: Some(list_path_for(object_name)),
        };

        let raw = self.execute(&request).await?;

        if raw.status != 200 {
            return Err(SessionError::Jolokia {
                status: raw.status,
                message: raw.error.unwrap_or_else(|| "List failed".to_string()),
            });
        }

        let mut attribute_names = Vec::new();

        if let Some(Value::Object(map)) = raw.value {
            if let Some(Value::Object(attrs)) = map.get("attr").cloned() {
                attribute_names.extend(attrs.keys().cloned());
            }
        }

        attribute_names.sort();
        Ok(attribute_names)
    }

    /// Bulk Read - 한 MBean의 여러 속성 일괄 조회
    ///
    /// 항상 배열 형태의 attribute spec을 보내므로 응답은 언제나
    /// 속성 이름으로 키된 맵입니다.
    pub async fn get_attributes(
        &self,
        object_name: &str,
        attribute_names: &[String],
    ) -> SessionResult<HashMap<String, AttrValue>> {
        if attribute_names.is_empty() {
            return Ok(HashMap::new());
        }

        let request = JolokiaRequest {
            request_type: "read".to_string(),
            mbean: Some(object_name.to_string()),
            attribute: Some(AttributeSpec::Multiple(attribute_names.to_vec())),
            path: None,
        };

        debug!(mbean = %object_name, count = attribute_names.len(), "Sending bulk read request");

        let raw = self.execute(&request).await?;

        if raw.status != 200 {
            return Err(SessionError::Jolokia {
                status: raw.status,
                message: raw.error.unwrap_or_else(|| "Bulk read failed".to_string()),
            });
        }

        match raw.value {
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(k, v)| Ok((k, parse_attr_value(v)?)))
                .collect(),
            Some(other) => Err(SessionError::JsonParse(format!(
                "Expected attribute map, got {}",
                other
            ))),
            None => Ok(HashMap::new()),
        }
    }

    /// 단일 속성 조회
    pub async fn get_attribute(
        &self,
        object_name: &str,
        attribute_name: &str,
    ) -> SessionResult<AttrValue> {
        let request = JolokiaRequest {
            request_type: "read".to_string(),
            mbean: Some(object_name.to_string()),
            attribute: Some(AttributeSpec::Single(attribute_name.to_string())),
            path: None,
        };

        let raw = self.execute(&request).await?;

        if raw.status != 200 {
            return Err(SessionError::Jolokia {
                status: raw.status,
                message: raw.error.unwrap_or_else(|| "Read failed".to_string()),
            });
        }

        match raw.value {
            Some(v) => parse_attr_value(v),
            None => Ok(AttrValue::Null),
        }
    }

    /// 요청 실행 공통 경로
    async fn execute(&self, request: &JolokiaRequest) -> SessionResult<RawResponse> {
        let mut req = self.client.post(&self.base_url).json(request);

        if let Some((username, password)) = &self.auth {
            req = req.basic_auth(username, Some(password));
        }

        let response = req.send().await.map_err(SessionError::from)?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SessionError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(SessionError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(SessionError::HttpResponse)?;

        serde_json::from_str(&body).map_err(|e| SessionError::JsonParse(e.to_string()))
    }
}

/// Jolokia `list` 요청 경로 생성
///
/// ObjectName은 `domain/propertyList` 형태의 경로가 되며, 경로 구분자와
/// 충돌하는 문자는 `!`로 이스케이프합니다.
fn list_path_for(object_name: &str) -> String {
    let escaped: String = object_name
        .chars()
        .flat_map(|c| match c {
            '!' => vec!['!', '!'],
            '/' => vec!['!', '/'],
            '"' => vec!['!', '"'],
            other => vec![other],
        })
        .collect();

    match escaped.split_once(':') {
        Some((domain, props)) => format!("{}/{}", domain, props),
        None => escaped,
    }
}
