use super::{
    postman::*,
    tree::{build_tree, FolderNode},
};
use crate::{
    config::DocsConfig,
    endpoint::{path_variables, rewrite_path_variables, Auth, BodyMode, Endpoint, ResponseExample, Test, Variable, VariableScope},
    error::ApiDocResult,
    synth::{synthesize, FieldConstraints, FILE_PLACEHOLDER},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Characters left as-is in `url.raw` query pairs; `{{var}}` references and
/// `filter[field]` keys must survive unencoded
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'{')
    .remove(b'}')
    .remove(b'[')
    .remove(b']')
    .remove(b':')
    .remove(b'/')
    .remove(b',');

/// Request-collection generator
pub struct CollectionGenerator<'a> {
    config: &'a DocsConfig,
    collection_id: Option<String>,
}

impl<'a> CollectionGenerator<'a> {
    pub fn new(config: &'a DocsConfig) -> Self {
        Self {
            config,
            collection_id: None,
        }
    }

    /// Fix `info._postman_id`; a random v4 UUID is used otherwise
    pub fn with_collection_id(mut self, id: &str) -> Self {
        self.collection_id = Some(id.to_string());
        self
    }

    /// Folder tree for `endpoints`
    pub fn build_tree(&self, endpoints: &[Endpoint]) -> FolderNode {
        build_tree(endpoints, self.config)
    }

    /// Generate the full collection document
    pub fn generate(&self, endpoints: &[Endpoint]) -> ApiDocResult<PostmanCollection> {
        let id = self
            .collection_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut collection =
            PostmanCollection::new(&id, &self.config.info.title, &self.config.info.description);

        let tree = self.build_tree(endpoints);
        for folder in tree.folders.values() {
            collection.add_item(self.render_folder(folder)?);
        }
        collection.variable = self.collection_variables();

        Ok(collection)
    }

    fn render_folder(&self, node: &FolderNode) -> ApiDocResult<PostmanItem> {
        let mut items = Vec::with_capacity(node.requests.len() + node.folders.len());
        for endpoint in &node.requests {
            items.push(PostmanItem::Request(self.render_request(endpoint)?));
        }
        for child in node.folders.values() {
            items.push(self.render_folder(child)?);
        }

        Ok(PostmanItem::Folder(PostmanFolder {
            name: node.name.clone(),
            item: items,
        }))
    }

    /// Render one endpoint as a collection request item
    pub fn render_request(&self, endpoint: &Endpoint) -> ApiDocResult<PostmanRequestItem> {
        let mut response = Vec::with_capacity(endpoint.responses.len());
        for example in &endpoint.responses {
            response.push(render_response(example)?);
        }

        Ok(PostmanRequestItem {
            name: endpoint.name.clone(),
            event: self.render_events(endpoint),
            request: PostmanRequest {
                method: endpoint.method.clone(),
                header: self.render_headers(endpoint),
                body: render_body(endpoint)?,
                url: self.render_url(endpoint),
                auth: self.render_auth(endpoint),
                description: endpoint.description.clone(),
            },
            response,
        })
    }

    /// Default headers not overridden by the endpoint, then the endpoint's own
    fn render_headers(&self, endpoint: &Endpoint) -> Vec<PostmanHeader> {
        let overridden = |key: &str| {
            endpoint
                .headers
                .iter()
                .any(|header| header.key.eq_ignore_ascii_case(key))
        };

        self.config
            .default_headers
            .iter()
            .filter(|header| !overridden(&header.key))
            .chain(endpoint.headers.iter())
            .map(|header| PostmanHeader {
                key: header.key.clone(),
                value: header.value.clone(),
                description: header.description.clone(),
                disabled: header.disabled,
            })
            .collect()
    }

    /// URL with `:name` path variables. A first segment listed in
    /// `versioned_hosts` selects that host variable and is dropped.
    pub fn render_url(&self, endpoint: &Endpoint) -> PostmanUrl {
        let mut segments: Vec<&str> = endpoint
            .uri
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let host_variable = match segments.first().and_then(|first| self.config.versioned_hosts.get(*first)) {
            Some(variable) => {
                segments.remove(0);
                variable.clone()
            }
            None => self.config.base_url_variable.clone(),
        };
        let host = format!("{{{{{}}}}}", host_variable);

        let path: Vec<String> = segments
            .iter()
            .map(|segment| rewrite_path_variables(segment, |name| format!(":{}", name)))
            .collect();

        let query: Vec<PostmanQuery> = endpoint
            .query_params
            .iter()
            .map(|param| PostmanQuery {
                key: param.key.clone(),
                value: param.value.clone(),
                description: param.description.clone(),
                disabled: param.disabled,
            })
            .collect();

        let variable = path_variables(&endpoint.uri)
            .iter()
            .map(|name| PostmanVariable::new(name, &example_text(name)))
            .collect();

        let mut raw = host.clone();
        if !path.is_empty() {
            raw.push('/');
            raw.push_str(&path.join("/"));
        }
        let enabled: Vec<String> = query
            .iter()
            .filter(|param| !param.disabled)
            .map(|param| {
                format!(
                    "{}={}",
                    utf8_percent_encode(&param.key, QUERY_ENCODE_SET),
                    utf8_percent_encode(&param.value, QUERY_ENCODE_SET)
                )
            })
            .collect();
        if !enabled.is_empty() {
            raw.push('?');
            raw.push_str(&enabled.join("&"));
        }

        PostmanUrl {
            raw,
            host: vec![host],
            path,
            query,
            variable,
        }
    }

    /// Explicit auth, else bearer when a protected middleware tag is present.
    /// `None` leaves the request inheriting from its parent.
    pub fn render_auth(&self, endpoint: &Endpoint) -> Option<PostmanAuth> {
        match &endpoint.auth {
            Some(Auth::Bearer { token }) if token.is_empty() => Some(PostmanAuth::bearer(&self.token_reference())),
            Some(Auth::Bearer { token }) => Some(PostmanAuth::bearer(token)),
            Some(Auth::Basic { username, password }) => Some(PostmanAuth::basic(username, password)),
            Some(Auth::ApiKey { value, header }) => Some(PostmanAuth::apikey(header, value)),
            Some(Auth::NoAuth) => Some(PostmanAuth::noauth()),
            None if endpoint.has_protected_tag(&self.config.protected_tags) => {
                Some(PostmanAuth::bearer(&self.token_reference()))
            }
            None => None,
        }
    }

    fn render_events(&self, endpoint: &Endpoint) -> Vec<PostmanEvent> {
        let mut events = Vec::new();

        let mut test_lines: Vec<String> = endpoint.tests.iter().flat_map(test_lines).collect();
        test_lines.extend(extraction_lines(&endpoint.variables));
        if !test_lines.is_empty() {
            events.push(PostmanEvent::new("test", test_lines));
        }

        let prerequest: Vec<String> = endpoint
            .pre_request_scripts
            .iter()
            .flat_map(|script| script.lines().map(str::to_string))
            .collect();
        if !prerequest.is_empty() {
            events.push(PostmanEvent::new("prerequest", prerequest));
        }

        events
    }

    /// Collection variables: base URL, versioned hosts, custom variables, auth token
    fn collection_variables(&self) -> Vec<PostmanVariable> {
        let base_url = self.config.base_url.trim_end_matches('/');
        let mut variables = vec![PostmanVariable::string(&self.config.base_url_variable, base_url)];

        for (token, variable) in &self.config.versioned_hosts {
            if variables.iter().any(|existing| &existing.key == variable) {
                continue;
            }
            variables.push(PostmanVariable::string(variable, &format!("{}/{}", base_url, token)));
        }
        for (key, value) in &self.config.variables {
            variables.push(PostmanVariable::string(key, value));
        }
        variables.push(PostmanVariable::string(&self.config.auth_token_variable, ""));

        variables
    }

    fn token_reference(&self) -> String {
        format!("{{{{{}}}}}", self.config.auth_token_variable)
    }
}

fn render_body(endpoint: &Endpoint) -> ApiDocResult<Option<PostmanBody>> {
    let Some(body) = &endpoint.body else {
        return Ok(None);
    };

    let rendered = match endpoint.body_mode {
        BodyMode::Raw => PostmanBody {
            mode: "raw".to_string(),
            raw: Some(serde_json::to_string_pretty(&Value::Object(body.clone()))?),
            options: Some(PostmanBodyOptions {
                raw: PostmanRawOptions {
                    language: endpoint.body_language.clone(),
                },
            }),
            formdata: None,
            urlencoded: None,
        },
        BodyMode::Formdata => PostmanBody {
            mode: "formdata".to_string(),
            raw: None,
            options: None,
            formdata: Some(form_params(body, true)),
            urlencoded: None,
        },
        BodyMode::Urlencoded => PostmanBody {
            mode: "urlencoded".to_string(),
            raw: None,
            options: None,
            formdata: None,
            urlencoded: Some(form_params(body, false)),
        },
    };

    Ok(Some(rendered))
}

fn form_params(body: &Map<String, Value>, allow_files: bool) -> Vec<PostmanFormParam> {
    body.iter()
        .map(|(key, value)| {
            let text = value_text(value);
            if allow_files && text == FILE_PLACEHOLDER {
                PostmanFormParam {
                    key: key.clone(),
                    value: None,
                    param_type: "file".to_string(),
                    src: Some(String::new()),
                }
            } else {
                PostmanFormParam {
                    key: key.clone(),
                    value: Some(text),
                    param_type: "text".to_string(),
                    src: None,
                }
            }
        })
        .collect()
}

fn render_response(example: &ResponseExample) -> ApiDocResult<PostmanResponse> {
    let (body, preview_language) = match &example.body {
        Value::String(text) => (text.clone(), "text"),
        other => (serde_json::to_string_pretty(other)?, "json"),
    };

    let mut header = Vec::with_capacity(example.headers.len() + 1);
    if !example
        .headers
        .keys()
        .any(|key| key.eq_ignore_ascii_case("content-type"))
    {
        let content_type = if preview_language == "json" {
            "application/json"
        } else {
            "text/plain"
        };
        header.push(PostmanHeader::new("Content-Type", content_type));
    }
    header.extend(
        example
            .headers
            .iter()
            .map(|(key, value)| PostmanHeader::new(key, value)),
    );

    Ok(PostmanResponse {
        name: example.name.clone(),
        status: status_text(example.status).to_string(),
        code: example.status,
        preview_language: preview_language.to_string(),
        header,
        body,
    })
}

fn test_lines(test: &Test) -> Vec<String> {
    let script = test.script.lines().map(str::to_string);
    match &test.name {
        Some(name) => {
            let mut lines = vec![format!("pm.test({}, function () {{", js_string(name))];
            lines.extend(script.map(|line| format!("    {}", line)));
            lines.push("});".to_string());
            lines
        }
        None => script.collect(),
    }
}

/// Script lines that copy response values into variables
fn extraction_lines(variables: &[Variable]) -> Vec<String> {
    if variables.is_empty() {
        return Vec::new();
    }

    let mut lines = vec!["var jsonData = pm.response.json();".to_string()];
    for variable in variables {
        let target = match variable.scope {
            VariableScope::Collection => "pm.collectionVariables",
            VariableScope::Environment => "pm.environment",
            VariableScope::Global => "pm.globals",
        };
        lines.push(format!(
            "{}.set({}, {});",
            target,
            js_string(&variable.name),
            js_accessor("jsonData", &variable.path)
        ));
    }
    lines
}

/// `data.items.0.id` → `jsonData.data.items[0].id`
fn js_accessor(root: &str, path: &str) -> String {
    let mut accessor = root.to_string();
    for segment in path.split('.').filter(|segment| !segment.is_empty()) {
        if segment.chars().all(|c| c.is_ascii_digit()) {
            accessor.push_str(&format!("[{}]", segment));
        } else if is_js_identifier(segment) {
            accessor.push('.');
            accessor.push_str(segment);
        } else {
            accessor.push_str(&format!("[{}]", js_string(segment)));
        }
    }
    accessor
}

fn is_js_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

fn js_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn example_text(name: &str) -> String {
    value_text(&synthesize(name, &FieldConstraints::default()))
}

/// Reason phrase for common status codes
pub fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
