use crate::client::audience::HostFamily;
use crate::constants::{limits::SUGGESTION_LIMIT, network::DEFAULT_CONTENT_TYPE};
use crate::errors::ClientError;
use crate::utils::suggest::closest_names;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

const SCOPE_PLACEHOLDER: &str = "{scope_id}";

#[derive(Debug, Clone)]
pub struct EndpointTemplate {
    pub name: String,
    pub path_template: String,
    pub host: HostFamily,
    pub requires_scope_id: bool,
    pub method: Method,
    pub content_type: String,
    pub default_payload: Option<Value>,
    pub default_query: Vec<(String, String)>,
    /// Appended after the item id on create calls, e.g. `/getDefinition`.
    pub suffix: Option<String>,
    pub supports_pagination: bool,
    pub returns_raw: bool,
}

impl EndpointTemplate {
    pub fn new(name: &str, path_template: &str) -> Self {
        Self {
            name: name.to_string(),
            path_template: path_template.to_string(),
            host: HostFamily::Fabric,
            requires_scope_id: path_template.contains(SCOPE_PLACEHOLDER),
            method: Method::GET,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            default_payload: None,
            default_query: Vec::new(),
            suffix: None,
            supports_pagination: false,
            returns_raw: false,
        }
    }

    pub fn host(mut self, host: HostFamily) -> Self {
        self.host = host;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.default_payload = Some(payload);
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.default_query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    pub fn paginated(mut self) -> Self {
        self.supports_pagination = true;
        self
    }

    pub fn raw(mut self) -> Self {
        self.returns_raw = true;
        self
    }

    pub fn render_path(
        &self,
        scope_id: Option<&str>,
        item_id: Option<&str>,
        with_suffix: bool,
    ) -> String {
        let mut path = match scope_id {
            Some(scope) if self.requires_scope_id => {
                self.path_template
                    .replace(SCOPE_PLACEHOLDER, &encode_segment(scope.trim()))
            }
            _ => self.path_template.clone(),
        };
        if let Some(item) = item_id.map(str::trim).filter(|item| !item.is_empty()) {
            path.push('/');
            path.push_str(&encode_segment(item));
        }
        if with_suffix {
            if let Some(suffix) = self.suffix.as_deref() {
                path.push_str(suffix);
            }
        }
        path
    }

    fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::configuration("Endpoint name must not be empty"));
        }
        if !self.path_template.starts_with('/') {
            return Err(ClientError::configuration(format!(
                "Endpoint {} path must start with '/'",
                self.name
            )));
        }
        if let Some(payload) = self.default_payload.as_ref() {
            if !payload.is_object() {
                return Err(ClientError::configuration(format!(
                    "Endpoint {} default payload must be a JSON object",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

fn encode_segment(raw: &str) -> String {
    let Ok(mut url) = Url::parse("http://segment.invalid/") else {
        return raw.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(raw);
    }
    url.path().trim_start_matches('/').to_string()
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    name: String,
    path: String,
    #[serde(default)]
    host: HostFamily,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    query: BTreeMap<String, String>,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    paginated: bool,
    #[serde(default)]
    raw: bool,
}

impl TryFrom<TemplateEntry> for EndpointTemplate {
    type Error = ClientError;

    fn try_from(entry: TemplateEntry) -> Result<Self, Self::Error> {
        let mut template = EndpointTemplate::new(&entry.name, &entry.path).host(entry.host);
        if let Some(method) = entry.method {
            let parsed = Method::from_bytes(method.trim().to_uppercase().as_bytes())
                .map_err(|_| {
                    ClientError::configuration(format!(
                        "Endpoint {} has invalid method {}",
                        entry.name, method
                    ))
                })?;
            template = template.method(parsed);
        }
        if let Some(content_type) = entry.content_type {
            template = template.content_type(&content_type);
        }
        if let Some(payload) = entry.payload {
            template = template.payload(payload);
        }
        for (key, value) in entry.query {
            template = template.query(&key, &value);
        }
        if let Some(suffix) = entry.suffix {
            template = template.suffix(&suffix);
        }
        template.supports_pagination = entry.paginated;
        template.returns_raw = entry.raw;
        Ok(template)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    templates: BTreeMap<String, EndpointTemplate>,
}

impl EndpointRegistry {
    pub fn new<I>(templates: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = EndpointTemplate>,
    {
        let mut out = BTreeMap::new();
        for template in templates {
            template.validate()?;
            if out.contains_key(&template.name) {
                return Err(ClientError::configuration(format!(
                    "Duplicate endpoint template: {}",
                    template.name
                )));
            }
            out.insert(template.name.clone(), template);
        }
        Ok(Self { templates: out })
    }

    pub fn from_json(text: &str) -> Result<Self, ClientError> {
        let entries: Vec<TemplateEntry> = serde_json::from_str(text)?;
        let templates = entries
            .into_iter()
            .map(EndpointTemplate::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(templates)
    }

    pub fn builtin() -> Self {
        let templates = builtin_templates()
            .into_iter()
            .map(|template| (template.name.clone(), template))
            .collect();
        Self { templates }
    }

    pub fn get(&self, name: &str) -> Option<&EndpointTemplate> {
        self.templates.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&EndpointTemplate, ClientError> {
        if let Some(template) = self.templates.get(name) {
            return Ok(template);
        }
        let suggestions = closest_names(
            name,
            self.templates.keys().map(String::as_str),
            SUGGESTION_LIMIT,
        );
        let mut err = ClientError::configuration(format!("Unknown template name: {}", name));
        if !suggestions.is_empty() {
            err = err.with_hint(format!("Did you mean: {}?", suggestions.join(", ")));
        }
        Err(err.with_details(serde_json::json!({ "did_you_mean": suggestions })))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn scoped_collection(name: &str, segment: &str) -> EndpointTemplate {
    EndpointTemplate::new(name, &format!("/workspaces/{}/{}", SCOPE_PLACEHOLDER, segment))
        .paginated()
}

fn builtin_templates() -> Vec<EndpointTemplate> {
    let mut templates = vec![
        EndpointTemplate::new("workspaces", "/workspaces").paginated(),
        EndpointTemplate::new("capacities", "/capacities").paginated(),
        EndpointTemplate::new("connections", "/connections").paginated(),
        EndpointTemplate::new("gateways", "/gateways").paginated(),
        EndpointTemplate::new("assign_to_capacity", "/workspaces/{scope_id}")
            .suffix("/assignToCapacity"),
        EndpointTemplate::new("unassign_from_capacity", "/workspaces/{scope_id}")
            .suffix("/unassignFromCapacity"),
        scoped_collection("role_assignments", "roleAssignments"),
        scoped_collection("folders", "folders"),
        EndpointTemplate::new("folder_move", "/workspaces/{scope_id}/folders").suffix("/move"),
        EndpointTemplate::new(
            "connections_role_assignments",
            "/connections/{scope_id}/roleAssignments",
        )
        .paginated(),
        scoped_collection("items", "items"),
        scoped_collection("lakehouses", "lakehouses"),
        scoped_collection("notebooks", "notebooks"),
        scoped_collection("data_pipelines", "dataPipelines"),
        scoped_collection("dataflows", "dataflows"),
        scoped_collection("reports", "reports"),
        scoped_collection("semantic_models", "semanticModels"),
        scoped_collection("warehouses", "warehouses"),
    ];

    for (name, segment) in [
        ("item", "items"),
        ("report", "reports"),
        ("semantic_model", "semanticModels"),
        ("notebook", "notebooks"),
        ("data_pipeline", "dataPipelines"),
        ("dataflow", "dataflows"),
    ] {
        let path = format!("/workspaces/{}/{}", SCOPE_PLACEHOLDER, segment);
        templates.push(
            EndpointTemplate::new(&format!("{}_definition", name), &path)
                .suffix("/getDefinition"),
        );
        let mut update = EndpointTemplate::new(&format!("{}_update_definition", name), &path)
            .suffix("/updateDefinition");
        if name == "semantic_model" {
            update = update.query("updateMetadata", "True");
        }
        templates.push(update);
    }

    templates.extend([
        EndpointTemplate::new("powerbi_dataflows", "/groups/{scope_id}/dataflows")
            .host(HostFamily::PowerBi),
        EndpointTemplate::new("powerbi_dataflow_export", "/groups/{scope_id}/dataflows")
            .host(HostFamily::PowerBi)
            .raw(),
        EndpointTemplate::new("powerbi_datasets", "/groups/{scope_id}/datasets")
            .host(HostFamily::PowerBi),
        EndpointTemplate::new("powerbi_dataset_refreshes", "/groups/{scope_id}/datasets")
            .host(HostFamily::PowerBi)
            .suffix("/refreshes"),
        EndpointTemplate::new("powerbi_gateways", "/gateways").host(HostFamily::PowerBi),
    ]);
    templates
}
