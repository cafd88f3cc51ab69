//! Connections and API destinations for calling HTTP endpoints.

use crate::model::{
    ApiKeyAuthParametersProperty, AuthParametersProperty, BasicAuthParametersProperty,
    CfnApiDestination, CfnApiDestinationProps, CfnConnection, CfnConnectionProps,
    ClientParametersProperty, ConnectionHttpParametersProperty, OAuthParametersProperty,
    ParameterProperty,
};
use cfnsynth_core::{CfnString, Construct, Stack, SynthError, Template, ValidationError};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A secret rendered into the template.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretValue(String);

impl SecretValue {
    /// Embeds `value` in the template as plain text.
    pub fn unsafe_plain_text(value: impl Into<String>) -> Self {
        SecretValue(value.into())
    }

    /// Dynamic reference resolved from Secrets Manager at deploy time.
    pub fn secrets_manager(secret_id: &str, json_field: Option<&str>) -> Self {
        SecretValue(format!(
            "{{{{resolve:secretsmanager:{secret_id}:SecretString:{}::}}}}",
            json_field.unwrap_or("")
        ))
    }

    fn render(&self) -> CfnString {
        self.0.as_str().into()
    }
}

/// A header, query string or body parameter sent with each request.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpParameter {
    Plain(CfnString),
    Secret(SecretValue),
}

impl HttpParameter {
    pub fn from_string(value: impl Into<CfnString>) -> Self {
        HttpParameter::Plain(value.into())
    }

    pub fn from_secret(value: SecretValue) -> Self {
        HttpParameter::Secret(value)
    }

    fn render(&self, key: &str) -> ParameterProperty {
        let (value, secret) = match self {
            HttpParameter::Plain(value) => (value.clone(), false),
            HttpParameter::Secret(secret) => (secret.render(), true),
        };
        ParameterProperty {
            key: key.into(),
            value,
            is_value_secret: Some(secret),
        }
    }
}

/// Parameters keyed by name.
pub type HttpParameters = BTreeMap<String, HttpParameter>;

fn render_parameters(params: &HttpParameters) -> Option<Vec<ParameterProperty>> {
    if params.is_empty() {
        return None;
    }
    Some(params.iter().map(|(key, p)| p.render(key)).collect())
}

fn render_http_parameters(
    headers: &HttpParameters,
    query_strings: &HttpParameters,
    body: &HttpParameters,
) -> Option<ConnectionHttpParametersProperty> {
    let rendered = ConnectionHttpParametersProperty {
        body_parameters: render_parameters(body),
        header_parameters: render_parameters(headers),
        query_string_parameters: render_parameters(query_strings),
    };
    (rendered != ConnectionHttpParametersProperty::default()).then_some(rendered)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Get,
    Head,
    Options,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(HttpMethod::Post),
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unknown http method '{other}'")),
        }
    }
}

/// OAuth client-credentials settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthAuthorization {
    pub authorization_endpoint: String,
    pub http_method: HttpMethod,
    pub client_id: String,
    pub client_secret: SecretValue,
    pub header_parameters: HttpParameters,
    pub query_string_parameters: HttpParameters,
    pub body_parameters: HttpParameters,
}

/// How a connection authorizes requests.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    ApiKey { name: String, value: SecretValue },
    Basic { username: String, password: SecretValue },
    OAuth(OAuthAuthorization),
}

impl Authorization {
    pub fn api_key(name: impl Into<String>, value: SecretValue) -> Self {
        Authorization::ApiKey {
            name: name.into(),
            value,
        }
    }

    pub fn basic(username: impl Into<String>, password: SecretValue) -> Self {
        Authorization::Basic {
            username: username.into(),
            password,
        }
    }

    pub fn oauth(options: OAuthAuthorization) -> Self {
        Authorization::OAuth(options)
    }

    fn authorization_type(&self) -> &'static str {
        match self {
            Authorization::ApiKey { .. } => "API_KEY",
            Authorization::Basic { .. } => "BASIC",
            Authorization::OAuth(_) => "OAUTH_CLIENT_CREDENTIALS",
        }
    }

    fn render(&self) -> AuthParametersProperty {
        match self {
            Authorization::ApiKey { name, value } => AuthParametersProperty {
                api_key_auth_parameters: Some(ApiKeyAuthParametersProperty {
                    api_key_name: name.as_str().into(),
                    api_key_value: value.render(),
                }),
                ..AuthParametersProperty::default()
            },
            Authorization::Basic { username, password } => AuthParametersProperty {
                basic_auth_parameters: Some(BasicAuthParametersProperty {
                    username: username.as_str().into(),
                    password: password.render(),
                }),
                ..AuthParametersProperty::default()
            },
            Authorization::OAuth(oauth) => AuthParametersProperty {
                oauth_parameters: Some(OAuthParametersProperty {
                    authorization_endpoint: oauth.authorization_endpoint.as_str().into(),
                    client_parameters: ClientParametersProperty {
                        client_id: oauth.client_id.as_str().into(),
                        client_secret: oauth.client_secret.render(),
                    },
                    http_method: oauth.http_method.as_str().into(),
                    oauth_http_parameters: render_http_parameters(
                        &oauth.header_parameters,
                        &oauth.query_string_parameters,
                        &oauth.body_parameters,
                    ),
                }),
                ..AuthParametersProperty::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionProps {
    pub authorization: Authorization,
    pub connection_name: Option<String>,
    pub description: Option<String>,
    /// Sent with every invocation.
    pub header_parameters: HttpParameters,
    pub query_string_parameters: HttpParameters,
    pub body_parameters: HttpParameters,
}

impl ConnectionProps {
    pub fn new(authorization: Authorization) -> Self {
        Self {
            authorization,
            connection_name: None,
            description: None,
            header_parameters: HttpParameters::new(),
            query_string_parameters: HttpParameters::new(),
            body_parameters: HttpParameters::new(),
        }
    }
}

/// Reference to a connection owned here or elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRef {
    pub connection_arn: CfnString,
    pub connection_name: Option<CfnString>,
    pub connection_secret_arn: Option<CfnString>,
}

impl ConnectionRef {
    pub fn from_connection_arn(arn: impl Into<CfnString>) -> Self {
        Self {
            connection_arn: arn.into(),
            connection_name: None,
            connection_secret_arn: None,
        }
    }
}

/// Authorization settings for API destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    resource: CfnConnection,
}

impl Connection {
    pub fn new(stack: &mut Stack, id: &str, props: ConnectionProps) -> Result<Self, SynthError> {
        let mut auth_parameters = props.authorization.render();
        auth_parameters.invocation_http_parameters = render_http_parameters(
            &props.header_parameters,
            &props.query_string_parameters,
            &props.body_parameters,
        );
        let resource = CfnConnection::new(
            stack,
            &format!("{id}/Resource"),
            CfnConnectionProps {
                authorization_type: props.authorization.authorization_type().into(),
                auth_parameters,
                description: props.description.map(Into::into),
                name: props.connection_name.map(Into::into),
            },
        )?;
        debug!(id, logical_id = resource.logical_id(), "created connection");
        Ok(Self { resource })
    }

    pub fn connection_arn(&self) -> CfnString {
        self.resource.attr_arn()
    }

    pub fn connection_name(&self) -> CfnString {
        self.resource.reference()
    }

    pub fn connection_secret_arn(&self) -> CfnString {
        self.resource.attr_secret_arn()
    }

    pub fn connection_ref(&self) -> ConnectionRef {
        ConnectionRef {
            connection_arn: self.connection_arn(),
            connection_name: Some(self.connection_name()),
            connection_secret_arn: Some(self.connection_secret_arn()),
        }
    }

    pub fn resource(&self) -> &CfnConnection {
        &self.resource
    }
}

impl Construct for Connection {
    fn path(&self) -> &str {
        self.resource.path()
    }

    fn validate(&self) -> Vec<ValidationError> {
        self.resource.validate()
    }

    fn synthesize(&self, template: &mut Template) -> Result<(), SynthError> {
        self.resource.synthesize(template)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiDestinationProps {
    pub connection: ConnectionRef,
    pub endpoint: String,
    /// Defaults to `POST`.
    pub http_method: Option<HttpMethod>,
    pub rate_limit_per_second: Option<u32>,
    pub api_destination_name: Option<String>,
    pub description: Option<String>,
}

impl ApiDestinationProps {
    pub fn new(connection: ConnectionRef, endpoint: impl Into<String>) -> Self {
        Self {
            connection,
            endpoint: endpoint.into(),
            http_method: None,
            rate_limit_per_second: None,
            api_destination_name: None,
            description: None,
        }
    }
}

/// An HTTP endpoint rules can deliver events to.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDestination {
    resource: CfnApiDestination,
}

impl ApiDestination {
    pub fn new(
        stack: &mut Stack,
        id: &str,
        props: ApiDestinationProps,
    ) -> Result<Self, SynthError> {
        let http_method = props.http_method.unwrap_or(HttpMethod::Post);
        let resource = CfnApiDestination::new(
            stack,
            &format!("{id}/Resource"),
            CfnApiDestinationProps {
                connection_arn: props.connection.connection_arn,
                http_method: http_method.as_str().into(),
                invocation_endpoint: props.endpoint.into(),
                description: props.description.map(Into::into),
                invocation_rate_limit_per_second: props.rate_limit_per_second,
                name: props.api_destination_name.map(Into::into),
            },
        )?;
        Ok(Self { resource })
    }

    pub fn api_destination_arn(&self) -> CfnString {
        self.resource.attr_arn()
    }

    pub fn api_destination_name(&self) -> CfnString {
        self.resource.reference()
    }

    pub fn resource(&self) -> &CfnApiDestination {
        &self.resource
    }
}

impl Construct for ApiDestination {
    fn path(&self) -> &str {
        self.resource.path()
    }

    fn validate(&self) -> Vec<ValidationError> {
        self.resource.validate()
    }

    fn synthesize(&self, template: &mut Template) -> Result<(), SynthError> {
        self.resource.synthesize(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn synth<C: Construct>(construct: &C) -> Template {
        let mut template = Template::default();
        construct.synthesize(&mut template).expect("synth");
        template
    }

    #[test]
    fn api_key_connection_renders_invocation_parameters() {
        let mut stack = Stack::new("Demo");
        let mut props = ConnectionProps::new(Authorization::api_key(
            "x-api-key",
            SecretValue::secrets_manager("hook-key", Some("key")),
        ));
        props
            .header_parameters
            .insert("X-Team".into(), HttpParameter::from_string("ops"));
        props.query_string_parameters.insert(
            "token".into(),
            HttpParameter::from_secret(SecretValue::unsafe_plain_text("t0k")),
        );
        let connection = Connection::new(&mut stack, "Connection", props).expect("connection");

        let template = synth(&connection);
        let (_, node) = template
            .resources_of_type("AWS::Events::Connection")
            .next()
            .expect("node");
        assert_eq!(node.property("AuthorizationType"), Some(&json!("API_KEY")));
        assert_eq!(
            node.property("AuthParameters"),
            Some(&json!({
                "ApiKeyAuthParameters": {
                    "ApiKeyName": "x-api-key",
                    "ApiKeyValue": "{{resolve:secretsmanager:hook-key:SecretString:key::}}"
                },
                "InvocationHttpParameters": {
                    "HeaderParameters": [{"Key": "X-Team", "Value": "ops", "IsValueSecret": false}],
                    "QueryStringParameters": [{"Key": "token", "Value": "t0k", "IsValueSecret": true}]
                }
            }))
        );
    }

    #[test]
    fn api_destination_defaults_to_post() {
        let mut stack = Stack::new("Demo");
        let connection = Connection::new(
            &mut stack,
            "Connection",
            ConnectionProps::new(Authorization::basic(
                "user",
                SecretValue::unsafe_plain_text("pw"),
            )),
        )
        .expect("connection");
        let destination = ApiDestination::new(
            &mut stack,
            "Destination",
            ApiDestinationProps::new(connection.connection_ref(), "https://example.com/hook"),
        )
        .expect("destination");

        let template = synth(&destination);
        let node = template
            .resource(destination.resource().logical_id())
            .expect("node");
        assert_eq!(node.property("HttpMethod"), Some(&json!("POST")));
        assert_eq!(
            node.property("ConnectionArn"),
            Some(&json!({"Fn::GetAtt": [connection.resource().logical_id(), "Arn"]}))
        );
    }

    #[test]
    fn l2_logical_id_hides_resource_segment() {
        let mut stack = Stack::new("Demo");
        let connection = Connection::new(
            &mut stack,
            "Hook",
            ConnectionProps::new(Authorization::basic("u", SecretValue::unsafe_plain_text("p"))),
        )
        .expect("connection");
        let id = connection.resource().logical_id();
        assert!(id.starts_with("Hook"));
        assert_eq!(id.len(), "Hook".len() + 8);
    }

    #[test]
    fn http_method_parses_case_insensitively() {
        assert_eq!("put".parse::<HttpMethod>(), Ok(HttpMethod::Put));
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }
}
