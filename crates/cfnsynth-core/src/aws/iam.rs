//! IAM policy documents, roles and inline policies.

use crate::cfn_resource;
use crate::resource::CfnProperties;
use crate::token::{CfnString, Intrinsic};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Who a statement applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// `"*"`.
    Any,
    /// `{"Service": "cloudtrail.amazonaws.com"}`.
    Service(String),
    /// `{"AWS": <account or role arn>}`.
    Aws(CfnString),
}

impl Principal {
    pub fn service(name: impl Into<String>) -> Self {
        Principal::Service(name.into())
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Principal::Any => serializer.serialize_str("*"),
            Principal::Service(service) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Service", service)?;
                map.end()
            }
            Principal::Aws(arn) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("AWS", arn)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<CfnString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
}

impl PolicyStatement {
    pub fn allow() -> Self {
        Self::with_effect(Effect::Allow)
    }

    pub fn deny() -> Self {
        Self::with_effect(Effect::Deny)
    }

    fn with_effect(effect: Effect) -> Self {
        Self {
            sid: None,
            effect,
            principal: None,
            action: Vec::new(),
            resource: Vec::new(),
            condition: None,
        }
    }

    pub fn sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action.push(action.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<CfnString>) -> Self {
        self.resource.push(resource.into());
        self
    }

    pub fn condition(mut self, condition: Value) -> Self {
        self.condition = Some(condition);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: Vec::new(),
        }
    }
}

impl PolicyDocument {
    pub fn new(statements: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: statements,
        }
    }

    pub fn add_statement(&mut self, statement: PolicyStatement) {
        self.statement.push(statement);
    }

    pub fn is_empty(&self) -> bool {
        self.statement.is_empty()
    }

    /// Trust policy letting a service principal assume a role.
    pub fn assumed_by_service(service: &str) -> Self {
        Self::new(vec![PolicyStatement::allow()
            .principal(Principal::service(service))
            .action("sts:AssumeRole")])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRoleProps {
    pub assume_role_policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<CfnString>,
}

impl CfnProperties for CfnRoleProps {
    const RESOURCE_TYPE: &'static str = "AWS::IAM::Role";
}

cfn_resource!(
    /// `AWS::IAM::Role`.
    CfnRole,
    CfnRoleProps
);

impl CfnRole {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }

    pub fn as_role_ref(&self) -> RoleRef {
        RoleRef {
            role_arn: self.attr_arn(),
            role_name: Some(self.reference()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnPolicyProps {
    pub policy_name: CfnString,
    pub policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<CfnString>>,
}

impl CfnProperties for CfnPolicyProps {
    const RESOURCE_TYPE: &'static str = "AWS::IAM::Policy";
}

cfn_resource!(
    /// `AWS::IAM::Policy`, an inline policy attached to roles.
    CfnPolicy,
    CfnPolicyProps
);

/// Reference to an existing or stack-owned role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleRef {
    pub role_arn: CfnString,
    pub role_name: Option<CfnString>,
}

impl RoleRef {
    pub fn from_role_arn(role_arn: impl Into<CfnString>) -> Self {
        Self {
            role_arn: role_arn.into(),
            role_name: None,
        }
    }

    pub fn from_import(export_name: &str) -> Self {
        Self::from_role_arn(Intrinsic::import_value(export_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trust_policy_renders_service_principal() {
        let doc = PolicyDocument::assumed_by_service("cloudtrail.amazonaws.com");
        assert_eq!(
            serde_json::to_value(&doc).expect("json"),
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {"Service": "cloudtrail.amazonaws.com"},
                    "Action": ["sts:AssumeRole"]
                }]
            })
        );
    }

    #[test]
    fn any_principal_renders_star() {
        let statement = PolicyStatement::deny()
            .principal(Principal::Any)
            .action("s3:*")
            .resource("arn:aws:s3:::bucket");
        let value = serde_json::to_value(&statement).expect("json");
        assert_eq!(value["Principal"], json!("*"));
        assert_eq!(value["Resource"], json!(["arn:aws:s3:::bucket"]));
    }
}
