//! L1 resource plumbing: a logical id plus a typed property struct.

use crate::error::SynthError;
use crate::stack::Stack;
use crate::template::{DeletionPolicy, ResourceNode, Template};
use crate::token::{CfnString, Intrinsic};
use crate::traits::Construct;
use crate::validation::{ValidationError, Validator};
use serde::Serialize;
use tracing::debug;

/// Property struct of one CloudFormation resource type.
pub trait CfnProperties: Serialize {
    /// CloudFormation type name, e.g. `AWS::CloudTrail::Trail`.
    const RESOURCE_TYPE: &'static str;

    /// Checks documented constraints on literal values.
    fn validate(&self, _validator: &mut Validator) {}
}

/// A CloudFormation resource owned by the construct that created it.
#[derive(Debug, Clone, PartialEq)]
pub struct CfnResource<P> {
    path: String,
    logical_id: String,
    props: P,
    depends_on: Vec<String>,
    deletion_policy: Option<DeletionPolicy>,
    update_replace_policy: Option<DeletionPolicy>,
}

impl<P: CfnProperties> CfnResource<P> {
    /// Allocates a logical id for `path` and takes ownership of the props.
    pub fn new(stack: &mut Stack, path: &str, props: P) -> Result<Self, SynthError> {
        let logical_id = stack.allocate_logical_id(path)?;
        debug!(
            resource_type = P::RESOURCE_TYPE,
            path,
            logical_id = %logical_id,
            "created resource"
        );
        Ok(Self {
            path: path.to_string(),
            logical_id,
            props,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        })
    }

    pub fn resource_type(&self) -> &'static str {
        P::RESOURCE_TYPE
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn props(&self) -> &P {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut P {
        &mut self.props
    }

    /// `{"Ref": <logical id>}`.
    pub fn reference(&self) -> CfnString {
        Intrinsic::reference(self.logical_id.clone()).into()
    }

    /// `{"Fn::GetAtt": [<logical id>, attribute]}`.
    pub fn get_att(&self, attribute: &str) -> CfnString {
        Intrinsic::get_att(self.logical_id.clone(), attribute).into()
    }

    pub fn add_depends_on(&mut self, logical_id: impl Into<String>) {
        let logical_id = logical_id.into();
        if !self.depends_on.contains(&logical_id) {
            self.depends_on.push(logical_id);
        }
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Sets both the deletion and update-replace policy.
    pub fn apply_removal_policy(&mut self, policy: DeletionPolicy) {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
    }

    /// Renders this resource as a template node.
    pub fn to_node(&self) -> Result<ResourceNode, SynthError> {
        let properties = serde_json::to_value(&self.props)
            .map_err(|err| SynthError::render(self.logical_id.clone(), err))?;
        Ok(ResourceNode {
            resource_type: P::RESOURCE_TYPE.to_string(),
            properties,
            depends_on: self.depends_on.clone(),
            deletion_policy: self.deletion_policy,
            update_replace_policy: self.update_replace_policy,
        })
    }
}

impl<P: CfnProperties> Construct for CfnResource<P> {
    fn path(&self) -> &str {
        &self.path
    }

    fn validate(&self) -> Vec<ValidationError> {
        let mut validator = Validator::new(self.path.clone());
        self.props.validate(&mut validator);
        validator.finish()
    }

    fn synthesize(&self, template: &mut Template) -> Result<(), SynthError> {
        template.add_resource(self.logical_id.clone(), self.to_node()?)
    }
}

/// Declares a named L1 resource type wrapping [`CfnResource`].
///
/// The generated type dereferences to `CfnResource<Props>` and implements
/// [`Construct`](crate::traits::Construct).
#[macro_export]
macro_rules! cfn_resource {
    ($(#[$meta:meta])* $name:ident, $props:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name($crate::resource::CfnResource<$props>);

        impl $name {
            pub const CFN_RESOURCE_TYPE_NAME: &'static str =
                <$props as $crate::resource::CfnProperties>::RESOURCE_TYPE;

            pub fn new(
                stack: &mut $crate::stack::Stack,
                id: &str,
                props: $props,
            ) -> Result<Self, $crate::error::SynthError> {
                $crate::resource::CfnResource::new(stack, id, props).map(Self)
            }

            pub fn into_inner(self) -> $crate::resource::CfnResource<$props> {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::resource::CfnResource<$props>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl $crate::traits::Construct for $name {
            fn path(&self) -> &str {
                $crate::traits::Construct::path(&self.0)
            }

            fn validate(&self) -> Vec<$crate::validation::ValidationError> {
                $crate::traits::Construct::validate(&self.0)
            }

            fn synthesize(
                &self,
                template: &mut $crate::template::Template,
            ) -> Result<(), $crate::error::SynthError> {
                $crate::traits::Construct::synthesize(&self.0, template)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct QueueProps {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub queue_name: Option<CfnString>,
    }

    impl CfnProperties for QueueProps {
        const RESOURCE_TYPE: &'static str = "AWS::SQS::Queue";

        fn validate(&self, validator: &mut Validator) {
            validator.length("QueueName", self.queue_name.as_ref(), 1, 80);
        }
    }

    cfn_resource!(CfnQueue, QueueProps);

    #[test]
    fn resource_renders_node_with_dependencies() {
        let mut stack = Stack::new("Demo");
        let mut queue = CfnQueue::new(
            &mut stack,
            "Queue",
            QueueProps {
                queue_name: Some("jobs".into()),
            },
        )
        .expect("queue");
        queue.add_depends_on("Topic");
        queue.add_depends_on("Topic");
        queue.apply_removal_policy(DeletionPolicy::Retain);

        let mut template = Template::default();
        queue.synthesize(&mut template).expect("synth");
        let node = template.resource("Queue").expect("node");
        assert_eq!(CfnQueue::CFN_RESOURCE_TYPE_NAME, "AWS::SQS::Queue");
        assert_eq!(node.property("QueueName"), Some(&json!("jobs")));
        assert_eq!(node.depends_on, vec!["Topic".to_string()]);
        assert_eq!(node.deletion_policy, Some(DeletionPolicy::Retain));
    }

    #[test]
    fn props_validation_is_scoped_to_path() {
        let mut stack = Stack::new("Demo");
        let queue = CfnQueue::new(
            &mut stack,
            "Queue",
            QueueProps {
                queue_name: Some(String::new().into()),
            },
        )
        .expect("queue");
        let errors = queue.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "Queue");
    }

    #[test]
    fn reference_and_attributes_are_tokens() {
        let mut stack = Stack::new("Demo");
        let queue = CfnQueue::new(&mut stack, "Queue", QueueProps { queue_name: None })
            .expect("queue");
        assert_eq!(
            serde_json::to_value(queue.get_att("Arn")).expect("json"),
            json!({"Fn::GetAtt": ["Queue", "Arn"]})
        );
        assert_eq!(
            serde_json::to_value(queue.reference()).expect("json"),
            json!({"Ref": "Queue"})
        );
    }
}
