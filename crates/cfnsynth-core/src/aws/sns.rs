//! SNS topics and topic policies.

use crate::aws::iam::PolicyDocument;
use crate::cfn_resource;
use crate::resource::CfnProperties;
use crate::tag::CfnTag;
use crate::token::{concat, CfnString, Pseudo};
use serde::Serialize;

/// Reference to an SNS topic.
///
/// Only topics created in this stack are `owned`; a topic policy replaces the
/// whole policy of its topic, so grants on imported topics emit nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicRef {
    pub topic_arn: CfnString,
    pub topic_name: CfnString,
    pub owned: bool,
}

impl TopicRef {
    /// Topic in the stack's own account and region.
    pub fn from_topic_name(name: &str) -> Self {
        let topic_arn = concat(vec![
            "arn:".into(),
            Pseudo::Partition.token(),
            ":sns:".into(),
            Pseudo::Region.token(),
            ":".into(),
            Pseudo::AccountId.token(),
            ":".into(),
            name.into(),
        ]);
        Self {
            topic_arn,
            topic_name: name.into(),
            owned: false,
        }
    }

    /// Topic by literal ARN; the name is the last `:` segment.
    pub fn from_topic_arn(arn: &str) -> Self {
        let name = arn.rsplit(':').next().unwrap_or(arn);
        Self {
            topic_arn: arn.into(),
            topic_name: name.into(),
            owned: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnTopicProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<CfnString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_master_key_id: Option<CfnString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<CfnTag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<CfnString>,
}

impl CfnProperties for CfnTopicProps {
    const RESOURCE_TYPE: &'static str = "AWS::SNS::Topic";
}

cfn_resource!(
    /// `AWS::SNS::Topic`.
    CfnTopic,
    CfnTopicProps
);

impl CfnTopic {
    pub fn attr_topic_name(&self) -> CfnString {
        self.get_att("TopicName")
    }

    /// `Ref` of a topic is its ARN.
    pub fn as_topic_ref(&self) -> TopicRef {
        TopicRef {
            topic_arn: self.reference(),
            topic_name: self.attr_topic_name(),
            owned: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnTopicPolicyProps {
    pub policy_document: PolicyDocument,
    pub topics: Vec<CfnString>,
}

impl CfnProperties for CfnTopicPolicyProps {
    const RESOURCE_TYPE: &'static str = "AWS::SNS::TopicPolicy";
}

cfn_resource!(
    /// `AWS::SNS::TopicPolicy`.
    CfnTopicPolicy,
    CfnTopicPolicyProps
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Stack;

    #[test]
    fn topic_name_is_taken_from_arn() {
        let topic = TopicRef::from_topic_arn("arn:aws:sns:us-east-1:123456789012:alerts");
        assert_eq!(topic.topic_name, "alerts");
        assert_eq!(topic.topic_arn, "arn:aws:sns:us-east-1:123456789012:alerts");
        assert!(!topic.owned);
    }

    #[test]
    fn topic_created_in_stack_is_owned() {
        let mut stack = Stack::new("Demo");
        let topic = CfnTopic::new(&mut stack, "Alerts", CfnTopicProps::default())
            .expect("topic");
        let topic_ref = topic.as_topic_ref();
        assert!(topic_ref.owned);
        assert_eq!(topic_ref.topic_arn, topic.reference());
    }
}
