//! S3 buckets and bucket policies.

use crate::aws::iam::PolicyDocument;
use crate::cfn_resource;
use crate::resource::CfnProperties;
use crate::tag::CfnTag;
use crate::token::{concat, CfnString, Pseudo};
use serde::Serialize;

/// Reference to a bucket, owned by this stack or imported by name.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRef {
    pub bucket_name: CfnString,
    pub bucket_arn: CfnString,
}

impl BucketRef {
    pub fn from_bucket_name(name: impl Into<CfnString>) -> Self {
        let bucket_name = name.into();
        let bucket_arn = concat(vec![
            "arn:".into(),
            Pseudo::Partition.token(),
            ":s3:::".into(),
            bucket_name.clone(),
        ]);
        Self {
            bucket_name,
            bucket_arn,
        }
    }

    /// ARN matching objects under `key_pattern`, e.g. `AWSLogs/*`.
    pub fn arn_for_objects(&self, key_pattern: impl Into<CfnString>) -> CfnString {
        concat(vec![self.bucket_arn.clone(), "/".into(), key_pattern.into()])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnBucketProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<CfnString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_encryption: Option<BucketEncryption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_access_block_configuration: Option<PublicAccessBlockConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<CfnTag>>,
}

impl CfnProperties for CfnBucketProps {
    const RESOURCE_TYPE: &'static str = "AWS::S3::Bucket";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketEncryption {
    pub server_side_encryption_configuration: Vec<ServerSideEncryptionRule>,
}

impl BucketEncryption {
    /// SSE-S3 (`AES256`) default encryption.
    pub fn s3_managed() -> Self {
        Self {
            server_side_encryption_configuration: vec![ServerSideEncryptionRule {
                server_side_encryption_by_default: ServerSideEncryptionByDefault {
                    sse_algorithm: "AES256".to_string(),
                    kms_master_key_id: None,
                },
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerSideEncryptionRule {
    pub server_side_encryption_by_default: ServerSideEncryptionByDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSideEncryptionByDefault {
    #[serde(rename = "SSEAlgorithm")]
    pub sse_algorithm: String,
    #[serde(rename = "KMSMasterKeyID", skip_serializing_if = "Option::is_none")]
    pub kms_master_key_id: Option<CfnString>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicAccessBlockConfiguration {
    pub block_public_acls: bool,
    pub block_public_policy: bool,
    pub ignore_public_acls: bool,
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockConfiguration {
    pub fn block_all() -> Self {
        Self {
            block_public_acls: true,
            block_public_policy: true,
            ignore_public_acls: true,
            restrict_public_buckets: true,
        }
    }
}

cfn_resource!(
    /// `AWS::S3::Bucket`.
    CfnBucket,
    CfnBucketProps
);

impl CfnBucket {
    pub fn attr_arn(&self) -> CfnString {
        self.get_att("Arn")
    }

    pub fn as_bucket_ref(&self) -> BucketRef {
        BucketRef {
            bucket_name: self.reference(),
            bucket_arn: self.attr_arn(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnBucketPolicyProps {
    pub bucket: CfnString,
    pub policy_document: PolicyDocument,
}

impl CfnProperties for CfnBucketPolicyProps {
    const RESOURCE_TYPE: &'static str = "AWS::S3::BucketPolicy";
}

cfn_resource!(
    /// `AWS::S3::BucketPolicy`.
    CfnBucketPolicy,
    CfnBucketPolicyProps
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn imported_bucket_arn_uses_partition() {
        let bucket = BucketRef::from_bucket_name("logs");
        assert_eq!(
            serde_json::to_value(bucket.arn_for_objects("AWSLogs/*")).expect("json"),
            json!({"Fn::Join": ["", ["arn:", {"Ref": "AWS::Partition"}, ":s3:::logs/AWSLogs/*"]]})
        );
    }

    #[test]
    fn encryption_uses_cloudformation_acronyms() {
        let value = serde_json::to_value(BucketEncryption::s3_managed()).expect("json");
        assert_eq!(
            value,
            json!({"ServerSideEncryptionConfiguration": [
                {"ServerSideEncryptionByDefault": {"SSEAlgorithm": "AES256"}}
            ]})
        );
    }
}
